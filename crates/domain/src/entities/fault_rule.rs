//! Fault rule entity - One concrete injection directive for a proxy
//!
//! A rule describes which messages on the edge `source -> dest` a proxy
//! should delay, abort or mangle, and with which probability.
//!
//! # Examples
//!
//! ```
//! use domain::{FaultRule, MessageType};
//!
//! let rule = FaultRule::new("productpage", "reviews")
//!     .with_message_type(MessageType::Response)
//!     .with_delay(1.0, "2s");
//!
//! assert_eq!(rule.delay.probability, 1.0);
//! assert_eq!(rule.delay_time, "2s");
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entities::Topology;
use crate::errors::DomainError;
use crate::value_objects::{Distribution, MessageType, parse_duration};

/// Error code asking the proxy to reset the connection instead of replying
pub const RESET_CONNECTION: i32 = -1;

/// Probability and distribution deciding whether an action fires
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Trigger {
    /// Probability in `[0, 1]`
    pub probability: f64,
    /// Distribution the proxy samples from
    #[serde(default)]
    pub distribution: Distribution,
}

impl Trigger {
    /// Uniformly distributed trigger
    pub const fn uniform(probability: f64) -> Self {
        Self {
            probability,
            distribution: Distribution::Uniform,
        }
    }

    /// Whether the action can fire at all
    pub fn is_active(&self) -> bool {
        self.probability > 0.0
    }
}

/// A validated, immutable fault-injection rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultRule {
    pub source: String,
    pub dest: String,
    pub message_type: MessageType,
    /// Pattern matched against the tracking header value
    pub header_pattern: String,
    /// Pattern matched against the message body
    pub body_pattern: String,
    pub delay: Trigger,
    /// Injected latency as a duration string, e.g. `"1s500ms"`
    pub delay_time: String,
    pub abort: Trigger,
    /// HTTP status to return on abort, or [`RESET_CONNECTION`]
    pub error_code: i32,
    pub mangle: Trigger,
    pub search_string: String,
    pub replace_string: String,
}

impl FaultRule {
    /// Rule on `source -> dest` with every action disabled
    pub fn new(source: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            message_type: MessageType::Request,
            header_pattern: "*".to_string(),
            body_pattern: "*".to_string(),
            delay: Trigger::default(),
            delay_time: "0s".to_string(),
            abort: Trigger::default(),
            error_code: RESET_CONNECTION,
            mangle: Trigger::default(),
            search_string: String::new(),
            replace_string: String::new(),
        }
    }

    /// Pass-through rule that only makes the proxy log tracked traffic
    ///
    /// Log rules have every probability at zero and therefore never pass
    /// [`FaultRule::validate`]. They are only generated internally for
    /// edges no scenario covers.
    pub fn log_only(source: impl Into<String>, dest: impl Into<String>) -> Self {
        Self::new(source, dest)
    }

    #[must_use]
    pub fn with_message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    #[must_use]
    pub fn with_header_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.header_pattern = pattern.into();
        self
    }

    #[must_use]
    pub fn with_body_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.body_pattern = pattern.into();
        self
    }

    /// Delay matching messages by `delay_time` with the given probability
    #[must_use]
    pub fn with_delay(mut self, probability: f64, delay_time: impl Into<String>) -> Self {
        self.delay.probability = probability;
        self.delay_time = delay_time.into();
        self
    }

    /// Abort matching messages with `error_code` with the given probability
    #[must_use]
    pub fn with_abort(mut self, probability: f64, error_code: i32) -> Self {
        self.abort.probability = probability;
        self.error_code = error_code;
        self
    }

    /// Replace `search` with `replace` in matching bodies with the given probability
    #[must_use]
    pub fn with_mangle(
        mut self,
        probability: f64,
        search: impl Into<String>,
        replace: impl Into<String>,
    ) -> Self {
        self.mangle.probability = probability;
        self.search_string = search.into();
        self.replace_string = replace.into();
        self
    }

    #[must_use]
    pub fn with_delay_distribution(mut self, distribution: Distribution) -> Self {
        self.delay.distribution = distribution;
        self
    }

    #[must_use]
    pub fn with_abort_distribution(mut self, distribution: Distribution) -> Self {
        self.abort.distribution = distribution;
        self
    }

    #[must_use]
    pub fn with_mangle_distribution(mut self, distribution: Distribution) -> Self {
        self.mangle.distribution = distribution;
        self
    }

    /// Whether no action can ever fire
    pub fn is_log_only(&self) -> bool {
        !(self.delay.is_active() || self.abort.is_active() || self.mangle.is_active())
    }

    /// Parsed injected latency
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MalformedDuration`] if `delay_time` does not parse.
    pub fn delay_duration(&self) -> Result<Duration, DomainError> {
        parse_duration(&self.delay_time)
    }

    /// Check every rule invariant against a topology
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidRule`] naming the first violated invariant.
    pub fn validate(&self, topology: &Topology) -> Result<(), DomainError> {
        if self.source.is_empty() || self.dest.is_empty() {
            return Err(invalid("source and dest must both be set"));
        }
        for service in [&self.source, &self.dest] {
            if !topology.contains(service) {
                return Err(invalid(format!("service '{service}' is not in the topology")));
            }
        }
        if self.header_pattern.is_empty() && self.body_pattern.is_empty() {
            return Err(invalid("header pattern or body pattern must be set"));
        }
        for (action, trigger) in [
            ("delay", &self.delay),
            ("abort", &self.abort),
            ("mangle", &self.mangle),
        ] {
            if !(0.0..=1.0).contains(&trigger.probability) {
                return Err(invalid(format!(
                    "{action} probability {} is outside [0, 1]",
                    trigger.probability
                )));
            }
        }
        if self.is_log_only() {
            return Err(invalid(
                "at least one of delay, abort or mangle probability must be above zero",
            ));
        }
        if self.delay.is_active() {
            if self.delay_time.is_empty() {
                return Err(invalid("delay probability is set but delay time is empty"));
            }
            let delay = self
                .delay_duration()
                .map_err(|e| invalid(format!("delay time: {e}")))?;
            if delay.is_zero() {
                return Err(invalid("delay probability is set but delay time is zero"));
            }
        }
        if self.abort.is_active() && self.error_code < RESET_CONNECTION {
            return Err(invalid(format!(
                "abort probability is set but error code {} is below -1",
                self.error_code
            )));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> DomainError {
    DomainError::InvalidRule(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topology() -> Topology {
        let mut topology = Topology::new();
        topology.add_service("a");
        topology.add_service("b");
        topology.add_dependency("a", "b").unwrap();
        topology
    }

    fn assert_invalid(rule: &FaultRule, fragment: &str) {
        match rule.validate(&topology()) {
            Err(DomainError::InvalidRule(reason)) => assert!(
                reason.contains(fragment),
                "expected '{fragment}' in '{reason}'"
            ),
            other => unreachable!("expected InvalidRule, got {other:?}"),
        }
    }

    #[test]
    fn new_rule_has_documented_defaults() {
        let rule = FaultRule::new("a", "b");
        assert_eq!(rule.message_type, MessageType::Request);
        assert_eq!(rule.header_pattern, "*");
        assert_eq!(rule.body_pattern, "*");
        assert_eq!(rule.delay_time, "0s");
        assert_eq!(rule.error_code, -1);
        assert_eq!(rule.delay.distribution, Distribution::Uniform);
        assert!(rule.is_log_only());
    }

    #[test]
    fn valid_abort_rule() {
        let rule = FaultRule::new("a", "b").with_abort(1.0, -1);
        assert!(rule.validate(&topology()).is_ok());
    }

    #[test]
    fn valid_delay_rule() {
        let rule = FaultRule::new("a", "b").with_delay(0.3, "1s500ms");
        assert!(rule.validate(&topology()).is_ok());
        assert_eq!(rule.delay_duration().unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn valid_mangle_rule() {
        let rule = FaultRule::new("a", "b").with_mangle(0.5, "foo", "bar");
        assert!(rule.validate(&topology()).is_ok());
    }

    #[test]
    fn rejects_empty_endpoints() {
        assert_invalid(&FaultRule::new("", "b").with_abort(1.0, 500), "must both be set");
    }

    #[test]
    fn rejects_unknown_services() {
        assert_invalid(
            &FaultRule::new("a", "ghost").with_abort(1.0, 500),
            "'ghost' is not in the topology",
        );
    }

    #[test]
    fn rejects_missing_patterns() {
        let rule = FaultRule::new("a", "b")
            .with_header_pattern("")
            .with_body_pattern("")
            .with_abort(1.0, 500);
        assert_invalid(&rule, "pattern");
    }

    #[test]
    fn one_pattern_is_enough() {
        let rule = FaultRule::new("a", "b")
            .with_header_pattern("")
            .with_abort(1.0, 500);
        assert!(rule.validate(&topology()).is_ok());
    }

    #[test]
    fn rejects_rule_without_action() {
        assert_invalid(&FaultRule::new("a", "b"), "above zero");
    }

    #[test]
    fn rejects_probability_out_of_range() {
        assert_invalid(&FaultRule::new("a", "b").with_abort(1.5, 500), "outside [0, 1]");
        assert_invalid(&FaultRule::new("a", "b").with_delay(-0.1, "1s"), "outside [0, 1]");
    }

    #[test]
    fn rejects_delay_without_time() {
        assert_invalid(&FaultRule::new("a", "b").with_delay(1.0, ""), "empty");
        assert_invalid(&FaultRule::new("a", "b").with_delay(1.0, "0s"), "zero");
    }

    #[test]
    fn rejects_malformed_delay_time() {
        assert_invalid(&FaultRule::new("a", "b").with_delay(1.0, "3x"), "delay time");
    }

    #[test]
    fn rejects_error_code_below_reset() {
        assert_invalid(&FaultRule::new("a", "b").with_abort(1.0, -2), "below -1");
    }

    #[test]
    fn log_only_rule_never_validates() {
        let rule = FaultRule::log_only("a", "b");
        assert!(rule.is_log_only());
        assert!(rule.validate(&topology()).is_err());
    }
}
