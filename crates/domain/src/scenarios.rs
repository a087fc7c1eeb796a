//! Failure scenarios - Graph-aware intents that expand into fault rules
//!
//! A scenario names a failure ("crash reviews", "delay everything productpage
//! calls") relative to the dependency graph. Expansion resolves the missing
//! side of the edge from the topology:
//!
//! - no source: every service calling `dest` (its dependents)
//! - no dest: every service `source` calls (its dependencies)
//!
//! and produces one rule per `(source, dest)` pair of the cross product.
//! Empty strings count as "not given".
//!
//! # Examples
//!
//! ```
//! use domain::{CrashParams, Scenario, Topology};
//!
//! let mut topology = Topology::new();
//! for name in ["productpage", "reviews", "details"] {
//!     topology.add_service(name);
//! }
//! topology.add_dependency("productpage", "details").unwrap();
//! topology.add_dependency("reviews", "details").unwrap();
//!
//! let rules = Scenario::CrashService(CrashParams::new("details"))
//!     .expand(&topology)
//!     .unwrap();
//! assert_eq!(rules.len(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::entities::{FaultRule, RESET_CONNECTION, Topology};
use crate::errors::DomainError;
use crate::value_objects::{Distribution, MessageType};

const DEFAULT_DELAY_TIME: &str = "1s";
const OVERLOAD_DELAY_TIME: &str = "10s";
const OVERLOAD_PROBABILITY: f64 = 0.5;
const OVERLOAD_ERROR_CODE: i32 = 503;

/// Header and body patterns, `"*"` when not given
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPatterns {
    #[serde(alias = "headerpattern", skip_serializing_if = "Option::is_none")]
    pub header_pattern: Option<String>,
    #[serde(alias = "bodypattern", skip_serializing_if = "Option::is_none")]
    pub body_pattern: Option<String>,
}

impl MatchPatterns {
    fn apply(&self, rule: FaultRule) -> FaultRule {
        rule.with_header_pattern(pattern_or_any(self.header_pattern.as_deref()))
            .with_body_pattern(pattern_or_any(self.body_pattern.as_deref()))
    }
}

fn pattern_or_any(pattern: Option<&str>) -> &str {
    pattern.filter(|p| !p.is_empty()).unwrap_or("*")
}

/// Parameters of `delay_requests` and `delay_responses`
///
/// Defaults: probability 1, delay `1s`, uniform distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(alias = "delayprobability", skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(alias = "delaydistribution", skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Distribution>,
    #[serde(alias = "delaytime", skip_serializing_if = "Option::is_none")]
    pub delay_time: Option<String>,
    #[serde(flatten)]
    pub patterns: MatchPatterns,
}

impl DelayParams {
    #[must_use]
    pub fn from_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn to_dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    #[must_use]
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }

    #[must_use]
    pub fn with_delay_time(mut self, delay_time: impl Into<String>) -> Self {
        self.delay_time = Some(delay_time.into());
        self
    }
}

/// Parameters of `abort_requests` and `abort_responses`
///
/// Defaults: probability 1, error code -1 (reset connection).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbortParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(alias = "abortprobability", skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(alias = "abortdistribution", skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Distribution>,
    #[serde(alias = "errorcode", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
    #[serde(flatten)]
    pub patterns: MatchPatterns,
}

impl AbortParams {
    #[must_use]
    pub fn from_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn to_dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    #[must_use]
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }

    #[must_use]
    pub fn with_error_code(mut self, error_code: i32) -> Self {
        self.error_code = Some(error_code);
        self
    }
}

/// Parameters of `partition_services`
///
/// Severs the existing edge `source -> dest` in both directions.
/// `src_probability` applies to `source -> dest`, `dst_probability` to the
/// reverse direction. Both default to 1, the error code to -1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionParams {
    pub source: String,
    pub dest: String,
    #[serde(alias = "srcprobability", skip_serializing_if = "Option::is_none")]
    pub src_probability: Option<f64>,
    #[serde(alias = "dstprobability", skip_serializing_if = "Option::is_none")]
    pub dst_probability: Option<f64>,
    #[serde(alias = "errorcode", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
    #[serde(flatten)]
    pub patterns: MatchPatterns,
}

impl PartitionParams {
    pub fn new(source: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            ..Self::default()
        }
    }
}

/// Parameters of `crash_service`: every caller of `dest` gets aborted requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashParams {
    pub dest: String,
    #[serde(alias = "abortprobability", skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(alias = "errorcode", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
    #[serde(flatten)]
    pub patterns: MatchPatterns,
}

impl CrashParams {
    pub fn new(dest: impl Into<String>) -> Self {
        Self {
            dest: dest.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_error_code(mut self, error_code: i32) -> Self {
        self.error_code = Some(error_code);
        self
    }
}

/// Parameters of `overload_service`
///
/// Defaults: half of the matching messages delayed by `10s`, the other half
/// aborted with HTTP 503, applied to every caller of `dest`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverloadParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub dest: String,
    #[serde(alias = "messagetype", skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageType>,
    #[serde(alias = "delayprobability", skip_serializing_if = "Option::is_none")]
    pub delay_probability: Option<f64>,
    #[serde(alias = "abortprobability", skip_serializing_if = "Option::is_none")]
    pub abort_probability: Option<f64>,
    #[serde(alias = "delaytime", skip_serializing_if = "Option::is_none")]
    pub delay_time: Option<String>,
    #[serde(alias = "errorcode", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
    #[serde(flatten)]
    pub patterns: MatchPatterns,
}

impl OverloadParams {
    pub fn new(dest: impl Into<String>) -> Self {
        Self {
            dest: dest.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_delay_time(mut self, delay_time: impl Into<String>) -> Self {
        self.delay_time = Some(delay_time.into());
        self
    }

    #[must_use]
    pub fn with_error_code(mut self, error_code: i32) -> Self {
        self.error_code = Some(error_code);
        self
    }
}

/// A named failure intent with its typed parameters
///
/// Serialized with a `scenario` tag, e.g.
/// `{"scenario": "crash_service", "dest": "reviews"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scenario", rename_all = "snake_case")]
pub enum Scenario {
    DelayRequests(DelayParams),
    DelayResponses(DelayParams),
    AbortRequests(AbortParams),
    AbortResponses(AbortParams),
    PartitionServices(PartitionParams),
    CrashService(CrashParams),
    OverloadService(OverloadParams),
}

impl Scenario {
    /// Scenario name as used in recipe documents
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DelayRequests(_) => "delay_requests",
            Self::DelayResponses(_) => "delay_responses",
            Self::AbortRequests(_) => "abort_requests",
            Self::AbortResponses(_) => "abort_responses",
            Self::PartitionServices(_) => "partition_services",
            Self::CrashService(_) => "crash_service",
            Self::OverloadService(_) => "overload_service",
        }
    }

    /// Expand into concrete rules over `topology`
    ///
    /// Rules are returned in expansion order and are not yet validated
    /// against the rule invariants.
    ///
    /// # Errors
    ///
    /// - [`DomainError::UnknownService`] if an explicit service is not registered
    /// - [`DomainError::InvalidScenario`] if a required service is missing or a
    ///   partition targets services that are not connected
    pub fn expand(&self, topology: &Topology) -> Result<Vec<FaultRule>, DomainError> {
        match self {
            Self::DelayRequests(params) => delay(topology, params, MessageType::Request),
            Self::DelayResponses(params) => delay(topology, params, MessageType::Response),
            Self::AbortRequests(params) => abort(topology, params, MessageType::Request),
            Self::AbortResponses(params) => abort(topology, params, MessageType::Response),
            Self::PartitionServices(params) => partition(topology, params),
            Self::CrashService(params) => crash(topology, params),
            Self::OverloadService(params) => overload(topology, params),
        }
    }
}

/// Recipe document listing the scenarios of one test
///
/// ```json
/// { "gremlins": [ { "scenario": "crash_service", "dest": "reviews" } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureRecipe {
    pub gremlins: Vec<Scenario>,
}

fn given(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|n| !n.is_empty())
}

fn require<'a>(scenario: &str, role: &str, name: &'a str) -> Result<&'a str, DomainError> {
    given(Some(name)).ok_or_else(|| {
        DomainError::InvalidScenario(format!("{scenario} requires a {role} service"))
    })
}

fn ensure_known(topology: &Topology, service: &str) -> Result<(), DomainError> {
    if topology.contains(service) {
        Ok(())
    } else {
        Err(DomainError::UnknownService(service.to_string()))
    }
}

/// Cross product of resolved sources and destinations
fn resolve_edges(
    topology: &Topology,
    scenario: &str,
    source: Option<&str>,
    dest: Option<&str>,
) -> Result<Vec<(String, String)>, DomainError> {
    let source = given(source);
    let dest = given(dest);

    let (sources, dests): (Vec<&str>, Vec<&str>) = match (source, dest) {
        (None, None) => {
            return Err(DomainError::InvalidScenario(format!(
                "{scenario} requires a source or a dest service"
            )));
        }
        (Some(s), Some(d)) => {
            ensure_known(topology, s)?;
            ensure_known(topology, d)?;
            (vec![s], vec![d])
        }
        (Some(s), None) => {
            ensure_known(topology, s)?;
            (vec![s], topology.dependencies(s))
        }
        (None, Some(d)) => {
            ensure_known(topology, d)?;
            (topology.dependents(d), vec![d])
        }
    };

    Ok(sources
        .iter()
        .flat_map(|s| dests.iter().map(|d| ((*s).to_string(), (*d).to_string())))
        .collect())
}

fn delay(
    topology: &Topology,
    params: &DelayParams,
    message_type: MessageType,
) -> Result<Vec<FaultRule>, DomainError> {
    let scenario = match message_type {
        MessageType::Response => "delay_responses",
        _ => "delay_requests",
    };
    let edges = resolve_edges(
        topology,
        scenario,
        params.source.as_deref(),
        params.dest.as_deref(),
    )?;
    let delay_time = params.delay_time.as_deref().unwrap_or(DEFAULT_DELAY_TIME);
    Ok(edges
        .into_iter()
        .map(|(s, d)| {
            let rule = FaultRule::new(s, d)
                .with_message_type(message_type)
                .with_delay(params.probability.unwrap_or(1.0), delay_time)
                .with_delay_distribution(params.distribution.unwrap_or_default());
            params.patterns.apply(rule)
        })
        .collect())
}

fn abort(
    topology: &Topology,
    params: &AbortParams,
    message_type: MessageType,
) -> Result<Vec<FaultRule>, DomainError> {
    let scenario = match message_type {
        MessageType::Response => "abort_responses",
        _ => "abort_requests",
    };
    let edges = resolve_edges(
        topology,
        scenario,
        params.source.as_deref(),
        params.dest.as_deref(),
    )?;
    Ok(edges
        .into_iter()
        .map(|(s, d)| {
            let rule = FaultRule::new(s, d)
                .with_message_type(message_type)
                .with_abort(
                    params.probability.unwrap_or(1.0),
                    params.error_code.unwrap_or(RESET_CONNECTION),
                )
                .with_abort_distribution(params.distribution.unwrap_or_default());
            params.patterns.apply(rule)
        })
        .collect())
}

fn partition(topology: &Topology, params: &PartitionParams) -> Result<Vec<FaultRule>, DomainError> {
    let source = require("partition_services", "source", &params.source)?;
    let dest = require("partition_services", "dest", &params.dest)?;
    ensure_known(topology, source)?;
    ensure_known(topology, dest)?;
    if !topology.has_dependency(source, dest) {
        return Err(DomainError::InvalidScenario(format!(
            "partition_services requires an edge {source} -> {dest}"
        )));
    }

    let error_code = params.error_code.unwrap_or(RESET_CONNECTION);
    let forward = FaultRule::new(source, dest)
        .with_abort(params.src_probability.unwrap_or(1.0), error_code);
    let backward = FaultRule::new(dest, source)
        .with_abort(params.dst_probability.unwrap_or(1.0), error_code);
    Ok(vec![
        params.patterns.apply(forward),
        params.patterns.apply(backward),
    ])
}

fn crash(topology: &Topology, params: &CrashParams) -> Result<Vec<FaultRule>, DomainError> {
    let dest = require("crash_service", "dest", &params.dest)?;
    ensure_known(topology, dest)?;
    let error_code = params.error_code.unwrap_or(RESET_CONNECTION);
    Ok(topology
        .dependents(dest)
        .into_iter()
        .map(|s| {
            let rule =
                FaultRule::new(s, dest).with_abort(params.probability.unwrap_or(1.0), error_code);
            params.patterns.apply(rule)
        })
        .collect())
}

fn overload(topology: &Topology, params: &OverloadParams) -> Result<Vec<FaultRule>, DomainError> {
    let dest = require("overload_service", "dest", &params.dest)?;
    let edges = resolve_edges(
        topology,
        "overload_service",
        params.source.as_deref(),
        Some(dest),
    )?;
    let delay_time = params.delay_time.as_deref().unwrap_or(OVERLOAD_DELAY_TIME);
    Ok(edges
        .into_iter()
        .map(|(s, d)| {
            let rule = FaultRule::new(s, d)
                .with_message_type(params.message_type.unwrap_or_default())
                .with_delay(
                    params.delay_probability.unwrap_or(OVERLOAD_PROBABILITY),
                    delay_time,
                )
                .with_abort(
                    params.abort_probability.unwrap_or(OVERLOAD_PROBABILITY),
                    params.error_code.unwrap_or(OVERLOAD_ERROR_CODE),
                );
            params.patterns.apply(rule)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// gateway -> productpage -> {reviews, details}, reviews -> details
    fn topology() -> Topology {
        let mut topology = Topology::new();
        for name in ["gateway", "productpage", "reviews", "details"] {
            topology.add_service(name);
        }
        topology.add_dependency("gateway", "productpage").unwrap();
        topology.add_dependency("productpage", "reviews").unwrap();
        topology.add_dependency("productpage", "details").unwrap();
        topology.add_dependency("reviews", "details").unwrap();
        topology
    }

    fn pairs(rules: &[FaultRule]) -> Vec<(&str, &str)> {
        rules
            .iter()
            .map(|r| (r.source.as_str(), r.dest.as_str()))
            .collect()
    }

    // ========================================================================
    // Edge resolution
    // ========================================================================

    #[test]
    fn missing_source_expands_to_dependents() {
        let rules = Scenario::AbortRequests(AbortParams::default().to_dest("details"))
            .expand(&topology())
            .unwrap();
        assert_eq!(
            pairs(&rules),
            vec![("productpage", "details"), ("reviews", "details")]
        );
    }

    #[test]
    fn missing_dest_expands_to_dependencies() {
        let rules = Scenario::DelayRequests(DelayParams::default().from_source("productpage"))
            .expand(&topology())
            .unwrap();
        assert_eq!(
            pairs(&rules),
            vec![("productpage", "reviews"), ("productpage", "details")]
        );
    }

    #[test]
    fn explicit_pair_is_a_single_rule() {
        let rules = Scenario::DelayResponses(
            DelayParams::default()
                .from_source("gateway")
                .to_dest("productpage"),
        )
        .expand(&topology())
        .unwrap();
        assert_eq!(pairs(&rules), vec![("gateway", "productpage")]);
        assert_eq!(rules[0].message_type, MessageType::Response);
    }

    #[test]
    fn neither_side_given_is_rejected() {
        let result = Scenario::DelayRequests(DelayParams::default()).expand(&topology());
        assert!(matches!(result, Err(DomainError::InvalidScenario(_))));
    }

    #[test]
    fn empty_source_counts_as_missing() {
        let rules = Scenario::AbortRequests(
            AbortParams::default().from_source("").to_dest("productpage"),
        )
        .expand(&topology())
        .unwrap();
        assert_eq!(pairs(&rules), vec![("gateway", "productpage")]);
    }

    #[test]
    fn unknown_explicit_service_is_rejected() {
        let result =
            Scenario::AbortRequests(AbortParams::default().to_dest("ratings")).expand(&topology());
        assert_eq!(
            result.unwrap_err(),
            DomainError::UnknownService("ratings".to_string())
        );
    }

    // ========================================================================
    // Scenario defaults
    // ========================================================================

    #[test]
    fn delay_defaults() {
        let rules = Scenario::DelayRequests(DelayParams::default().to_dest("productpage"))
            .expand(&topology())
            .unwrap();
        let rule = &rules[0];
        assert!((rule.delay.probability - 1.0).abs() < f64::EPSILON);
        assert_eq!(rule.delay_time, "1s");
        assert_eq!(rule.message_type, MessageType::Request);
        assert_eq!(rule.header_pattern, "*");
        assert!(!rule.abort.is_active());
    }

    #[test]
    fn abort_defaults() {
        let rules = Scenario::AbortResponses(AbortParams::default().to_dest("productpage"))
            .expand(&topology())
            .unwrap();
        let rule = &rules[0];
        assert!((rule.abort.probability - 1.0).abs() < f64::EPSILON);
        assert_eq!(rule.error_code, -1);
        assert_eq!(rule.message_type, MessageType::Response);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let rules = Scenario::AbortRequests(
            AbortParams::default()
                .to_dest("productpage")
                .with_probability(0.25)
                .with_error_code(500),
        )
        .expand(&topology())
        .unwrap();
        assert!((rules[0].abort.probability - 0.25).abs() < f64::EPSILON);
        assert_eq!(rules[0].error_code, 500);
    }

    #[test]
    fn patterns_are_carried_and_empty_means_any() {
        let params = AbortParams {
            dest: Some("productpage".to_string()),
            patterns: MatchPatterns {
                header_pattern: Some("test-*".to_string()),
                body_pattern: Some(String::new()),
            },
            ..AbortParams::default()
        };
        let rules = Scenario::AbortRequests(params).expand(&topology()).unwrap();
        assert_eq!(rules[0].header_pattern, "test-*");
        assert_eq!(rules[0].body_pattern, "*");
    }

    // ========================================================================
    // Compound scenarios
    // ========================================================================

    #[test]
    fn crash_aborts_every_caller() {
        let rules = Scenario::CrashService(CrashParams::new("details"))
            .expand(&topology())
            .unwrap();
        assert_eq!(
            pairs(&rules),
            vec![("productpage", "details"), ("reviews", "details")]
        );
        for rule in &rules {
            assert_eq!(rule.error_code, -1);
            assert!((rule.abort.probability - 1.0).abs() < f64::EPSILON);
            assert_eq!(rule.message_type, MessageType::Request);
        }
    }

    #[test]
    fn crash_uses_configured_error_code() {
        let rules = Scenario::CrashService(CrashParams::new("details").with_error_code(503))
            .expand(&topology())
            .unwrap();
        assert!(rules.iter().all(|r| r.error_code == 503));
    }

    #[test]
    fn crash_of_uncalled_service_yields_nothing() {
        let rules = Scenario::CrashService(CrashParams::new("gateway"))
            .expand(&topology())
            .unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn crash_requires_dest() {
        let result = Scenario::CrashService(CrashParams::default()).expand(&topology());
        assert!(matches!(result, Err(DomainError::InvalidScenario(_))));
    }

    #[test]
    fn partition_severs_edge_both_ways() {
        let rules = Scenario::PartitionServices(PartitionParams::new("productpage", "reviews"))
            .expand(&topology())
            .unwrap();
        assert_eq!(
            pairs(&rules),
            vec![("productpage", "reviews"), ("reviews", "productpage")]
        );
        for rule in &rules {
            assert!((rule.abort.probability - 1.0).abs() < f64::EPSILON);
            assert_eq!(rule.error_code, -1);
        }
    }

    #[test]
    fn partition_uses_directional_probabilities() {
        let params = PartitionParams {
            src_probability: Some(0.8),
            dst_probability: Some(0.2),
            ..PartitionParams::new("productpage", "reviews")
        };
        let rules = Scenario::PartitionServices(params)
            .expand(&topology())
            .unwrap();
        assert!((rules[0].abort.probability - 0.8).abs() < f64::EPSILON);
        assert!((rules[1].abort.probability - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn partition_requires_existing_edge() {
        let result = Scenario::PartitionServices(PartitionParams::new("details", "gateway"))
            .expand(&topology());
        assert!(matches!(result, Err(DomainError::InvalidScenario(_))));
    }

    #[test]
    fn overload_defaults() {
        let rules = Scenario::OverloadService(OverloadParams::new("details"))
            .expand(&topology())
            .unwrap();
        assert_eq!(rules.len(), 2);
        for rule in &rules {
            assert!((rule.delay.probability - 0.5).abs() < f64::EPSILON);
            assert!((rule.abort.probability - 0.5).abs() < f64::EPSILON);
            assert_eq!(rule.delay_time, "10s");
            assert_eq!(rule.error_code, 503);
        }
    }

    #[test]
    fn overload_with_explicit_source() {
        let params = OverloadParams {
            source: Some("reviews".to_string()),
            ..OverloadParams::new("details").with_delay_time("2s")
        };
        let rules = Scenario::OverloadService(params).expand(&topology()).unwrap();
        assert_eq!(pairs(&rules), vec![("reviews", "details")]);
        assert_eq!(rules[0].delay_time, "2s");
    }

    // ========================================================================
    // Recipe documents
    // ========================================================================

    #[test]
    fn recipe_deserializes_tagged_scenarios() {
        let recipe: FailureRecipe = serde_json::from_value(serde_json::json!({
            "gremlins": [
                { "scenario": "crash_service", "dest": "details", "errorcode": 500 },
                { "scenario": "delay_requests", "dest": "reviews", "delaytime": "3s" },
                { "scenario": "partition_services", "source": "productpage", "dest": "reviews",
                  "srcprobability": 0.5 },
                { "scenario": "overload_service", "dest": "details", "headerpattern": "t-*" }
            ]
        }))
        .unwrap();

        assert_eq!(recipe.gremlins.len(), 4);
        assert_eq!(
            recipe.gremlins[0],
            Scenario::CrashService(CrashParams::new("details").with_error_code(500))
        );
        assert_eq!(
            recipe.gremlins[1],
            Scenario::DelayRequests(DelayParams::default().to_dest("reviews").with_delay_time("3s"))
        );
        let Scenario::PartitionServices(partition) = &recipe.gremlins[2] else {
            unreachable!("expected partition_services");
        };
        assert_eq!(partition.src_probability, Some(0.5));
        let Scenario::OverloadService(overload) = &recipe.gremlins[3] else {
            unreachable!("expected overload_service");
        };
        assert_eq!(overload.patterns.header_pattern.as_deref(), Some("t-*"));
    }

    #[test]
    fn unknown_scenario_is_rejected() {
        let result = serde_json::from_str::<Scenario>(r#"{"scenario":"melt_datacenter"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn scenario_names_match_tags() {
        let scenario = Scenario::CrashService(CrashParams::new("details"));
        let json = serde_json::to_value(&scenario).unwrap();
        assert_eq!(json["scenario"], scenario.name());
    }
}
