//! Wire models for the proxy management and control plane APIs

use domain::{Distribution, FaultRule, MessageType, TrackingHeader};
use serde::{Deserialize, Serialize};

use crate::error::ProxyError;

/// Rule as accepted by `POST /gremlin/v1/rules/add`
///
/// Field names are the flat lower-case keys the proxy expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulePayload {
    pub source: String,
    pub dest: String,
    pub messagetype: MessageType,
    pub headerpattern: String,
    pub bodypattern: String,
    pub delayprobability: f64,
    pub delaydistribution: Distribution,
    pub mangleprobability: f64,
    pub mangledistribution: Distribution,
    pub abortprobability: f64,
    pub abortdistribution: Distribution,
    pub delaytime: String,
    pub errorcode: i32,
    pub searchstring: String,
    pub replacestring: String,
}

impl From<&FaultRule> for RulePayload {
    fn from(rule: &FaultRule) -> Self {
        Self {
            source: rule.source.clone(),
            dest: rule.dest.clone(),
            messagetype: rule.message_type,
            headerpattern: rule.header_pattern.clone(),
            bodypattern: rule.body_pattern.clone(),
            delayprobability: rule.delay.probability,
            delaydistribution: rule.delay.distribution,
            mangleprobability: rule.mangle.probability,
            mangledistribution: rule.mangle.distribution,
            abortprobability: rule.abort.probability,
            abortdistribution: rule.abort.distribution,
            delaytime: rule.delay_time.clone(),
            errorcode: rule.error_code,
            searchstring: rule.search_string.clone(),
            replacestring: rule.replace_string.clone(),
        }
    }
}

/// One rule in a control plane batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPlaneRule {
    pub source: String,
    pub destination: String,
    /// Tracking header name
    pub header: String,
    /// Tracking header value pattern
    pub pattern: String,
    pub delay_probability: f64,
    pub abort_probability: f64,
    /// Injected delay in seconds
    pub delay: f64,
    pub return_code: i32,
}

impl ControlPlaneRule {
    /// Convert a fault rule, scoping it to `tracking`
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::InvalidRule`] if the delay time does not parse.
    pub fn from_rule(rule: &FaultRule, tracking: &TrackingHeader) -> Result<Self, ProxyError> {
        let delay = rule
            .delay_duration()
            .map_err(|e| ProxyError::InvalidRule(e.to_string()))?;
        Ok(Self {
            source: rule.source.clone(),
            destination: rule.dest.clone(),
            header: tracking.name().to_string(),
            pattern: tracking.pattern().to_string(),
            delay_probability: rule.delay.probability,
            abort_probability: rule.abort.probability,
            delay: delay.as_secs_f64(),
            return_code: rule.error_code,
        })
    }
}

/// Body of the control plane rules `PUT`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleUpdate {
    pub req_tracking_header: String,
    pub filters: RuleFilters,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleFilters {
    pub rules: Vec<ControlPlaneRule>,
}

impl RuleUpdate {
    pub fn new(tracking: &TrackingHeader, rules: Vec<ControlPlaneRule>) -> Self {
        Self {
            req_tracking_header: tracking.name().to_string(),
            filters: RuleFilters { rules },
        }
    }
}
