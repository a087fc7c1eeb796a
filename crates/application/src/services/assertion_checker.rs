//! Assertion checker service
//!
//! Evaluates resilience properties against the events the proxies logged
//! for one test run.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use domain::{
    Assertion, AssertionResult, CheckOutcome, CheckSpec, Checklist, CircuitBreakerPolicy, Event,
    EventKind, GroupKey, TrackingHeader, circuit_breaker,
};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{EventQuery, EventStorePort};

/// Checks properties of one test run
pub struct AssertionChecker {
    store: Arc<dyn EventStorePort>,
    test_id: String,
    tracking: Option<TrackingHeader>,
    stop_on_first: bool,
}

impl fmt::Debug for AssertionChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssertionChecker")
            .field("test_id", &self.test_id)
            .field("tracking", &self.tracking)
            .field("stop_on_first", &self.stop_on_first)
            .finish_non_exhaustive()
    }
}

impl AssertionChecker {
    pub fn new(store: Arc<dyn EventStorePort>, test_id: impl Into<String>) -> Self {
        Self {
            store,
            test_id: test_id.into(),
            tracking: None,
            stop_on_first: false,
        }
    }

    /// Only consider traffic whose tracking header matches
    ///
    /// Request groups are then keyed by the tracking value instead of the
    /// request id.
    #[must_use]
    pub fn with_tracking(mut self, tracking: TrackingHeader) -> Self {
        self.tracking = Some(tracking);
        self
    }

    /// Report only the first violation of each property
    #[must_use]
    pub const fn fail_fast(mut self) -> Self {
        self.stop_on_first = true;
        self
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    fn query(&self) -> EventQuery {
        EventQuery::for_test(self.test_id.clone()).with_tracking(self.tracking.clone())
    }

    fn edge_query(&self, source: &str, dest: &str, kind: EventKind) -> EventQuery {
        self.query().on_edge(source, dest).of_kind(kind)
    }

    const fn request_group(&self) -> GroupKey {
        if self.tracking.is_some() {
            GroupKey::TrackingValue
        } else {
            GroupKey::RequestId
        }
    }

    fn record(&self, outcome: &mut CheckOutcome, message: String) -> bool {
        outcome.record(message);
        self.stop_on_first
    }

    /// Every response for `request_id` on `source -> dest` has `status`
    #[instrument(skip(self))]
    pub async fn http_status(
        &self,
        source: &str,
        dest: &str,
        request_id: &str,
        status: u16,
    ) -> Result<CheckOutcome, ApplicationError> {
        let query = self
            .edge_query(source, dest, EventKind::Response)
            .with_request_id(request_id);
        let events = self.store.query_events(&query).await?;
        if events.is_empty() {
            return Ok(CheckOutcome::no_evidence());
        }

        let mut outcome = CheckOutcome::pass();
        for event in &events.events {
            if event.status != Some(status) {
                let message = format!(
                    "{source} -> {dest}: expected HTTP {status} but found {} for request {request_id}",
                    describe_status(event)
                );
                if self.record(&mut outcome, message) {
                    break;
                }
            }
        }
        Ok(outcome)
    }

    /// Every response of the test run has status 200
    #[instrument(skip(self))]
    pub async fn http_success_status(&self) -> Result<CheckOutcome, ApplicationError> {
        let query = self.query().of_kind(EventKind::Response);
        let events = self.store.query_events(&query).await?;
        if events.is_empty() {
            return Ok(CheckOutcome::no_evidence());
        }

        let mut outcome = CheckOutcome::pass();
        for event in events.events.iter().filter(|e| !e.is_success()) {
            let message = format!(
                "{} -> {}: request {} returned {}",
                event.source,
                event.dest,
                event.request_id,
                describe_status(event)
            );
            if self.record(&mut outcome, message) {
                break;
            }
        }
        Ok(outcome)
    }

    /// The proxies logged no errors about themselves
    #[instrument(skip(self))]
    pub async fn no_proxy_errors(&self) -> Result<CheckOutcome, ApplicationError> {
        let errors = self.store.count_proxy_errors().await?;
        if errors == 0 {
            Ok(CheckOutcome::pass())
        } else {
            Ok(CheckOutcome::fail(format!(
                "proxies logged {errors} error(s)"
            )))
        }
    }

    /// Every response on `source -> dest` arrived within `max_latency`
    #[instrument(skip(self))]
    pub async fn bounded_response_time(
        &self,
        source: &str,
        dest: &str,
        max_latency: Duration,
    ) -> Result<CheckOutcome, ApplicationError> {
        let query = self.edge_query(source, dest, EventKind::Response);
        let events = self.store.query_events(&query).await?;
        if events.is_empty() {
            return Ok(CheckOutcome::no_evidence());
        }

        let mut outcome = CheckOutcome::pass();
        for event in &events.events {
            let message = match event.duration {
                Some(took) if took <= max_latency => continue,
                Some(took) => format!(
                    "{dest} did not reply in time to {source}: request {} took {took:?}, max {max_latency:?}",
                    event.request_id
                ),
                None => format!(
                    "{source} -> {dest}: no response time logged for request {}",
                    event.request_id
                ),
            };
            if self.record(&mut outcome, message) {
                break;
            }
        }
        Ok(outcome)
    }

    /// No request group on `source -> dest` has more than `num_requests + 1` attempts
    #[instrument(skip(self))]
    pub async fn at_most_requests(
        &self,
        source: &str,
        dest: &str,
        num_requests: u32,
    ) -> Result<CheckOutcome, ApplicationError> {
        let key = self.request_group();
        let query = self
            .edge_query(source, dest, EventKind::Request)
            .grouped_by(key);
        let events = self.store.query_events(&query).await?;
        if events.is_empty() {
            return Ok(CheckOutcome::no_evidence());
        }

        let groups = events.group_counts(key);
        if groups.is_empty() {
            return Ok(CheckOutcome::no_evidence());
        }

        let allowed = u64::from(num_requests) + 1;
        let mut outcome = CheckOutcome::pass();
        for group in groups {
            if group.count > allowed {
                let message = format!(
                    "{source} -> {dest}: expected at most {allowed} requests, found {} for {}",
                    group.count, group.key
                );
                if self.record(&mut outcome, message) {
                    break;
                }
            }
        }
        Ok(outcome)
    }

    /// Retries on `source -> dest` are bounded and, with a `wait_time`, spaced
    /// within `error_tolerance` of it
    #[instrument(skip(self))]
    pub async fn bounded_retries(
        &self,
        source: &str,
        dest: &str,
        retries: u32,
        wait_time: Option<Duration>,
        error_tolerance: Duration,
        by_uri: bool,
    ) -> Result<CheckOutcome, ApplicationError> {
        let key = if by_uri {
            GroupKey::Uri
        } else {
            self.request_group()
        };
        let query = self
            .edge_query(source, dest, EventKind::Request)
            .grouped_by(key);
        let events = self.store.query_events(&query).await?;
        if events.is_empty() {
            return Ok(CheckOutcome::no_evidence());
        }

        let groups = events.group_counts(key);
        if groups.is_empty() {
            return Ok(CheckOutcome::no_evidence());
        }

        let mut outcome = CheckOutcome::pass();
        for group in groups {
            let attempts = group.count.saturating_sub(1);
            if attempts > u64::from(retries) {
                let message = format!(
                    "{source} -> {dest}: expected {retries} retries, found {attempts} for {}",
                    group.key
                );
                if self.record(&mut outcome, message) {
                    return Ok(outcome);
                }
            }
        }

        let Some(wait_time) = wait_time else {
            return Ok(outcome);
        };
        let lower = wait_time.saturating_sub(error_tolerance);
        let upper = wait_time.saturating_add(error_tolerance);
        for (group, mut attempts) in events.group_events(key) {
            attempts.sort_by_key(|e| e.timestamp);
            let spacing = attempts.windows(2).enumerate().find_map(|(i, pair)| {
                let gap = (pair[1].timestamp - pair[0].timestamp)
                    .to_std()
                    .unwrap_or_default();
                (gap < lower || gap > upper).then_some((i + 1, gap))
            });
            if let Some((attempt, gap)) = spacing {
                let message = format!(
                    "{source} -> {dest}: expected {wait_time:?} +/- {error_tolerance:?} before retry {attempt} of {group}, observed {gap:?}"
                );
                if self.record(&mut outcome, message) {
                    break;
                }
            }
        }
        Ok(outcome)
    }

    /// `source` never calls `dest` while its circuit breaker should be open
    #[instrument(skip(self, policy), fields(closed_attempts = policy.closed_attempts))]
    pub async fn circuit_breaker(
        &self,
        source: &str,
        dest: &str,
        policy: &CircuitBreakerPolicy,
    ) -> Result<CheckOutcome, ApplicationError> {
        let query = self
            .query()
            .on_edge(source, dest)
            .of_kind(EventKind::Request)
            .of_kind(EventKind::Response);
        let events = self.store.query_events(&query).await?;
        if events.is_empty() {
            return Ok(CheckOutcome::no_evidence());
        }

        let violations = circuit_breaker::replay(&events.events, policy, self.stop_on_first);
        debug!(events = events.events.len(), violations = violations.len(), "Replayed edge");

        let mut outcome = CheckOutcome::pass();
        for violation in violations {
            outcome.record(format!("{source} -> {dest}: {violation}"));
        }
        Ok(outcome)
    }

    /// Evaluate one typed assertion
    pub async fn check(&self, assertion: &Assertion) -> Result<CheckOutcome, ApplicationError> {
        match assertion {
            Assertion::HttpStatus {
                source,
                dest,
                request_id,
                status,
            } => self.http_status(source, dest, request_id, *status).await,
            Assertion::HttpSuccessStatus => self.http_success_status().await,
            Assertion::NoProxyErrors => self.no_proxy_errors().await,
            Assertion::BoundedResponseTime {
                source,
                dest,
                max_latency,
            } => self.bounded_response_time(source, dest, *max_latency).await,
            Assertion::AtMostRequests {
                source,
                dest,
                num_requests,
            } => self.at_most_requests(source, dest, *num_requests).await,
            Assertion::BoundedRetries {
                source,
                dest,
                retries,
                wait_time,
                error_tolerance,
                by_uri,
            } => {
                self.bounded_retries(source, dest, *retries, *wait_time, *error_tolerance, *by_uri)
                    .await
            }
            Assertion::CircuitBreaker {
                source,
                dest,
                closed_attempts,
                reset_time,
                half_open_attempts,
            } => {
                let policy = CircuitBreakerPolicy::new(*closed_attempts, *reset_time)
                    .with_half_open_attempts(*half_open_attempts);
                self.circuit_breaker(source, dest, &policy).await
            }
        }
    }

    /// Evaluate a property given by name and loose parameters
    ///
    /// # Errors
    ///
    /// Parameter errors and log store failures are returned as errors;
    /// a violated property is a successful call with `success == false`.
    pub async fn check_assertion(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<AssertionResult, ApplicationError> {
        let assertion = Assertion::from_params(name, params)?;
        let outcome = self.check(&assertion).await?;
        if !outcome.is_success() {
            warn!(assertion = name, error = %outcome.message(), "Assertion failed");
        }
        Ok(outcome.into_result(name, assertion.to_string()))
    }

    /// Evaluate checks in order
    ///
    /// Unless `all` is set, evaluation stops after the first failing check;
    /// its result is the last one returned.
    #[instrument(skip(self, checks), fields(checks = checks.len()))]
    pub async fn check_assertions(
        &self,
        checks: &[CheckSpec],
        all: bool,
    ) -> Result<Vec<AssertionResult>, ApplicationError> {
        let mut results = Vec::with_capacity(checks.len());
        for spec in checks {
            let result = self.check_assertion(&spec.name, &spec.params).await?;
            let failed = !result.success;
            results.push(result);
            if failed && !all {
                break;
            }
        }
        info!(
            checked = results.len(),
            passed = results.iter().filter(|r| r.success).count(),
            "Checked assertions"
        );
        Ok(results)
    }

    /// Evaluate a checklist document
    pub async fn check_checklist(
        &self,
        checklist: &Checklist,
        all: bool,
    ) -> Result<Vec<AssertionResult>, ApplicationError> {
        self.check_assertions(&checklist.checks, all).await
    }
}

fn describe_status(event: &Event) -> String {
    match event.status {
        Some(status) => format!("HTTP {status}"),
        None if event.is_injected_abort() => "an aborted request".to_string(),
        None => "no status".to_string(),
    }
}
