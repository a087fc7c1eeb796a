//! Failure generator service
//!
//! Turns failure scenarios into validated fault rules, queues them for one
//! test-preparation session and distributes them to the proxies, either to
//! every proxy instance individually or as one batch through a control plane.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use domain::{
    AbortParams, CrashParams, DelayParams, FailureRecipe, FaultRule, OverloadParams,
    PartitionParams, Scenario, TestId, Topology, TrackingHeader,
};
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{ControlPlanePort, ProxyControlPort};

/// Rules installed per service, then per instance
pub type InstalledRules = BTreeMap<String, BTreeMap<String, Value>>;

/// A rule that could not be installed on one instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushFailure {
    pub service: String,
    pub instance: String,
    pub error: String,
}

/// Outcome of [`FailureGenerator::push_rules`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Successful submissions
    pub installed: usize,
    pub failures: Vec<PushFailure>,
}

impl PushReport {
    /// Whether every submission succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

struct ControlPlane {
    port: Arc<dyn ControlPlanePort>,
    tracking: TrackingHeader,
}

/// Generates and distributes fault rules for one test
pub struct FailureGenerator {
    topology: Topology,
    proxy: Arc<dyn ProxyControlPort>,
    control_plane: Option<ControlPlane>,
    test_id: Option<TestId>,
    queue: Vec<FaultRule>,
}

impl fmt::Debug for FailureGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureGenerator")
            .field("services", &self.topology.services())
            .field("has_control_plane", &self.control_plane.is_some())
            .field("test_id", &self.test_id)
            .field("queued_rules", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl FailureGenerator {
    /// Create a generator distributing rules to each proxy instance
    pub fn new(topology: Topology, proxy: Arc<dyn ProxyControlPort>) -> Self {
        Self {
            topology,
            proxy,
            control_plane: None,
            test_id: None,
            queue: Vec::new(),
        }
    }

    /// Distribute rules through a control plane, scoped to `tracking`
    ///
    /// Queued rules then get the tracking pattern as header pattern, and
    /// [`FailureGenerator::generate_log_rules`] becomes available.
    #[must_use]
    pub fn with_control_plane(
        mut self,
        port: Arc<dyn ControlPlanePort>,
        tracking: TrackingHeader,
    ) -> Self {
        self.control_plane = Some(ControlPlane { port, tracking });
        self
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Id of the active test, if one was started
    pub fn test_id(&self) -> Option<&TestId> {
        self.test_id.as_ref()
    }

    /// Rules waiting to be pushed
    pub fn queued_rules(&self) -> &[FaultRule] {
        &self.queue
    }

    /// Start a new test: allocate a fresh id and discard queued rules
    pub fn start_test(&mut self) -> TestId {
        let id = TestId::new();
        info!(test_id = %id, "Starting new test");
        self.test_id = Some(id.clone());
        self.discard_queue();
        id
    }

    fn discard_queue(&mut self) {
        self.queue.clear();
        self.topology.reset_coverage();
    }

    /// Tell every proxy instance the id of the active test
    ///
    /// All instances are notified even if some fail; the failures are then
    /// reported together.
    #[instrument(skip(self))]
    pub async fn announce_test(&self) -> Result<(), ApplicationError> {
        let Some(test_id) = &self.test_id else {
            return Err(ApplicationError::Internal(
                "no active test, start one before announcing it".to_string(),
            ));
        };
        debug!(test_id = %test_id, "Announcing test to proxies");

        let targets = self.instance_targets();
        let results = join_all(
            targets
                .iter()
                .map(|(_, instance)| self.proxy.start_test(instance, test_id)),
        )
        .await;
        collect_failures("announce test", &targets, results)
    }

    /// Empty the queue and remove installed rules everywhere
    ///
    /// Every instance is attempted; each failure is logged and the call
    /// fails afterwards if any instance could not be cleared. Clearing a
    /// topology without instances succeeds.
    #[instrument(skip(self))]
    pub async fn clear_rules(&mut self) -> Result<(), ApplicationError> {
        self.discard_queue();

        if let Some(cp) = &self.control_plane {
            debug!(tracking = %cp.tracking, "Clearing rules through control plane");
            return cp.port.clear_rules(&cp.tracking).await;
        }

        let targets = self.instance_targets();
        let results = join_all(
            targets
                .iter()
                .map(|(_, instance)| self.proxy.clear_rules(instance)),
        )
        .await;
        collect_failures("clear rules", &targets, results)
    }

    /// Validate and queue one rule
    ///
    /// # Errors
    ///
    /// Returns [`domain::DomainError::InvalidRule`] naming the violated invariant.
    pub fn add_rule(&mut self, rule: FaultRule) -> Result<(), ApplicationError> {
        rule.validate(&self.topology)?;
        self.enqueue(rule);
        Ok(())
    }

    fn enqueue(&mut self, rule: FaultRule) {
        let rule = match &self.control_plane {
            Some(cp) => rule.with_header_pattern(cp.tracking.pattern()),
            None => rule,
        };
        debug!(
            source = %rule.source,
            dest = %rule.dest,
            message_type = %rule.message_type,
            "Queued fault rule"
        );
        self.topology.mark_covered(&rule.source, &rule.dest);
        self.queue.push(rule);
    }

    /// Expand a scenario and queue its rules
    ///
    /// Either every expanded rule is valid and queued, or none is.
    /// Returns the number of queued rules.
    pub fn apply_scenario(&mut self, scenario: &Scenario) -> Result<usize, ApplicationError> {
        let rules = scenario.expand(&self.topology)?;
        for rule in &rules {
            rule.validate(&self.topology)?;
        }
        if rules.is_empty() {
            warn!(scenario = scenario.name(), "Scenario matched no edge");
        }
        let count = rules.len();
        for rule in rules {
            self.enqueue(rule);
        }
        info!(scenario = scenario.name(), rules = count, "Applied scenario");
        Ok(count)
    }

    pub fn delay_requests(&mut self, params: DelayParams) -> Result<usize, ApplicationError> {
        self.apply_scenario(&Scenario::DelayRequests(params))
    }

    pub fn delay_responses(&mut self, params: DelayParams) -> Result<usize, ApplicationError> {
        self.apply_scenario(&Scenario::DelayResponses(params))
    }

    pub fn abort_requests(&mut self, params: AbortParams) -> Result<usize, ApplicationError> {
        self.apply_scenario(&Scenario::AbortRequests(params))
    }

    pub fn abort_responses(&mut self, params: AbortParams) -> Result<usize, ApplicationError> {
        self.apply_scenario(&Scenario::AbortResponses(params))
    }

    /// Sever an existing edge in both directions
    pub fn partition_services(
        &mut self,
        params: PartitionParams,
    ) -> Result<usize, ApplicationError> {
        self.apply_scenario(&Scenario::PartitionServices(params))
    }

    /// Make `dest` unavailable to all of its callers
    pub fn crash_service(&mut self, params: CrashParams) -> Result<usize, ApplicationError> {
        self.apply_scenario(&Scenario::CrashService(params))
    }

    /// Half delayed, half failing with 503 by default
    pub fn overload_service(&mut self, params: OverloadParams) -> Result<usize, ApplicationError> {
        self.apply_scenario(&Scenario::OverloadService(params))
    }

    /// Apply every scenario of a recipe, then push the rules
    ///
    /// Stops at the first invalid scenario without pushing anything.
    #[instrument(skip(self, recipe), fields(scenarios = recipe.gremlins.len()))]
    pub async fn setup_failures(
        &mut self,
        recipe: &FailureRecipe,
    ) -> Result<PushReport, ApplicationError> {
        for scenario in &recipe.gremlins {
            self.apply_scenario(scenario)?;
        }
        self.push_rules(false).await
    }

    /// Queue pass-through rules for every edge no queued rule covers
    ///
    /// Only meaningful with a control plane, which logs exactly the traffic
    /// it has rules for. Returns the number of rules added.
    pub fn generate_log_rules(&mut self) -> usize {
        if self.control_plane.is_none() {
            debug!("Log rules are only generated for control plane deployments");
            return 0;
        }
        let uncovered: Vec<(String, String)> = self
            .topology
            .uncovered_edges()
            .into_iter()
            .map(|(s, d)| (s.to_string(), d.to_string()))
            .collect();
        for (source, dest) in &uncovered {
            self.enqueue(FaultRule::log_only(source, dest));
        }
        debug!(rules = uncovered.len(), "Generated log rules");
        uncovered.len()
    }

    /// Submit queued rules
    ///
    /// Per-instance deployments get one call per rule and instance of the
    /// rule's source service. With `continue_on_errors` false the first
    /// failing call aborts the push and its error is returned; otherwise
    /// failures are logged, collected in the report, and pushing continues.
    #[instrument(skip(self), fields(rules = self.queue.len()))]
    pub async fn push_rules(&self, continue_on_errors: bool) -> Result<PushReport, ApplicationError> {
        let mut report = PushReport::default();

        if let Some(cp) = &self.control_plane {
            match cp.port.replace_rules(&cp.tracking, &self.queue).await {
                Ok(()) => report.installed = self.queue.len(),
                Err(e) if continue_on_errors => {
                    warn!(error = %e, "Failed to push rules to control plane");
                    report.failures.push(PushFailure {
                        service: String::new(),
                        instance: "control-plane".to_string(),
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
            return Ok(report);
        }

        for rule in &self.queue {
            let instances = self.topology.instances(&rule.source);
            if instances.is_empty() {
                warn!(service = %rule.source, "No proxy instances known, rule not installed");
            }
            for instance in instances {
                match self.proxy.add_rule(instance, rule).await {
                    Ok(()) => report.installed += 1,
                    Err(e) => {
                        warn!(
                            service = %rule.source,
                            instance = %instance,
                            error = %e,
                            "Could not add rule to instance"
                        );
                        if !continue_on_errors {
                            return Err(e);
                        }
                        report.failures.push(PushFailure {
                            service: rule.source.clone(),
                            instance: instance.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            installed = report.installed,
            failed = report.failures.len(),
            "Pushed fault rules"
        );
        Ok(report)
    }

    /// Fetch installed rules from every instance
    ///
    /// Instances that cannot be reached are logged and left out.
    #[instrument(skip(self))]
    pub async fn list_rules(&self) -> InstalledRules {
        let mut rules = InstalledRules::new();
        for service in self.topology.iter() {
            let per_instance = rules.entry(service.name().to_string()).or_default();
            for instance in service.instances() {
                match self.proxy.list_rules(instance).await {
                    Ok(listed) => {
                        per_instance.insert(instance.clone(), listed);
                    }
                    Err(e) => warn!(
                        service = %service.name(),
                        instance = %instance,
                        error = %e,
                        "Failed to fetch rules"
                    ),
                }
            }
        }
        rules
    }

    /// Every `(service, instance)` pair of the topology
    fn instance_targets(&self) -> Vec<(String, String)> {
        self.topology
            .iter()
            .flat_map(|service| {
                service
                    .instances()
                    .iter()
                    .map(|instance| (service.name().to_string(), instance.clone()))
            })
            .collect()
    }
}

fn collect_failures(
    operation: &str,
    targets: &[(String, String)],
    results: Vec<Result<(), ApplicationError>>,
) -> Result<(), ApplicationError> {
    let failures: Vec<String> = targets
        .iter()
        .zip(results)
        .filter_map(|((service, instance), result)| {
            result.err().map(|e| {
                warn!(
                    service = %service,
                    instance = %instance,
                    error = %e,
                    "Failed to {operation}"
                );
                format!("{service}/{instance}: {e}")
            })
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(ApplicationError::Transport(format!(
            "{operation} failed on {} instance(s): {}",
            failures.len(),
            failures.join("; ")
        )))
    }
}
