//! Topology entity - Directed service dependency graph
//!
//! An edge `A -> B` means "A calls B". The graph is built once from a
//! declarative model while a test is being prepared and is read-only
//! afterwards, apart from the per-test coverage annotation used when
//! generating log rules.
//!
//! # Examples
//!
//! ```
//! use domain::Topology;
//!
//! let mut topology = Topology::new();
//! topology.add_service("productpage");
//! topology.add_service("reviews");
//! topology.add_dependency("productpage", "reviews").unwrap();
//!
//! assert_eq!(topology.dependents("reviews"), vec!["productpage"]);
//! assert_eq!(topology.dependencies("productpage"), vec!["reviews"]);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// One service entry of a declarative topology model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Unique service name
    pub name: String,
    /// Addresses (`host:port`) of the fault-injection proxies fronting this service
    #[serde(default, alias = "instances")]
    pub service_proxies: Vec<String>,
}

/// Declarative topology model, usually loaded from a JSON document
///
/// ```json
/// {
///   "services": [
///     { "name": "gateway", "service_proxies": ["127.0.0.1:9877"] },
///     { "name": "productpage", "service_proxies": ["127.0.0.1:9876"] },
///     { "name": "reviews" }
///   ],
///   "dependencies": {
///     "gateway": ["productpage"],
///     "productpage": ["reviews"]
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyModel {
    /// Services to register
    pub services: Vec<ServiceSpec>,
    /// Caller name to callee names
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<String>>,
}

/// A registered service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    name: String,
    instances: Vec<String>,
}

impl Service {
    /// Service name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Proxy instance addresses
    pub fn instances(&self) -> &[String] {
        &self.instances
    }
}

/// Directed graph of services and their call dependencies
///
/// Cycles are allowed. Service and edge order follow registration order so
/// rule expansion is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    services: Vec<Service>,
    index: HashMap<String, usize>,
    edges: Vec<(usize, usize)>,
    covered: HashSet<(usize, usize)>,
}

impl Topology {
    /// Create an empty topology
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a topology from a declarative model
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownService`] if a dependency references a
    /// service that is not listed under `services`.
    pub fn from_model(model: &TopologyModel) -> Result<Self, DomainError> {
        let mut topology = Self::new();
        for spec in &model.services {
            topology.add_service_with_instances(&spec.name, spec.service_proxies.clone());
        }
        for (from, callees) in &model.dependencies {
            for to in callees {
                topology.add_dependency(from, to)?;
            }
        }
        Ok(topology)
    }

    /// Register a service without proxy instances
    pub fn add_service(&mut self, name: impl Into<String>) {
        self.add_service_with_instances(name, Vec::new());
    }

    /// Register a service with its proxy instance addresses
    ///
    /// Registering an existing name again replaces its instance list and
    /// keeps its edges.
    pub fn add_service_with_instances(&mut self, name: impl Into<String>, instances: Vec<String>) {
        let name = name.into();
        if let Some(&idx) = self.index.get(&name) {
            self.services[idx].instances = instances;
            return;
        }
        self.index.insert(name.clone(), self.services.len());
        self.services.push(Service { name, instances });
    }

    /// Add the edge `from -> to`
    ///
    /// Adding an edge that already exists is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownService`] if either endpoint is not registered.
    pub fn add_dependency(&mut self, from: &str, to: &str) -> Result<(), DomainError> {
        let edge = (self.lookup(from)?, self.lookup(to)?);
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<usize, DomainError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| DomainError::UnknownService(name.to_string()))
    }

    /// Check whether a service is registered
    pub fn contains(&self, service: &str) -> bool {
        self.index.contains_key(service)
    }

    /// Check whether the edge `from -> to` exists
    pub fn has_dependency(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&f), Some(&t)) => self.edges.contains(&(f, t)),
            _ => false,
        }
    }

    /// Services with an edge into `service`, in edge insertion order
    pub fn dependents(&self, service: &str) -> Vec<&str> {
        let Some(&target) = self.index.get(service) else {
            return Vec::new();
        };
        self.edges
            .iter()
            .filter(|(_, to)| *to == target)
            .map(|(from, _)| self.services[*from].name.as_str())
            .collect()
    }

    /// Services `service` has an edge to, in edge insertion order
    pub fn dependencies(&self, service: &str) -> Vec<&str> {
        let Some(&origin) = self.index.get(service) else {
            return Vec::new();
        };
        self.edges
            .iter()
            .filter(|(from, _)| *from == origin)
            .map(|(_, to)| self.services[*to].name.as_str())
            .collect()
    }

    /// Proxy instance addresses of a service, empty if none or unknown
    pub fn instances(&self, service: &str) -> &[String] {
        self.index
            .get(service)
            .map_or(&[], |&idx| self.services[idx].instances.as_slice())
    }

    /// All registered service names in registration order
    pub fn services(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name.as_str()).collect()
    }

    /// All registered services in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    /// All edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges.iter().map(|&(from, to)| {
            (
                self.services[from].name.as_str(),
                self.services[to].name.as_str(),
            )
        })
    }

    /// Mark the edge `from -> to` as covered by a fault rule
    ///
    /// Returns `false` if there is no such edge.
    pub fn mark_covered(&mut self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&f), Some(&t)) if self.edges.contains(&(f, t)) => {
                self.covered.insert((f, t));
                true
            }
            _ => false,
        }
    }

    /// Edges no fault rule covers yet, in insertion order
    pub fn uncovered_edges(&self) -> Vec<(&str, &str)> {
        self.edges
            .iter()
            .filter(|edge| !self.covered.contains(edge))
            .map(|&(from, to)| {
                (
                    self.services[from].name.as_str(),
                    self.services[to].name.as_str(),
                )
            })
            .collect()
    }

    /// Drop all coverage marks
    pub fn reset_coverage(&mut self) {
        self.covered.clear();
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for service in &self.services {
            writeln!(f, "Node: {}", service.name)?;
        }
        for (from, to) in self.edges() {
            writeln!(f, "Edge: {from}->{to}")?;
        }
        Ok(())
    }
}
