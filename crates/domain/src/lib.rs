//! Domain layer for gremlin-rs
//!
//! Contains the service topology, fault rules and the scenarios that expand
//! into them, logged events, typed assertions and the circuit breaker replay.
//! This layer performs no I/O.

pub mod assertions;
pub mod circuit_breaker;
pub mod entities;
pub mod errors;
pub mod scenarios;
pub mod value_objects;

pub use assertions::{
    Assertion, AssertionResult, CheckOutcome, CheckSpec, Checklist, DEFAULT_ERROR_TOLERANCE,
    NO_LOG_ENTRIES,
};
pub use circuit_breaker::{BreakerSnapshot, CircuitBreakerPolicy, CircuitState, Violation};
pub use entities::*;
pub use errors::DomainError;
pub use scenarios::{
    AbortParams, CrashParams, DelayParams, FailureRecipe, MatchPatterns, OverloadParams,
    PartitionParams, Scenario,
};
pub use value_objects::*;
