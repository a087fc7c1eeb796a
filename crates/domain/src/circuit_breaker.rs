//! Circuit breaker replay
//!
//! Reconstructs the state a correctly behaving circuit breaker in `source`
//! must have been in while calling `dest`, purely from the logged events of
//! that edge, and reports every request that should have been short-circuited.
//!
//! # States
//!
//! - **Closed**: calls pass through; failures are counted
//! - **Open**: the breaker tripped; no request may reach `dest` until
//!   `reset_time` has elapsed since it opened
//! - **Half-Open**: probing; one failure re-opens, enough successes close
//!
//! A failure is a response with a status other than 200, or a request the
//! proxy aborted. A success is a response with status 200.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::entities::Event;

/// Thresholds of the breaker under test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerPolicy {
    /// Consecutive failures tolerated while closed; one more trips the breaker
    pub closed_attempts: u32,
    /// Time the breaker stays open before probing
    pub reset_time: Duration,
    /// Successes tolerated while half-open; one more closes the breaker
    pub half_open_attempts: u32,
}

impl CircuitBreakerPolicy {
    /// Policy with the default of one half-open trial
    pub const fn new(closed_attempts: u32, reset_time: Duration) -> Self {
        Self {
            closed_attempts,
            reset_time,
            half_open_attempts: 1,
        }
    }

    #[must_use]
    pub const fn with_half_open_attempts(mut self, attempts: u32) -> Self {
        self.half_open_attempts = attempts;
        self
    }
}

/// State of a circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// A request observed while the breaker must have been open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub opened_at: DateTime<Utc>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "request {} at {} reached the dependency while the circuit was open (since {})",
            if self.request_id.is_empty() {
                "<no id>"
            } else {
                self.request_id.as_str()
            },
            self.timestamp.to_rfc3339(),
            self.opened_at.to_rfc3339()
        )
    }
}

/// Breaker state plus its counters at one point of the replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    pub opened_at: Option<DateTime<Utc>>,
}

impl Default for BreakerSnapshot {
    fn default() -> Self {
        Self::closed()
    }
}

impl BreakerSnapshot {
    /// Fresh closed breaker
    pub const fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            opened_at: None,
        }
    }

    const fn opened(at: DateTime<Utc>) -> Self {
        Self {
            state: CircuitState::Open,
            failure_count: 0,
            success_count: 0,
            opened_at: Some(at),
        }
    }

    const fn half_open() -> Self {
        Self {
            state: CircuitState::HalfOpen,
            failure_count: 0,
            success_count: 0,
            opened_at: None,
        }
    }

    /// Apply one event
    ///
    /// Returns the next snapshot and, if the event is a request that must
    /// not have happened, the violation it represents.
    #[must_use]
    pub fn transition(
        self,
        event: &Event,
        policy: &CircuitBreakerPolicy,
    ) -> (Self, Option<Violation>) {
        match self.state {
            CircuitState::Closed => (self.on_closed(event, policy), None),
            CircuitState::Open => {
                let opened_at = self.opened_at.unwrap_or(event.timestamp);
                let elapsed = event
                    .timestamp
                    .signed_duration_since(opened_at)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                if elapsed >= policy.reset_time {
                    return Self::half_open().transition(event, policy);
                }
                let violation = event.is_request().then(|| Violation {
                    timestamp: event.timestamp,
                    request_id: event.request_id.clone(),
                    opened_at,
                });
                (self, violation)
            }
            CircuitState::HalfOpen => (self.on_half_open(event, policy), None),
        }
    }

    fn on_closed(mut self, event: &Event, policy: &CircuitBreakerPolicy) -> Self {
        if event.is_failure() {
            self.failure_count += 1;
            if self.failure_count > policy.closed_attempts {
                return Self::opened(event.timestamp);
            }
        } else if event.is_success() {
            self.failure_count = 0;
        }
        self
    }

    fn on_half_open(mut self, event: &Event, policy: &CircuitBreakerPolicy) -> Self {
        if event.is_failure() {
            return Self::opened(event.timestamp);
        }
        if event.is_success() {
            self.success_count += 1;
            if self.success_count > policy.half_open_attempts {
                return Self::closed();
            }
        }
        self
    }
}

/// Replay the events of one edge and collect violations
///
/// Events are sorted by timestamp first; events with equal timestamps keep
/// their input order. With `stop_on_first` the replay ends at the first
/// violation.
pub fn replay(
    events: &[Event],
    policy: &CircuitBreakerPolicy,
    stop_on_first: bool,
) -> Vec<Violation> {
    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by_key(|e| e.timestamp);

    let mut snapshot = BreakerSnapshot::closed();
    let mut violations = Vec::new();
    for event in ordered {
        let (next, violation) = snapshot.transition(event, policy);
        snapshot = next;
        if let Some(violation) = violation {
            violations.push(violation);
            if stop_on_first {
                break;
            }
        }
    }
    violations
}
