//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A fault rule invariant was violated
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// A topology lookup referenced a service that was never registered
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// A property check was invoked without one of its required arguments
    #[error("Missing parameter '{parameter}' for assertion '{assertion}'")]
    MissingParameter {
        assertion: String,
        parameter: String,
    },

    /// A property check argument was present but unusable
    #[error("Invalid parameter '{parameter}' for assertion '{assertion}': {reason}")]
    InvalidParameter {
        assertion: String,
        parameter: String,
        reason: String,
    },

    /// No property is known under this name
    #[error("Unknown assertion: {0}")]
    UnknownAssertion(String),

    /// A failure scenario could not be expanded
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    /// A duration string could not be parsed
    #[error("Malformed duration '{input}': {reason}")]
    MalformedDuration { input: String, reason: String },
}

impl DomainError {
    /// Create a missing parameter error
    pub fn missing_parameter(assertion: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            assertion: assertion.into(),
            parameter: parameter.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(
        assertion: impl Into<String>,
        parameter: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            assertion: assertion.into(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed duration error
    pub fn malformed_duration(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDuration {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parameter_creates_correct_error() {
        let err = DomainError::missing_parameter("bounded_retries", "retries");
        match err {
            DomainError::MissingParameter {
                assertion,
                parameter,
            } => {
                assert_eq!(assertion, "bounded_retries");
                assert_eq!(parameter, "retries");
            }
            _ => unreachable!("Expected MissingParameter error"),
        }
    }

    #[test]
    fn missing_parameter_error_message_is_correct() {
        let err = DomainError::missing_parameter("circuit_breaker", "reset_time");
        assert_eq!(
            err.to_string(),
            "Missing parameter 'reset_time' for assertion 'circuit_breaker'"
        );
    }

    #[test]
    fn invalid_rule_error_message() {
        let err = DomainError::InvalidRule("source must not be empty".to_string());
        assert_eq!(err.to_string(), "Invalid rule: source must not be empty");
    }

    #[test]
    fn unknown_service_error_message() {
        let err = DomainError::UnknownService("ratings".to_string());
        assert_eq!(err.to_string(), "Unknown service: ratings");
    }

    #[test]
    fn malformed_duration_error_message() {
        let err = DomainError::malformed_duration("3x", "unknown unit 'x'");
        assert_eq!(err.to_string(), "Malformed duration '3x': unknown unit 'x'");
    }

    #[test]
    fn invalid_parameter_error_message() {
        let err = DomainError::invalid_parameter("http_status", "status", "expected an integer");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'status' for assertion 'http_status': expected an integer"
        );
    }
}
