//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A proxy, control plane or log store call failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error came from a collaborator rather than from validation
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this error is a rule or parameter validation failure
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Domain(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_convert_transparently() {
        let err: ApplicationError = DomainError::UnknownService("ratings".to_string()).into();
        assert!(err.is_validation());
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "Unknown service: ratings");
    }

    #[test]
    fn transport_error_message() {
        let err = ApplicationError::Transport("connection refused".to_string());
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "Transport error: connection refused");
    }
}
