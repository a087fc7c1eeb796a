//! Proxy client errors

use thiserror::Error;

/// Errors talking to a proxy instance or the control plane
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The HTTP client could not be built or the peer was unreachable
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The peer answered with a non-success status
    #[error("Request to {url} failed with HTTP {status}")]
    RequestFailed { url: String, status: u16 },

    /// Credentials were rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The response body could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A rule cannot be expressed in the wire format
    #[error("Invalid rule: {0}")]
    InvalidRule(String),
}

impl ProxyError {
    /// Whether retrying the call could succeed
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed(_) => true,
            Self::RequestFailed { status, .. } => *status >= 500,
            Self::Unauthorized(_) | Self::ParseError(_) | Self::InvalidRule(_) => false,
        }
    }
}
