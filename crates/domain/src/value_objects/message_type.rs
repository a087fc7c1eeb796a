//! Message type and probability distribution enumerations used by fault rules

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of message a fault rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Outgoing request from source to dest
    #[default]
    Request,
    /// Response travelling back from dest to source
    Response,
    /// Message published to a broker
    Publish,
    /// Message consumed from a broker
    Subscribe,
}

impl MessageType {
    /// Wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::Publish => "publish",
            Self::Subscribe => "subscribe",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Probability distribution the proxy samples from when deciding to fire an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    #[default]
    Uniform,
    Exponential,
    Normal,
}

impl Distribution {
    /// Wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Exponential => "exponential",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_serialization() {
        let json = serde_json::to_string(&MessageType::Subscribe).unwrap();
        assert_eq!(json, "\"subscribe\"");
        let parsed: MessageType = serde_json::from_str("\"response\"").unwrap();
        assert_eq!(parsed, MessageType::Response);
    }

    #[test]
    fn message_type_rejects_unknown() {
        assert!(serde_json::from_str::<MessageType>("\"stream\"").is_err());
    }

    #[test]
    fn defaults() {
        assert_eq!(MessageType::default(), MessageType::Request);
        assert_eq!(Distribution::default(), Distribution::Uniform);
    }

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(MessageType::Publish.to_string(), "publish");
        assert_eq!(Distribution::Exponential.to_string(), "exponential");
    }
}
