//! Test correlation identifier value object
//!
//! # Examples
//!
//! ```
//! use domain::TestId;
//!
//! let id = TestId::new();
//! assert_eq!(id.as_str().len(), 32);
//!
//! let parsed = TestId::parse("4f1c2a9e").unwrap();
//! assert_eq!(parsed.to_string(), "4f1c2a9e");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque token that scopes fault rules and log queries to one test run
///
/// Freshly allocated ids are random 128-bit values rendered as 32 lowercase
/// hex characters. Ids handed over by an external tool are accepted verbatim
/// as long as they are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(String);

impl TestId {
    /// Allocate a new random test id
    ///
    /// # Examples
    ///
    /// ```
    /// use domain::TestId;
    ///
    /// assert_ne!(TestId::new(), TestId::new());
    /// ```
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing test id, `None` if it is empty or whitespace
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
