//! Application layer - Use cases and orchestration
//!
//! Contains the failure generator and the assertion checker together with
//! the ports they use to reach proxies, the control plane and the log store.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
