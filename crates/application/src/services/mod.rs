//! Application services - Use case implementations

mod assertion_checker;
mod failure_generator;

pub use assertion_checker::AssertionChecker;
pub use failure_generator::{FailureGenerator, InstalledRules, PushFailure, PushReport};
