//! Sandbox test runs: evaluate a stored rule against a scenario, report the
//! outcome, and keep saved configurations.

pub mod configuration;
pub mod report;
pub mod runner;

pub use configuration::SandboxConfiguration;
pub use report::*;
pub use runner::{SandboxRunner, ScenarioSource};
