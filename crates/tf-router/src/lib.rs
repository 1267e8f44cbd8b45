//! TokenFlow router: deterministic estimator and rule decision engine.

pub mod engine;
pub mod estimator;
mod suggest;
pub mod types;

pub use engine::DecisionEngine;
pub use estimator::Estimator;
pub use types::*;

use tf_core::config::RoutingConfig;
use tf_core::registry::ProviderRegistry;
use tf_core::types::{RoutingRule, TestScenario};

/// Decide a route with a one-off engine built from `config`.
pub fn decide(
    rule: &RoutingRule,
    scenario: &TestScenario,
    registry: &ProviderRegistry,
    config: &RoutingConfig,
) -> Result<RoutingDecision> {
    DecisionEngine::new(config).decide(rule, scenario, registry)
}
