//! Deterministic cost and performance estimates.

use crate::types::Estimate;
use tf_core::config::EstimatorConfig;
use tf_core::types::{Complexity, Provider, ProviderStatus, TestScenario};

/// Estimates cost, latency and reliability from provider reference data.
///
/// The complexity multiplier scales both cost and latency. Degraded
/// providers get an extra latency factor. No jitter: identical inputs
/// always give identical estimates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Estimator {
    config: EstimatorConfig,
}

impl Estimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn multiplier(&self, complexity: Complexity) -> f64 {
        self.config.multiplier(complexity)
    }

    pub fn estimate(&self, provider: &Provider, scenario: &TestScenario) -> Estimate {
        let m = self.multiplier(scenario.complexity);
        let cost = provider.cost_per_1k * (scenario.tokens as f64 / 1000.0) * m;
        let mut latency_ms = provider.base_latency_ms * m;
        if provider.status == ProviderStatus::Degraded {
            latency_ms *= self.config.degraded_latency_factor;
        }
        Estimate { cost, latency_ms, reliability: provider.reliability }
    }
}
