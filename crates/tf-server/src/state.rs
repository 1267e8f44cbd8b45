//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Instant;
use tf_core::config::TfConfig;
use tf_core::error::Result;
use tf_core::registry::{default_providers, ProviderRegistry};
use tf_sandbox::SandboxRunner;
use tf_store::{RuleStore, ScenarioStore};

/// Shared application state. Cloning is cheap; every store sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TfConfig>,
    pub registry: ProviderRegistry,
    pub rules: RuleStore,
    pub scenarios: ScenarioStore,
    pub runner: SandboxRunner,
    pub start_time: Instant,
}

impl AppState {
    /// State over the built-in providers with empty stores.
    pub fn new() -> Self {
        let registry = ProviderRegistry::new(default_providers())
            .expect("built-in provider table has unique names and in-range figures");
        Self::with_registry(TfConfig::default(), registry)
    }

    /// State built from a loaded configuration. Scenarios are not seeded;
    /// call [`AppState::seed_scenarios`] for that.
    pub fn from_config(config: TfConfig) -> Result<Self> {
        config.validate()?;
        let registry = ProviderRegistry::new(config.providers.clone())?;
        Ok(Self::with_registry(config, registry))
    }

    fn with_registry(config: TfConfig, registry: ProviderRegistry) -> Self {
        let rules = RuleStore::in_memory(registry.clone());
        let scenarios = ScenarioStore::in_memory();
        let runner = SandboxRunner::from_config(rules.clone(), scenarios.clone(), &config);
        Self {
            config: Arc::new(config),
            registry,
            rules,
            scenarios,
            runner,
            start_time: Instant::now(),
        }
    }

    /// Load the configured sample scenarios into the scenario store.
    pub async fn seed_scenarios(&self) -> Result<usize> {
        let count = self.scenarios.seed(self.config.scenarios.iter().cloned()).await?;
        tracing::debug!(count, "sample scenarios seeded");
        Ok(count)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
