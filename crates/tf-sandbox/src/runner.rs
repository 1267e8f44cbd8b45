use crate::configuration::SandboxConfiguration;
use crate::report::TestReport;
use std::sync::Arc;
use std::time::Duration;
use tf_core::config::TfConfig;
use tf_core::error::{Result, TfError};
use tf_core::types::{RoutingRule, TestScenario};
use tf_router::{DecisionEngine, RouterError};
use tf_store::{MemoryStore, RecordStore, RuleStore, ScenarioStore};

/// Where a sandbox run takes its scenario from.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioSource {
    Stored(u64),
    /// Ad hoc input, validated and never persisted.
    Custom(TestScenario),
}

/// Runs rules against scenarios and manages saved configurations.
#[derive(Clone)]
pub struct SandboxRunner {
    rules: RuleStore,
    scenarios: ScenarioStore,
    configurations: Arc<dyn RecordStore<SandboxConfiguration>>,
    engine: DecisionEngine,
    fetch_timeout: Duration,
}

impl SandboxRunner {
    pub fn new(
        rules: RuleStore,
        scenarios: ScenarioStore,
        configurations: Arc<dyn RecordStore<SandboxConfiguration>>,
        engine: DecisionEngine,
        fetch_timeout: Duration,
    ) -> Self {
        Self { rules, scenarios, configurations, engine, fetch_timeout }
    }

    /// Runner over the given stores with an in-memory configuration store,
    /// engine and timeout taken from `config`.
    pub fn from_config(rules: RuleStore, scenarios: ScenarioStore, config: &TfConfig) -> Self {
        Self::new(
            rules,
            scenarios,
            Arc::new(MemoryStore::<SandboxConfiguration>::new()),
            DecisionEngine::new(&config.routing),
            Duration::from_millis(config.sandbox.fetch_timeout_ms),
        )
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn scenarios(&self) -> &ScenarioStore {
        &self.scenarios
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Evaluate rule `rule_id` against a stored or custom scenario.
    ///
    /// Both fetches share one timeout. A rule with no viable provider yields
    /// a report, not an error.
    pub async fn run_test(&self, rule_id: u64, source: ScenarioSource) -> Result<TestReport> {
        let (rule, scenario_id, scenario) = tokio::time::timeout(self.fetch_timeout, self.fetch(rule_id, source))
            .await
            .map_err(|_| {
                tracing::warn!(rule_id, timeout_ms = self.fetch_timeout.as_millis() as u64, "sandbox fetch timed out");
                TfError::Timeout(format!(
                    "loading rule {rule_id} and scenario took longer than {} ms",
                    self.fetch_timeout.as_millis()
                ))
            })??;

        match self.engine.decide(&rule, &scenario, self.rules.registry()) {
            Ok(decision) => {
                tracing::info!(
                    rule_id,
                    provider = %decision.selected_provider,
                    confidence = decision.confidence,
                    "sandbox test routed"
                );
                Ok(TestReport::routed(&rule, scenario_id, scenario, decision))
            }
            Err(RouterError::NoViableProvider { candidates, suggestions, .. }) => {
                tracing::info!(rule_id, "sandbox test found no viable provider");
                Ok(TestReport::no_viable_provider(&rule, scenario_id, scenario, candidates, suggestions))
            }
            Err(err @ RouterError::Estimation { .. }) => {
                tracing::error!(rule_id, error = %err, "sandbox estimation failed");
                Err(TfError::Internal(err.to_string()))
            }
        }
    }

    async fn fetch(&self, rule_id: u64, source: ScenarioSource) -> Result<(RoutingRule, Option<u64>, TestScenario)> {
        let rule = self.rules.get(rule_id).await?;
        let (scenario_id, scenario) = match source {
            ScenarioSource::Stored(id) => (Some(id), self.scenarios.get(id).await?),
            ScenarioSource::Custom(mut scenario) => {
                scenario.id = 0;
                scenario.validate()?;
                (None, scenario)
            }
        };
        Ok((rule, scenario_id, scenario))
    }

    /// Save a report under `name`, or a generated name when absent.
    pub async fn save_configuration(&self, name: Option<String>, report: TestReport) -> Result<SandboxConfiguration> {
        let saved = self.configurations.create(SandboxConfiguration::new(name, report)).await?;
        tracing::info!(id = saved.id, name = %saved.name, rule_id = saved.rule_id, "sandbox configuration saved");
        Ok(saved)
    }

    pub async fn get_configuration(&self, id: u64) -> Result<SandboxConfiguration> {
        self.configurations.get(id).await
    }

    pub async fn list_configurations(&self) -> Result<Vec<SandboxConfiguration>> {
        self.configurations.list().await
    }

    pub async fn delete_configuration(&self, id: u64) -> Result<()> {
        self.configurations.delete(id).await?;
        tracing::info!(id, "sandbox configuration deleted");
        Ok(())
    }
}
