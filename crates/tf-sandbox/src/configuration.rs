use crate::report::TestReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tf_core::types::TestScenario;
use tf_store::Entity;

/// A saved sandbox run. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxConfiguration {
    pub id: u64,
    pub name: String,
    pub rule_id: u64,
    pub scenario: TestScenario,
    pub report: TestReport,
    pub created_at: DateTime<Utc>,
}

impl SandboxConfiguration {
    pub fn new(name: Option<String>, report: TestReport) -> Self {
        let created_at = Utc::now();
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Test Config {}", created_at.timestamp_millis()));
        Self {
            id: 0,
            name,
            rule_id: report.rule_id,
            scenario: report.scenario.clone(),
            report,
            created_at,
        }
    }
}

impl Entity for SandboxConfiguration {
    const KIND: &'static str = "sandbox_configuration";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}
