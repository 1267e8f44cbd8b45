use serde::{Deserialize, Serialize};
use tf_core::types::{RoutingRule, TestScenario};
use tf_router::{CandidateEvaluation, RoutingDecision};

/// Estimated cost of the winner against the most expensive viable candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostComparison {
    pub estimated: f64,
    pub alternative: f64,
    pub savings: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub latency_ms: f64,
    pub reliability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TestOutcome {
    Routed { decision: RoutingDecision },
    NoViableProvider { message: String, candidates: Vec<CandidateEvaluation> },
}

/// Result of one sandbox run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    pub rule_id: u64,
    pub rule_name: String,
    /// Stored scenario id; `None` for custom input.
    pub scenario_id: Option<u64>,
    pub scenario: TestScenario,
    pub outcome: TestOutcome,
    pub cost: Option<CostComparison>,
    pub performance: Option<Performance>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl TestReport {
    pub fn routed(
        rule: &RoutingRule,
        scenario_id: Option<u64>,
        scenario: TestScenario,
        decision: RoutingDecision,
    ) -> Self {
        let estimated = decision.estimate.cost;
        let alternative = decision
            .candidates
            .iter()
            .filter(|c| c.is_viable())
            .filter_map(|c| c.estimate.map(|e| e.cost))
            .fold(estimated, f64::max);
        let cost = CostComparison { estimated, alternative, savings: (alternative - estimated).max(0.0) };
        let performance = Performance {
            latency_ms: decision.estimate.latency_ms,
            reliability: decision.estimate.reliability,
        };
        Self {
            rule_id: rule.id,
            rule_name: rule.name.clone(),
            scenario_id,
            scenario,
            suggestions: decision.suggestions.clone(),
            outcome: TestOutcome::Routed { decision },
            cost: Some(cost),
            performance: Some(performance),
        }
    }

    pub fn no_viable_provider(
        rule: &RoutingRule,
        scenario_id: Option<u64>,
        scenario: TestScenario,
        candidates: Vec<CandidateEvaluation>,
        suggestions: Vec<String>,
    ) -> Self {
        Self {
            rule_id: rule.id,
            rule_name: rule.name.clone(),
            scenario_id,
            scenario,
            outcome: TestOutcome::NoViableProvider {
                message: format!("No provider satisfies rule '{}' for this scenario", rule.name),
                candidates,
            },
            cost: None,
            performance: None,
            suggestions,
        }
    }

    pub fn decision(&self) -> Option<&RoutingDecision> {
        match &self.outcome {
            TestOutcome::Routed { decision } => Some(decision),
            TestOutcome::NoViableProvider { .. } => None,
        }
    }

    pub fn selected_provider(&self) -> Option<&str> {
        self.decision().map(|d| d.selected_provider.as_str())
    }
}
