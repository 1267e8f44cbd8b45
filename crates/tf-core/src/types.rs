//! Canonical routing data model shared by every crate.

use crate::error::{Result, TfError};
use serde::{Deserialize, Serialize};
use std::fmt;

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(TfError::validation(format!(
            "{field} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(TfError::validation(format!("{field} must be a non-negative number, got {value}")));
    }
    Ok(())
}

// ========== Providers ==========

/// Operational status of a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    #[default]
    Online,
    Degraded,
    Offline,
}

/// An LLM API vendor and its reference characteristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub name: String,
    pub cost_per_1k: f64,
    pub base_latency_ms: f64,
    pub reliability: f64,
    pub availability: f64,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub status: ProviderStatus,
    /// Models served by this provider. Empty means any model.
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Provider {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TfError::validation("provider name must not be empty"));
        }
        check_non_negative("costPer1k", self.cost_per_1k)?;
        check_non_negative("baseLatencyMs", self.base_latency_ms)?;
        check_range("reliability", self.reliability, 0.0, 100.0)?;
        check_range("availability", self.availability, 0.0, 100.0)?;
        Ok(())
    }

    pub fn serves(&self, model: &str) -> bool {
        self.models.is_empty() || self.models.iter().any(|m| m.eq_ignore_ascii_case(model))
    }
}

// ========== Routing Rules ==========

/// Strategy used to pick a winner among viable candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Cost,
    Speed,
    Reliability,
    #[default]
    Balanced,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Cost => write!(f, "cost"),
            Priority::Speed => write!(f, "speed"),
            Priority::Reliability => write!(f, "reliability"),
            Priority::Balanced => write!(f, "balanced"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = TfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cost" => Ok(Priority::Cost),
            "speed" => Ok(Priority::Speed),
            "reliability" => Ok(Priority::Reliability),
            "balanced" => Ok(Priority::Balanced),
            other => Err(TfError::validation(format!("unknown priority: {other}"))),
        }
    }
}

/// Numeric bounds a candidate must satisfy. Unset bounds are not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_success_rate: Option<f64>,
}

impl RuleConditions {
    pub fn is_empty(&self) -> bool {
        self.max_cost.is_none() && self.max_latency.is_none() && self.min_success_rate.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(v) = self.max_cost {
            check_non_negative("maxCost", v)?;
        }
        if let Some(v) = self.max_latency {
            check_non_negative("maxLatency", v)?;
        }
        if let Some(v) = self.min_success_rate {
            check_range("minSuccessRate", v, 0.0, 100.0)?;
        }
        Ok(())
    }
}

/// A named routing policy: target provider, fallback chain, priority and bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRule {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub conditions: RuleConditions,
    pub target_provider: String,
    #[serde(default)]
    pub fallback_providers: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RoutingRule {
    pub fn new(name: impl Into<String>, priority: Priority, target: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            priority,
            conditions: RuleConditions::default(),
            target_provider: target.into(),
            fallback_providers: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_fallbacks<I, S>(mut self, fallbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_providers = fallbacks.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_conditions(mut self, conditions: RuleConditions) -> Self {
        self.conditions = conditions;
        self
    }

    /// Target first, then fallbacks in order; later repeats of a name are dropped.
    pub fn candidates(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(1 + self.fallback_providers.len());
        for name in std::iter::once(&self.target_provider).chain(&self.fallback_providers) {
            if !out.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
                out.push(name);
            }
        }
        out
    }
}

// ========== Scenarios ==========

/// Request complexity class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Medium,
    Complex,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Complexity::Simple => write!(f, "simple"),
            Complexity::Medium => write!(f, "medium"),
            Complexity::Complex => write!(f, "complex"),
        }
    }
}

impl std::str::FromStr for Complexity {
    type Err = TfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(Complexity::Simple),
            "medium" => Ok(Complexity::Medium),
            "complex" => Ok(Complexity::Complex),
            other => Err(TfError::validation(format!("unknown complexity: {other}"))),
        }
    }
}

/// Optional generation parameters carried by a scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

impl GenerationParams {
    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.temperature {
            check_range("temperature", t, 0.0, 2.0)?;
        }
        if self.max_tokens == Some(0) {
            return Err(TfError::validation("maxTokens must be greater than 0"));
        }
        if let Some(p) = self.top_p {
            check_range("topP", p, 0.0, 1.0)?;
        }
        Ok(())
    }
}

/// A hypothetical request used to evaluate a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestScenario {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub model: String,
    pub tokens: u64,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub parameters: GenerationParams,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl TestScenario {
    pub fn new(model: impl Into<String>, tokens: u64, complexity: Complexity) -> Self {
        Self {
            id: 0,
            name: String::new(),
            description: String::new(),
            model: model.into(),
            tokens,
            complexity,
            category: String::new(),
            parameters: GenerationParams::default(),
            tags: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(TfError::validation("model must not be empty"));
        }
        if self.tokens == 0 {
            return Err(TfError::validation("tokens must be greater than 0"));
        }
        self.parameters.validate()
    }
}
