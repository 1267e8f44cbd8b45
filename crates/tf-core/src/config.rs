//! Service configuration, loaded from TOML with defaults for every section.

use crate::error::{Result, TfError};
use crate::registry::default_providers;
use crate::types::{Complexity, GenerationParams, Provider, TestScenario};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "TF_CONFIG";
/// Config file picked up from the working directory when nothing else is given.
pub const DEFAULT_CONFIG_FILE: &str = "tokenflow.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TfConfig {
    pub server: ServerConfig,
    pub sandbox: SandboxConfig,
    pub routing: RoutingConfig,
    pub providers: Vec<Provider>,
    pub scenarios: Vec<TestScenario>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub json_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Upper bound on fetching a rule and scenario before a test run.
    pub fetch_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub estimator: EstimatorConfig,
    pub confidence: ConfidenceConfig,
    pub suggestions: SuggestionConfig,
}

/// Complexity multipliers applied to cost and latency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub simple_multiplier: f64,
    pub medium_multiplier: f64,
    pub complex_multiplier: f64,
    /// Extra latency factor for providers reporting `degraded`.
    pub degraded_latency_factor: f64,
}

impl EstimatorConfig {
    pub fn multiplier(&self, complexity: Complexity) -> f64 {
        match complexity {
            Complexity::Simple => self.simple_multiplier,
            Complexity::Medium => self.medium_multiplier,
            Complexity::Complex => self.complex_multiplier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Winner/runner-up margin at which confidence reaches 100.
    pub saturation_margin: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Winner cost at or below `maxCost * ratio` suggests tightening the bound.
    pub cost_headroom_ratio: f64,
    /// Winner latency at or above `maxLatency * ratio` warns about the bound.
    pub latency_headroom_ratio: f64,
    /// Simple requests costing more than `cheapest * ratio` suggest cost priority.
    pub simple_cost_ratio: f64,
}

impl Default for TfConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            sandbox: SandboxConfig::default(),
            routing: RoutingConfig::default(),
            providers: default_providers(),
            scenarios: default_scenarios(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 3001, json_logs: false }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self { fetch_timeout_ms: 5_000 }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            simple_multiplier: 0.8,
            medium_multiplier: 1.0,
            complex_multiplier: 1.5,
            degraded_latency_factor: 1.5,
        }
    }
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self { saturation_margin: 0.5 }
    }
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self { cost_headroom_ratio: 0.5, latency_headroom_ratio: 0.9, simple_cost_ratio: 1.5 }
    }
}

fn scenario(name: &str, description: &str, category: &str, shape: (&str, u64, Complexity)) -> TestScenario {
    let (model, tokens, complexity) = shape;
    let mut scenario = TestScenario::new(model, tokens, complexity);
    scenario.name = name.into();
    scenario.description = description.into();
    scenario.category = category.into();
    scenario.parameters = GenerationParams {
        temperature: Some(0.7),
        max_tokens: Some(150),
        top_p: Some(1.0),
    };
    scenario
}

/// Sample scenarios seeded into a fresh scenario store.
pub fn default_scenarios() -> Vec<TestScenario> {
    vec![
        scenario(
            "Simple Q&A",
            "Short factual question",
            "chat",
            ("gpt-4o-mini", 250, Complexity::Simple),
        ),
        scenario(
            "Code Generation",
            "Generate a function with tests",
            "code",
            ("gpt-4", 1_000, Complexity::Medium),
        ),
        scenario(
            "Document Analysis",
            "Summarize and critique a long report",
            "analysis",
            ("claude-3", 8_000, Complexity::Complex),
        ),
    ]
}

fn positive(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TfError::Config(format!("{field} must be a positive number, got {value}")));
    }
    Ok(())
}

impl TfConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| TfError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| TfError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
            .map_err(|e| TfError::Config(format!("parsing {}: {e}", path.display())))
    }

    /// Resolve the config source: explicit path, then `TF_CONFIG`, then
    /// `tokenflow.toml` if it exists, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => match std::env::var(CONFIG_ENV) {
                Ok(p) => Some(PathBuf::from(p)),
                Err(_) => {
                    let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                    fallback.exists().then_some(fallback)
                }
            },
        };
        match path {
            Some(p) => Ok((Self::from_file(&p)?, Some(p))),
            None => Ok((Self::default(), None)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let est = &self.routing.estimator;
        positive("routing.estimator.simple_multiplier", est.simple_multiplier)?;
        positive("routing.estimator.medium_multiplier", est.medium_multiplier)?;
        positive("routing.estimator.complex_multiplier", est.complex_multiplier)?;
        positive("routing.estimator.degraded_latency_factor", est.degraded_latency_factor)?;

        let margin = self.routing.confidence.saturation_margin;
        if !margin.is_finite() || margin <= 0.0 || margin > 1.0 {
            return Err(TfError::Config(format!(
                "routing.confidence.saturation_margin must be in (0, 1], got {margin}"
            )));
        }

        let sug = &self.routing.suggestions;
        positive("routing.suggestions.cost_headroom_ratio", sug.cost_headroom_ratio)?;
        positive("routing.suggestions.latency_headroom_ratio", sug.latency_headroom_ratio)?;
        positive("routing.suggestions.simple_cost_ratio", sug.simple_cost_ratio)?;

        if self.sandbox.fetch_timeout_ms == 0 {
            return Err(TfError::Config("sandbox.fetch_timeout_ms must be greater than 0".into()));
        }
        Ok(())
    }
}
