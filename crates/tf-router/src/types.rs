use serde::{Deserialize, Serialize};
use std::fmt;
use tf_core::types::Priority;
use thiserror::Error;

/// Decision-time estimate for one provider and scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub cost: f64,
    pub latency_ms: f64,
    pub reliability: f64,
}

impl Estimate {
    pub fn is_finite(&self) -> bool {
        self.cost.is_finite() && self.latency_ms.is_finite() && self.reliability.is_finite()
    }
}

/// Where a candidate sits in the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateRole {
    Target,
    Fallback,
}

/// Why a candidate was dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Rejection {
    UnknownProvider,
    Offline,
    CostExceeded { estimated: f64, max: f64 },
    LatencyExceeded { estimated: f64, max: f64 },
    ReliabilityBelow { estimated: f64, min: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnknownProvider => write!(f, "unknown provider"),
            Rejection::Offline => write!(f, "provider offline"),
            Rejection::CostExceeded { estimated, max } => {
                write!(f, "cost {estimated:.4} exceeds max {max:.4}")
            }
            Rejection::LatencyExceeded { estimated, max } => {
                write!(f, "latency {estimated:.0} ms exceeds max {max:.0} ms")
            }
            Rejection::ReliabilityBelow { estimated, min } => {
                write!(f, "reliability {estimated:.1} below min {min:.1}")
            }
        }
    }
}

/// One provider from the rule's chain, as the engine saw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateEvaluation {
    pub provider: String,
    pub role: CandidateRole,
    /// 0 for the target, then fallback order.
    pub position: usize,
    pub model: Option<String>,
    pub estimate: Option<Estimate>,
    pub rejections: Vec<Rejection>,
    /// 1-based rank among viable candidates.
    pub rank: Option<usize>,
    /// Balanced score in [0, 1] among viable candidates.
    pub score: Option<f64>,
}

impl CandidateEvaluation {
    pub fn is_viable(&self) -> bool {
        self.rejections.is_empty()
    }

    pub fn label(&self) -> String {
        match self.role {
            CandidateRole::Target => format!("{} (target)", self.provider),
            CandidateRole::Fallback => format!("{} (fallback {})", self.provider, self.position),
        }
    }
}

/// Outcome of evaluating a rule against a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    pub rule_id: u64,
    pub priority: Priority,
    pub selected_provider: String,
    pub selected_model: String,
    /// 50 to 100; wider winner margin means higher confidence.
    pub confidence: u8,
    pub estimate: Estimate,
    /// Every candidate in evaluation order.
    pub candidates: Vec<CandidateEvaluation>,
    pub rationale: Vec<String>,
    pub suggestions: Vec<String>,
}

impl RoutingDecision {
    /// Viable candidates, best first.
    pub fn ranking(&self) -> Vec<&CandidateEvaluation> {
        let mut ranked: Vec<_> = self.candidates.iter().filter(|c| c.rank.is_some()).collect();
        ranked.sort_by_key(|c| c.rank);
        ranked
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouterError {
    #[error("no provider satisfies rule '{rule_name}' for this scenario")]
    NoViableProvider {
        rule_id: u64,
        rule_name: String,
        candidates: Vec<CandidateEvaluation>,
        suggestions: Vec<String>,
    },
    #[error("estimation failed for {provider}: {reason}")]
    Estimation { provider: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RouterError>;
