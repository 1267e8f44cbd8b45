//! Rule evaluation and provider selection.

use crate::estimator::Estimator;
use crate::suggest;
use crate::types::*;
use std::cmp::Ordering;
use tf_core::config::{ConfidenceConfig, RoutingConfig, SuggestionConfig};
use tf_core::registry::ProviderRegistry;
use tf_core::types::{Priority, Provider, ProviderStatus, RoutingRule, RuleConditions, TestScenario};

/// Evaluates a rule's candidate chain and picks a winner by priority.
///
/// Holds configuration only. `decide` reads the registry and never mutates
/// anything, so one engine can serve concurrent callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionEngine {
    estimator: Estimator,
    confidence: ConfidenceConfig,
    suggestions: SuggestionConfig,
}

impl DecisionEngine {
    pub fn new(config: &RoutingConfig) -> Self {
        Self {
            estimator: Estimator::new(config.estimator),
            confidence: config.confidence,
            suggestions: config.suggestions,
        }
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    /// Evaluate `rule` for `scenario`.
    ///
    /// Candidates are the target followed by the fallbacks. Each is estimated
    /// and checked against the rule's conditions; rejected candidates stay in
    /// the output with their reasons. Fails with
    /// [`RouterError::NoViableProvider`] when every candidate is rejected.
    pub fn decide(
        &self,
        rule: &RoutingRule,
        scenario: &TestScenario,
        registry: &ProviderRegistry,
    ) -> Result<RoutingDecision> {
        let mut candidates = rule
            .candidates()
            .into_iter()
            .enumerate()
            .map(|(position, name)| self.evaluate(position, name, &rule.conditions, scenario, registry))
            .collect::<Result<Vec<_>>>()?;

        let viable: Vec<(usize, Estimate)> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_viable())
            .filter_map(|(i, c)| c.estimate.map(|e| (i, e)))
            .collect();

        if viable.is_empty() {
            tracing::info!(rule_id = rule.id, candidates = candidates.len(), "no viable provider");
            let suggestions = suggest::for_rejection(&candidates);
            return Err(RouterError::NoViableProvider {
                rule_id: rule.id,
                rule_name: rule.name.clone(),
                candidates,
                suggestions,
            });
        }

        let estimates: Vec<Estimate> = viable.iter().map(|(_, e)| *e).collect();
        let scores = balanced_scores(&estimates);
        let mut ranked: Vec<(usize, Estimate, f64)> = viable
            .into_iter()
            .zip(scores)
            .map(|((i, e), s)| (i, e, s))
            .collect();
        // Stable sort: full ties keep candidate order, so the target wins them.
        ranked.sort_by(|a, b| compare(rule.priority, (&a.1, a.2), (&b.1, b.2)));

        for (rank, (i, _, score)) in ranked.iter().enumerate() {
            candidates[*i].rank = Some(rank + 1);
            candidates[*i].score = Some(*score);
        }

        let (winner, estimate, winner_score) = ranked[0];
        let runner_up = ranked.get(1).copied();
        let margin = margin(
            rule.priority,
            &estimate,
            winner_score,
            runner_up.map(|(_, e, s)| (e, s)),
        );
        let confidence = self.confidence_from(margin);

        let rationale = rationale(
            rule,
            scenario,
            &candidates,
            winner,
            runner_up.map(|(i, _, _)| i),
            margin,
            confidence,
        );
        let suggestions = suggest::for_decision(rule, scenario, &candidates, winner, &self.suggestions);

        let selected = &candidates[winner];
        let selected_provider = selected.provider.clone();
        let selected_model = selected.model.clone().unwrap_or_else(|| scenario.model.clone());
        tracing::info!(
            rule_id = rule.id,
            provider = %selected_provider,
            model = %selected_model,
            confidence,
            "routing decision"
        );

        Ok(RoutingDecision {
            rule_id: rule.id,
            priority: rule.priority,
            selected_provider,
            selected_model,
            confidence,
            estimate,
            candidates,
            rationale,
            suggestions,
        })
    }

    fn evaluate(
        &self,
        position: usize,
        name: &str,
        conditions: &RuleConditions,
        scenario: &TestScenario,
        registry: &ProviderRegistry,
    ) -> Result<CandidateEvaluation> {
        let role = if position == 0 { CandidateRole::Target } else { CandidateRole::Fallback };
        let mut eval = CandidateEvaluation {
            provider: name.to_string(),
            role,
            position,
            model: None,
            estimate: None,
            rejections: Vec::new(),
            rank: None,
            score: None,
        };

        let provider = match registry.get(name) {
            Ok(p) => p,
            Err(_) => {
                tracing::debug!(provider = name, "candidate not in registry");
                eval.rejections.push(Rejection::UnknownProvider);
                return Ok(eval);
            }
        };
        eval.provider = provider.name.clone();

        if provider.status == ProviderStatus::Offline {
            tracing::debug!(provider = %provider.name, "candidate offline");
            eval.rejections.push(Rejection::Offline);
            return Ok(eval);
        }

        let estimate = self.estimator.estimate(provider, scenario);
        if !estimate.is_finite() {
            return Err(RouterError::Estimation {
                provider: provider.name.clone(),
                reason: format!("non-finite estimate {estimate:?}"),
            });
        }

        eval.rejections = check_conditions(&estimate, conditions);
        if !eval.rejections.is_empty() {
            tracing::debug!(provider = %provider.name, reasons = ?eval.rejections, "candidate rejected");
        }
        eval.model = Some(resolve_model(provider, &scenario.model));
        eval.estimate = Some(estimate);
        Ok(eval)
    }

    fn confidence_from(&self, margin: f64) -> u8 {
        let ratio = (margin / self.confidence.saturation_margin).min(1.0);
        (50.0 + 50.0 * ratio).round().clamp(50.0, 100.0) as u8
    }
}

fn check_conditions(estimate: &Estimate, conditions: &RuleConditions) -> Vec<Rejection> {
    let mut rejections = Vec::new();
    if let Some(max) = conditions.max_cost {
        if estimate.cost > max {
            rejections.push(Rejection::CostExceeded { estimated: estimate.cost, max });
        }
    }
    if let Some(max) = conditions.max_latency {
        if estimate.latency_ms > max {
            rejections.push(Rejection::LatencyExceeded { estimated: estimate.latency_ms, max });
        }
    }
    if let Some(min) = conditions.min_success_rate {
        if estimate.reliability < min {
            rejections.push(Rejection::ReliabilityBelow { estimated: estimate.reliability, min });
        }
    }
    rejections
}

/// The requested model if served, else the provider's first listed model.
fn resolve_model(provider: &Provider, requested: &str) -> String {
    if provider.serves(requested) {
        return requested.to_string();
    }
    provider.models.first().cloned().unwrap_or_else(|| requested.to_string())
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

fn normalize(value: f64, (min, max): (f64, f64), flat: f64) -> f64 {
    let range = max - min;
    if range > 0.0 {
        (value - min) / range
    } else {
        flat
    }
}

/// Equal-weight mean of inverted normalized cost, inverted normalized
/// latency and normalized reliability.
fn balanced_scores(estimates: &[Estimate]) -> Vec<f64> {
    let cost = bounds(estimates.iter().map(|e| e.cost));
    let latency = bounds(estimates.iter().map(|e| e.latency_ms));
    let reliability = bounds(estimates.iter().map(|e| e.reliability));
    estimates
        .iter()
        .map(|e| {
            let nc = normalize(e.cost, cost, 0.0);
            let nl = normalize(e.latency_ms, latency, 0.0);
            let nr = normalize(e.reliability, reliability, 1.0);
            ((1.0 - nc) + (1.0 - nl) + nr) / 3.0
        })
        .collect()
}

fn compare(priority: Priority, (a, score_a): (&Estimate, f64), (b, score_b): (&Estimate, f64)) -> Ordering {
    match priority {
        Priority::Cost => a.cost.total_cmp(&b.cost).then_with(|| a.latency_ms.total_cmp(&b.latency_ms)),
        Priority::Speed => a.latency_ms.total_cmp(&b.latency_ms).then_with(|| a.cost.total_cmp(&b.cost)),
        Priority::Reliability => b.reliability.total_cmp(&a.reliability).then_with(|| a.cost.total_cmp(&b.cost)),
        Priority::Balanced => score_b.total_cmp(&score_a),
    }
}

fn relative_gap(best: f64, other: f64) -> f64 {
    if other > 0.0 {
        (other - best) / other
    } else {
        0.0
    }
}

/// Winner's lead over the runner-up on the priority's primary metric.
/// A sole viable candidate has margin 1.
fn margin(priority: Priority, winner: &Estimate, winner_score: f64, runner_up: Option<(Estimate, f64)>) -> f64 {
    let Some((runner, runner_score)) = runner_up else {
        return 1.0;
    };
    let m = match priority {
        Priority::Cost => relative_gap(winner.cost, runner.cost),
        Priority::Speed => relative_gap(winner.latency_ms, runner.latency_ms),
        Priority::Reliability if winner.reliability > 0.0 => {
            (winner.reliability - runner.reliability) / winner.reliability
        }
        Priority::Reliability => 0.0,
        Priority::Balanced => winner_score - runner_score,
    };
    if m.is_finite() {
        m.max(0.0)
    } else {
        0.0
    }
}

fn describe(c: &CandidateEvaluation) -> String {
    let reasons = || c.rejections.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
    match (&c.estimate, c.is_viable()) {
        (Some(e), true) => format!(
            "{}: cost {:.4}, latency {:.0} ms, reliability {:.1}, viable",
            c.label(),
            e.cost,
            e.latency_ms,
            e.reliability
        ),
        (Some(e), false) => format!(
            "{}: cost {:.4}, latency {:.0} ms, reliability {:.1}, rejected: {}",
            c.label(),
            e.cost,
            e.latency_ms,
            e.reliability,
            reasons()
        ),
        (None, _) => format!("{}: rejected: {}", c.label(), reasons()),
    }
}

fn rationale(
    rule: &RoutingRule,
    scenario: &TestScenario,
    candidates: &[CandidateEvaluation],
    winner: usize,
    runner_up: Option<usize>,
    margin: f64,
    confidence: u8,
) -> Vec<String> {
    let mut lines: Vec<String> = candidates.iter().map(describe).collect();

    let w = &candidates[winner];
    let viable = candidates.iter().filter(|c| c.is_viable()).count();
    lines.push(format!(
        "Selected {} by {} priority among {} viable candidate{}",
        w.provider,
        rule.priority,
        viable,
        if viable == 1 { "" } else { "s" }
    ));

    if let Some(model) = &w.model {
        if !model.eq_ignore_ascii_case(&scenario.model) {
            lines.push(format!("{} does not serve {}; using {}", w.provider, scenario.model, model));
        }
    }

    match runner_up {
        Some(r) if rule.priority == Priority::Balanced => lines.push(format!(
            "Confidence {confidence} from a score margin of {margin:.3} over {}",
            candidates[r].provider
        )),
        Some(r) => lines.push(format!(
            "Confidence {confidence} from a {:.1}% margin over {}",
            margin * 100.0,
            candidates[r].provider
        )),
        None => lines.push(format!("Confidence {confidence}: no other candidate was viable")),
    }
    lines
}
