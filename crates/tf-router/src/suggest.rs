//! Rule-derived suggestions, computed from the candidate estimates.

use crate::types::{CandidateEvaluation, Rejection};
use tf_core::config::SuggestionConfig;
use tf_core::types::{Complexity, Priority, RoutingRule, TestScenario};

fn reasons(rejections: &[Rejection]) -> String {
    rejections.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Suggestions for a successful decision, in a fixed order.
pub(crate) fn for_decision(
    rule: &RoutingRule,
    scenario: &TestScenario,
    candidates: &[CandidateEvaluation],
    winner: usize,
    config: &SuggestionConfig,
) -> Vec<String> {
    let mut out = Vec::new();
    let w = &candidates[winner];
    let Some(estimate) = w.estimate else {
        return out;
    };

    if let Some(target) = candidates.first() {
        if !target.is_viable() {
            out.push(format!(
                "Target provider {} was rejected ({}); consider promoting {} to target",
                target.provider,
                reasons(&target.rejections),
                w.provider
            ));
        }
    }

    for c in candidates {
        if c.rejections.contains(&Rejection::UnknownProvider) {
            out.push(format!("Provider {} is not in the registry; remove it from the rule", c.provider));
        } else if c.rejections.contains(&Rejection::Offline) {
            out.push(format!("Provider {} is offline and was skipped", c.provider));
        }
    }

    if let Some(max) = rule.conditions.max_cost {
        if max > 0.0 && estimate.cost <= max * config.cost_headroom_ratio {
            out.push(format!(
                "Tighten max cost to increase savings: estimated cost {:.4} is under {:.0}% of the {:.4} limit",
                estimate.cost,
                config.cost_headroom_ratio * 100.0,
                max
            ));
        }
    }

    if let Some(max) = rule.conditions.max_latency {
        if max > 0.0 && estimate.latency_ms >= max * config.latency_headroom_ratio {
            out.push(format!(
                "Estimated latency {:.0} ms is close to the {:.0} ms limit; raise max latency or add a faster fallback",
                estimate.latency_ms, max
            ));
        }
    }

    let viable: Vec<&CandidateEvaluation> = candidates.iter().filter(|c| c.is_viable()).collect();
    if viable.len() == 1 {
        out.push("Only one provider satisfied the rule; add a fallback provider to improve resilience".into());
    }

    if rule.conditions.is_empty() {
        out.push("Rule has no conditions; add explicit cost or latency bounds".into());
    }

    if scenario.complexity == Complexity::Simple && rule.priority != Priority::Cost {
        let cheapest = viable
            .iter()
            .filter_map(|c| c.estimate.map(|e| (c.provider.as_str(), e.cost)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((provider, cost)) = cheapest {
            if estimate.cost > cost * config.simple_cost_ratio {
                out.push(format!(
                    "Consider cost priority for simple requests: {provider} would cost {cost:.4} instead of {:.4}",
                    estimate.cost
                ));
            }
        }
    }

    out
}

fn keep<'a>(slot: &mut Option<(&'a str, f64)>, provider: &'a str, value: f64, better: fn(f64, f64) -> bool) {
    match slot {
        Some((_, current)) if !better(value, *current) => {}
        _ => *slot = Some((provider, value)),
    }
}

/// Suggestions when every candidate was rejected: the smallest change to
/// each violated bound that would admit some candidate on that bound.
pub(crate) fn for_rejection(candidates: &[CandidateEvaluation]) -> Vec<String> {
    let mut cheapest: Option<(&str, f64)> = None;
    let mut fastest: Option<(&str, f64)> = None;
    let mut most_reliable: Option<(&str, f64)> = None;

    for c in candidates {
        for r in &c.rejections {
            match *r {
                Rejection::CostExceeded { estimated, .. } => {
                    keep(&mut cheapest, &c.provider, estimated, |a, b| a < b)
                }
                Rejection::LatencyExceeded { estimated, .. } => {
                    keep(&mut fastest, &c.provider, estimated, |a, b| a < b)
                }
                Rejection::ReliabilityBelow { estimated, .. } => {
                    keep(&mut most_reliable, &c.provider, estimated, |a, b| a > b)
                }
                Rejection::UnknownProvider | Rejection::Offline => {}
            }
        }
    }

    let mut out = Vec::new();
    if let Some((provider, cost)) = cheapest {
        out.push(format!(
            "Raise max cost to at least {:.4} to admit {provider} on cost",
            (cost * 10_000.0).ceil() / 10_000.0
        ));
    }
    if let Some((provider, latency)) = fastest {
        out.push(format!("Raise max latency to at least {:.0} ms to admit {provider} on latency", latency.ceil()));
    }
    if let Some((provider, reliability)) = most_reliable {
        out.push(format!(
            "Lower min success rate to {:.1} to admit {provider} on reliability",
            (reliability * 10.0).floor() / 10.0
        ));
    }
    if candidates.iter().all(|c| c.estimate.is_none()) {
        out.push("Every candidate is unknown or offline; add an available fallback provider".into());
    }
    out
}
