//! Adapters between the flat record-store format and the canonical model.
//!
//! The record store keeps rules and scenarios as flat attribute bags
//! (`conditions_max_cost`, comma-joined `fallback_providers`,
//! `parameters_temperature`, ...). API handlers accept either shape through
//! [`RuleInput`] and [`ScenarioInput`].

use crate::error::{Result, TfError};
use crate::types::{GenerationParams, RoutingRule, RuleConditions, TestScenario};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Flat routing-rule record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,
    #[serde(rename = "Tags", alias = "tags", default)]
    pub tags: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions_max_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions_max_latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions_min_success_rate: Option<f64>,
    pub target_provider: String,
    #[serde(default)]
    pub fallback_providers: String,
}

impl TryFrom<RuleRecord> for RoutingRule {
    type Error = TfError;

    fn try_from(rec: RuleRecord) -> Result<Self> {
        let priority = match rec.priority.as_deref() {
            Some(p) if !p.trim().is_empty() => p.parse()?,
            _ => Default::default(),
        };
        Ok(RoutingRule {
            id: rec.id.unwrap_or_default(),
            name: rec.name,
            priority,
            conditions: RuleConditions {
                max_cost: rec.conditions_max_cost,
                max_latency: rec.conditions_max_latency,
                min_success_rate: rec.conditions_min_success_rate,
            },
            target_provider: rec.target_provider,
            fallback_providers: split_list(&rec.fallback_providers),
            tags: split_list(&rec.tags),
        })
    }
}

impl From<&RoutingRule> for RuleRecord {
    fn from(rule: &RoutingRule) -> Self {
        Self {
            id: Some(rule.id),
            name: rule.name.clone(),
            tags: rule.tags.join(","),
            priority: Some(rule.priority.to_string()),
            conditions_max_cost: rule.conditions.max_cost,
            conditions_max_latency: rule.conditions.max_latency,
            conditions_min_success_rate: rule.conditions.min_success_rate,
            target_provider: rule.target_provider.clone(),
            fallback_providers: rule.fallback_providers.join(","),
        }
    }
}

/// Flat sandbox-scenario record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioRecord {
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,
    #[serde(rename = "Tags", alias = "tags", default)]
    pub tags: String,
    /// Carried through the record store only; the model has no owner.
    #[serde(rename = "Owner", alias = "owner", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Value>,
    #[serde(default)]
    pub description: String,
    pub model: String,
    pub tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters_max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters_top_p: Option<f64>,
}

impl TryFrom<ScenarioRecord> for TestScenario {
    type Error = TfError;

    fn try_from(rec: ScenarioRecord) -> Result<Self> {
        let complexity = match rec.complexity.as_deref() {
            Some(c) if !c.trim().is_empty() => c.parse()?,
            _ => Default::default(),
        };
        Ok(TestScenario {
            id: rec.id.unwrap_or_default(),
            name: rec.name,
            description: rec.description,
            model: rec.model,
            tokens: rec.tokens,
            complexity,
            category: rec.category,
            parameters: GenerationParams {
                temperature: rec.parameters_temperature,
                max_tokens: rec.parameters_max_tokens,
                top_p: rec.parameters_top_p,
            },
            tags: split_list(&rec.tags),
        })
    }
}

impl From<&TestScenario> for ScenarioRecord {
    fn from(s: &TestScenario) -> Self {
        Self {
            id: Some(s.id),
            name: s.name.clone(),
            tags: s.tags.join(","),
            owner: None,
            description: s.description.clone(),
            model: s.model.clone(),
            tokens: s.tokens,
            complexity: Some(s.complexity.to_string()),
            category: s.category.clone(),
            parameters_temperature: s.parameters.temperature,
            parameters_max_tokens: s.parameters.max_tokens,
            parameters_top_p: s.parameters.top_p,
        }
    }
}

/// A rule body in either canonical or record shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RuleInput {
    Canonical(RoutingRule),
    Record(RuleRecord),
}

impl RuleInput {
    pub fn into_rule(self) -> Result<RoutingRule> {
        match self {
            RuleInput::Canonical(rule) => Ok(rule),
            RuleInput::Record(rec) => rec.try_into(),
        }
    }
}

/// Keys only the flat record shape uses.
const SCENARIO_RECORD_KEYS: &[&str] = &[
    "Id",
    "Name",
    "Tags",
    "Owner",
    "parameters_temperature",
    "parameters_max_tokens",
    "parameters_top_p",
];

/// Keys only the canonical shape uses.
const SCENARIO_CANONICAL_KEYS: &[&str] = &["id", "parameters"];

/// A scenario body in either record or canonical shape.
///
/// The shape is picked from the keys present. A body carrying keys of both
/// shapes is refused rather than half-read.
#[derive(Debug, Clone)]
pub enum ScenarioInput {
    Record(ScenarioRecord),
    Canonical(TestScenario),
}

impl ScenarioInput {
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(TfError::validation("scenario body must be a JSON object"));
        };
        let record_key = first_key(&map, SCENARIO_RECORD_KEYS);
        let canonical_key = first_key(&map, SCENARIO_CANONICAL_KEYS);
        match (record_key, canonical_key) {
            (Some(r), Some(c)) => Err(TfError::validation(format!(
                "scenario body mixes record key `{r}` with canonical key `{c}`"
            ))),
            (Some(_), None) => Ok(Self::Record(serde_json::from_value(Value::Object(map))?)),
            (None, Some(_)) => Ok(Self::Canonical(serde_json::from_value(Value::Object(map))?)),
            // Only shared keys: the strict record shape first, then the lenient one.
            (None, None) => match serde_json::from_value::<ScenarioRecord>(Value::Object(map.clone())) {
                Ok(rec) => Ok(Self::Record(rec)),
                Err(_) => Ok(Self::Canonical(serde_json::from_value(Value::Object(map))?)),
            },
        }
    }

    pub fn into_scenario(self) -> Result<TestScenario> {
        match self {
            ScenarioInput::Record(rec) => rec.try_into(),
            ScenarioInput::Canonical(s) => Ok(s),
        }
    }
}

fn first_key<'a>(map: &Map<String, Value>, keys: &[&'a str]) -> Option<&'a str> {
    keys.iter().copied().find(|k| map.contains_key(*k))
}

impl<'de> Deserialize<'de> for ScenarioInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}
