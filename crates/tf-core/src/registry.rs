//! Read-only provider registry.

use crate::error::{Result, TfError};
use crate::types::{Provider, ProviderStatus};
use std::collections::HashMap;
use std::sync::Arc;

/// Provider reference data, loaded once and shared by clone.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Arc<Vec<Provider>>,
    index: Arc<HashMap<String, usize>>,
}

impl ProviderRegistry {
    /// Build a registry, rejecting invalid or duplicate providers.
    pub fn new(providers: Vec<Provider>) -> Result<Self> {
        let mut index = HashMap::with_capacity(providers.len());
        for (i, p) in providers.iter().enumerate() {
            p.validate()?;
            if index.insert(p.name.to_lowercase(), i).is_some() {
                return Err(TfError::validation(format!("duplicate provider: {}", p.name)));
            }
        }
        tracing::debug!(count = providers.len(), "provider registry built");
        Ok(Self { providers: Arc::new(providers), index: Arc::new(index) })
    }

    /// Look up a provider by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Result<&Provider> {
        self.index
            .get(&name.to_lowercase())
            .map(|&i| &self.providers[i])
            .ok_or_else(|| TfError::not_found("provider", name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// Providers in registration order.
    pub fn list(&self) -> &[Provider] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

struct Figures {
    cost_per_1k: f64,
    latency: f64,
    reliability: f64,
    availability: f64,
}

fn provider(name: &str, figures: Figures, region: &str, models: &[&str], endpoint: &str) -> Provider {
    Provider {
        name: name.into(),
        cost_per_1k: figures.cost_per_1k,
        base_latency_ms: figures.latency,
        reliability: figures.reliability,
        availability: figures.availability,
        region: region.into(),
        status: ProviderStatus::Online,
        models: models.iter().map(|m| m.to_string()).collect(),
        endpoint: Some(endpoint.into()),
    }
}

/// Default provider catalogue.
pub fn default_providers() -> Vec<Provider> {
    vec![
        provider(
            "OpenAI",
            Figures { cost_per_1k: 0.02, latency: 150.0, reliability: 99.5, availability: 99.8 },
            "us-east-1",
            &["gpt-4", "gpt-4o", "gpt-4o-mini"],
            "https://api.openai.com/v1/chat/completions",
        ),
        provider(
            "Anthropic",
            Figures { cost_per_1k: 0.025, latency: 180.0, reliability: 99.2, availability: 99.2 },
            "us-west-2",
            &["claude-3", "claude-3-haiku", "claude-sonnet-4"],
            "https://api.anthropic.com/v1/messages",
        ),
        provider(
            "Google",
            Figures { cost_per_1k: 0.0125, latency: 210.0, reliability: 98.9, availability: 99.5 },
            "us-central1",
            &["gemini-pro", "gemini-2.5-flash"],
            "https://generativelanguage.googleapis.com/v1beta/models",
        ),
        provider(
            "Cohere",
            Figures { cost_per_1k: 0.015, latency: 240.0, reliability: 98.5, availability: 99.0 },
            "us-east-1",
            &["command-r", "command-r-plus"],
            "https://api.cohere.ai/v1/chat",
        ),
        provider(
            "Mistral",
            Figures { cost_per_1k: 0.008, latency: 260.0, reliability: 98.0, availability: 98.7 },
            "eu-west-1",
            &["mistral-large", "mistral-small"],
            "https://api.mistral.ai/v1/chat/completions",
        ),
    ]
}
