//! Routing-rule store enforcing the fallback invariant.

use crate::memory::MemoryStore;
use crate::record::RecordStore;
use std::sync::Arc;
use tf_core::error::{Result, TfError};
use tf_core::registry::ProviderRegistry;
use tf_core::types::RoutingRule;

/// Check a rule against the registry. The fallback list must exclude the
/// target and hold no duplicates; every provider must be registered.
pub fn validate_rule(rule: &RoutingRule, registry: &ProviderRegistry) -> Result<()> {
    if rule.name.trim().is_empty() {
        return Err(TfError::validation("rule name must not be empty"));
    }
    rule.conditions.validate()?;

    let target = rule.target_provider.trim();
    if target.is_empty() {
        return Err(TfError::validation("target provider is required"));
    }
    if !registry.contains(target) {
        return Err(TfError::validation(format!("unknown target provider: {target}")));
    }

    let mut seen: Vec<&str> = Vec::with_capacity(rule.fallback_providers.len());
    for fallback in &rule.fallback_providers {
        let name = fallback.trim();
        if name.is_empty() {
            return Err(TfError::validation("fallback provider names must not be empty"));
        }
        if name.eq_ignore_ascii_case(target) {
            return Err(TfError::validation(format!(
                "fallback providers must not include the target provider {target}"
            )));
        }
        if seen.iter().any(|s| s.eq_ignore_ascii_case(name)) {
            return Err(TfError::validation(format!("duplicate fallback provider: {name}")));
        }
        if !registry.contains(name) {
            return Err(TfError::validation(format!("unknown fallback provider: {name}")));
        }
        seen.push(name);
    }
    Ok(())
}

/// Rewrite provider references to their registered spelling. Unknown names
/// are only trimmed so [`validate_rule`] can still reject them.
pub fn normalize_rule(mut rule: RoutingRule, registry: &ProviderRegistry) -> RoutingRule {
    let canonical = |name: &str| -> String {
        let name = name.trim();
        match registry.get(name) {
            Ok(provider) => provider.name.clone(),
            Err(_) => name.to_string(),
        }
    };
    rule.target_provider = canonical(&rule.target_provider);
    rule.fallback_providers = rule.fallback_providers.iter().map(|f| canonical(f)).collect();
    rule
}

/// Validating front for a rule [`RecordStore`]. Writes happen only after
/// validation passes.
#[derive(Clone)]
pub struct RuleStore {
    inner: Arc<dyn RecordStore<RoutingRule>>,
    registry: ProviderRegistry,
}

impl RuleStore {
    pub fn new(inner: Arc<dyn RecordStore<RoutingRule>>, registry: ProviderRegistry) -> Self {
        Self { inner, registry }
    }

    pub fn in_memory(registry: ProviderRegistry) -> Self {
        Self::new(Arc::new(MemoryStore::<RoutingRule>::new()), registry)
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub async fn list(&self) -> Result<Vec<RoutingRule>> {
        self.inner.list().await
    }

    pub async fn get(&self, id: u64) -> Result<RoutingRule> {
        self.inner.get(id).await
    }

    pub async fn create(&self, rule: RoutingRule) -> Result<RoutingRule> {
        let rule = normalize_rule(rule, &self.registry);
        validate_rule(&rule, &self.registry)?;
        let created = self.inner.create(rule).await?;
        tracing::info!(id = created.id, name = %created.name, "routing rule created");
        Ok(created)
    }

    pub async fn update(&self, id: u64, rule: RoutingRule) -> Result<RoutingRule> {
        let rule = normalize_rule(rule, &self.registry);
        validate_rule(&rule, &self.registry)?;
        self.inner.update(id, rule).await
    }

    pub async fn delete(&self, id: u64) -> Result<()> {
        self.inner.delete(id).await
    }
}
