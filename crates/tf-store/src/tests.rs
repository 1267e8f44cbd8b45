use crate::*;
use std::sync::Arc;
use tf_core::registry::default_providers;
use tf_core::*;

fn registry() -> ProviderRegistry {
    ProviderRegistry::new(default_providers()).unwrap()
}

fn rule() -> RoutingRule {
    RoutingRule::new("Cost first", Priority::Cost, "OpenAI").with_fallbacks(["Anthropic", "Google"])
}

// ========== Memory Store ==========

#[tokio::test]
async fn test_memory_create_assigns_ids() {
    let store = MemoryStore::<RoutingRule>::new();
    let a = store.create(rule()).await.unwrap();
    let mut with_id = rule();
    with_id.id = 99;
    let b = store.create(with_id).await.unwrap();
    assert_eq!(a.id, 1);
    assert_eq!(b.id, 2);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_memory_get_missing() {
    let store = MemoryStore::<TestScenario>::new();
    let err = store.get(7).await.unwrap_err();
    assert!(matches!(err, TfError::NotFound { kind: "sandbox_scenario", .. }));
}

#[tokio::test]
async fn test_memory_update_keeps_id() {
    let store = MemoryStore::<RoutingRule>::new();
    let created = store.create(rule()).await.unwrap();
    let mut changed = rule();
    changed.name = "renamed".into();
    let updated = store.update(created.id, changed).await.unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(store.get(created.id).await.unwrap().name, "renamed");
}

#[tokio::test]
async fn test_memory_update_missing() {
    let store = MemoryStore::<RoutingRule>::new();
    assert!(matches!(store.update(3, rule()).await, Err(TfError::NotFound { .. })));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_memory_delete() {
    let store = MemoryStore::<RoutingRule>::new();
    let created = store.create(rule()).await.unwrap();
    store.delete(created.id).await.unwrap();
    assert!(store.get(created.id).await.is_err());
    assert!(store.delete(created.id).await.is_err());
}

#[tokio::test]
async fn test_memory_list_in_id_order() {
    let store = MemoryStore::<TestScenario>::new();
    for tokens in [30, 10, 20] {
        store.create(TestScenario::new("gpt-4", tokens, Complexity::Simple)).await.unwrap();
    }
    let tokens: Vec<u64> = store.list().await.unwrap().iter().map(|s| s.tokens).collect();
    assert_eq!(tokens, vec![30, 10, 20]);
}

#[tokio::test]
async fn test_memory_concurrent_creates_unique_ids() {
    let store = Arc::new(MemoryStore::<TestScenario>::new());
    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.create(TestScenario::new("gpt-4", 10, Complexity::Simple)).await.unwrap().id
        }));
    }
    let mut ids = Vec::new();
    for h in handles {
        ids.push(h.await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 16);
}

// ========== Rule Validation ==========

#[test]
fn test_validate_rule_ok() {
    assert!(validate_rule(&rule(), &registry()).is_ok());
}

#[test]
fn test_validate_rule_target_in_fallbacks() {
    let r = rule().with_fallbacks(["Anthropic", "openai"]);
    assert!(matches!(validate_rule(&r, &registry()), Err(TfError::Validation(_))));
}

#[test]
fn test_validate_rule_duplicate_fallbacks() {
    let r = rule().with_fallbacks(["Anthropic", "Google", "anthropic"]);
    let err = validate_rule(&r, &registry()).unwrap_err();
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn test_validate_rule_unknown_providers() {
    let r = RoutingRule::new("r", Priority::Cost, "Nowhere");
    assert!(validate_rule(&r, &registry()).is_err());
    let r = rule().with_fallbacks(["Nowhere"]);
    assert!(validate_rule(&r, &registry()).is_err());
}

#[test]
fn test_validate_rule_empty_name() {
    let mut r = rule();
    r.name = "  ".into();
    assert!(validate_rule(&r, &registry()).is_err());
}

#[test]
fn test_validate_rule_bad_conditions() {
    let r = rule().with_conditions(RuleConditions { min_success_rate: Some(150.0), ..Default::default() });
    assert!(validate_rule(&r, &registry()).is_err());
}

// ========== Rule Store ==========

#[tokio::test]
async fn test_rule_store_create_invalid_leaves_store_unchanged() {
    let store = RuleStore::in_memory(registry());
    let bad = rule().with_fallbacks(["OpenAI"]);
    assert!(matches!(store.create(bad).await, Err(TfError::Validation(_))));
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rule_store_update_invalid_leaves_rule_unchanged() {
    let store = RuleStore::in_memory(registry());
    let created = store.create(rule()).await.unwrap();
    let bad = rule().with_fallbacks(["Google", "Google"]);
    assert!(matches!(store.update(created.id, bad).await, Err(TfError::Validation(_))));
    assert_eq!(store.get(created.id).await.unwrap(), created);
}

#[tokio::test]
async fn test_rule_store_update_missing() {
    let store = RuleStore::in_memory(registry());
    assert!(matches!(store.update(42, rule()).await, Err(TfError::NotFound { .. })));
}

#[tokio::test]
async fn test_rule_store_crud() {
    let store = RuleStore::in_memory(registry());
    let created = store.create(rule()).await.unwrap();
    let mut changed = created.clone();
    changed.priority = Priority::Speed;
    let updated = store.update(created.id, changed).await.unwrap();
    assert_eq!(updated.priority, Priority::Speed);
    store.delete(created.id).await.unwrap();
    assert!(matches!(store.get(created.id).await, Err(TfError::NotFound { .. })));
}

#[tokio::test]
async fn test_rule_store_stores_registered_provider_names() {
    let store = RuleStore::in_memory(registry());
    let padded = RoutingRule::new("padded", Priority::Cost, " OpenAI ").with_fallbacks([" anthropic", "GOOGLE\t"]);
    let created = store.create(padded).await.unwrap();
    assert_eq!(created.target_provider, "OpenAI");
    assert_eq!(created.fallback_providers, vec!["Anthropic", "Google"]);

    let mut changed = created.clone();
    changed.target_provider = "mistral ".into();
    let updated = store.update(created.id, changed).await.unwrap();
    assert_eq!(updated.target_provider, "Mistral");
    assert_eq!(store.get(created.id).await.unwrap().target_provider, "Mistral");
}

#[tokio::test]
async fn test_rule_store_padded_duplicates_still_rejected() {
    let store = RuleStore::in_memory(registry());
    let dup = RoutingRule::new("dup", Priority::Cost, "OpenAI").with_fallbacks([" google", "Google "]);
    assert!(matches!(store.create(dup).await, Err(TfError::Validation(_))));
    let self_ref = RoutingRule::new("self", Priority::Cost, " openai").with_fallbacks(["OpenAI "]);
    assert!(matches!(store.create(self_ref).await, Err(TfError::Validation(_))));
    let unknown = RoutingRule::new("unknown", Priority::Cost, " Nope ");
    assert!(matches!(store.create(unknown).await, Err(TfError::Validation(_))));
    assert!(store.list().await.unwrap().is_empty());
}

#[test]
fn test_normalize_rule_keeps_unknown_trimmed() {
    let rule = RoutingRule::new("r", Priority::Speed, "  Nope").with_fallbacks([" cohere "]);
    let normalized = normalize_rule(rule, &registry());
    assert_eq!(normalized.target_provider, "Nope");
    assert_eq!(normalized.fallback_providers, vec!["Cohere"]);
}

// ========== Scenario Store ==========

#[tokio::test]
async fn test_scenario_store_validates() {
    let store = ScenarioStore::in_memory();
    assert!(store.create(TestScenario::new("gpt-4", 0, Complexity::Simple)).await.is_err());
    assert!(store.create(TestScenario::new("", 10, Complexity::Simple)).await.is_err());
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_scenario_store_seed() {
    let store = ScenarioStore::in_memory();
    let n = store.seed(tf_core::config::default_scenarios()).await.unwrap();
    assert_eq!(n, 3);
    assert_eq!(store.get(1).await.unwrap().name, "Simple Q&A");
}
