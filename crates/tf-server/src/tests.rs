use crate::error::{ApiError, INVALID_ID};
use crate::state::AppState;
use crate::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tf_core::TfError;
use tower::ServiceExt;

async fn seeded_app() -> Router {
    let state = AppState::new();
    state.seed_scenarios().await.unwrap();
    app_with_state(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&v).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn cost_rule() -> Value {
    json!({
        "name": "Cost first",
        "priority": "cost",
        "conditions": { "maxLatency": 500.0 },
        "targetProvider": "OpenAI",
        "fallbackProviders": ["Anthropic"]
    })
}

// ========== Health & Fallback ==========

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["providers"], 5);
}

#[tokio::test]
async fn test_root_info() {
    let (status, body) = send(&app(), "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["health"], "/health");
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, body) = send(&app(), "GET", "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Endpoint not found");
    assert_eq!(body["code"], "not_found");
}

// ========== Providers ==========

#[tokio::test]
async fn test_list_providers() {
    let (status, body) = send(&app(), "GET", "/api/providers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 5);
    assert_eq!(body["data"][0]["name"], "OpenAI");
    assert_eq!(body["data"][0]["costPer1k"], 0.02);
}

#[tokio::test]
async fn test_get_provider_case_insensitive() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/providers/anthropic", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Anthropic");
    let (status, _) = send(&app, "GET", "/api/providers/Nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ========== Rules ==========

#[tokio::test]
async fn test_rule_crud() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/rules", Some(cost_rule())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "routing rule created successfully");
    let id = body["data"]["id"].as_u64().unwrap();

    let (status, body) = send(&app, "GET", &format!("/api/rules/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["targetProvider"], "OpenAI");

    let mut changed = cost_rule();
    changed["priority"] = json!("speed");
    let (status, body) = send(&app, "PUT", &format!("/api/rules/{id}"), Some(changed)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["priority"], "speed");
    assert_eq!(body["data"]["id"], id);

    let (status, body) = send(&app, "GET", "/api/rules", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/rules/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/api/rules/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_rule_record_shape() {
    let record = json!({
        "Name": "Fast",
        "priority": "speed",
        "conditions_max_latency": 400,
        "target_provider": "Google",
        "fallback_providers": "Mistral, Cohere"
    });
    let (status, body) = send(&app(), "POST", "/api/rules", Some(record)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "Fast");
    assert_eq!(body["data"]["fallbackProviders"], json!(["Mistral", "Cohere"]));
    assert_eq!(body["data"]["conditions"]["maxLatency"], 400.0);
}

#[tokio::test]
async fn test_padded_provider_names_stored_canonical() {
    let app = seeded_app().await;
    let mut padded = cost_rule();
    padded["targetProvider"] = json!(" openai ");
    padded["fallbackProviders"] = json!([" Anthropic"]);
    let (status, body) = send(&app, "POST", "/api/rules", Some(padded)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["targetProvider"], "OpenAI");
    assert_eq!(body["data"]["fallbackProviders"], json!(["Anthropic"]));

    let id = body["data"]["id"].as_u64().unwrap();
    let run = json!({ "ruleId": id, "scenarioId": 2 });
    let (status, body) = send(&app, "POST", "/api/sandbox/test", Some(run)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"]["status"], "routed");
    assert_eq!(body["data"]["outcome"]["decision"]["selectedProvider"], "OpenAI");
}

#[tokio::test]
async fn test_routing_rules_alias() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/routing-rules", Some(cost_rule())).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_u64().unwrap();
    let (status, body) = send(&app, "GET", &format!("/api/rules/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Cost first");
    let (_, body) = send(&app, "GET", "/api/routing-rules", None).await;
    assert_eq!(body["count"], 1);
    let (status, _) = send(&app, "DELETE", &format!("/api/routing-rules/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_rule_rejected_and_store_unchanged() {
    let app = app();
    let mut bad = cost_rule();
    bad["fallbackProviders"] = json!(["Anthropic", "openai"]);
    let (status, body) = send(&app, "POST", "/api/rules", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
    let (_, body) = send(&app, "GET", "/api/rules", None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_unknown_priority_is_bad_request() {
    let record = json!({ "Name": "x", "priority": "fastest", "target_provider": "Google" });
    let (status, _) = send(&app(), "POST", "/api/rules", Some(record)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_id_format() {
    let app = app();
    let cases = [
        ("GET", "/api/rules/abc"),
        ("DELETE", "/api/scenarios/1.5"),
        ("GET", "/api/sandbox/configurations/-1"),
    ];
    for (method, uri) in cases {
        let (status, body) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(body["error"], INVALID_ID);
    }
}

#[tokio::test]
async fn test_update_missing_rule() {
    let (status, _) = send(&app(), "PUT", "/api/rules/42", Some(cost_rule())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_json() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/rules")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ========== Scenarios ==========

#[tokio::test]
async fn test_seeded_scenarios() {
    let (status, body) = send(&seeded_app().await, "GET", "/api/scenarios", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["data"][1]["name"], "Code Generation");
}

#[tokio::test]
async fn test_create_scenario_record_shape() {
    let app = app();
    let record = json!({
        "Name": "Batch",
        "model": "gpt-4o",
        "tokens": 2000,
        "complexity": "complex",
        "parameters_temperature": 0.2,
        "parameters_max_tokens": 512
    });
    let (status, body) = send(&app, "POST", "/api/scenarios", Some(record)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["complexity"], "complex");
    assert_eq!(body["data"]["parameters"]["maxTokens"], 512);

    let bad = json!({ "model": "gpt-4o", "tokens": 0 });
    let (status, _) = send(&app, "POST", "/api/scenarios", Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_scenario_full_record_shape() {
    let app = seeded_app().await;
    let record = json!({
        "Name": "Q&A",
        "Tags": "chat,faq",
        "Owner": 7,
        "description": "Short answer",
        "model": "gpt-4",
        "tokens": 500,
        "complexity": "simple",
        "category": "chat",
        "parameters_temperature": 0.4,
        "parameters_max_tokens": 128,
        "parameters_top_p": 0.9
    });
    let (status, body) = send(&app, "POST", "/api/sandbox/scenarios", Some(record.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "Q&A");
    assert_eq!(body["data"]["tags"], json!(["chat", "faq"]));
    assert_eq!(body["data"]["parameters"]["maxTokens"], 128);
    let id = body["data"]["id"].as_u64().unwrap();
    let (status, body) = send(&app, "GET", &format!("/api/scenarios/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["complexity"], "simple");

    let mut out_of_range = record;
    out_of_range["parameters_temperature"] = json!(3.5);
    out_of_range["parameters_max_tokens"] = json!(0);
    let (status, body) = send(&app, "POST", "/api/scenarios", Some(out_of_range)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
    let (_, body) = send(&app, "GET", "/api/sandbox/scenarios", None).await;
    assert_eq!(body["count"], 4);
}

#[tokio::test]
async fn test_mixed_scenario_shape_rejected() {
    let mixed = json!({
        "Name": "mixed",
        "model": "gpt-4",
        "tokens": 500,
        "parameters": { "temperature": 3.5 }
    });
    let (status, body) = send(&app(), "POST", "/api/scenarios", Some(mixed)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("mixes"));
}

// ========== Sandbox ==========

#[tokio::test]
async fn test_sandbox_stored_scenario() {
    let app = seeded_app().await;
    send(&app, "POST", "/api/rules", Some(cost_rule())).await;
    let (status, body) = send(&app, "POST", "/api/sandbox/test", Some(json!({ "ruleId": 1, "scenarioId": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    let report = &body["data"];
    assert_eq!(report["outcome"]["status"], "routed");
    assert_eq!(report["outcome"]["decision"]["selectedProvider"], "OpenAI");
    assert_eq!(report["outcome"]["decision"]["confidence"], 70);
    assert_eq!(report["scenarioId"], 2);
}

#[tokio::test]
async fn test_sandbox_custom_input_alias() {
    let app = app();
    send(&app, "POST", "/api/rules", Some(cost_rule())).await;
    let req = json!({ "ruleId": 1, "testData": { "model": "gpt-4", "tokens": 1000, "complexity": "medium" } });
    let (status, body) = send(&app, "POST", "/api/sandbox/test", Some(req)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["scenarioId"].is_null());
    assert_eq!(body["data"]["scenario"]["id"], 0);
}

#[tokio::test]
async fn test_sandbox_requires_one_scenario_source() {
    let app = seeded_app().await;
    send(&app, "POST", "/api/rules", Some(cost_rule())).await;
    let both = json!({ "ruleId": 1, "scenarioId": 1, "customInput": { "model": "gpt-4", "tokens": 10 } });
    let (status, _) = send(&app, "POST", "/api/sandbox/test", Some(both)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, "POST", "/api/sandbox/test", Some(json!({ "ruleId": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sandbox_unknown_rule() {
    let app = seeded_app().await;
    let (status, body) = send(&app, "POST", "/api/sandbox/test", Some(json!({ "ruleId": 9, "scenarioId": 1 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_sandbox_no_viable_provider_is_ok() {
    let app = seeded_app().await;
    let mut tight = cost_rule();
    tight["conditions"] = json!({ "maxCost": 0.001 });
    send(&app, "POST", "/api/rules", Some(tight)).await;
    let (status, body) = send(&app, "POST", "/api/sandbox/test", Some(json!({ "ruleId": 1, "scenarioId": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"]["status"], "noViableProvider");
    assert!(body["data"]["cost"].is_null());
}

#[tokio::test]
async fn test_configuration_round_trip() {
    let app = seeded_app().await;
    send(&app, "POST", "/api/rules", Some(cost_rule())).await;
    let (_, body) = send(&app, "POST", "/api/sandbox/test", Some(json!({ "ruleId": 1, "scenarioId": 2 }))).await;
    let report = body["data"].clone();

    let (status, body) = send(
        &app,
        "POST",
        "/api/sandbox/configurations",
        Some(json!({ "name": "baseline", "report": report })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_u64().unwrap();
    assert_eq!(body["data"]["name"], "baseline");
    assert_eq!(body["data"]["ruleId"], 1);
    assert!(body["data"]["createdAt"].is_string());

    let (status, body) = send(&app, "GET", &format!("/api/sandbox/configurations/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["report"]["ruleName"], "Cost first");
    assert_eq!(body["data"]["report"]["outcome"]["decision"]["selectedProvider"], "OpenAI");

    let (_, body) = send(&app, "GET", "/api/sandbox/configurations", None).await;
    assert_eq!(body["count"], 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/sandbox/configurations/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/api/sandbox/configurations/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ========== Error Mapping ==========

#[test]
fn test_error_status_mapping() {
    let cases = [
        (TfError::not_found("routing_rule", 3), StatusCode::NOT_FOUND),
        (TfError::validation("bad"), StatusCode::BAD_REQUEST),
        (TfError::Timeout("slow".into()), StatusCode::GATEWAY_TIMEOUT),
        (TfError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, expected) in cases {
        assert_eq!(ApiError::from(err).into_response().status(), expected);
    }
}

#[test]
fn test_internal_error_message_is_generic() {
    let err = ApiError::from(TfError::Internal("estimate was NaN".into()));
    assert_eq!(err.message, "internal server error");
    assert_eq!(err.code, "internal_error");
}
