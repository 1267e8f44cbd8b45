use crate::error::{parse_id, ApiError};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tf_core::wire::{RuleInput, ScenarioInput};
use tf_sandbox::{ScenarioSource, TestReport};

type ApiResult<T> = Result<T, ApiError>;
type JsonBody<T> = Result<Json<T>, JsonRejection>;

fn data<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

fn list<T: Serialize>(items: Vec<T>) -> Json<Value> {
    let count = items.len();
    Json(json!({ "success": true, "data": items, "count": count }))
}

fn created<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(json!({ "success": true, "data": data, "message": message })))
}

fn updated<T: Serialize>(data: T, message: &str) -> Json<Value> {
    Json(json!({ "success": true, "data": data, "message": message }))
}

fn deleted(message: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}

// ========== Health ==========

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(root)).route("/health", get(health))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "TokenFlow routing sandbox API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health",
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptimeSeconds": state.start_time.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "providers": state.registry.len(),
    }))
}

/// Everything served under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(provider_routes())
        .merge(rule_routes())
        .merge(scenario_routes())
        .merge(sandbox_routes())
}

// ========== Providers ==========

pub fn provider_routes() -> Router<AppState> {
    Router::new()
        .route("/providers", get(list_providers))
        .route("/providers/{name}", get(get_provider))
}

async fn list_providers(State(state): State<AppState>) -> Json<Value> {
    list(state.registry.list().to_vec())
}

async fn get_provider(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Json<Value>> {
    Ok(data(state.registry.get(&name)?))
}

// ========== Rules ==========

pub fn rule_routes() -> Router<AppState> {
    let mut router = Router::new();
    // `/routing-rules` is the dashboard client's path.
    for base in ["/rules", "/routing-rules"] {
        router = router
            .route(base, get(list_rules).post(create_rule))
            .route(&format!("{base}/{{id}}"), get(get_rule).put(update_rule).delete(delete_rule));
    }
    router
}

async fn list_rules(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(list(state.rules.list().await?))
}

async fn get_rule(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    Ok(data(state.rules.get(id).await?))
}

async fn create_rule(State(state): State<AppState>, body: JsonBody<RuleInput>) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(input) = body?;
    let rule = state.rules.create(input.into_rule()?).await?;
    Ok(created(rule, "routing rule created successfully"))
}

async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody<RuleInput>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    let Json(input) = body?;
    let rule = state.rules.update(id, input.into_rule()?).await?;
    Ok(updated(rule, "routing rule updated successfully"))
}

async fn delete_rule(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    state.rules.delete(id).await?;
    Ok(deleted("routing rule deleted successfully"))
}

// ========== Scenarios ==========

pub fn scenario_routes() -> Router<AppState> {
    let mut router = Router::new();
    for base in ["/scenarios", "/sandbox/scenarios"] {
        router = router
            .route(base, get(list_scenarios).post(create_scenario))
            .route(
                &format!("{base}/{{id}}"),
                get(get_scenario).put(update_scenario).delete(delete_scenario),
            );
    }
    router
}

async fn list_scenarios(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(list(state.scenarios.list().await?))
}

async fn get_scenario(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    Ok(data(state.scenarios.get(id).await?))
}

async fn create_scenario(
    State(state): State<AppState>,
    body: JsonBody<ScenarioInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(input) = body?;
    let scenario = state.scenarios.create(input.into_scenario()?).await?;
    Ok(created(scenario, "scenario created successfully"))
}

async fn update_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody<ScenarioInput>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    let Json(input) = body?;
    let scenario = state.scenarios.update(id, input.into_scenario()?).await?;
    Ok(updated(scenario, "scenario updated successfully"))
}

async fn delete_scenario(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    state.scenarios.delete(id).await?;
    Ok(deleted("scenario deleted successfully"))
}

// ========== Sandbox ==========

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxTestRequest {
    pub rule_id: u64,
    pub scenario_id: Option<u64>,
    #[serde(alias = "testData")]
    pub custom_input: Option<ScenarioInput>,
}

#[derive(Debug, Deserialize)]
pub struct SaveConfigurationRequest {
    pub name: Option<String>,
    pub report: TestReport,
}

pub fn sandbox_routes() -> Router<AppState> {
    Router::new()
        .route("/sandbox/test", post(run_test))
        .route("/sandbox/configurations", get(list_configurations).post(save_configuration))
        .route("/sandbox/configurations/{id}", get(get_configuration).delete(delete_configuration))
}

async fn run_test(State(state): State<AppState>, body: JsonBody<SandboxTestRequest>) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    let source = match (req.scenario_id, req.custom_input) {
        (Some(id), None) => ScenarioSource::Stored(id),
        (None, Some(input)) => ScenarioSource::Custom(input.into_scenario()?),
        _ => return Err(ApiError::bad_request("provide exactly one of scenarioId or customInput")),
    };
    let report = state.runner.run_test(req.rule_id, source).await?;
    Ok(data(report))
}

async fn list_configurations(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(list(state.runner.list_configurations().await?))
}

async fn save_configuration(
    State(state): State<AppState>,
    body: JsonBody<SaveConfigurationRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(req) = body?;
    let saved = state.runner.save_configuration(req.name, req.report).await?;
    Ok(created(saved, "configuration saved successfully"))
}

async fn get_configuration(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    Ok(data(state.runner.get_configuration(id).await?))
}

async fn delete_configuration(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    state.runner.delete_configuration(id).await?;
    Ok(deleted("configuration deleted successfully"))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Endpoint not found")
}
