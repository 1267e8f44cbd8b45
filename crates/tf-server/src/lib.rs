//! TokenFlow HTTP API server (Axum).
//!
//! Provides REST endpoints for the provider registry, routing-rule and
//! scenario CRUD, sandbox test runs, saved configurations and health.

pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use state::AppState;
use tower_http::trace::TraceLayer;

/// Build the application router with all routes.
pub fn app() -> Router {
    let state = AppState::new();
    app_with_state(state)
}

/// Build the application router with a custom state.
pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .nest("/api", routes::api_routes())
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests;
