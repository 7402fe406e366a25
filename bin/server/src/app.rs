//! Router construction.

use crate::auth;
use crate::state::AppState;
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

/// Builds the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/signup", post(auth::signup))
        .with_state(state)
}

/// The load balancer checks this path, as does the deployment hook.
async fn root() -> &'static str {
    "Hello World"
}

async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "ok" }))
}
