//! Service info and health handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::{ApiInfo, HealthResponse};
use crate::state::AppState;

/// Service name, version and endpoint list.
pub async fn root() -> Json<ApiInfo> {
    Json(ApiInfo::current())
}

/// Liveness plus whether the engine has been loaded yet.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.generation.is_ready()))
}
