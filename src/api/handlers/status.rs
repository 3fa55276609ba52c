//! Job runner status endpoints, reachable from loopback callers only.

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    routing::get,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::api::middleware::local_only_middleware;
use crate::error::AppResult;
use crate::jobs::StatusData;
use crate::state::AppState;

/// `GET /jobrunner/status` and `GET /jobrunner/status/{id}`
pub fn status_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/jobrunner/status", get(list_status))
        .route("/jobrunner/status/{id}", get(entry_status))
        .route_layer(middleware::from_fn_with_state(state, local_only_middleware))
}

/// `{"jobrunner": [...]}` with one record per scheduler entry
pub async fn list_status(State(state): State<AppState>) -> AppResult<Json<JsonValue>> {
    Ok(Json(state.runner.status_json().await?))
}

pub async fn entry_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<StatusData>> {
    Ok(Json(state.runner.entry_status(id).await?))
}
