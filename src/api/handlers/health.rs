//! Liveness endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub name: String,
    pub version: String,
    pub uptime_secs: u64,
    pub runner: RunnerHealth,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Every permit of a bounded pool is taken; new fires are waiting
    Saturated,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunnerHealth {
    pub entries: usize,
    pub bounded: bool,
    pub pool_size: usize,
    pub in_flight: usize,
    pub self_concurrent: bool,
}

/// `GET /health`
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let gate = state.runner.gate();
    let runner = RunnerHealth {
        entries: state.runner.entries().len(),
        bounded: gate.is_bounded(),
        pool_size: gate.capacity(),
        in_flight: gate.in_flight(),
        self_concurrent: gate.self_concurrent(),
    };

    let status = if runner.bounded && runner.in_flight >= runner.pool_size {
        HealthStatus::Saturated
    } else {
        HealthStatus::Healthy
    };

    Json(HealthResponse {
        status,
        name: state.application.name.clone(),
        version: state.application.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        runner,
    })
}
