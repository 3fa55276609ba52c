//! Shared state handed to the axum handlers.

use std::time::Instant;

use crate::config::{ApplicationConfig, StatusConfig};
use crate::jobs::JobRunner;

/// Cloning is cheap: the runner is a handle and the configs are small.
#[derive(Clone)]
pub struct AppState {
    pub runner: JobRunner,
    pub status: StatusConfig,
    pub application: ApplicationConfig,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(runner: JobRunner, status: StatusConfig, application: ApplicationConfig) -> Self {
        Self {
            runner,
            status,
            application,
            started_at: Instant::now(),
        }
    }
}
