//! Process lifecycle: runner startup, status endpoint, graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;

use crate::api::routes::create_router;
use crate::config::{Environment, settings::Settings};
use crate::error::{AppError, AppResult};
use crate::jobs::tasks::{HeartbeatTask, heartbeat::HEARTBEAT_JOB_NAME};
use crate::jobs::{Job, JobRunner};
use crate::state::AppState;

pub struct Server {
    settings: Settings,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Starts the job runner, registers the configured jobs and serves the
    /// status endpoint until Ctrl+C or SIGTERM. The scheduler is shut down
    /// after the HTTP server has drained.
    pub async fn run(self) -> AppResult<()> {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %Environment::from_env(),
            "Application starting"
        );

        tracing::info!(
            level = %self.settings.logger.level,
            console_enabled = self.settings.logger.console.enabled,
            file_enabled = self.settings.logger.file.enabled,
            "Logger configuration loaded"
        );

        let runner = JobRunner::from_settings(&self.settings.runner).await?;
        register_builtin_jobs(&runner, &self.settings).await?;

        let state = AppState::new(
            runner.clone(),
            self.settings.status.clone(),
            self.settings.application.clone(),
        );
        let router = create_router(state);

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            AppError::from(anyhow::anyhow!("Failed to bind to {}: {}", address, e))
        })?;

        tracing::info!(
            address = %address,
            status_enabled = self.settings.status.enabled,
            "Server listening"
        );

        let served = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await;

        runner.shutdown().await?;
        served.map_err(|e| AppError::from(anyhow::Error::new(e)))?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

async fn register_builtin_jobs(runner: &JobRunner, settings: &Settings) -> AppResult<()> {
    if let Some(spec) = &settings.runner.heartbeat {
        let task = HeartbeatTask::new(format!("{} is running", settings.application.name));
        let job = Arc::new(Job::new(HEARTBEAT_JOB_NAME, Arc::new(task)));
        runner.schedule(spec, job).await?;
    }
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM. A handler that cannot be installed never
/// resolves, leaving the other one in charge.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
