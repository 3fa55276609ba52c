use std::future::Future;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::config::settings::RunnerConfig;
use crate::jobs::error::JobResult;
use crate::jobs::gate::ConcurrencyGate;
use crate::jobs::job::Job;
use crate::jobs::scheduler::{Entry, EntryId, JobScheduler};
use crate::jobs::status::{StatusData, StatusReporter};

/// Scheduling context shared by everything that registers or inspects jobs.
///
/// Owns the concurrency gate and the scheduler; cloning is cheap and every
/// clone talks to the same scheduler.
#[derive(Clone)]
pub struct JobRunner {
    scheduler: JobScheduler,
    reporter: StatusReporter,
}

impl JobRunner {
    /// Creates and starts a runner from the positional startup options:
    /// `[pool_size, self_concurrency]`, both optional.
    pub async fn start(options: &[i64]) -> JobResult<Self> {
        Self::with_gate(ConcurrencyGate::from_options(options)).await
    }

    /// Creates and starts a runner from the `[runner]` settings section
    pub async fn from_settings(config: &RunnerConfig) -> JobResult<Self> {
        Self::with_gate(config.gate()).await
    }

    /// Creates and starts a runner around an already configured gate
    pub async fn with_gate(gate: ConcurrencyGate) -> JobResult<Self> {
        let pool_size = gate.capacity();
        let bounded = gate.is_bounded();
        let self_concurrent = gate.self_concurrent();

        let scheduler = JobScheduler::new(gate).await?;
        scheduler.start().await?;

        tracing::info!(pool_size, bounded, self_concurrent, "JobRunner started");

        Ok(Self {
            reporter: StatusReporter::new(scheduler.clone()),
            scheduler,
        })
    }

    /// Registers `job` to fire on `spec`
    pub async fn schedule(&self, spec: &str, job: Arc<Job>) -> JobResult<EntryId> {
        self.scheduler.schedule(spec, job).await
    }

    /// Registers an async closure under `name`
    pub async fn schedule_fn<F, Fut>(
        &self,
        spec: &str,
        name: impl Into<String>,
        f: F,
    ) -> JobResult<EntryId>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.schedule(spec, Arc::new(Job::from_fn(name, f))).await
    }

    /// Stops future fires of one entry
    pub async fn remove(&self, id: EntryId) -> JobResult<()> {
        self.scheduler.remove(id).await
    }

    /// Stops all future fires without waiting for running jobs
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    /// Like [`JobRunner::stop`] but waits for the scheduler shutdown
    pub async fn shutdown(&self) -> JobResult<()> {
        self.scheduler.shutdown().await
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.reporter.entries()
    }

    pub async fn status_page(&self) -> Vec<StatusData> {
        self.reporter.snapshot().await
    }

    pub async fn status_json(&self) -> JobResult<JsonValue> {
        self.reporter.status_json().await
    }

    pub async fn entry_status(&self, id: EntryId) -> JobResult<StatusData> {
        self.reporter.entry_status(id).await
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        self.scheduler.gate()
    }
}
