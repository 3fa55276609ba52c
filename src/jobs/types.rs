use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::jobs::error::{JobError, JobResult};
use crate::jobs::fault;
use crate::jobs::scheduler::EntryId;

/// Context handed to a job body on every invocation
#[derive(Debug, Clone)]
pub struct JobContext {
    pub job_name: String,
    /// Scheduler entry that fired, `None` for direct invocations
    pub entry_id: Option<EntryId>,
    pub fired_at: DateTime<Utc>,
}

impl JobContext {
    pub fn new(job_name: impl Into<String>, entry_id: Option<EntryId>) -> Self {
        Self {
            job_name: job_name.into(),
            entry_id,
            fired_at: Utc::now(),
        }
    }
}

/// Running/idle projection of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunState {
    Idle,
    Running,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "IDLE",
            RunState::Running => "RUNNING",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait that all job bodies must implement
#[async_trait]
pub trait Runnable: Send + Sync {
    /// Execute one run of the job
    async fn run(&self, ctx: JobContext) -> JobResult<()>;
}

/// Adapts an async closure into a [`Runnable`]
pub struct FnRunnable<F, Fut> {
    f: F,
    _future: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnRunnable<F, Fut>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _future: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut> Runnable for FnRunnable<F, Fut>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn run(&self, _ctx: JobContext) -> JobResult<()> {
        (self.f)().await;
        Ok(())
    }
}

/// Runs a synchronous body on tokio's blocking pool
pub struct BlockingRunnable<F> {
    f: Arc<F>,
}

impl<F> BlockingRunnable<F>
where
    F: Fn() + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }
}

#[async_trait]
impl<F> Runnable for BlockingRunnable<F>
where
    F: Fn() + Send + Sync + 'static,
{
    async fn run(&self, _ctx: JobContext) -> JobResult<()> {
        let f = Arc::clone(&self.f);
        match tokio::task::spawn_blocking(move || fault::isolate_blocking(|| f())).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(fault)) => Err(JobError::Panicked(fault)),
            Err(e) => Err(JobError::failed(e.to_string())),
        }
    }
}
