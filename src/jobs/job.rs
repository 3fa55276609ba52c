//! Job wrapper: naming, self-exclusion, running flag and latency tracking
//! around a user supplied [`Runnable`].

use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::jobs::error::JobError;
use crate::jobs::fault;
use crate::jobs::gate::ConcurrencyGate;
use crate::jobs::types::{BlockingRunnable, FnRunnable, JobContext, RunState, Runnable};

/// Display name used for closure jobs registered without one
pub const UNNAMED: &str = "(unnamed)";

/// How a single run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed(String),
    Panicked(String),
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub latency: Duration,
}

/// Point-in-time view of a job, used by the status reporter
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub name: String,
    pub status: RunState,
    /// Human readable latency of the last completed run
    pub latency: Option<String>,
    pub latency_ms: Option<u64>,
    pub run_count: u64,
}

/// A runnable wrapped with concurrency and status bookkeeping.
///
/// Status reads go through atomics only and never wait on the exclusion
/// lock, so they may lag a run that is finishing at the same moment.
pub struct Job {
    name: String,
    inner: Arc<dyn Runnable>,
    /// Body executions currently in flight. Only above one when
    /// self-concurrency is allowed; [`Job::running`] projects it to 0/1.
    in_flight: AtomicU32,
    self_lock: Mutex<()>,
    last_status: RwLock<RunState>,
    /// Nanoseconds, 0 until the first run completes
    last_latency: AtomicU64,
    run_count: AtomicU64,
}

impl Job {
    pub fn new(name: impl Into<String>, inner: Arc<dyn Runnable>) -> Self {
        Self {
            name: name.into(),
            inner,
            in_flight: AtomicU32::new(0),
            self_lock: Mutex::new(()),
            last_status: RwLock::new(RunState::Idle),
            last_latency: AtomicU64::new(0),
            run_count: AtomicU64::new(0),
        }
    }

    /// Wraps a runnable under the [`UNNAMED`] sentinel
    pub fn unnamed(inner: Arc<dyn Runnable>) -> Self {
        Self::new(UNNAMED, inner)
    }

    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::new(name, Arc::new(FnRunnable::new(f)))
    }

    /// Wraps a synchronous body that runs on the blocking thread pool
    pub fn blocking<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::new(name, Arc::new(BlockingRunnable::new(f)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Running flag: 1 while any body execution is in flight, else 0
    pub fn running(&self) -> u32 {
        self.in_flight.load(Ordering::Acquire).min(1)
    }

    pub fn is_running(&self) -> bool {
        self.running() == 1
    }

    /// Overlapping body executions of this job right now
    pub fn in_flight(&self) -> u32 {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Recomputes the cached status from the running flag
    pub fn status_update(&self) -> RunState {
        let state = if self.is_running() {
            RunState::Running
        } else {
            RunState::Idle
        };
        *self.last_status.write().unwrap_or_else(PoisonError::into_inner) = state;
        state
    }

    /// Last cached status, which may trail [`Job::status_update`]
    pub fn last_status(&self) -> RunState {
        *self.last_status.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Duration of the most recently completed run
    pub fn last_latency(&self) -> Option<Duration> {
        match self.last_latency.load(Ordering::Acquire) {
            0 => None,
            nanos => Some(Duration::from_nanos(nanos)),
        }
    }

    pub fn run_count(&self) -> u64 {
        self.run_count.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let latency = self.last_latency();
        JobSnapshot {
            name: self.name.clone(),
            status: self.status_update(),
            latency: latency.map(|d| format!("{:?}", d)),
            latency_ms: latency.map(|d| d.as_millis() as u64),
            run_count: self.run_count(),
        }
    }

    /// Executes one run under the gate's admission rules.
    ///
    /// Self-exclusion is taken before the gate permit so that a job waiting
    /// on its own previous run never holds a pool slot. Failures of the body
    /// are logged and absorbed; nothing propagates to the caller.
    pub async fn run(&self, gate: &ConcurrencyGate, ctx: JobContext) -> RunReport {
        let _exclusive = if gate.self_concurrent() {
            None
        } else {
            Some(self.self_lock.lock().await)
        };
        let _permit = gate.acquire().await;

        let running = RunningGuard::enter(self);
        let entry_id = ctx.entry_id;
        let result = fault::isolate(self.inner.run(ctx)).await;
        let latency = running.finish();

        let outcome = match result {
            Ok(Ok(())) => {
                tracing::debug!(
                    job = %self.name,
                    entry_id = ?entry_id,
                    latency_ms = latency.as_millis() as u64,
                    "Job run completed"
                );
                RunOutcome::Completed
            }
            Ok(Err(JobError::Panicked(fault))) | Err(fault) => {
                tracing::error!(
                    job = %self.name,
                    entry_id = ?entry_id,
                    panic = %fault,
                    backtrace = %fault.backtrace,
                    "Job panicked, recovered"
                );
                RunOutcome::Panicked(fault.message)
            }
            Ok(Err(e)) => {
                tracing::error!(
                    job = %self.name,
                    entry_id = ?entry_id,
                    error = %e,
                    "Job run failed"
                );
                RunOutcome::Failed(e.to_string())
            }
        };

        RunReport { outcome, latency }
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("status", &self.last_status())
            .field("last_latency", &self.last_latency())
            .finish()
    }
}

/// Marks a job as running for its lifetime; also covers a run whose future
/// is dropped before completion.
struct RunningGuard<'a> {
    job: &'a Job,
    started: Instant,
    finished: bool,
}

impl<'a> RunningGuard<'a> {
    fn enter(job: &'a Job) -> Self {
        job.in_flight.fetch_add(1, Ordering::AcqRel);
        job.status_update();
        Self {
            job,
            started: Instant::now(),
            finished: false,
        }
    }

    fn finish(mut self) -> Duration {
        self.release()
    }

    fn release(&mut self) -> Duration {
        let latency = self.started.elapsed();
        if !self.finished {
            self.finished = true;
            let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX).max(1);
            self.job.last_latency.store(nanos, Ordering::Release);
            self.job.run_count.fetch_add(1, Ordering::AcqRel);
            self.job.in_flight.fetch_sub(1, Ordering::AcqRel);
            self.job.status_update();
        }
        latency
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
