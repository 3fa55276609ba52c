use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler as TokioCronScheduler};
use uuid::Uuid;

use crate::jobs::error::{JobError, JobResult};
use crate::jobs::gate::ConcurrencyGate;
use crate::jobs::job::Job;
use crate::jobs::trigger::Trigger;
use crate::jobs::types::JobContext;

/// Identifier of a scheduler entry, assigned by tokio-cron-scheduler
pub type EntryId = Uuid;

type FireFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A trigger expression bound to a job
#[derive(Clone)]
pub struct Entry {
    pub id: EntryId,
    pub spec: String,
    pub job: Arc<Job>,
    prev: Arc<StdMutex<Option<DateTime<Utc>>>>,
}

impl Entry {
    /// Time of the most recent fire, `None` until the entry has fired once
    pub fn prev(&self) -> Option<DateTime<Utc>> {
        *self.prev.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("spec", &self.spec)
            .field("job", &self.job.name())
            .field("prev", &self.prev())
            .finish()
    }
}

/// Wrapper around tokio-cron-scheduler that runs every fire through the
/// concurrency gate and keeps the entry table used for status reporting
#[derive(Clone)]
pub struct JobScheduler {
    scheduler: Arc<Mutex<TokioCronScheduler>>,
    gate: Arc<ConcurrencyGate>,
    entries: Arc<DashMap<EntryId, Entry>>,
    /// Runtime the scheduler was created on, used by [`JobScheduler::stop`]
    runtime: Handle,
}

impl JobScheduler {
    pub async fn new(gate: ConcurrencyGate) -> JobResult<Self> {
        let scheduler = TokioCronScheduler::new()
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            gate: Arc::new(gate),
            entries: Arc::new(DashMap::new()),
            runtime: Handle::current(),
        })
    }

    /// Start the underlying timer loop
    pub async fn start(&self) -> JobResult<()> {
        self.scheduler
            .lock()
            .await
            .start()
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))
    }

    /// Register `job` under the trigger expression `spec`
    pub async fn schedule(&self, spec: &str, job: Arc<Job>) -> JobResult<EntryId> {
        let trigger: Trigger = spec.parse()?;
        let prev = Arc::new(StdMutex::new(None));

        let gate = Arc::clone(&self.gate);
        let fired = Arc::clone(&prev);
        let target = Arc::clone(&job);
        let on_fire = move |entry_id: Uuid, _scheduler: TokioCronScheduler| -> FireFuture {
            let gate = Arc::clone(&gate);
            let fired = Arc::clone(&fired);
            let job = Arc::clone(&target);

            Box::pin(async move {
                let ctx = JobContext::new(job.name(), Some(entry_id));
                *fired.lock().unwrap_or_else(PoisonError::into_inner) = Some(ctx.fired_at);
                job.run(&gate, ctx).await;
            })
        };

        let cron_job = match &trigger {
            Trigger::Every(interval) => CronJob::new_repeated_async(*interval, on_fire),
            Trigger::Cron(expression) => CronJob::new_async(expression.as_str(), on_fire),
        }
        .map_err(|e| JobError::InvalidSchedule(format!("{}: {}", spec, e)))?;

        let name = job.name().to_string();
        let id = self
            .scheduler
            .lock()
            .await
            .add(cron_job)
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))?;

        self.entries.insert(
            id,
            Entry {
                id,
                spec: spec.trim().to_string(),
                job,
                prev,
            },
        );

        tracing::info!(entry_id = %id, spec = %spec.trim(), job = %name, "Job scheduled");
        Ok(id)
    }

    /// Remove an entry; a run already in progress completes normally.
    /// Unknown ids are ignored. The entry stays listed if the scheduler
    /// refuses the removal.
    pub async fn remove(&self, id: EntryId) -> JobResult<()> {
        if !self.entries.contains_key(&id) {
            tracing::debug!(entry_id = %id, "Remove called for unknown entry");
            return Ok(());
        }

        self.scheduler
            .lock()
            .await
            .remove(&id)
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))?;

        let Some((_, entry)) = self.entries.remove(&id) else {
            return Ok(());
        };
        tracing::info!(entry_id = %id, job = %entry.job.name(), "Job removed");
        Ok(())
    }

    /// Halt future fires without waiting for running jobs to drain.
    /// Callable from any thread, inside the runtime or not.
    pub fn stop(&self) {
        let scheduler = self.clone();
        self.runtime.spawn(async move {
            if let Err(e) = scheduler.shutdown().await {
                tracing::error!(error = %e, "Failed to stop scheduler");
            }
        });
    }

    /// Shut the scheduler down and wait for the shutdown itself to finish
    pub async fn shutdown(&self) -> JobResult<()> {
        self.scheduler
            .lock()
            .await
            .shutdown()
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }

    /// Snapshot of every registered entry
    pub fn entries(&self) -> Vec<Entry> {
        self.entries.iter().map(|e| e.value().clone()).collect()
    }

    pub fn entry(&self, id: EntryId) -> JobResult<Entry> {
        self.entries
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(JobError::NotFound(id))
    }

    /// Next scheduled fire of an entry, if the scheduler knows one
    pub async fn next_fire(&self, id: EntryId) -> Option<DateTime<Utc>> {
        match self.scheduler.lock().await.next_tick_for_job(id).await {
            Ok(next) => next,
            Err(e) => {
                tracing::debug!(entry_id = %id, error = %e, "Next fire time unavailable");
                None
            }
        }
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }
}
