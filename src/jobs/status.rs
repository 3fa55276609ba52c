//! Read-only status projection over the scheduler entries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

use crate::jobs::error::JobResult;
use crate::jobs::job::JobSnapshot;
use crate::jobs::scheduler::{Entry, EntryId, JobScheduler};

/// Key under which the JSON projection nests the status list
pub const STATUS_KEY: &str = "jobrunner";

/// One scheduler entry together with its job status
#[derive(Debug, Clone, Serialize)]
pub struct StatusData {
    pub id: EntryId,
    pub spec: String,
    pub job: JobSnapshot,
    pub next: Option<DateTime<Utc>>,
    pub prev: Option<DateTime<Utc>>,
}

/// Builds point-in-time snapshots. Safe to call while jobs run and while
/// entries are added or removed; an entry removed mid-snapshot may or may
/// not appear.
#[derive(Clone)]
pub struct StatusReporter {
    scheduler: JobScheduler,
}

impl StatusReporter {
    pub fn new(scheduler: JobScheduler) -> Self {
        Self { scheduler }
    }

    /// Raw entry list, useful for picking an id to remove
    pub fn entries(&self) -> Vec<Entry> {
        self.scheduler.entries()
    }

    /// Status records for every entry, ordered by entry id
    pub async fn snapshot(&self) -> Vec<StatusData> {
        let mut entries = self.scheduler.entries();
        entries.sort_by_key(|e| e.id);

        let mut statuses = Vec::with_capacity(entries.len());
        for entry in entries {
            statuses.push(self.project(entry).await);
        }
        statuses
    }

    /// Status of a single entry
    pub async fn entry_status(&self, id: EntryId) -> JobResult<StatusData> {
        let entry = self.scheduler.entry(id)?;
        Ok(self.project(entry).await)
    }

    /// `{"jobrunner": [...]}`
    pub async fn status_json(&self) -> JobResult<JsonValue> {
        let statuses = serde_json::to_value(self.snapshot().await)?;
        Ok(json!({ STATUS_KEY: statuses }))
    }

    async fn project(&self, entry: Entry) -> StatusData {
        let next = self.scheduler.next_fire(entry.id).await;
        StatusData {
            id: entry.id,
            job: entry.job.snapshot(),
            prev: entry.prev(),
            spec: entry.spec,
            next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::gate::ConcurrencyGate;
    use crate::jobs::job::Job;
    use crate::jobs::types::RunState;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_snapshot_matches_registered_entries() {
        let scheduler = JobScheduler::new(ConcurrencyGate::unbounded()).await.unwrap();
        scheduler.start().await.unwrap();
        let reporter = StatusReporter::new(scheduler.clone());

        let mut registered = HashSet::new();
        for i in 0..5 {
            let job = Arc::new(Job::from_fn(format!("job-{i}"), || async {}));
            registered.insert(scheduler.schedule("@every 1h", job).await.unwrap());
        }

        let snapshot = reporter.snapshot().await;
        assert_eq!(snapshot.len(), 5);
        let reported: HashSet<_> = snapshot.iter().map(|s| s.id).collect();
        assert_eq!(reported, registered);
        assert!(snapshot.iter().all(|s| s.job.status == RunState::Idle));
        assert!(snapshot.iter().all(|s| s.prev.is_none()));
        assert!(snapshot.windows(2).all(|w| w[0].id <= w[1].id));

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_json_shape() {
        let scheduler = JobScheduler::new(ConcurrencyGate::unbounded()).await.unwrap();
        let reporter = StatusReporter::new(scheduler.clone());

        let job = Arc::new(Job::from_fn("reporting", || async {}));
        let id = scheduler.schedule("@every 1h", job).await.unwrap();

        let value = reporter.status_json().await.unwrap();
        let list = value[STATUS_KEY].as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], id.to_string());
        assert_eq!(list[0]["job"]["name"], "reporting");
        assert_eq!(list[0]["job"]["status"], "IDLE");
        assert!(list[0]["job"]["latency"].is_null());
    }

    #[tokio::test]
    async fn test_entry_status_unknown_id() {
        let scheduler = JobScheduler::new(ConcurrencyGate::unbounded()).await.unwrap();
        let reporter = StatusReporter::new(scheduler);
        assert!(reporter.entry_status(uuid::Uuid::new_v4()).await.is_err());
    }
}
