use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::jobs::error::JobResult;
use crate::jobs::types::{JobContext, Runnable};

pub const HEARTBEAT_JOB_NAME: &str = "heartbeat";

/// Logs a liveness line on every fire
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HeartbeatTask {
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(skip)]
    beats: AtomicU64,
}

fn default_message() -> String {
    "alive".to_string()
}

impl HeartbeatTask {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            beats: AtomicU64::new(0),
        }
    }

    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Runnable for HeartbeatTask {
    async fn run(&self, ctx: JobContext) -> JobResult<()> {
        let beat = self.beats.fetch_add(1, Ordering::Relaxed) + 1;

        tracing::info!(
            job = %ctx.job_name,
            beat,
            fired_at = %ctx.fired_at,
            message = %self.message,
            "Heartbeat"
        );

        Ok(())
    }
}
