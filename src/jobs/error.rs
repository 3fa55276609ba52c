use thiserror::Error;
use uuid::Uuid;

use crate::jobs::fault::Fault;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Job panicked: {0}")]
    Panicked(Fault),

    #[error("Invalid schedule expression: {0}")]
    InvalidSchedule(String),

    #[error("Job entry not found: {0}")]
    NotFound(Uuid),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl JobError {
    pub fn failed(message: impl Into<String>) -> Self {
        JobError::ExecutionFailed(message.into())
    }
}

pub type JobResult<T> = Result<T, JobError>;
