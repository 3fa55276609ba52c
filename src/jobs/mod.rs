pub mod error;
pub mod fault;
pub mod gate;
pub mod job;
pub mod runner;
pub mod scheduler;
pub mod status;
pub mod tasks;
pub mod trigger;
pub mod types;

pub use error::{JobError, JobResult};
pub use fault::Fault;
pub use gate::{ConcurrencyGate, DEFAULT_JOB_POOL_SIZE};
pub use job::{Job, JobSnapshot, RunOutcome, RunReport, UNNAMED};
pub use runner::JobRunner;
pub use scheduler::{Entry, EntryId, JobScheduler};
pub use status::{STATUS_KEY, StatusData, StatusReporter};
pub use trigger::Trigger;
pub use types::{JobContext, RunState, Runnable};
