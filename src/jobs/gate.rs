//! Process-wide admission control for job executions.
//!
//! The gate bounds how many job bodies may run at once and carries the flag
//! deciding whether a single job may overlap with itself. It is built once
//! and moved into the runner; there is no way to reconfigure it afterwards.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Pool size used when the configured capacity is zero or negative.
pub const DEFAULT_JOB_POOL_SIZE: usize = 10;

/// Counting semaphore plus the self-concurrency switch.
///
/// Waiters block until a permit frees up. There is no timeout and callers
/// must not assume any ordering between waiters.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    permits: Option<Arc<Semaphore>>,
    capacity: usize,
    self_concurrent: bool,
}

impl ConcurrencyGate {
    /// A gate that admits everything and forbids self-overlap.
    pub fn unbounded() -> Self {
        Self {
            permits: None,
            capacity: 0,
            self_concurrent: false,
        }
    }

    /// Builds a bounded gate from the two signed startup values.
    pub fn configure(pool_size: i64, self_concurrency: i64) -> Self {
        Self::unbounded()
            .with_pool_size(pool_size)
            .with_self_concurrency(self_concurrency)
    }

    /// Builds a gate from the positional startup options.
    ///
    /// Index 0 is the pool size, index 1 the self-concurrency flag. Missing
    /// positions keep their zero value: no pool at all, self-overlap off.
    pub fn from_options(options: &[i64]) -> Self {
        let mut gate = Self::unbounded();
        for (position, value) in options.iter().copied().enumerate() {
            gate = match position {
                0 => gate.with_pool_size(value),
                1 => gate.with_self_concurrency(value),
                _ => {
                    tracing::warn!(position, value, "Ignoring unknown job runner option");
                    gate
                }
            };
        }
        gate
    }

    pub fn with_pool_size(mut self, pool_size: i64) -> Self {
        let capacity = usize::try_from(pool_size)
            .ok()
            .filter(|c| *c > 0)
            .unwrap_or(DEFAULT_JOB_POOL_SIZE)
            .min(Semaphore::MAX_PERMITS);
        self.capacity = capacity;
        self.permits = Some(Arc::new(Semaphore::new(capacity)));
        self
    }

    pub fn with_self_concurrency(mut self, flag: i64) -> Self {
        self.self_concurrent = flag > 0;
        self
    }

    /// Waits for a permit. Returns `None` when the gate is unbounded.
    ///
    /// The semaphore is never closed, so a bounded gate always yields a
    /// permit once one is released.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        match &self.permits {
            Some(semaphore) => Arc::clone(semaphore).acquire_owned().await.ok(),
            None => None,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.permits.is_some()
    }

    /// Configured pool size, 0 when unbounded.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available_permits(&self) -> usize {
        self.permits
            .as_ref()
            .map(|s| s.available_permits())
            .unwrap_or(0)
    }

    /// Number of permits currently held by running jobs.
    pub fn in_flight(&self) -> usize {
        self.capacity.saturating_sub(self.available_permits())
    }

    pub fn self_concurrent(&self) -> bool {
        self.self_concurrent
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::unbounded()
    }
}
