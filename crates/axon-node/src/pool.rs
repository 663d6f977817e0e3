//! Worker pools for message handling
//!
//! [`TokioPool`] hands each job to the runtime's blocking thread pool so the
//! transport's I/O path never waits on graph locks or handlers.
//! [`InlinePool`] runs jobs on the caller's thread for deterministic tests.

use axon_core::{Job, WorkerPool};
use tokio::runtime::Handle;

use crate::error::{NodeError, NodeResult};

/// Runs jobs on a tokio runtime's blocking pool
#[derive(Debug, Clone)]
pub struct TokioPool {
    handle: Handle,
}

impl TokioPool {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running on
    pub fn current() -> NodeResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| NodeError::Runtime(e.to_string()))
    }
}

impl WorkerPool for TokioPool {
    fn execute(&self, job: Job) {
        // Fire and forget; the job reports through events and logs
        drop(self.handle.spawn_blocking(job));
    }
}

/// Runs jobs immediately on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct InlinePool;

impl WorkerPool for InlinePool {
    fn execute(&self, job: Job) {
        job();
    }
}
