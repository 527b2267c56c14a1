//! Caller-supplied task runner for metadata retrieval.
//!
//! Metadata providers may fan work out (for example parsing one document per
//! version). They do so through a [`TaskRunner`] handed in by the caller, and
//! every job has finished by the time [`TaskRunner::map`] returns. Graph
//! algorithms themselves never run on it.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::warn;

/// Runs batches of independent jobs, either inline or on a dedicated rayon
/// pool.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    pool: Option<Arc<ThreadPool>>,
}

impl TaskRunner {
    /// A runner that executes every job on the calling thread.
    #[must_use]
    pub const fn sequential() -> Self {
        Self { pool: None }
    }

    /// A runner with `workers` threads. Zero or one runs inline.
    ///
    /// Falls back to inline execution if the pool cannot be started.
    #[must_use]
    pub fn parallel(workers: usize) -> Self {
        if workers <= 1 {
            return Self::sequential();
        }

        match ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("verdag-worker-{i}"))
            .build()
        {
            Ok(pool) => Self {
                pool: Some(Arc::new(pool)),
            },
            Err(err) => {
                warn!(%err, workers, "could not start worker pool, running inline");
                Self::sequential()
            }
        }
    }

    /// A runner sized to the machine's available parallelism.
    #[must_use]
    pub fn available() -> Self {
        Self::parallel(thread::available_parallelism().map_or(1, NonZeroUsize::get))
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.pool.as_ref().map_or(1, |pool| pool.current_num_threads())
    }

    /// Apply `job` to every item, preserving input order in the output.
    ///
    /// A panic in any job is resumed on the calling thread.
    pub fn map<T, U, F>(&self, items: Vec<T>, job: F) -> Vec<U>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> U + Send + Sync,
    {
        match &self.pool {
            Some(pool) if items.len() > 1 => {
                pool.install(|| items.into_par_iter().map(job).collect())
            }
            _ => items.into_iter().map(job).collect(),
        }
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::available()
    }
}
