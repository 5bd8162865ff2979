//! Bounded CPU-worker pool shared by extraction (C3) and DTW (C4) so neither
//! blocks other sessions' WebSocket tasks (§5).
//!
//! Generalizes the teacher's `JobExecutor`/`WorkerConfig::max_concurrent_jobs`
//! semaphore-gated concurrency from "concurrent render jobs" to "concurrent
//! blocking compute tasks", with `tokio::task::spawn_blocking` standing in
//! for the teacher's per-job `tokio::spawn`.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::{WorkerError, WorkerResult};

/// Env var overriding the pool size; falls back to the host's available
/// parallelism.
pub const MAX_CONCURRENT_ENV: &str = "WORKER_MAX_CONCURRENT";

#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl WorkerPool {
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Builds a pool sized from `WORKER_MAX_CONCURRENT`, defaulting to the
    /// number of available CPUs.
    pub fn from_env() -> Self {
        let default = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        let max_concurrent = std::env::var(MAX_CONCURRENT_ENV)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default);
        Self::new(max_concurrent)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of tasks currently holding a permit.
    pub fn active_tasks(&self) -> usize {
        self.max_concurrent
            .saturating_sub(self.semaphore.available_permits())
    }

    /// Runs `f` on the blocking thread pool once a permit is free, holding
    /// that permit for the duration of `f`.
    pub async fn run_blocking<F, T>(&self, f: F) -> WorkerResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| WorkerError::PoolClosed)?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            f()
        })
        .await
        .map_err(|e| WorkerError::TaskPanicked(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn runs_a_blocking_closure_and_returns_its_value() {
        let pool = WorkerPool::new(2);
        let result = pool.run_blocking(|| 2 + 2).await.unwrap();
        assert_eq!(result, 4);
    }

    #[tokio::test]
    async fn never_exceeds_the_configured_concurrency() {
        let pool = WorkerPool::new(2);
        let concurrent = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let pool = pool.clone();
            let concurrent = Arc::clone(&concurrent);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                pool.run_blocking(move || {
                    let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(30));
                    concurrent.fetch_sub(1, Ordering::SeqCst);
                })
                .await
                .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn a_panicking_task_surfaces_as_task_panicked() {
        let pool = WorkerPool::new(1);
        let err = pool
            .run_blocking(|| -> () { panic!("boom") })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::TaskPanicked(_)));
    }
}
