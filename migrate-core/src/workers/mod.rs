//! Fixed-size worker pool for the data-parallel stages.
//!
//! Work is split into contiguous chunks of `total / N` items with the
//! remainder folded into the last chunk, so the last worker may carry up to
//! `N - 1` extra items. Results come back in chunk order regardless of which
//! worker finished first.

use crate::error::AppError;
use rayon::prelude::*;

/// Number of hardware threads available to this process.
pub fn hardware_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Split `items` into at most `parts` contiguous chunks.
///
/// Every chunk but the last holds `items.len() / parts` items. When there are
/// fewer items than parts everything lands in a single chunk. An empty input
/// yields no chunks.
pub fn chunk_contiguous<T>(items: Vec<T>, parts: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }

    let parts = parts.max(1);
    let size = items.len() / parts;
    if size == 0 {
        return vec![items];
    }

    let mut chunks = Vec::with_capacity(parts);
    let mut rest = items;
    for _ in 0..parts - 1 {
        let tail = rest.split_off(size);
        chunks.push(rest);
        rest = tail;
    }
    chunks.push(rest);
    chunks
}

pub struct WorkerPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self, AppError> {
        let workers = workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("acl-worker-{}", i))
            .build()
            .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;

        tracing::debug!(workers, "Worker pool started");

        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Chunk `items` for this pool's worker count.
    pub fn chunk<T>(&self, items: Vec<T>) -> Vec<Vec<T>> {
        chunk_contiguous(items, self.workers)
    }

    /// Run `f` on every chunk in parallel. Each call owns its chunk; the
    /// output vector is in chunk-submission order.
    pub fn map_chunks<T, R, F>(&self, chunks: Vec<Vec<T>>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(Vec<T>) -> R + Send + Sync,
    {
        self.pool.install(|| chunks.into_par_iter().map(f).collect())
    }

    /// Release the worker threads. Every `map_chunks` call has returned by the
    /// time this can be called, so there is no queued work left to drain.
    pub fn shutdown(self) {
        let workers = self.workers;
        drop(self.pool);
        tracing::debug!(workers, "Worker pool released");
    }
}
