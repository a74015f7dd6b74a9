//! Bounded worker pool for file-level work (hashing, copying, removing).
//!
//! This module provides a dispatcher + worker inbox design:
//! - single-consumer upstream `mpsc::Receiver` (dispatcher)
//! - per-worker `mpsc` inbox channels
//! - each worker runs one blocking job at a time via `spawn_blocking`
//! - explicit sender drop on shutdown before awaiting workers
//!
//! The pool owns a dedicated tokio runtime. `map` blocks the calling thread
//! until every submitted job has finished, so callers must not be running on
//! an async worker thread (use `spawn_blocking` from async code).

use crate::types::MirrorError;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;

use std::sync::Arc;

/// Upper bound for the default worker count
pub const MAX_DEFAULT_WORKERS: usize = 20;

/// Default pool size: twice the available processing units, capped.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(4)
        .min(MAX_DEFAULT_WORKERS)
}

/// Fixed-size pool of blocking workers.
pub struct WorkerPool {
    runtime: Runtime,
    workers: usize,
    queue_capacity: usize,
}

impl WorkerPool {
    /// Create a pool with `worker_count` workers and bounded inboxes.
    pub fn new(worker_count: usize, queue_capacity: usize) -> Result<Self, MirrorError> {
        let workers = worker_count.max(1);
        let capacity = queue_capacity.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers)
            .thread_name("replica-worker")
            .enable_all()
            .build()
            .map_err(|e| MirrorError::Pool(format!("failed to start worker runtime: {}", e)))?;

        Ok(Self {
            runtime,
            workers,
            queue_capacity: capacity,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `job` over every item and wait for all of them.
    ///
    /// Outputs come back in the order the items were submitted. At most
    /// `workers()` jobs run at the same time. A panicking job fails the whole
    /// call with `MirrorError::Pool`; ordinary failures belong in `R`.
    pub fn map<T, R, F>(&self, items: Vec<T>, job: F) -> Result<Vec<R>, MirrorError>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let total = items.len();
        let workers = self.workers.min(total);
        let capacity = self.queue_capacity;
        let job = Arc::new(job);

        self.runtime.block_on(async move {
            let (enqueue_tx, enqueue_rx) = mpsc::channel::<(usize, T)>(capacity);
            let (result_tx, mut result_rx) = mpsc::unbounded_channel::<(usize, R)>();

            let mut worker_txs = Vec::with_capacity(workers);
            let mut worker_handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                let (worker_tx, worker_rx) = mpsc::channel::<(usize, T)>(capacity);
                worker_txs.push(worker_tx);
                worker_handles.push(tokio::spawn(worker_loop(
                    worker_rx,
                    Arc::clone(&job),
                    result_tx.clone(),
                )));
            }
            drop(result_tx);

            let dispatcher = tokio::spawn(dispatcher_loop(enqueue_rx, worker_txs));

            for (index, item) in items.into_iter().enumerate() {
                if enqueue_tx.send((index, item)).await.is_err() {
                    break;
                }
            }
            // Closing the upstream queue lets the dispatcher, then the workers, drain and exit.
            drop(enqueue_tx);

            dispatcher.await.map_err(map_join_error)?;
            let mut per_worker = Vec::with_capacity(workers);
            for handle in worker_handles {
                per_worker.push(handle.await.map_err(map_join_error)??);
            }
            tracing::trace!(jobs = total, ?per_worker, "worker pool drained");

            let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
            while let Some((index, output)) = result_rx.recv().await {
                slots[index] = Some(output);
            }

            slots
                .into_iter()
                .map(|slot| {
                    slot.ok_or_else(|| MirrorError::Pool("a submitted job never completed".into()))
                })
                .collect::<Result<Vec<R>, MirrorError>>()
        })
    }
}

async fn dispatcher_loop<T>(
    mut enqueue_rx: mpsc::Receiver<(usize, T)>,
    worker_txs: Vec<mpsc::Sender<(usize, T)>>,
) {
    let mut next_worker = 0usize;
    let worker_len = worker_txs.len();

    while let Some(job) = enqueue_rx.recv().await {
        if worker_len == 0 {
            break;
        }

        let target = next_worker % worker_len;
        next_worker = (next_worker + 1) % worker_len;
        // A closed inbox means that worker died; its failure surfaces when it is joined.
        let _ = worker_txs[target].send(job).await;
    }
    // worker_txs are dropped here, which closes worker inboxes.
}

async fn worker_loop<T, R, F>(
    mut worker_rx: mpsc::Receiver<(usize, T)>,
    job: Arc<F>,
    results: mpsc::UnboundedSender<(usize, R)>,
) -> Result<usize, MirrorError>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    let mut completed = 0usize;
    while let Some((index, item)) = worker_rx.recv().await {
        let job = Arc::clone(&job);
        let output = tokio::task::spawn_blocking(move || job(item))
            .await
            .map_err(map_join_error)?;
        // The receiver outlives every worker, so a send can only fail after a panic elsewhere.
        let _ = results.send((index, output));
        completed += 1;
    }
    Ok(completed)
}

fn map_join_error(error: tokio::task::JoinError) -> MirrorError {
    MirrorError::Pool(format!("worker task failed: {}", error))
}
