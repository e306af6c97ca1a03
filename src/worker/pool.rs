//! Bounded worker pool
//!
//! Caps concurrent extractions at the configured worker count. Requests that
//! find every worker busy wait in a bounded queue for a limited time.
//!
//! # Thread Safety
//!
//! Slots are `tokio::sync::Semaphore` permits. Statistics are plain atomics
//! so health checks read them without waiting on anything.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio::time::timeout;

/// Worker pool errors
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("All {capacity} workers are busy and the queue is full")]
    QueueFull { capacity: usize },

    #[error("Timed out after {0:?} waiting for a worker")]
    QueueTimeout(Duration),

    #[error("Worker pool is shut down")]
    Closed,
}

/// Point-in-time pool statistics
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStats {
    pub capacity: usize,
    pub active: usize,
    pub waiting: usize,
    pub completed: u64,
    pub rejected: u64,
}

struct PoolInner {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    max_waiting: usize,
    queue_timeout: Duration,
    active: AtomicUsize,
    waiting: AtomicUsize,
    completed: AtomicU64,
    rejected: AtomicU64,
}

/// Worker pool handle, cheap to clone
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

impl WorkerPool {
    /// Create a pool with `capacity` workers (at least one)
    pub fn new(capacity: usize, max_waiting: usize, queue_timeout: Duration) -> Self {
        let capacity = capacity.max(1);

        Self {
            inner: Arc::new(PoolInner {
                semaphore: Arc::new(Semaphore::new(capacity)),
                capacity,
                max_waiting,
                queue_timeout,
                active: AtomicUsize::new(0),
                waiting: AtomicUsize::new(0),
                completed: AtomicU64::new(0),
                rejected: AtomicU64::new(0),
            }),
        }
    }

    /// Wait for a free worker
    ///
    /// Returns immediately when a worker is idle. Otherwise takes a queue
    /// slot, failing with `QueueFull` if none is left, and waits at most the
    /// queue timeout.
    pub async fn acquire(&self) -> Result<WorkerPermit, WorkerError> {
        let inner = &self.inner;

        match Arc::clone(&inner.semaphore).try_acquire_owned() {
            Ok(permit) => return Ok(self.started(permit)),
            Err(TryAcquireError::Closed) => return Err(WorkerError::Closed),
            Err(TryAcquireError::NoPermits) => {}
        }

        let reserved = inner
            .waiting
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |waiting| {
                (waiting < inner.max_waiting).then_some(waiting + 1)
            });
        if reserved.is_err() {
            inner.rejected.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                capacity = inner.capacity,
                max_waiting = inner.max_waiting,
                "Rejecting request: worker queue full"
            );
            return Err(WorkerError::QueueFull {
                capacity: inner.capacity,
            });
        }

        let _slot = QueueSlot(&inner.waiting);
        tracing::debug!("All workers busy, request queued");

        match timeout(
            inner.queue_timeout,
            Arc::clone(&inner.semaphore).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => Ok(self.started(permit)),
            Ok(Err(_)) => Err(WorkerError::Closed),
            Err(_) => {
                inner.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    timeout_secs = inner.queue_timeout.as_secs_f64(),
                    "Rejecting request: timed out waiting for a worker"
                );
                Err(WorkerError::QueueTimeout(inner.queue_timeout))
            }
        }
    }

    fn started(&self, permit: OwnedSemaphorePermit) -> WorkerPermit {
        self.inner.active.fetch_add(1, Ordering::AcqRel);
        WorkerPermit {
            _permit: permit,
            inner: Arc::clone(&self.inner),
        }
    }

    /// Snapshot of the pool counters
    pub fn stats(&self) -> PoolStats {
        let inner = &self.inner;
        PoolStats {
            capacity: inner.capacity,
            active: inner.active.load(Ordering::Acquire),
            waiting: inner.waiting.load(Ordering::Acquire),
            completed: inner.completed.load(Ordering::Relaxed),
            rejected: inner.rejected.load(Ordering::Relaxed),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Suggested `Retry-After` for rejected requests, in seconds
    pub fn retry_after_secs(&self) -> u64 {
        self.inner.queue_timeout.as_secs().max(1)
    }

    /// Refuse new work; queued requests fail with `Closed`
    ///
    /// Permits already handed out stay valid until dropped.
    pub fn close(&self) {
        tracing::info!(
            waiting = self.inner.waiting.load(Ordering::Acquire),
            "Closing worker pool"
        );
        self.inner.semaphore.close();
    }
}

/// A running extraction; the worker is released on drop
pub struct WorkerPermit {
    _permit: OwnedSemaphorePermit,
    inner: Arc<PoolInner>,
}

impl Drop for WorkerPermit {
    fn drop(&mut self) {
        self.inner.active.fetch_sub(1, Ordering::AcqRel);
        self.inner.completed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Queue slot reservation, released on drop
struct QueueSlot<'a>(&'a AtomicUsize);

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
