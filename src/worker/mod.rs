//! Extraction concurrency control

mod pool;

pub use pool::{PoolStats, WorkerError, WorkerPermit, WorkerPool};
