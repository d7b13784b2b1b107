//! Connection dispatch.
//!
//! - **`listener`**: the accept loop; it only waits for connections and
//!   queues them
//! - **`pool`**: the fixed set of workers that run queued connections

pub mod listener;
pub mod pool;

pub use pool::{PoolStats, SubmitError, WorkerPool};
