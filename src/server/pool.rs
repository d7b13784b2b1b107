//! Fixed-size pool of worker tasks fed by a FIFO queue.
//!
//! Each worker takes one item from the queue, runs the job on it to
//! completion and only then takes the next, so at most `size` jobs run at
//! once. A job that panics is contained in its own task and the worker moves
//! on. The queue is unbounded unless a pending limit is given, in which case
//! [`WorkerPool::submit`] hands the item back when the queue is full.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::{Mutex, mpsc};
use tracing::Instrument;

/// Live counters of a pool.
#[derive(Debug, Default)]
pub struct PoolStats {
    active: AtomicUsize,
    peak: AtomicUsize,
    completed: AtomicU64,
}

impl PoolStats {
    /// Jobs running right now.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of jobs ever running at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    fn begin(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn end(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Why [`WorkerPool::submit`] handed an item back.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitError<T> {
    /// The pending queue is at its limit.
    Full(T),
    /// Every worker has exited.
    Closed(T),
}

enum Sender<T> {
    Unbounded(mpsc::UnboundedSender<T>),
    Bounded(mpsc::Sender<T>),
}

enum Receiver<T> {
    Unbounded(mpsc::UnboundedReceiver<T>),
    Bounded(mpsc::Receiver<T>),
}

impl<T> Receiver<T> {
    async fn recv(&mut self) -> Option<T> {
        match self {
            Receiver::Unbounded(rx) => rx.recv().await,
            Receiver::Bounded(rx) => rx.recv().await,
        }
    }
}

pub struct WorkerPool<T> {
    queue: Sender<T>,
    stats: Arc<PoolStats>,
    size: usize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Spawns `size` workers running `job` on every submitted item.
    ///
    /// `max_pending` bounds the queue of items waiting for a worker; `None`
    /// leaves it unbounded. Must be called inside a Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `size` or `max_pending` is zero.
    pub fn new<F, Fut>(size: usize, max_pending: Option<usize>, job: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        assert!(size > 0, "worker pool needs at least one worker");

        let (queue, rx) = match max_pending {
            Some(limit) => {
                let (tx, rx) = mpsc::channel(limit);
                (Sender::Bounded(tx), Receiver::Bounded(rx))
            }
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                (Sender::Unbounded(tx), Receiver::Unbounded(rx))
            }
        };

        let rx = Arc::new(Mutex::new(rx));
        let job = Arc::new(job);
        let stats = Arc::new(PoolStats::default());

        for id in 0..size {
            let rx = rx.clone();
            let job = job.clone();
            let stats = stats.clone();

            tokio::spawn(
                async move {
                    loop {
                        // the lock is held only while waiting; waiters queue fairly
                        let next = rx.lock().await.recv().await;
                        let Some(item) = next else {
                            tracing::debug!("Queue closed, worker exiting");
                            break;
                        };

                        stats.begin();
                        if let Err(e) = tokio::spawn(job(item).in_current_span()).await {
                            tracing::error!(error = %e, "Job aborted");
                        }
                        stats.end();
                    }
                }
                .instrument(tracing::debug_span!("worker", id)),
            );
        }

        Self { queue, stats, size }
    }

    /// Queues an item for the next free worker.
    ///
    /// Returns the item when the queue is full or every worker has exited.
    pub fn submit(&self, item: T) -> Result<(), SubmitError<T>> {
        match &self.queue {
            Sender::Unbounded(tx) => tx.send(item).map_err(|e| SubmitError::Closed(e.0)),
            Sender::Bounded(tx) => tx.try_send(item).map_err(|e| match e {
                mpsc::error::TrySendError::Full(item) => SubmitError::Full(item),
                mpsc::error::TrySendError::Closed(item) => SubmitError::Closed(item),
            }),
        }
    }

    pub fn stats(&self) -> Arc<PoolStats> {
        self.stats.clone()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}
