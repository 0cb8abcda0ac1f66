//! Worker pools that run one unit of work per row.
//!
//! The reader talks to a pool only through [`WorkerPool`]: submit a task, ask
//! whether anything failed, wait for everything to finish. Two implementations:
//!
//! - [`InlinePool`] runs each task on the submitting thread (`concurrency = 1`).
//! - [`RayonPool`] runs tasks on a dedicated `rayon` thread pool and blocks the
//!   submitter once `2 × workers` tasks are in flight.
//!
//! Both keep the first error a task returns; later errors are logged and dropped.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// One unit of work.
pub type Task = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// Submit-and-drain access to a bounded set of workers.
pub trait WorkerPool {
    /// Queue `task`, blocking while the pool is saturated.
    fn submit(&self, task: Task);

    /// Whether any task has failed since the last [`wait`](WorkerPool::wait).
    fn has_failed(&self) -> bool;

    /// Block until every submitted task has finished, then return the first error.
    ///
    /// # Errors
    /// The first error returned by a task.
    fn wait(&self) -> Result<()>;

    /// Number of tasks that may run at once.
    fn workers(&self) -> usize;
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct FirstError {
    failed: AtomicBool,
    error: Mutex<Option<Error>>,
}

impl FirstError {
    fn record(&self, err: Error) {
        let mut slot = lock(&self.error);
        if slot.is_none() {
            tracing::warn!(error = %err, "row processing failed; stopping dispatch");
            *slot = Some(err);
            self.failed.store(true, Ordering::Release);
        } else {
            tracing::debug!(error = %err, "additional row failure after first error");
        }
    }

    fn is_set(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    fn take(&self) -> Result<()> {
        self.failed.store(false, Ordering::Release);
        match lock(&self.error).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Runs every task immediately on the calling thread.
#[derive(Default)]
pub struct InlinePool {
    failure: FirstError,
}

impl InlinePool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkerPool for InlinePool {
    fn submit(&self, task: Task) {
        if let Err(err) = task() {
            self.failure.record(err);
        }
    }

    fn has_failed(&self) -> bool {
        self.failure.is_set()
    }

    fn wait(&self) -> Result<()> {
        self.failure.take()
    }

    fn workers(&self) -> usize {
        1
    }
}

struct Shared {
    in_flight: Mutex<usize>,
    changed: Condvar,
    failure: FirstError,
}

/// Decrements the in-flight count when a task ends, including by unwinding.
struct Done(Arc<Shared>);

impl Drop for Done {
    fn drop(&mut self) {
        let mut n = lock(&self.0.in_flight);
        *n -= 1;
        self.0.changed.notify_all();
    }
}

/// A fixed-size `rayon` thread pool with bounded submission.
pub struct RayonPool {
    pool: rayon::ThreadPool,
    workers: usize,
    capacity: usize,
    shared: Arc<Shared>,
}

impl RayonPool {
    /// Start `workers` threads.
    ///
    /// # Errors
    /// [`Error::InvalidConfiguration`] for zero workers, [`Error::WorkerPool`] if
    /// the threads cannot be spawned.
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::InvalidConfiguration(
                "worker pool needs at least one worker".into(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("csvbind-worker-{i}"))
            .build()?;
        tracing::debug!(workers, "started worker pool");
        Ok(Self {
            pool,
            workers,
            capacity: workers.saturating_mul(2),
            shared: Arc::new(Shared {
                in_flight: Mutex::new(0),
                changed: Condvar::new(),
                failure: FirstError::default(),
            }),
        })
    }

    fn drain(&self) {
        let mut n = lock(&self.shared.in_flight);
        while *n > 0 {
            n = self
                .shared
                .changed
                .wait(n)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl WorkerPool for RayonPool {
    fn submit(&self, task: Task) {
        {
            let mut n = lock(&self.shared.in_flight);
            while *n >= self.capacity {
                n = self
                    .shared
                    .changed
                    .wait(n)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            *n += 1;
        }
        let shared = Arc::clone(&self.shared);
        self.pool.spawn(move || {
            let done = Done(shared);
            if let Err(err) = task() {
                done.0.failure.record(err);
            }
        });
    }

    fn has_failed(&self) -> bool {
        self.shared.failure.is_set()
    }

    fn wait(&self) -> Result<()> {
        self.drain();
        self.shared.failure.take()
    }

    fn workers(&self) -> usize {
        self.workers
    }
}

impl Drop for RayonPool {
    fn drop(&mut self) {
        self.drain();
    }
}
