use std::fmt;

use crate::{work::WorkerFn, WorkerPool};

/// Number of queue slots when the caller does not pick a capacity.
const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// An error returned from [`PoolBuilder::build`].
#[derive(Debug, PartialEq, Eq)]
pub enum BuildError {
    /// No default worker function was configured. A pool cannot run
    /// without one.
    MissingWorkerFn,

    /// A bounded queue with zero slots was requested. A zero-capacity
    /// channel is a rendezvous, not a queue; use
    /// [`PoolBuilder::unbounded`] to remove the bound instead.
    ZeroCapacity,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::MissingWorkerFn => write!(f, "no worker function was configured"),
            BuildError::ZeroCapacity => write!(f, "the work queue needs at least one slot"),
        }
    }
}

impl std::error::Error for BuildError {}

/// A builder of the [`WorkerPool`], which configures the worker function,
/// the number of threads, and the queue bound of a new pool.
///
/// # Examples
///
/// ```
/// use workpile::PoolBuilder;
///
/// let pool = PoolBuilder::new()
///     .threads(3)
///     .queue_capacity(32)
///     .worker_fn(|line: String| {
///         println!("{}", line.to_uppercase());
///     })
///     .build()
///     .unwrap();
/// # pool.shutdown();
/// ```
pub struct PoolBuilder<T> {
    worker_fn: Option<WorkerFn<T>>,
    threads: usize,
    queue_capacity: Option<usize>,
}

impl<T> Default for PoolBuilder<T> {
    /// Creates a builder with no worker function, one thread per logical
    /// CPU, and a bounded queue of 64 slots.
    fn default() -> Self {
        Self {
            worker_fn: None,
            threads: 0,
            queue_capacity: Some(DEFAULT_QUEUE_CAPACITY),
        }
    }
}

impl<T: Send + 'static> PoolBuilder<T> {
    /// Creates the base configuration for a new pool.
    ///
    /// See: [`PoolBuilder::default`]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker function. Every payload submitted through
    /// [`WorkerPool::submit`] is fed to it; a
    /// [`submit_with`](WorkerPool::submit_with) item brings its own
    /// callback instead.
    #[must_use]
    pub fn worker_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.worker_fn = Some(Box::new(f));
        self
    }

    /// Sets the number of worker threads. `0` (the default) picks one per
    /// logical CPU.
    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the capacity of the bounded work queue. Submissions beyond it
    /// are rejected with [`SubmitError::Full`](crate::SubmitError::Full)
    /// until workers drain the backlog.
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Removes the queue bound entirely. Submissions are then only
    /// rejected once the pool is shutting down.
    #[must_use]
    pub fn unbounded(mut self) -> Self {
        self.queue_capacity = None;
        self
    }

    /// Builds the pool and starts its worker threads.
    ///
    /// The threads are long-lived and detached; they end only when the
    /// pool shuts down or its last handle is dropped.
    ///
    /// # Errors
    ///
    /// [`BuildError::MissingWorkerFn`] if no worker function was
    /// configured, [`BuildError::ZeroCapacity`] if a zero-slot bounded
    /// queue was requested.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to spawn a thread; the pool
    /// treats that as unrecoverable.
    pub fn build(self) -> Result<WorkerPool<T>, BuildError> {
        if self.queue_capacity == Some(0) {
            return Err(BuildError::ZeroCapacity);
        }
        let worker_fn = self.worker_fn.ok_or(BuildError::MissingWorkerFn)?;
        let threads = if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        };
        Ok(WorkerPool::start(worker_fn, threads, self.queue_capacity))
    }
}
