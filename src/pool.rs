use std::{
    fmt,
    sync::{Arc, Condvar, Mutex},
};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::debug;

use crate::{
    work::{WorkItem, WorkerFn},
    worker,
};

/// An error returned from [`WorkerPool::submit`] and
/// [`WorkerPool::submit_with`].
///
/// Both variants hand the rejected payload back so the caller can retry or
/// dispose of it; the pool never keeps a payload it will not run.
pub enum SubmitError<T> {
    /// The bounded work queue is at capacity. This is ordinary
    /// backpressure, not a fault: retry once workers have drained some of
    /// the backlog, or shed the load.
    Full(T),

    /// The pool has begun shutting down and accepts no further work.
    Stopped(T),
}

impl<T> SubmitError<T> {
    /// Consumes the error, returning the rejected payload.
    pub fn into_payload(self) -> T {
        match self {
            SubmitError::Full(payload) | SubmitError::Stopped(payload) => payload,
        }
    }
}

impl<T> fmt::Debug for SubmitError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Full(_) => f.pad("Full(..)"),
            SubmitError::Stopped(_) => f.pad("Stopped(..)"),
        }
    }
}

impl<T> fmt::Display for SubmitError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Full(_) => write!(f, "the work queue is full"),
            SubmitError::Stopped(_) => write!(f, "the pool is shutting down"),
        }
    }
}

impl<T> std::error::Error for SubmitError<T> {}

/// Mutable pool accounting. Guarded by the single mutex in [`Monitor`];
/// no field is read or written anywhere without holding it.
pub(crate) struct PoolState<T> {
    /// Payloads accepted but not yet claimed and accounted by a worker.
    pub(crate) queued: usize,
    /// Workers currently inside a callback.
    pub(crate) active: usize,
    /// Worker threads that have not exited their loop.
    pub(crate) alive: usize,
    /// Flips to `true` once, at shutdown. Never reversed.
    pub(crate) stopping: bool,
    /// Payloads a worker claimed after the stop request. Handed back to
    /// the caller when `shutdown` returns.
    pub(crate) discarded: Vec<T>,
}

impl<T> PoolState<T> {
    /// The barrier predicate: either the pool is running with nothing
    /// queued and nobody working, or it is stopping and every worker has
    /// exited.
    pub(crate) fn is_quiesced(&self) -> bool {
        if self.stopping {
            self.alive == 0
        } else {
            self.queued == 0 && self.active == 0
        }
    }
}

/// The part of the pool shared with the worker threads: the accounting
/// record, the condition the quiescence barrier sleeps on, and the default
/// worker function.
pub(crate) struct Monitor<T> {
    pub(crate) state: Mutex<PoolState<T>>,
    pub(crate) quiesced: Condvar,
    pub(crate) worker_fn: WorkerFn<T>,
}

/// The intake side of the queue. Reachable only from pool handles, never
/// from workers, so dropping the last handle disconnects the channel and
/// lets idle workers exit even without an explicit `shutdown`.
struct Intake<T> {
    /// Taken (and thereby dropped) at shutdown; `None` afterwards.
    sender: Mutex<Option<Sender<WorkItem<T>>>>,
    /// Kept so `shutdown` can reclaim undispatched items.
    receiver: Receiver<WorkItem<T>>,
}

/// A fixed-size pool of worker threads that feed submitted payloads
/// through one worker function.
///
/// The pool binds a default worker function at construction; every call to
/// [`submit`] dispatches one payload to it, and [`submit_with`] may bind a
/// different callback to a single item. Payloads are claimed in strict
/// submission order, though completion order across workers is
/// unspecified.
///
/// # Work queue
///
/// Pending payloads sit in a FIFO queue between the producers and the
/// workers. By default the queue is bounded: once `queue_capacity` items
/// are waiting, [`submit`] returns the payload back inside
/// [`SubmitError::Full`] rather than blocking or dropping it. A pool built
/// with [`unbounded`](crate::PoolBuilder::unbounded) never reports a full
/// queue.
///
/// # Quiescence
///
/// [`wait`] blocks the caller until the pool is quiescent: nothing queued
/// and no worker inside a callback (or, once shutdown has begun, until
/// every worker has exited). Any number of threads may wait concurrently;
/// all of them are released together.
///
/// # Shutdown
///
/// [`shutdown`] stops the intake, reclaims every payload that was still
/// waiting in the queue, and blocks until the last worker thread has
/// exited. The reclaimed payloads are returned to the caller; their
/// callbacks never run. Worker threads are detached — the pool tracks
/// their number itself and never joins an OS thread handle.
///
/// Handles are cheap to clone and share one pool. The pool keeps running
/// while any handle exists; dropping the last handle closes the intake, so
/// idle workers do not outlive their pool.
///
/// [`submit`]: WorkerPool::submit
/// [`submit_with`]: WorkerPool::submit_with
/// [`wait`]: WorkerPool::wait
/// [`shutdown`]: WorkerPool::shutdown
pub struct WorkerPool<T> {
    intake: Arc<Intake<T>>,
    monitor: Arc<Monitor<T>>,
    capacity: Option<usize>,
}

impl<T> Clone for WorkerPool<T> {
    fn clone(&self) -> Self {
        WorkerPool {
            intake: Arc::clone(&self.intake),
            monitor: Arc::clone(&self.monitor),
            capacity: self.capacity,
        }
    }
}

impl<T> fmt::Debug for WorkerPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Creates the shared state and spawns the worker threads.
    ///
    /// This assumes the builder already validated its arguments and
    /// resolved the thread count.
    pub(crate) fn start(worker_fn: WorkerFn<T>, threads: usize, capacity: Option<usize>) -> Self {
        let (sender, receiver) = match capacity {
            Some(n) => crossbeam_channel::bounded(n),
            None => crossbeam_channel::unbounded(),
        };

        let monitor = Arc::new(Monitor {
            state: Mutex::new(PoolState {
                queued: 0,
                active: 0,
                alive: threads,
                stopping: false,
                discarded: Vec::new(),
            }),
            quiesced: Condvar::new(),
            worker_fn,
        });

        debug!("starting {} worker threads", threads);
        for id in 0..threads {
            worker::spawn(id, Arc::clone(&monitor), receiver.clone());
        }

        WorkerPool {
            intake: Arc::new(Intake {
                sender: Mutex::new(Some(sender)),
                receiver,
            }),
            monitor,
            capacity,
        }
    }

    /// Submits one payload for the pool's default worker function.
    ///
    /// The payload goes to the tail of the queue; an idle worker picks it
    /// up in submission order. Submission never blocks.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Full`] if the bounded queue is at capacity, and
    /// [`SubmitError::Stopped`] if [`shutdown`](WorkerPool::shutdown) has
    /// begun. The payload rides back inside the error either way.
    pub fn submit(&self, payload: T) -> Result<(), SubmitError<T>> {
        self.submit_item(WorkItem::new(payload))
    }

    /// Submits one payload with its own callback, overriding the pool's
    /// default worker function for this item only.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](WorkerPool::submit).
    pub fn submit_with<F>(&self, payload: T, item_fn: F) -> Result<(), SubmitError<T>>
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.submit_item(WorkItem::with_fn(payload, Box::new(item_fn)))
    }

    fn submit_item(&self, item: WorkItem<T>) -> Result<(), SubmitError<T>> {
        let intake = self.intake.sender.lock().unwrap();
        let Some(sender) = intake.as_ref() else {
            return Err(SubmitError::Stopped(item.into_payload()));
        };

        // `queued` must move together with the channel occupancy, so the
        // send happens under the state lock. `try_send` never blocks.
        let mut state = self.monitor.state.lock().unwrap();
        if state.stopping {
            return Err(SubmitError::Stopped(item.into_payload()));
        }
        match sender.try_send(item) {
            Ok(()) => {
                state.queued += 1;
                Ok(())
            }
            Err(TrySendError::Full(item)) => Err(SubmitError::Full(item.into_payload())),
            Err(TrySendError::Disconnected(item)) => {
                Err(SubmitError::Stopped(item.into_payload()))
            }
        }
    }

    /// Blocks until the pool is quiescent.
    ///
    /// Returns once nothing is queued and no worker is inside a callback,
    /// or — after [`shutdown`](WorkerPool::shutdown) has begun — once every
    /// worker thread has exited. A pool with no outstanding work returns
    /// immediately, so calling this twice in a row is harmless.
    ///
    /// Purely observational: the pool stays usable afterwards and any
    /// number of threads may wait at once.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    /// use workpile::PoolBuilder;
    ///
    /// let sum = Arc::new(AtomicUsize::new(0));
    /// let s = Arc::clone(&sum);
    /// let pool = PoolBuilder::new()
    ///     .threads(4)
    ///     .worker_fn(move |n: usize| {
    ///         s.fetch_add(n, Ordering::SeqCst);
    ///     })
    ///     .build()
    ///     .unwrap();
    ///
    /// for n in 1..=10 {
    ///     pool.submit(n).unwrap();
    /// }
    ///
    /// // Every submitted payload has been processed by the time this
    /// // returns.
    /// pool.wait();
    /// assert_eq!(55, sum.load(Ordering::SeqCst));
    /// ```
    pub fn wait(&self) {
        let mut state = self.monitor.state.lock().unwrap();
        while !state.is_quiesced() {
            state = self.monitor.quiesced.wait(state).unwrap();
        }
    }

    /// Shuts the pool down and blocks until every worker thread has
    /// exited.
    ///
    /// Payloads still waiting in the queue are reclaimed and returned;
    /// their callbacks never run. Work already inside a callback is
    /// allowed to finish. Afterwards [`submit`](WorkerPool::submit)
    /// rejects with [`SubmitError::Stopped`] on every handle of this pool,
    /// and calling `shutdown` again is a no-op that returns an empty
    /// `Vec`.
    ///
    /// # Examples
    ///
    /// ```
    /// use workpile::PoolBuilder;
    ///
    /// let pool = PoolBuilder::new()
    ///     .threads(2)
    ///     .worker_fn(|_: u32| {})
    ///     .build()
    ///     .unwrap();
    ///
    /// pool.shutdown();
    /// assert!(pool.submit(7).is_err());
    /// ```
    pub fn shutdown(&self) -> Vec<T> {
        let mut drained = Vec::new();
        {
            let mut intake = self.intake.sender.lock().unwrap();
            {
                let mut state = self.monitor.state.lock().unwrap();
                state.stopping = true;
                // Reclaim everything still undispatched. Workers racing us
                // here park their claims in `discarded` instead.
                while let Ok(item) = self.intake.receiver.try_recv() {
                    state.queued -= 1;
                    drained.push(item.into_payload());
                }
            }
            // Dropping the only sender disconnects the channel; idle
            // workers wake from `recv` and exit.
            intake.take();
        }

        self.wait();

        let mut state = self.monitor.state.lock().unwrap();
        drained.append(&mut state.discarded);
        if !drained.is_empty() {
            debug!("shutdown reclaimed {} undispatched payloads", drained.len());
        }
        drained
    }

    /// Returns the number of workers currently inside a callback.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.monitor.state.lock().unwrap().active
    }

    /// Returns the number of payloads waiting to be claimed.
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.monitor.state.lock().unwrap().queued
    }

    /// Returns the number of worker threads that have not exited.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.monitor.state.lock().unwrap().alive
    }

    /// Returns `true` once shutdown has begun.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.monitor.state.lock().unwrap().stopping
    }

    /// Returns the queue capacity, or `None` for an unbounded pool.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
