//! # Workpile
//!
//! A fixed-size pool of worker threads that feed a stream of
//! caller-supplied payloads through one worker function, with an
//! optionally bounded backlog, FIFO dispatch, and a barrier that blocks
//! until all submitted work has completed.
//!
//! # Build a pool
//!
//! Use the [`PoolBuilder`] to bind the worker function and configure the
//! thread count and queue bound. Each submission may also bring its own
//! callback via [`WorkerPool::submit_with`].
//!
//! Results are communicated by the worker function itself, typically by
//! writing back through the payload; the pool only guarantees delivery,
//! ordering, and completion accounting.
//!
//! # Examples
//!
//! ```
//! use std::sync::atomic::{AtomicU16, Ordering};
//! use std::sync::Arc;
//! use workpile::PoolBuilder;
//!
//! let pool = PoolBuilder::new()
//!     .threads(3)
//!     .queue_capacity(32)
//!     .worker_fn(|slot: Arc<AtomicU16>| {
//!         slot.fetch_add(100, Ordering::SeqCst);
//!     })
//!     .build()
//!     .unwrap();
//!
//! let slots: Vec<_> = (0u16..10).map(|i| Arc::new(AtomicU16::new(i))).collect();
//! for slot in &slots {
//!     pool.submit(Arc::clone(slot)).unwrap();
//! }
//!
//! // Block until every submitted payload has been processed.
//! pool.wait();
//!
//! let mut seen: Vec<u16> = slots.iter().map(|s| s.load(Ordering::SeqCst)).collect();
//! seen.sort_unstable();
//! assert_eq!((100..110).collect::<Vec<u16>>(), seen);
//!
//! // Stop the workers; anything still queued would be handed back here.
//! assert!(pool.shutdown().is_empty());
//! ```

mod builder;
mod pool;

pub(crate) mod work;
pub(crate) mod worker;

pub use builder::*;
pub use pool::*;
