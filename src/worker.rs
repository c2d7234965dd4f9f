use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
};

use crossbeam_channel::Receiver;
use log::{debug, error};

use crate::{pool::Monitor, work::WorkItem};

/// Spawns one detached worker thread.
///
/// The pool never joins the handle; a worker announces its exit by
/// decrementing the live count under the state lock, and the quiescence
/// barrier observes that instead of the OS thread.
pub(crate) fn spawn<T: Send + 'static>(
    id: usize,
    monitor: Arc<Monitor<T>>,
    receiver: Receiver<WorkItem<T>>,
) {
    thread::Builder::new()
        .name(format!("workpile-worker-{}", id))
        .spawn(move || run(id, monitor, receiver))
        .expect("failed to spawn a worker thread.");
}

fn run<T>(id: usize, monitor: Arc<Monitor<T>>, receiver: Receiver<WorkItem<T>>) {
    // Idle: the blocking `recv` stands in for a work-available condition
    // variable and holds no pool lock while parked. A disconnect means the
    // intake is gone, either through shutdown or the last handle dropping.
    while let Ok(item) = receiver.recv() {
        {
            let mut state = monitor.state.lock().unwrap();
            if state.stopping {
                // Claimed after a stop request: the callback must not run.
                // Park the payload so shutdown can hand it back.
                state.queued -= 1;
                state.discarded.push(item.into_payload());
                continue;
            }
            state.queued -= 1;
            state.active += 1;
        }

        // The callback runs unlocked; only dispatch accounting is ever
        // serialized. A panicking callback is contained here so the
        // counters stay balanced and `wait` cannot hang on it.
        if panic::catch_unwind(AssertUnwindSafe(|| item.run(&monitor.worker_fn))).is_err() {
            error!("worker {} caught a panicking worker function", id);
        }

        let mut state = monitor.state.lock().unwrap();
        state.active -= 1;
        if !state.stopping && state.active == 0 && state.queued == 0 {
            // Last one to finish flips the pool to quiescent. An item
            // arriving between this check and the notify is still safe:
            // waiters re-check the predicate under the same lock.
            monitor.quiesced.notify_all();
        }
    }

    let mut state = monitor.state.lock().unwrap();
    state.alive -= 1;
    monitor.quiesced.notify_all();
    debug!("worker {} exiting, {} workers still alive", id, state.alive);
}
