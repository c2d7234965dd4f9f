use std::sync::{
    atomic::{AtomicU16, AtomicUsize, Ordering},
    Arc,
};
use std::thread;

use workpile::{PoolBuilder, SubmitError};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn three_workers_transform_ten_payloads_exactly_once() {
    init_logs();
    let pool = PoolBuilder::new()
        .threads(3)
        .queue_capacity(32)
        .worker_fn(|slot: Arc<AtomicU16>| {
            slot.fetch_add(100, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let slots: Vec<_> = (0u16..10).map(|i| Arc::new(AtomicU16::new(i))).collect();
    for slot in &slots {
        pool.submit(Arc::clone(slot)).unwrap();
    }
    pool.wait();

    // Dispatch-to-worker mapping is unspecified, but the output set is
    // fixed: each input transformed exactly once, not zero, not twice.
    let mut outputs: Vec<u16> = slots.iter().map(|s| s.load(Ordering::SeqCst)).collect();
    outputs.sort_unstable();
    assert_eq!((100..110).collect::<Vec<u16>>(), outputs);

    assert!(pool.shutdown().is_empty());
    assert_eq!(0, pool.worker_count());
}

#[test]
fn pool_is_reusable_across_wait_calls() {
    init_logs();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let pool = PoolBuilder::new()
        .threads(2)
        .worker_fn(move |_: u32| {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    for round in 1..=3 {
        for i in 0..20 {
            pool.submit(i).unwrap();
        }
        pool.wait();
        assert_eq!(20 * round, hits.load(Ordering::SeqCst));
    }
}

#[test]
fn shutdown_racing_a_producer_loses_no_payloads() {
    init_logs();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let pool = PoolBuilder::new()
        .threads(2)
        .queue_capacity(8)
        .worker_fn(move |_: u64| {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let producer_pool = pool.clone();
    let producer = thread::spawn(move || {
        let mut accepted = 0usize;
        for i in 0u64.. {
            match producer_pool.submit(i) {
                Ok(()) => accepted += 1,
                Err(SubmitError::Full(_)) => thread::yield_now(),
                Err(SubmitError::Stopped(_)) => break,
            }
        }
        accepted
    });

    // Let the producer make some progress before pulling the plug.
    while hits.load(Ordering::SeqCst) < 50 {
        thread::yield_now();
    }
    let drained = pool.shutdown();
    let accepted = producer.join().unwrap();

    // Every accepted payload either ran or came back out of `shutdown`.
    assert_eq!(accepted, hits.load(Ordering::SeqCst) + drained.len());
    assert_eq!(0, pool.worker_count());
    assert_eq!(0, pool.active_count());
}

#[test]
fn per_item_callbacks_interleave_with_the_default() {
    init_logs();
    let default_hits = Arc::new(AtomicUsize::new(0));
    let d = default_hits.clone();
    let pool = PoolBuilder::new()
        .threads(4)
        .worker_fn(move |_: usize| {
            d.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let item_hits = Arc::new(AtomicUsize::new(0));
    for i in 0..40 {
        if i % 2 == 0 {
            pool.submit(i).unwrap();
        } else {
            let item = item_hits.clone();
            pool.submit_with(i, move |_| {
                item.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
    }
    pool.wait();

    assert_eq!(20, default_hits.load(Ordering::SeqCst));
    assert_eq!(20, item_hits.load(Ordering::SeqCst));
}
