// Integration tests for TaskPool
// Tests cover: dispatch, exactly-once execution, shard routing, shutdown

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use poolkit::{TaskPool, TaskPoolConfig, TaskPoolError};

// ============================================================================
// Dispatch
// ============================================================================

#[test]
fn test_sixteen_tasks_collected_once() {
    let config = TaskPoolConfig::new(4)
        .with_queue_number(2)
        .with_queue_len(8);
    let pool = TaskPool::new(config).unwrap();
    let collector = Arc::new(Mutex::new(Vec::new()));

    for i in 0..16 {
        let collector = Arc::clone(&collector);
        pool.add_task(move || collector.lock().unwrap().push(i));
    }
    let report = pool.close();
    assert!(report.is_clean(), "errors: {:?}", report.errors);
    assert_eq!(report.workers_joined, 4);

    let mut seen = collector.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, (0..16).collect::<Vec<_>>());
}

#[test]
fn test_many_tasks_run_exactly_once() {
    const TASKS: usize = 10_000;
    let pool = TaskPool::new(TaskPoolConfig::new(8).with_queue_len(16)).unwrap();
    let runs: Arc<Vec<AtomicUsize>> = Arc::new((0..TASKS).map(|_| AtomicUsize::new(0)).collect());

    for i in 0..TASKS {
        let runs = Arc::clone(&runs);
        pool.add_task(move || {
            runs[i].fetch_add(1, Ordering::Relaxed);
        });
    }
    pool.close();

    assert!(runs.iter().all(|r| r.load(Ordering::Relaxed) == 1));
}

#[test]
fn test_concurrent_submitters() {
    let pool = Arc::new(TaskPool::new(TaskPoolConfig::new(4).with_queue_len(4)).unwrap());
    let total = Arc::new(AtomicUsize::new(0));

    thread::scope(|s| {
        for _ in 0..4 {
            let pool = Arc::clone(&pool);
            let total = Arc::clone(&total);
            s.spawn(move || {
                for _ in 0..250 {
                    let total = Arc::clone(&total);
                    pool.add_task(move || {
                        total.fetch_add(1, Ordering::Relaxed);
                    });
                }
            });
        }
    });

    pool.close();
    assert_eq!(total.load(Ordering::Relaxed), 1000);
}

#[test]
fn test_shard_tasks_keep_fifo_order() {
    let pool = TaskPool::new(TaskPoolConfig::new(3).with_queue_number(3)).unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..100 {
        let order = Arc::clone(&order);
        pool.add_shard_task(4, move || order.lock().unwrap().push(i));
    }
    pool.close();

    assert_eq!(*order.lock().unwrap(), (0..100).collect::<Vec<_>>());
}

#[test]
fn test_shard_tasks_stay_on_shard_workers() {
    // Six workers over three shards: shard 1 is served by workers 1 and 4.
    let pool = TaskPool::new(TaskPoolConfig::new(6).with_queue_number(3)).unwrap();
    let names = Arc::new(Mutex::new(HashSet::new()));

    for _ in 0..200 {
        let names = Arc::clone(&names);
        pool.add_shard_task(7, move || {
            let name = thread::current().name().unwrap_or_default().to_owned();
            names.lock().unwrap().insert(name);
        });
    }
    pool.close();

    let allowed: HashSet<String> = ["poolkit-worker-1", "poolkit-worker-4"]
        .into_iter()
        .map(String::from)
        .collect();
    let names = names.lock().unwrap();
    assert!(!names.is_empty());
    assert!(names.is_subset(&allowed), "unexpected workers: {names:?}");
}

// ============================================================================
// Backpressure
// ============================================================================

#[test]
fn test_full_queue_blocks_until_worker_frees_slot() {
    let pool = Arc::new(TaskPool::new(TaskPoolConfig::new(1).with_queue_len(1)).unwrap());
    let gate = Arc::new(Barrier::new(2));
    let submitted = Arc::new(AtomicUsize::new(0));

    // Occupy the worker, then fill the single queue slot.
    let worker_gate = Arc::clone(&gate);
    pool.add_task(move || {
        worker_gate.wait();
    });
    pool.add_task(|| {});

    let submitter = {
        let pool = Arc::clone(&pool);
        let submitted = Arc::clone(&submitted);
        thread::spawn(move || {
            pool.add_task(|| {});
            submitted.store(1, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert_eq!(submitted.load(Ordering::SeqCst), 0, "submission should block");

    gate.wait();
    submitter.join().unwrap();
    assert_eq!(submitted.load(Ordering::SeqCst), 1);
    assert!(pool.close().is_clean());
}

#[test]
fn test_close_unblocks_waiting_submitter() {
    let pool = Arc::new(TaskPool::new(TaskPoolConfig::new(1).with_queue_len(1)).unwrap());
    let gate = Arc::new(Barrier::new(2));
    let ran = Arc::new(AtomicUsize::new(0));

    let worker_gate = Arc::clone(&gate);
    pool.add_task(move || {
        worker_gate.wait();
    });
    pool.add_task(|| {});

    let submitter = {
        let pool = Arc::clone(&pool);
        let ran = Arc::clone(&ran);
        thread::spawn(move || {
            pool.add_task(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            });
        })
    };
    thread::sleep(Duration::from_millis(50));

    // Fire the latch from a helper while the worker is still parked.
    let closer = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.close())
    };
    submitter.join().unwrap();

    gate.wait();
    let report = closer.join().unwrap();
    assert_eq!(report.workers_joined, 1);
    assert!(pool.is_closed());
    assert_eq!(ran.load(Ordering::SeqCst), 0, "blocked submission should be dropped");
}

// ============================================================================
// Shutdown
// ============================================================================

#[test]
fn test_close_waits_for_enqueued_tasks() {
    let pool = TaskPool::new(TaskPoolConfig::new(2).with_queue_len(64)).unwrap();
    let done = Arc::new(AtomicUsize::new(0));

    for _ in 0..40 {
        let done = Arc::clone(&done);
        pool.add_task(move || {
            thread::sleep(Duration::from_millis(2));
            done.fetch_add(1, Ordering::SeqCst);
        });
    }
    pool.close();
    assert_eq!(done.load(Ordering::SeqCst), 40);
}

#[test]
fn test_close_twice_and_concurrently() {
    let pool = Arc::new(TaskPool::new(TaskPoolConfig::new(4)).unwrap());

    let joined: usize = thread::scope(|s| {
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let pool = Arc::clone(&pool);
                s.spawn(move || pool.close().workers_joined)
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(joined, 4);
    assert_eq!(pool.close().workers_joined, 0);
    assert!(pool.is_closed());
}

#[test]
fn test_tasks_after_close_are_dropped() {
    let pool = TaskPool::new(TaskPoolConfig::new(2)).unwrap();
    assert!(!pool.is_closed());
    pool.close();
    assert!(pool.is_closed());

    let ran = Arc::new(AtomicUsize::new(0));
    for i in 0..10 {
        let ran = Arc::clone(&ran);
        pool.add_shard_task(i, move || {
            ran.fetch_add(1, Ordering::SeqCst);
        });
    }
    thread::sleep(Duration::from_millis(20));
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn test_invalid_pool_size() {
    let err = TaskPool::new(TaskPoolConfig::new(0)).unwrap_err();
    assert!(matches!(err, TaskPoolError::InvalidPoolSize { size: 0 }));
    assert_eq!(err.to_string(), "illegal pool size 0");
}
