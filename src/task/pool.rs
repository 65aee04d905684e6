//! Task pool construction, dispatch and shutdown.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{self as channel, Receiver, Sender, TryRecvError, select};
use parking_lot::Mutex;
use tracing::{debug, error};

use super::worker;
use crate::config::TaskPoolConfig;
use crate::error::TaskPoolError;

/// A unit of work run by a pool worker.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

type WorkerHandle = JoinHandle<Result<(), TaskPoolError>>;

/// Outcome of [`TaskPool::close`].
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Number of worker threads joined by this call that exited cleanly or
    /// with an error result. Panicked workers are joined too but only show
    /// up in [`errors`](Self::errors).
    pub workers_joined: usize,
    /// Errors returned or raised by the joined workers.
    pub errors: Vec<TaskPoolError>,
}

impl ShutdownReport {
    /// Returns `true` if every joined worker exited without error.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A fixed set of worker threads consuming from sharded bounded queues.
///
/// Worker `i` is bound to queue `i % shard_count`. [`add_task`](Self::add_task)
/// spreads tasks over the queues with a rotating counter;
/// [`add_shard_task`](Self::add_shard_task) lets the caller pick the queue,
/// which keeps tasks sharing a shard index in FIFO order relative to each
/// other when the shard has a single worker.
///
/// Dropping the pool closes it.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use poolkit::{TaskPool, TaskPoolConfig};
///
/// let pool = TaskPool::new(TaskPoolConfig::new(4).with_queue_number(2))?;
/// let hits = Arc::new(AtomicUsize::new(0));
///
/// for _ in 0..16 {
///     let hits = Arc::clone(&hits);
///     pool.add_task(move || {
///         hits.fetch_add(1, Ordering::Relaxed);
///     });
/// }
///
/// let report = pool.close();
/// assert!(report.is_clean());
/// assert_eq!(hits.load(Ordering::Relaxed), 16);
/// # Ok::<(), poolkit::TaskPoolError>(())
/// ```
pub struct TaskPool {
    config: TaskPoolConfig,
    index: AtomicUsize,
    queues: Box<[Sender<Task>]>,
    done_tx: Mutex<Option<Sender<()>>>,
    done_rx: Receiver<()>,
    worker_ids: Box<[ThreadId]>,
    workers: Mutex<Vec<WorkerHandle>>,
}

impl TaskPool {
    /// Validates `config` and starts its workers.
    ///
    /// # Errors
    ///
    /// Returns [`TaskPoolError::InvalidPoolSize`] if the pool size is zero,
    /// or [`TaskPoolError::Spawn`] if a worker thread cannot be started. In
    /// the latter case the workers already started are shut down first.
    pub fn new(config: TaskPoolConfig) -> Result<Self, TaskPoolError> {
        let config = config.validate()?;
        let (done_tx, done_rx) = channel::bounded::<()>(0);
        let (queues, receivers): (Vec<_>, Vec<_>) = (0..config.queue_number())
            .map(|_| channel::bounded::<Task>(config.queue_len()))
            .unzip();

        let mut workers = Vec::with_capacity(config.pool_size());
        for i in 0..config.pool_size() {
            let queue = receivers[i % receivers.len()].clone();
            let done = done_rx.clone();
            let spawned = thread::Builder::new()
                .name(format!("poolkit-worker-{i}"))
                .spawn(move || worker::run(i, queue, done));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    error!(worker = i, error = %e, "failed to spawn task worker");
                    drop(done_tx);
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(TaskPoolError::Spawn(e));
                }
            }
        }

        debug!(
            workers = config.pool_size(),
            shards = config.queue_number(),
            queue_len = config.queue_len(),
            "task pool started"
        );

        let worker_ids = workers.iter().map(|h| h.thread().id()).collect();

        Ok(Self {
            config,
            index: AtomicUsize::new(0),
            queues: queues.into_boxed_slice(),
            done_tx: Mutex::new(Some(done_tx)),
            done_rx,
            worker_ids,
            workers: Mutex::new(workers),
        })
    }

    /// Submits `task` to the next queue in rotation.
    ///
    /// Blocks while that queue is full. Dropped without running if the pool
    /// is closed or closes while the call is blocked.
    pub fn add_task<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let i = self.index.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        self.enqueue(i, Box::new(task));
    }

    /// Submits `task` to queue `index % shard_count`.
    ///
    /// Blocking and drop behavior match [`add_task`](Self::add_task).
    pub fn add_shard_task<F>(&self, index: usize, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(index, Box::new(task));
    }

    fn enqueue(&self, index: usize, task: Task) {
        if self.is_closed() {
            return;
        }
        let queue = &self.queues[index % self.queues.len()];
        select! {
            recv(self.done_rx) -> _ => {}
            send(queue, task) -> _ => {}
        }
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        matches!(self.done_rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Stops accepting tasks and waits for every worker to drain its queue
    /// and exit.
    ///
    /// Safe to call more than once and from several threads: concurrent
    /// callers wait for the first one, and later calls return an empty
    /// report. A queue is closed once the last worker bound to it exits.
    ///
    /// Called from one of the pool's own tasks, this only fires the latch
    /// and returns an empty report without waiting; the workers exit once
    /// their queues are drained.
    ///
    /// A task that never returns blocks this call indefinitely.
    pub fn close(&self) -> ShutdownReport {
        if self.worker_ids.contains(&thread::current().id()) {
            if self.done_tx.lock().take().is_some() {
                debug!("task pool closing from a worker");
            }
            return ShutdownReport::default();
        }

        let mut workers = self.workers.lock();
        if self.done_tx.lock().take().is_some() {
            debug!(workers = workers.len(), "task pool closing");
        }

        let mut report = ShutdownReport::default();
        for (worker, handle) in workers.drain(..).enumerate() {
            match handle.join() {
                Ok(Ok(())) => report.workers_joined += 1,
                Ok(Err(e)) => {
                    report.workers_joined += 1;
                    report.errors.push(e);
                }
                Err(_) => {
                    error!(worker, "task worker panicked");
                    report.errors.push(TaskPoolError::WorkerPanicked { worker });
                }
            }
        }

        if report.workers_joined > 0 {
            debug!(
                joined = report.workers_joined,
                errors = report.errors.len(),
                "task pool closed"
            );
        }
        report
    }

    /// Returns the number of task queues.
    pub fn shard_count(&self) -> usize {
        self.queues.len()
    }

    /// Returns the number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.config.pool_size()
    }

    /// Returns the capacity of each task queue.
    pub fn queue_len(&self) -> usize {
        self.config.queue_len()
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskPool")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
