//! Worker loop bound to a single task queue.

use crossbeam_channel::{Receiver, select};
use tracing::{debug, trace, warn};

use super::Task;
use crate::error::TaskPoolError;

/// Runs tasks from `queue` until `done` disconnects, then drains the queue.
///
/// Returns [`TaskPoolError::PendingTasks`] if tasks are still queued once
/// the drain finds the queue empty, which happens when a submission races
/// with shutdown.
pub(crate) fn run(
    worker: usize,
    queue: Receiver<Task>,
    done: Receiver<()>,
) -> Result<(), TaskPoolError> {
    trace!(worker, "task worker started");

    loop {
        select! {
            recv(done) -> _ => break,
            recv(queue) -> task => match task {
                Ok(task) => task(),
                Err(_) => break,
            },
        }
    }

    while let Ok(task) = queue.try_recv() {
        task();
    }

    let pending = queue.len();
    if pending > 0 {
        warn!(worker, pending, "task worker exiting with queued tasks");
        return Err(TaskPoolError::PendingTasks { worker, pending });
    }

    debug!(worker, "task worker exited");
    Ok(())
}
