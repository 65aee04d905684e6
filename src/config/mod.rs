//! Configuration for the sharded task pool.
//!
//! - [`TaskPoolConfig`] - Controls worker count, shard count and queue depth
//!
//! # Example
//!
//! ```
//! use poolkit::TaskPoolConfig;
//!
//! let config = TaskPoolConfig::new(4)
//!     .with_queue_number(2)
//!     .with_queue_len(8)
//!     .validate()?;
//!
//! assert_eq!(config.queue_number(), 2);
//! # Ok::<(), poolkit::TaskPoolError>(())
//! ```

use crate::error::TaskPoolError;

/// Default number of task queues (shards).
pub const DEFAULT_TASK_QUEUE_NUMBER: usize = 10;

/// Default capacity of each task queue.
pub const DEFAULT_TASK_QUEUE_LEN: usize = 128;

/// Configuration for a [`TaskPool`](crate::TaskPool).
///
/// A pool runs `pool_size` worker threads over `queue_number` bounded
/// queues of `queue_len` tasks each. Worker `i` drains queue
/// `i % queue_number`, so several workers may share one queue.
///
/// # Normalization
///
/// [`TaskPoolConfig::validate`] applies these rules:
/// - `pool_size` must be at least 1
/// - a zero `queue_len` becomes [`DEFAULT_TASK_QUEUE_LEN`]
/// - a zero `queue_number` becomes [`DEFAULT_TASK_QUEUE_NUMBER`]
/// - `queue_number` is clamped to `pool_size`, so no queue is left without
///   a worker
///
/// # Example
///
/// ```
/// use poolkit::TaskPoolConfig;
///
/// // Ten default shards are clamped to the three workers.
/// let config = TaskPoolConfig::new(3).validate()?;
/// assert_eq!(config.queue_number(), 3);
/// assert_eq!(config.queue_len(), 128);
/// # Ok::<(), poolkit::TaskPoolError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskPoolConfig {
    /// Number of worker threads.
    pool_size: usize,

    /// Capacity of each task queue.
    queue_len: usize,

    /// Number of task queues.
    queue_number: usize,
}

impl TaskPoolConfig {
    /// Creates a configuration for `pool_size` workers with default queues.
    ///
    /// The configuration is not validated until [`TaskPoolConfig::validate`]
    /// (or [`TaskPool::new`](crate::TaskPool::new)) runs.
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            queue_len: 0,
            queue_number: 0,
        }
    }

    /// Sets the number of worker threads.
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Sets the capacity of each task queue. Zero selects the default.
    pub fn with_queue_len(mut self, len: usize) -> Self {
        self.queue_len = len;
        self
    }

    /// Sets the number of task queues. Zero selects the default.
    pub fn with_queue_number(mut self, number: usize) -> Self {
        self.queue_number = number;
        self
    }

    /// Returns the number of worker threads.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Returns the capacity of each task queue.
    pub fn queue_len(&self) -> usize {
        self.queue_len
    }

    /// Returns the number of task queues.
    pub fn queue_number(&self) -> usize {
        self.queue_number
    }

    /// Validates the configuration and returns its normalized form.
    ///
    /// # Errors
    ///
    /// Returns [`TaskPoolError::InvalidPoolSize`] if `pool_size` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use poolkit::TaskPoolConfig;
    ///
    /// assert!(TaskPoolConfig::new(0).validate().is_err());
    /// ```
    pub fn validate(mut self) -> Result<Self, TaskPoolError> {
        if self.pool_size < 1 {
            return Err(TaskPoolError::InvalidPoolSize {
                size: self.pool_size,
            });
        }

        if self.queue_len < 1 {
            self.queue_len = DEFAULT_TASK_QUEUE_LEN;
        }

        if self.queue_number < 1 {
            self.queue_number = DEFAULT_TASK_QUEUE_NUMBER;
        }

        if self.queue_number > self.pool_size {
            self.queue_number = self.pool_size;
        }

        Ok(self)
    }
}
