//! Core object pool implementation.

use std::fmt;

use crossbeam_queue::SegQueue;

use super::Poolable;

/// Thread-safe pool of reusable values.
///
/// Values are built on demand by the factory and parked in a lock-free free
/// list when returned. The pool makes no ordering promise about which parked
/// value a `get` receives.
///
/// Parked values are never shed on their own: a pool built with
/// [`new`](Self::new) keeps every value returned after a burst for the life
/// of the pool. Use [`with_max_idle`](Self::with_max_idle) to drop values
/// returned while the free list is already full.
///
/// # Example
///
/// ```
/// use poolkit::{ByteBuffer, ObjectPool};
///
/// let pool = ObjectPool::new(ByteBuffer::new);
///
/// let mut buf = pool.get(64);
/// buf.write(b"hello");
/// pool.put(buf);
///
/// let buf = pool.get(64);
/// assert!(buf.is_empty());
/// ```
pub struct ObjectPool<T> {
    factory: Box<dyn Fn() -> T + Send + Sync>,
    free: SegQueue<T>,
    max_idle: usize,
}

impl<T: Poolable> ObjectPool<T> {
    /// Creates an empty pool that builds new values with `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::with_max_idle(usize::MAX, factory)
    }

    /// Creates an empty pool that parks at most `max_idle` values.
    ///
    /// The bound is checked without locking, so concurrent `put`s may
    /// overshoot it briefly.
    pub fn with_max_idle<F>(max_idle: usize, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            free: SegQueue::new(),
            max_idle,
        }
    }

    /// Takes a parked value, or builds one, and initializes it with `param`.
    pub fn get(&self, param: T::Param) -> T {
        let mut value = self.free.pop().unwrap_or_else(|| (self.factory)());
        value.init(param);
        value
    }

    /// Frees `value` and parks it for reuse, or drops it if the pool
    /// already holds its maximum of idle values.
    pub fn put(&self, mut value: T) {
        value.free();
        if self.free.len() < self.max_idle {
            self.free.push(value);
        }
    }

    /// Returns the number of parked values.
    pub fn idle(&self) -> usize {
        self.free.len()
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("idle", &self.free.len())
            .field("max_idle", &self.max_idle)
            .finish_non_exhaustive()
    }
}
