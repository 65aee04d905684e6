//! Sharded object pool.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ObjectPool, Poolable};

/// A set of independent [`ObjectPool`] shards.
///
/// Every `get` and `put` advances a shared atomic counter and uses it,
/// modulo the shard count, to pick a shard. Under concurrent access this
/// spreads callers across shards roughly round-robin; the sequence is not
/// strict, and a value is not guaranteed to return to the shard it came
/// from.
///
/// # Example
///
/// ```
/// use poolkit::{ByteBuffer, ShardedPool};
///
/// let pool = ShardedPool::new(4, ByteBuffer::new);
/// let buf = pool.get(256);
/// assert!(buf.cap() >= 256);
/// pool.put(buf);
/// assert_eq!(pool.idle(), 1);
/// ```
pub struct ShardedPool<T> {
    shards: Box<[ObjectPool<T>]>,
    index: AtomicUsize,
}

impl<T: Poolable> ShardedPool<T> {
    /// Creates `shards` empty pools sharing one factory.
    ///
    /// # Panics
    ///
    /// Panics if `shards` is zero.
    pub fn new<F>(shards: usize, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::with_max_idle(shards, usize::MAX, factory)
    }

    /// Creates `shards` empty pools sharing one factory, each parking at
    /// most `max_idle` values.
    ///
    /// # Panics
    ///
    /// Panics if `shards` is zero.
    pub fn with_max_idle<F>(shards: usize, max_idle: usize, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        assert!(shards > 0, "shard count must be > 0");
        let factory = Arc::new(factory);
        let shards = (0..shards)
            .map(|_| {
                let factory = Arc::clone(&factory);
                ObjectPool::with_max_idle(max_idle, move || factory())
            })
            .collect();

        Self {
            shards,
            index: AtomicUsize::new(0),
        }
    }

    /// Takes an initialized value from the next shard.
    pub fn get(&self, param: T::Param) -> T {
        self.next_shard().get(param)
    }

    /// Frees `value` and parks it in the next shard.
    pub fn put(&self, value: T) {
        self.next_shard().put(value);
    }

    /// Returns the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Returns the number of parked values across all shards.
    pub fn idle(&self) -> usize {
        self.shards.iter().map(ObjectPool::idle).sum()
    }

    fn next_shard(&self) -> &ObjectPool<T> {
        let i = self.index.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        &self.shards[i % self.shards.len()]
    }
}

impl<T> fmt::Debug for ShardedPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedPool")
            .field("shards", &self.shards)
            .finish_non_exhaustive()
    }
}
