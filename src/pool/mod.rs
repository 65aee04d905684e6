//! Generic object pooling.
//!
//! - [`Poolable`] - The init/free lifecycle a pooled type implements
//! - [`ObjectPool`] - A concurrent free list backed by a factory
//! - [`ShardedPool`] - Several independent pools behind a rotating index

mod object_pool;
mod poolable;
mod sharded;

pub use object_pool::ObjectPool;
pub use poolable::Poolable;
pub use sharded::ShardedPool;
