//! poolkit
//!
//! Allocation-light buffers and a sharded worker pool for hot paths.
//!
//! `poolkit` provides two small primitives for high-throughput services:
//!
//! - a growable [`ByteBuffer`] whose storage comes from a size-class
//!   [`SlabAllocator`] and which recycles through an [`ObjectPool`]
//! - a [`TaskPool`] that runs closures on a fixed set of workers fed by
//!   bounded, sharded queues, with a blocking, idempotent shutdown
//!
//! The crate intentionally:
//! - does NOT decode text or support seeking within a buffer
//! - does NOT schedule by priority or steal work between shards
//! - does NOT resize a task pool after construction
//! - does NOT install a `tracing` subscriber
//!
//! # Buffers
//!
//! ```
//! use poolkit::{get_byte_buffer, put_byte_buffer};
//!
//! let mut buf = get_byte_buffer(64);
//! buf.write(b"GET / HTTP/1.1\r\n");
//!
//! let mut sink = Vec::new();
//! buf.write_to(&mut sink)?;
//! assert_eq!(sink, b"GET / HTTP/1.1\r\n");
//!
//! put_byte_buffer(buf);
//! # Ok::<(), poolkit::BufferError>(())
//! ```
//!
//! # Tasks
//!
//! ```
//! use std::sync::mpsc;
//! use poolkit::{TaskPool, TaskPoolConfig};
//!
//! let pool = TaskPool::new(TaskPoolConfig::new(2))?;
//! let (tx, rx) = mpsc::channel();
//! pool.add_task(move || tx.send(42).unwrap());
//!
//! pool.close();
//! assert_eq!(rx.recv().unwrap(), 42);
//! # Ok::<(), poolkit::TaskPoolError>(())
//! ```
//!
//! # Async (feature = "async-io")
//!
//! ```ignore
//! use futures_io::AsyncRead;
//! use poolkit::ByteBuffer;
//!
//! async fn slurp<R: AsyncRead + Unpin>(reader: &mut R) -> Result<ByteBuffer, poolkit::BufferError> {
//!     let mut buf = ByteBuffer::new();
//!     buf.read_from_async(reader).await?;
//!     Ok(buf)
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod config;
mod error;
mod pool;
mod storage;
mod task;

#[cfg(feature = "async-io")]
mod async_io;

//
// Public surface
//

pub use buffer::{
    BYTE_BUFFER_POOL_MAX_IDLE, BYTE_BUFFER_POOL_SHARDS, ByteBuffer, MAX_READ, MIN_READ, Origin,
    ReadOp, get_byte_buffer, put_byte_buffer,
};
pub use config::{DEFAULT_TASK_QUEUE_LEN, DEFAULT_TASK_QUEUE_NUMBER, TaskPoolConfig};
pub use error::{BufferError, TaskPoolError};
pub use pool::{ObjectPool, Poolable, ShardedPool};
pub use storage::{AllocatorStats, DEFAULT_CLASS_DEPTH, MAX_CLASS_SIZE, MIN_CLASS_SIZE, SlabAllocator};
pub use task::{ShutdownReport, Task, TaskPool};
