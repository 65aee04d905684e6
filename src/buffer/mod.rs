//! Growable byte buffers and the process-wide buffer pool.
//!
//! - [`ByteBuffer`] - Read/write buffer backed by a [`SlabAllocator`](crate::SlabAllocator)
//! - [`get_byte_buffer`] / [`put_byte_buffer`] - Shared sharded pool of buffers

mod byte_buffer;
mod pool;

pub use byte_buffer::{ByteBuffer, MAX_READ, MIN_READ, Origin, ReadOp};
pub use pool::{
    BYTE_BUFFER_POOL_MAX_IDLE, BYTE_BUFFER_POOL_SHARDS, get_byte_buffer, put_byte_buffer,
};
