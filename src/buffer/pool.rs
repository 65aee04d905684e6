//! Process-wide pool of byte buffers.

use std::sync::LazyLock;

use super::ByteBuffer;
use crate::pool::ShardedPool;

/// Number of shards in the process-wide buffer pool.
pub const BYTE_BUFFER_POOL_SHARDS: usize = 4;

/// Most idle buffers each shard of the process-wide pool keeps.
pub const BYTE_BUFFER_POOL_MAX_IDLE: usize = 256;

static BYTE_BUFFER_POOL: LazyLock<ShardedPool<ByteBuffer>> = LazyLock::new(|| {
    ShardedPool::with_max_idle(
        BYTE_BUFFER_POOL_SHARDS,
        BYTE_BUFFER_POOL_MAX_IDLE,
        ByteBuffer::new,
    )
});

/// Takes a buffer from the process-wide pool with storage for at least
/// `size` bytes. A zero size selects [`MIN_READ`](crate::MIN_READ).
///
/// # Example
///
/// ```
/// use poolkit::{get_byte_buffer, put_byte_buffer};
///
/// let mut buf = get_byte_buffer(1024);
/// assert!(buf.cap() >= 1024);
/// buf.write(b"payload");
/// put_byte_buffer(buf);
/// ```
pub fn get_byte_buffer(size: usize) -> ByteBuffer {
    BYTE_BUFFER_POOL.get(size)
}

/// Frees `buf` and returns it to the process-wide pool.
///
/// The buffer's storage goes back to its allocator; the next
/// [`get_byte_buffer`] call gives it fresh storage.
pub fn put_byte_buffer(buf: ByteBuffer) {
    BYTE_BUFFER_POOL.put(buf);
}
