//! Error types for poolkit.

use std::io;

use thiserror::Error;

/// Errors reported by [`ByteBuffer`](crate::ByteBuffer) operations.
///
/// Programming errors (truncating out of range, a reader or writer reporting
/// more bytes than it was offered) are not represented here: they panic.
#[derive(Debug, Error)]
pub enum BufferError {
    /// A read was attempted on an empty buffer.
    #[error("end of buffer")]
    Eof,

    /// The sink accepted fewer bytes than were offered.
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite {
        /// Bytes the sink reported as written.
        written: usize,
        /// Bytes that were offered.
        expected: usize,
    },

    /// Growing the buffer would exceed the platform's addressable size.
    #[error("ByteBuffer: too large")]
    TooLarge,

    /// An I/O error raised by the source or sink.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<BufferError> for io::Error {
    fn from(e: BufferError) -> Self {
        match e {
            BufferError::Io(e) => e,
            BufferError::Eof => io::Error::from(io::ErrorKind::UnexpectedEof),
            BufferError::ShortWrite { .. } => io::Error::new(io::ErrorKind::WriteZero, e),
            BufferError::TooLarge => io::Error::new(io::ErrorKind::OutOfMemory, e),
        }
    }
}

/// Errors raised while building or shutting down a [`TaskPool`](crate::TaskPool).
#[derive(Debug, Error)]
pub enum TaskPoolError {
    /// The configured worker count is below one.
    #[error("illegal pool size {size}")]
    InvalidPoolSize {
        /// The rejected pool size.
        size: usize,
    },

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),

    /// A worker observed tasks still queued after shutdown.
    #[error("task worker {worker} exited while its queue still held {pending} tasks")]
    PendingTasks {
        /// Index of the worker.
        worker: usize,
        /// Number of tasks left in its queue.
        pending: usize,
    },

    /// A task panicked and took its worker thread down.
    #[error("task worker {worker} panicked")]
    WorkerPanicked {
        /// Index of the worker.
        worker: usize,
    },
}
