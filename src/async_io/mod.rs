//! Async I/O for byte buffers.
//!
//! Adds [`ByteBuffer::read_from_async`](crate::ByteBuffer::read_from_async)
//! and [`ByteBuffer::write_to_async`](crate::ByteBuffer::write_to_async) over
//! the `futures-io` traits, so any runtime that provides `AsyncRead` and
//! `AsyncWrite` (tokio via compat, async-std, smol) can drive them.
//!
//! This module requires the `async-io` feature to be enabled.

mod buffer_io;
