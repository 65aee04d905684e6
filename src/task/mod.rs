//! Sharded worker pool.
//!
//! - [`TaskPool`] - Fixed workers draining a set of bounded task queues
//! - [`ShutdownReport`] - Outcome of [`TaskPool::close`]
//!
//! A pool moves through `Running → Closing → Closed`. While running,
//! submissions block when their queue is full. [`TaskPool::close`] fires a
//! one-shot latch, after which submissions are dropped; workers drain what is
//! already queued, and `close` returns once every worker has exited.

mod pool;
mod worker;

pub use pool::{ShutdownReport, Task, TaskPool};
