//! Backing-store allocation for byte buffers.
//!
//! Buffers never allocate their storage directly. They ask a
//! [`SlabAllocator`] for a `Vec<u8>` of at least the size they need and hand
//! the vector back when they outgrow it or are freed, so repeated
//! grow/free cycles reuse the same allocations.

mod slab;

pub use slab::{AllocatorStats, SlabAllocator};
pub use slab::{DEFAULT_CLASS_DEPTH, MAX_CLASS_SIZE, MIN_CLASS_SIZE};
