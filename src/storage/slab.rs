//! Power-of-two size-class allocator for buffer storage.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use crossbeam_queue::ArrayQueue;
use tracing::trace;

const MIN_CLASS_SHIFT: u32 = 6;
const MAX_CLASS_SHIFT: u32 = 18;
const NUM_CLASSES: usize = (MAX_CLASS_SHIFT - MIN_CLASS_SHIFT + 1) as usize;

/// Smallest pooled storage size (64 B). Smaller requests are allocated exactly.
pub const MIN_CLASS_SIZE: usize = 1 << MIN_CLASS_SHIFT;

/// Largest pooled storage size (256 KiB). Larger requests are allocated exactly.
pub const MAX_CLASS_SIZE: usize = 1 << MAX_CLASS_SHIFT;

/// Default number of idle vectors kept per size class.
pub const DEFAULT_CLASS_DEPTH: usize = 64;

static GLOBAL: LazyLock<Arc<SlabAllocator>> = LazyLock::new(|| Arc::new(SlabAllocator::new()));

/// Snapshot of allocator counters.
///
/// Counters are updated with relaxed ordering and are meant for diagnostics,
/// not for synchronization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// `get` calls served from a free list.
    pub hits: u64,
    /// `get` calls that had to allocate.
    pub misses: u64,
    /// `put` calls that parked a vector for reuse.
    pub recycled: u64,
    /// `put` calls whose vector was dropped.
    pub discarded: u64,
}

struct SizeClass {
    size: usize,
    freelist: ArrayQueue<Vec<u8>>,
}

/// A thread-safe recycler of byte vectors grouped by power-of-two capacity.
///
/// Classes span [`MIN_CLASS_SIZE`] to [`MAX_CLASS_SIZE`]. Each class keeps a
/// bounded lock-free free list; a vector returned to a full class is simply
/// dropped.
///
/// # Example
///
/// ```
/// use poolkit::SlabAllocator;
///
/// let slab = SlabAllocator::new();
/// let v = slab.get(100);
/// assert!(v.capacity() >= 100);
/// assert!(v.is_empty());
///
/// let ptr = v.as_ptr();
/// slab.put(v);
/// assert_eq!(slab.get(128).as_ptr(), ptr);
/// ```
pub struct SlabAllocator {
    classes: Box<[SizeClass]>,
    hits: AtomicU64,
    misses: AtomicU64,
    recycled: AtomicU64,
    discarded: AtomicU64,
}

impl SlabAllocator {
    /// Creates an allocator keeping up to [`DEFAULT_CLASS_DEPTH`] idle
    /// vectors per class.
    pub fn new() -> Self {
        Self::with_depth(DEFAULT_CLASS_DEPTH)
    }

    /// Creates an allocator keeping up to `depth` idle vectors per class.
    ///
    /// # Panics
    ///
    /// Panics if `depth` is zero.
    pub fn with_depth(depth: usize) -> Self {
        assert!(depth > 0, "size class depth must be > 0");
        let classes = (0..NUM_CLASSES)
            .map(|i| SizeClass {
                size: MIN_CLASS_SIZE << i,
                freelist: ArrayQueue::new(depth),
            })
            .collect();

        Self {
            classes,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            recycled: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Returns the process-wide allocator shared by default buffers.
    pub fn global() -> Arc<SlabAllocator> {
        Arc::clone(&GLOBAL)
    }

    /// Returns an empty vector with capacity of at least `size`.
    pub fn get(&self, size: usize) -> Vec<u8> {
        let Some(index) = Self::request_class(size) else {
            if size > MAX_CLASS_SIZE {
                trace!(size, "allocating out-of-class buffer storage");
            }
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Vec::with_capacity(size);
        };

        let class = &self.classes[index];
        match class.freelist.pop() {
            Some(v) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                v
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Vec::with_capacity(class.size)
            }
        }
    }

    /// Clears `v` and parks it for reuse if its capacity fits a class.
    pub fn put(&self, mut v: Vec<u8>) {
        let Some(index) = Self::return_class(v.capacity()) else {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        };

        v.clear();
        match self.classes[index].freelist.push(v) {
            Ok(()) => {
                self.recycled.fetch_add(1, Ordering::Relaxed);
            }
            Err(v) => {
                trace!(capacity = v.capacity(), "size class full, dropping storage");
                self.discarded.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Returns the number of vectors currently parked across all classes.
    pub fn idle(&self) -> usize {
        self.classes.iter().map(|c| c.freelist.len()).sum()
    }

    /// Returns a snapshot of the allocator counters.
    pub fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            recycled: self.recycled.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }

    /// Smallest class whose size is ≥ `size`.
    fn request_class(size: usize) -> Option<usize> {
        if !(MIN_CLASS_SIZE..=MAX_CLASS_SIZE).contains(&size) {
            return None;
        }
        Some((size.next_power_of_two().trailing_zeros() - MIN_CLASS_SHIFT) as usize)
    }

    /// Largest class whose size is ≤ `capacity`.
    fn return_class(capacity: usize) -> Option<usize> {
        if capacity < MIN_CLASS_SIZE {
            return None;
        }
        let shift = usize::BITS - 1 - capacity.leading_zeros();
        if shift > MAX_CLASS_SHIFT {
            return None;
        }
        Some((shift - MIN_CLASS_SHIFT) as usize)
    }
}

impl Default for SlabAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SlabAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlabAllocator")
            .field("classes", &self.classes.len())
            .field("idle", &self.idle())
            .field("stats", &self.stats())
            .finish()
    }
}
