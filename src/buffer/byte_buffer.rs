//! Growable byte buffer with pool lifecycle hooks.

use std::fmt;
use std::io;
use std::mem;
use std::sync::Arc;

use bytes::{Buf, Bytes};

use crate::error::BufferError;
use crate::pool::Poolable;
use crate::storage::SlabAllocator;

/// Minimum spare space `read_from` makes available before each read.
pub const MIN_READ: usize = 1 << 9;

/// Once a single `read_from` call has read more than this, it returns.
pub const MAX_READ: usize = MIN_READ << 8;

const MAX_CAPACITY: usize = isize::MAX as usize;

/// Most spare bytes offered to a single read. Spare space is zeroed before
/// it is lent out, so this bounds the per-read cost on a large buffer.
const MAX_READ_CHUNK: usize = MIN_READ << 5;

const ERR_TRUNCATE: &str = "ByteBuffer: truncation out of range";
const ERR_INVALID_READ: &str = "ByteBuffer: reader returned invalid count from read";
const ERR_INVALID_WRITE: &str = "ByteBuffer.write_to: invalid write count";

/// Kind of the last operation performed on a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOp {
    /// The last operation consumed bytes.
    Read,
    /// The last operation was not a read.
    Invalid,
}

/// Who supplied a buffer's current storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Obtained from the buffer's [`SlabAllocator`]; handed back to it when
    /// the buffer outgrows it, is freed, or is dropped.
    Allocator,
    /// Supplied by the caller (or not yet allocated); simply dropped.
    Caller,
}

/// A growable read/write byte buffer designed for pooled reuse.
///
/// Unread content is `storage[off..len]`. Writes append at `len`; reads
/// consume from `off`. When more room is needed the buffer first tries to
/// slide its unread bytes over the already-consumed prefix and only then
/// allocates a store of `2 * cap + n` bytes from its [`SlabAllocator`].
///
/// A `ByteBuffer` is not internally synchronized.
///
/// # Example
///
/// ```
/// use poolkit::ByteBuffer;
///
/// let mut buf = ByteBuffer::with_capacity(10);
/// buf.write(b"ping");
/// assert_eq!(buf.cap(), 10);
///
/// let mut out = [0u8; 4];
/// assert_eq!(buf.read(&mut out)?, 4);
/// assert_eq!(&out, b"ping");
/// assert!(buf.is_empty());
/// # Ok::<(), poolkit::BufferError>(())
/// ```
pub struct ByteBuffer {
    buf: Vec<u8>,
    off: usize,
    last_read: ReadOp,
    origin: Origin,
    allocator: Arc<SlabAllocator>,
}

impl ByteBuffer {
    /// Creates an empty buffer with no storage, bound to the global allocator.
    pub fn new() -> Self {
        Self::with_allocator(SlabAllocator::global())
    }

    /// Creates an empty buffer with no storage, bound to `allocator`.
    pub fn with_allocator(allocator: Arc<SlabAllocator>) -> Self {
        Self {
            buf: Vec::new(),
            off: 0,
            last_read: ReadOp::Invalid,
            origin: Origin::Caller,
            allocator,
        }
    }

    /// Creates a buffer with allocator storage of at least `capacity` bytes.
    ///
    /// A zero capacity selects [`MIN_READ`].
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = Self::new();
        buffer.init(capacity);
        buffer
    }

    /// Wraps caller-supplied storage. The vector's contents become the
    /// unread region.
    pub fn from_vec(buf: Vec<u8>) -> Self {
        let mut buffer = Self::new();
        buffer.buf = buf;
        buffer
    }

    /// Returns the unread region.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[self.off..]
    }

    /// Copies the unread region into a [`Bytes`].
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }

    /// Returns the number of unread bytes.
    pub fn len(&self) -> usize {
        self.buf.len() - self.off
    }

    /// Returns `true` if there are no unread bytes.
    pub fn is_empty(&self) -> bool {
        self.buf.len() <= self.off
    }

    /// Returns the capacity of the current storage.
    pub fn cap(&self) -> usize {
        self.buf.capacity()
    }

    /// Returns the kind of the last operation.
    pub fn last_op(&self) -> ReadOp {
        self.last_read
    }

    /// Returns who supplied the current storage.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Empties the buffer, keeping its storage.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.off = 0;
        self.last_read = ReadOp::Invalid;
    }

    /// Discards all but the first `n` unread bytes.
    ///
    /// # Panics
    ///
    /// Panics if `n` is greater than [`len`](Self::len).
    pub fn truncate(&mut self, n: usize) {
        if n == 0 {
            self.reset();
            return;
        }
        self.last_read = ReadOp::Invalid;
        if n > self.len() {
            panic!("{ERR_TRUNCATE}");
        }
        self.buf.truncate(self.off + n);
    }

    /// Advances the read offset by `n` without copying.
    ///
    /// Does nothing if fewer than `n` bytes are unread.
    pub fn shift(&mut self, n: usize) {
        if n > self.len() {
            return;
        }
        self.off += n;
        if n > 0 {
            self.last_read = ReadOp::Read;
        }
    }

    /// Ensures `n` more bytes can be written without another allocation.
    ///
    /// # Panics
    ///
    /// Panics with [`BufferError::TooLarge`]'s message if the required
    /// capacity exceeds `isize::MAX`.
    pub fn grow(&mut self, n: usize) {
        if let Err(e) = self.try_grow(n) {
            panic!("{e}");
        }
    }

    /// Fallible form of [`grow`](Self::grow).
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::TooLarge`] if the required capacity exceeds
    /// `isize::MAX`. The buffer is left unchanged apart from compaction.
    pub fn try_grow(&mut self, n: usize) -> Result<(), BufferError> {
        let m = self.len();
        if m == 0 && self.off != 0 {
            self.reset();
        }

        // Slide the unread bytes over the consumed prefix when that alone
        // leaves more than `n` bytes free.
        let spare = self.buf.capacity() - self.buf.len();
        if self.off > 0 && spare + self.off > n {
            self.buf.copy_within(self.off.., 0);
            self.buf.truncate(m);
            self.off = 0;
        }

        if n <= self.buf.capacity() - self.buf.len() {
            return Ok(());
        }

        let size = self
            .buf
            .capacity()
            .checked_mul(2)
            .and_then(|c| c.checked_add(n))
            .filter(|&c| c <= MAX_CAPACITY)
            .ok_or(BufferError::TooLarge)?;

        let mut fresh = self.allocator.get(size);
        fresh.extend_from_slice(&self.buf[self.off..]);
        let old = mem::replace(&mut self.buf, fresh);
        if self.origin == Origin::Allocator {
            self.allocator.put(old);
        }
        self.origin = Origin::Allocator;
        self.off = 0;
        Ok(())
    }

    /// Appends `p`, growing as needed. Returns `p.len()`.
    pub fn write(&mut self, p: &[u8]) -> usize {
        self.last_read = ReadOp::Invalid;
        if p.len() > self.buf.capacity() - self.buf.len() {
            self.grow(p.len());
        }
        self.buf.extend_from_slice(p);
        p.len()
    }

    /// Appends the UTF-8 bytes of `s`. Returns `s.len()`.
    pub fn write_str(&mut self, s: &str) -> usize {
        self.write(s.as_bytes())
    }

    /// Copies up to `dst.len()` unread bytes into `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Eof`] if the buffer is empty and `dst` is not.
    /// An empty buffer also resets itself to reclaim its consumed prefix.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize, BufferError> {
        self.last_read = ReadOp::Invalid;
        if self.is_empty() {
            self.reset();
            if dst.is_empty() {
                return Ok(0);
            }
            return Err(BufferError::Eof);
        }

        let n = dst.len().min(self.len());
        dst[..n].copy_from_slice(&self.buf[self.off..self.off + n]);
        self.off += n;
        if n > 0 {
            self.last_read = ReadOp::Read;
        }
        Ok(n)
    }

    /// Reads from `r` into the buffer in chunks of at least [`MIN_READ`]
    /// bytes, and at most 16 KiB.
    ///
    /// Unlike [`io::Read::read_to_end`], this stops as soon as one read returns
    /// fewer bytes than were offered (including end of input), or once more
    /// than [`MAX_READ`] bytes have been read in this call. The source may
    /// therefore be left partially drained. `Interrupted` errors are retried.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Io`] if the source fails. Bytes read before the
    /// failure stay in the buffer.
    ///
    /// # Panics
    ///
    /// Panics if the source reports more bytes than it was offered.
    pub fn read_from<R: io::Read + ?Sized>(&mut self, r: &mut R) -> Result<u64, BufferError> {
        let mut total = 0u64;
        loop {
            let mut fill = self.fill_spare();
            let offered = fill.offered();
            let m = loop {
                match r.read(fill.spare()) {
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    res => break res?,
                }
            };
            fill.commit(m);

            total += m as u64;
            if m != offered || total > MAX_READ as u64 {
                return Ok(total);
            }
        }
    }

    /// Writes every unread byte to `w` with a single `write` call, then
    /// resets the buffer regardless of the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::ShortWrite`] if the sink accepts fewer bytes
    /// than offered, or [`BufferError::Io`] if it fails.
    ///
    /// # Panics
    ///
    /// Panics if the sink reports more bytes than it was offered.
    pub fn write_to<W: io::Write + ?Sized>(&mut self, w: &mut W) -> Result<u64, BufferError> {
        self.last_read = ReadOp::Invalid;
        if self.is_empty() {
            self.reset();
            return Ok(0);
        }

        let res = loop {
            match w.write(self.as_bytes()) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                res => break res,
            }
        };
        self.finish_write(res)
    }

    /// Returns allocator-owned storage (if any) and obtains a fresh store of
    /// at least `size_hint` bytes. A zero hint selects [`MIN_READ`].
    pub fn init(&mut self, size_hint: usize) {
        let size = if size_hint == 0 { MIN_READ } else { size_hint };
        self.release_storage();
        self.buf = self.allocator.get(size);
        self.origin = Origin::Allocator;
        self.off = 0;
        self.last_read = ReadOp::Invalid;
    }

    /// Empties the buffer and returns allocator-owned storage to the
    /// allocator, leaving the buffer without storage.
    pub fn free(&mut self) {
        self.reset();
        self.release_storage();
    }

    fn release_storage(&mut self) {
        let old = mem::take(&mut self.buf);
        if self.origin == Origin::Allocator {
            self.allocator.put(old);
        }
        self.origin = Origin::Caller;
    }

    /// Grows by [`MIN_READ`] and exposes spare capacity, up to
    /// `MAX_READ_CHUNK` bytes, for one read.
    pub(crate) fn fill_spare(&mut self) -> SpareFill<'_> {
        self.last_read = ReadOp::Invalid;
        self.grow(MIN_READ);
        let start = self.buf.len();
        let offered = (self.buf.capacity() - start).min(MAX_READ_CHUNK);
        self.buf.resize(start + offered, 0);
        SpareFill {
            buf: &mut self.buf,
            start,
            filled: 0,
        }
    }

    /// Applies the result of a single sink write of the unread region.
    pub(crate) fn finish_write(&mut self, res: io::Result<usize>) -> Result<u64, BufferError> {
        let expected = self.len();
        let outcome = match res {
            Ok(m) if m > expected => panic!("{ERR_INVALID_WRITE}"),
            Ok(m) if m < expected => Err(BufferError::ShortWrite {
                written: m,
                expected,
            }),
            Ok(m) => Ok(m as u64),
            Err(e) => Err(BufferError::Io(e)),
        };
        self.reset();
        outcome
    }
}

/// Spare region of a buffer lent to a single read.
///
/// Dropping the guard trims the storage back to the committed length, so a
/// failed or panicking reader leaves no uninitialized-looking bytes behind.
pub(crate) struct SpareFill<'a> {
    buf: &'a mut Vec<u8>,
    start: usize,
    filled: usize,
}

impl SpareFill<'_> {
    pub(crate) fn offered(&self) -> usize {
        self.buf.len() - self.start
    }

    pub(crate) fn spare(&mut self) -> &mut [u8] {
        &mut self.buf[self.start..]
    }

    /// Keeps the first `m` bytes of the spare region.
    ///
    /// # Panics
    ///
    /// Panics if `m` exceeds the offered space.
    pub(crate) fn commit(&mut self, m: usize) {
        if m > self.offered() {
            panic!("{ERR_INVALID_READ}");
        }
        self.filled = m;
    }
}

impl Drop for SpareFill<'_> {
    fn drop(&mut self) {
        self.buf.truncate(self.start + self.filled);
    }
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ByteBuffer {
    fn drop(&mut self) {
        self.release_storage();
    }
}

impl Poolable for ByteBuffer {
    type Param = usize;

    fn name(&self) -> &'static str {
        "ByteBuffer"
    }

    fn init(&mut self, size_hint: usize) {
        ByteBuffer::init(self, size_hint);
    }

    fn free(&mut self) {
        ByteBuffer::free(self);
    }
}

impl io::Read for ByteBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match ByteBuffer::read(self, buf) {
            Err(BufferError::Eof) => Ok(0),
            res => res.map_err(Into::into),
        }
    }
}

impl io::Write for ByteBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(ByteBuffer::write(self, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Buf for ByteBuffer {
    fn remaining(&self) -> usize {
        self.len()
    }

    fn chunk(&self) -> &[u8] {
        self.as_bytes()
    }

    fn advance(&mut self, cnt: usize) {
        assert!(
            cnt <= self.len(),
            "cannot advance past `remaining`: {} <= {}",
            cnt,
            self.len()
        );
        self.shift(cnt);
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(buf: Vec<u8>) -> Self {
        Self::from_vec(buf)
    }
}

impl From<String> for ByteBuffer {
    fn from(s: String) -> Self {
        Self::from_vec(s.into_bytes())
    }
}

/// Copies `data` into allocator storage sized to fit it.
impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        let mut buffer = Self::with_capacity(data.len());
        buffer.write(data);
        buffer
    }
}

impl From<&str> for ByteBuffer {
    fn from(s: &str) -> Self {
        Self::from(s.as_bytes())
    }
}

impl fmt::Display for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("len", &self.len())
            .field("cap", &self.cap())
            .field("off", &self.off)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn private_buffer() -> ByteBuffer {
        ByteBuffer::with_allocator(Arc::new(SlabAllocator::new()))
    }

    #[test]
    fn test_with_capacity_is_exact_below_class_sizes() {
        let mut buf = ByteBuffer::with_capacity(10);
        assert_eq!(buf.write(b"test"), 4);
        assert_eq!(buf.cap(), 10);
        assert_eq!(buf.origin(), Origin::Allocator);
    }

    #[test]
    fn test_growth_preserves_content() {
        let mut buf = ByteBuffer::with_capacity(10);
        buf.write(b"head");
        let body = vec![7u8; 1000];
        buf.write(&body);

        assert_eq!(buf.len(), 1004);
        assert!(buf.cap() >= 1004);
        assert_eq!(&buf.as_bytes()[..4], b"head");
        assert_eq!(&buf.as_bytes()[4..], &body[..]);
    }

    #[test]
    fn test_grow_slides_instead_of_allocating() {
        let mut buf = ByteBuffer::from_vec(Vec::with_capacity(64));
        buf.write(&[1u8; 60]);
        buf.shift(50);
        let ptr = buf.as_bytes().as_ptr();

        // 10 unread bytes; 54 free after sliding, cap 64 stays.
        buf.grow(40);
        assert_eq!(buf.cap(), 64);
        assert_eq!(buf.off, 0);
        assert_eq!(buf.as_bytes(), &[1u8; 10]);
        assert_ne!(buf.as_bytes().as_ptr(), ptr);
        assert_eq!(buf.origin(), Origin::Caller);
    }

    #[test]
    fn test_grow_allocates_double_plus_n() {
        let mut buf = private_buffer();
        buf.write(&[0u8; 100]);
        let cap = buf.cap();
        buf.grow(cap);
        assert!(buf.cap() >= 2 * cap + cap);
        assert_eq!(buf.len(), 100);
    }

    #[test]
    fn test_grow_then_write_does_not_reallocate() {
        let mut buf = ByteBuffer::from(&b"xyz"[..]);
        let mut tmp = [0u8; 2];
        buf.read(&mut tmp).unwrap();

        buf.grow(5000);
        let cap = buf.cap();
        let ptr = buf.as_bytes().as_ptr();
        buf.write(&[b'y'; 5000]);

        assert_eq!(buf.cap(), cap);
        assert_eq!(buf.as_bytes().as_ptr(), ptr);
        assert_eq!(buf.as_bytes()[0], b'z');
        assert_eq!(buf.len(), 5001);
    }

    #[test]
    fn test_empty_with_offset_resets_on_grow() {
        let mut buf = ByteBuffer::from_vec(b"abcd".to_vec());
        buf.shift(4);
        assert!(buf.is_empty());
        buf.grow(1);
        assert_eq!(buf.off, 0);
        assert_eq!(buf.cap(), 4);
    }

    #[test]
    #[should_panic(expected = "ByteBuffer: too large")]
    fn test_grow_overflow_panics() {
        let mut buf = ByteBuffer::from_vec(vec![0u8; 1]);
        buf.grow(usize::MAX);
    }

    #[test]
    fn test_try_grow_reports_too_large() {
        let mut buf = ByteBuffer::from_vec(vec![0u8; 1]);
        let err = buf.try_grow(isize::MAX as usize).unwrap_err();
        assert!(matches!(err, BufferError::TooLarge));
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_read_empty_destination_is_not_eof() {
        let mut buf = ByteBuffer::new();
        assert_eq!(buf.read(&mut [0u8; 0]).unwrap(), 0);
        assert!(matches!(buf.read(&mut [0u8; 1]), Err(BufferError::Eof)));
    }

    #[test]
    fn test_read_sets_last_op() {
        let mut buf = ByteBuffer::from("ab");
        assert_eq!(buf.last_op(), ReadOp::Invalid);
        buf.read(&mut [0u8; 1]).unwrap();
        assert_eq!(buf.last_op(), ReadOp::Read);
        buf.write(b"c");
        assert_eq!(buf.last_op(), ReadOp::Invalid);
        buf.shift(1);
        assert_eq!(buf.last_op(), ReadOp::Read);
    }

    #[test]
    fn test_shift_past_end_ignored() {
        let mut buf = ByteBuffer::from("hello");
        buf.shift(6);
        assert_eq!(buf.as_bytes(), b"hello");
        buf.shift(5);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_truncate() {
        let mut buf = ByteBuffer::from("hello world");
        buf.shift(6);
        buf.truncate(3);
        assert_eq!(buf.as_bytes(), b"wor");

        buf.truncate(0);
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.off, 0);
    }

    #[test]
    #[should_panic(expected = "truncation out of range")]
    fn test_truncate_out_of_range_panics() {
        let mut buf = ByteBuffer::from("abc");
        buf.truncate(4);
    }

    #[test]
    fn test_free_returns_storage_to_allocator() {
        let slab = Arc::new(SlabAllocator::new());
        let mut buf = ByteBuffer::with_allocator(Arc::clone(&slab));
        buf.init(100);
        assert_eq!(slab.idle(), 0);

        buf.write(b"data");
        buf.free();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.cap(), 0);
        assert_eq!(buf.origin(), Origin::Caller);
        assert_eq!(slab.idle(), 1);
    }

    #[test]
    fn test_caller_storage_is_not_recycled() {
        let slab = Arc::new(SlabAllocator::new());
        let mut buf = ByteBuffer::with_allocator(Arc::clone(&slab));
        buf.buf = Vec::with_capacity(128);
        buf.write(&[1u8; 100]);
        assert_eq!(buf.origin(), Origin::Caller);

        buf.grow(100);
        assert_eq!(buf.origin(), Origin::Allocator);
        assert_eq!(slab.stats().recycled, 0);
        assert_eq!(slab.stats().discarded, 0);

        buf.free();
        assert_eq!(slab.stats().recycled, 1);
    }

    #[test]
    fn test_drop_returns_storage() {
        let slab = Arc::new(SlabAllocator::new());
        let mut buf = ByteBuffer::with_allocator(Arc::clone(&slab));
        buf.init(256);
        drop(buf);
        assert_eq!(slab.idle(), 1);
    }

    #[test]
    fn test_read_from_offers_bounded_chunks() {
        /// Records how many bytes each read was offered.
        struct Recorder {
            offers: Vec<usize>,
            left: usize,
        }

        impl io::Read for Recorder {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.offers.push(buf.len());
                let n = buf.len().min(self.left);
                buf[..n].fill(1);
                self.left -= n;
                Ok(n)
            }
        }

        let mut buf = ByteBuffer::with_capacity(1 << 20);
        let mut src = Recorder {
            offers: Vec::new(),
            left: 3 * MAX_READ_CHUNK + 10,
        };

        let n = buf.read_from(&mut src).unwrap();
        assert_eq!(n as usize, 3 * MAX_READ_CHUNK + 10);
        assert_eq!(src.offers, vec![MAX_READ_CHUNK; 4]);
        assert_eq!(buf.cap(), 1 << 20);
        assert!(buf.as_bytes().iter().all(|&b| b == 1));
    }

    #[test]
    fn test_poolable_name() {
        let buf = ByteBuffer::new();
        assert_eq!(Poolable::name(&buf), "ByteBuffer");
    }

    #[test]
    fn test_buf_impl() {
        let mut buf = ByteBuffer::from("abcdef");
        assert_eq!(buf.remaining(), 6);
        assert_eq!(buf.get_u8(), b'a');
        buf.advance(2);
        assert_eq!(buf.chunk(), b"def");
        assert_eq!(buf.to_bytes(), Bytes::from_static(b"def"));
    }

    #[test]
    #[should_panic(expected = "cannot advance past")]
    fn test_buf_advance_past_end_panics() {
        let mut buf = ByteBuffer::from("ab");
        Buf::advance(&mut buf, 3);
    }

    #[test]
    fn test_display_and_debug() {
        let buf = ByteBuffer::from("hi");
        assert_eq!(buf.to_string(), "hi");
        assert!(format!("{buf:?}").contains("len: 2"));
    }
}
