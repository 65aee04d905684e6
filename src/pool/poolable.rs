//! Trait for objects that can be pooled.

/// Lifecycle hooks for values recycled through an [`ObjectPool`](super::ObjectPool).
///
/// The pool calls [`init`](Poolable::init) on every value it hands out,
/// whether freshly built or recycled, and [`free`](Poolable::free) on every
/// value it takes back. A value therefore never leaves the pool carrying
/// state from a previous user.
///
/// # Example
///
/// ```
/// use poolkit::{ObjectPool, Poolable};
///
/// struct Scratch {
///     words: Vec<String>,
/// }
///
/// impl Poolable for Scratch {
///     type Param = usize;
///
///     fn name(&self) -> &'static str {
///         "Scratch"
///     }
///
///     fn init(&mut self, capacity: usize) {
///         self.words.reserve(capacity);
///     }
///
///     fn free(&mut self) {
///         self.words.clear();
///     }
/// }
///
/// let pool = ObjectPool::new(|| Scratch { words: Vec::new() });
/// let mut s = pool.get(8);
/// s.words.push("hello".into());
/// pool.put(s);
///
/// assert!(pool.get(8).words.is_empty());
/// ```
pub trait Poolable: Send + 'static {
    /// Argument passed to [`init`](Poolable::init), typically a size hint.
    type Param;

    /// Short type name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Prepares the value for a new user.
    fn init(&mut self, param: Self::Param);

    /// Releases per-use state before the value is parked.
    fn free(&mut self);
}
