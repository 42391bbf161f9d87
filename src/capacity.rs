//! Chunk capacity configuration.
//!
//! Capacity is measured in estimated characters (see
//! [`EditRecord::estimated_chars`](crate::EditRecord::estimated_chars)), not bytes or
//! tokens. It is a packing target rather than a hard ceiling: a single record, or a
//! single file's edits when they cannot be split further, may still overflow it.

/// Default bound for one chunk, in estimated characters.
pub const DEFAULT_MAX_CHARS: usize = 20_000;

/// Upper bound on the estimated size of one chunk.
///
/// # Examples
///
/// ```rust
/// use editslabs::ChunkCapacity;
///
/// let cap = ChunkCapacity::new(1_000);
/// assert_eq!(cap.max(), 1_000);
/// assert!(!cap.would_overflow(600, 400));
/// assert!(cap.would_overflow(600, 401));
///
/// assert_eq!(ChunkCapacity::default().max(), 20_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkCapacity {
    max: usize,
}

impl ChunkCapacity {
    /// Create a capacity with the given bound.
    #[must_use]
    pub const fn new(max: usize) -> Self {
        Self { max }
    }

    /// The bound, in estimated characters.
    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }

    /// Whether a size on its own is larger than the bound.
    #[must_use]
    pub const fn exceeds(&self, size: usize) -> bool {
        size > self.max
    }

    /// Check if adding `additional` chars to a chunk of `current` chars would exceed the bound.
    ///
    /// Useful for incremental chunk building.
    #[must_use]
    pub fn would_overflow(&self, current: usize, additional: usize) -> bool {
        current.saturating_add(additional) > self.max
    }
}

impl Default for ChunkCapacity {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

impl From<usize> for ChunkCapacity {
    fn from(max: usize) -> Self {
        Self::new(max)
    }
}
