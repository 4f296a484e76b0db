//! Byte-key ranges for storage scans.

use std::ops::{Bound, RangeBounds};

use bytes::Bytes;

/// A range over byte-string keys.
///
/// Used by [`StorageRead::scan_iter`](crate::StorageRead::scan_iter) to
/// select a contiguous, lexicographically ordered slice of the key space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytesRange {
    pub start: Bound<Bytes>,
    pub end: Bound<Bytes>,
}

impl BytesRange {
    pub fn new(start: Bound<Bytes>, end: Bound<Bytes>) -> Self {
        Self { start, end }
    }

    /// A range covering every key.
    pub fn unbounded() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    /// A range covering every key that starts with `prefix`.
    ///
    /// The exclusive upper bound is the shortest key greater than all keys
    /// with the prefix: trailing `0xFF` bytes are dropped and the last
    /// remaining byte is incremented. A prefix made only of `0xFF` bytes has
    /// no such key and yields an unbounded end.
    pub fn prefix(prefix: Bytes) -> Self {
        let mut end = prefix.to_vec();
        while let Some(last) = end.pop() {
            if last < 0xFF {
                end.push(last + 1);
                return Self::new(
                    Bound::Included(prefix),
                    Bound::Excluded(Bytes::from(end)),
                );
            }
        }
        Self::new(Bound::Included(prefix), Bound::Unbounded)
    }

    /// Returns true if `key` falls inside this range.
    pub fn contains(&self, key: &[u8]) -> bool {
        let after_start = match &self.start {
            Bound::Included(start) => key >= start.as_ref(),
            Bound::Excluded(start) => key > start.as_ref(),
            Bound::Unbounded => true,
        };
        let before_end = match &self.end {
            Bound::Included(end) => key <= end.as_ref(),
            Bound::Excluded(end) => key < end.as_ref(),
            Bound::Unbounded => true,
        };
        after_start && before_end
    }
}

impl RangeBounds<Bytes> for BytesRange {
    fn start_bound(&self) -> Bound<&Bytes> {
        self.start.as_ref()
    }

    fn end_bound(&self) -> Bound<&Bytes> {
        self.end.as_ref()
    }
}
