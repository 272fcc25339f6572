//! Inclusive DMX value ranges.

use serde::{Deserialize, Serialize};

/// An inclusive interval of DMX values at some native resolution.
///
/// Ranges are value types: merging produces a new range, the inputs are
/// untouched. Lists of ranges describing the same channel are expected to
/// be mutually non-overlapping; that is the caller's contract and is not
/// re-validated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DmxRange {
    pub start: u64,
    pub end: u64,
}

impl DmxRange {
    /// Create a range, returning `None` if `start > end`.
    pub fn new(start: u64, end: u64) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// The full range at a 1-byte resolution.
    pub const FULL_8BIT: Self = Self { start: 0, end: 255 };

    /// Check whether `value` lies inside this range.
    pub fn contains(&self, value: u64) -> bool {
        self.start <= value && value <= self.end
    }

    /// Check whether `other` starts right after this range ends, or vice
    /// versa.
    pub fn is_adjacent_to(&self, other: &DmxRange) -> bool {
        self.end + 1 == other.start || other.end + 1 == self.start
    }

    /// The range spanning both this range and `other`.
    pub fn merge(&self, other: &DmxRange) -> DmxRange {
        DmxRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The middle of the range, rounded down. Used for menu-click values.
    pub fn center(&self) -> u64 {
        (self.start + self.end) / 2
    }
}

impl std::fmt::Display for DmxRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Merge adjacent ranges in a single left-to-right pass.
///
/// For each input range, the first already-accumulated range that is
/// adjacent to it is extended; otherwise the input starts a new
/// accumulated range. There is no re-scan after an extension, so three
/// ranges that only become mutually adjacent through an out-of-order
/// merge may not fully collapse. Inputs must be mutually non-overlapping.
pub fn merge_adjacent(ranges: &[DmxRange]) -> Vec<DmxRange> {
    let mut merged: Vec<DmxRange> = Vec::with_capacity(ranges.len());

    for range in ranges {
        match merged.iter_mut().find(|m| m.is_adjacent_to(range)) {
            Some(existing) => *existing = existing.merge(range),
            None => merged.push(*range),
        }
    }

    merged
}
