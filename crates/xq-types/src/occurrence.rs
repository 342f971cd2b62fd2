//! Occurrence indicators
//!
//! An indicator is a cardinality range. The five ranges used by sequence
//! types are closed under intersection, so intersecting two indicators either
//! yields one of them or nothing when the ranges do not overlap.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cardinality constraint on the length of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occurrence {
    /// No items (`empty-sequence()`)
    Zero,
    /// Exactly one item
    One,
    /// `?`
    ZeroOrOne,
    /// `+`
    OneOrMore,
    /// `*`
    ZeroOrMore,
}

impl Occurrence {
    /// Minimum number of items
    pub const fn min(&self) -> usize {
        match self {
            Self::Zero | Self::ZeroOrOne | Self::ZeroOrMore => 0,
            Self::One | Self::OneOrMore => 1,
        }
    }

    /// Maximum number of items, `None` if unbounded
    pub const fn max(&self) -> Option<usize> {
        match self {
            Self::Zero => Some(0),
            Self::One | Self::ZeroOrOne => Some(1),
            Self::OneOrMore | Self::ZeroOrMore => None,
        }
    }

    /// Indicator for a cardinality range, `None` for an empty range
    ///
    /// Ranges that do not match one of the indicators are widened to the
    /// smallest enclosing one.
    pub fn from_range(min: usize, max: Option<usize>) -> Option<Self> {
        if max.is_some_and(|max| min > max) {
            return None;
        }
        Some(match (min, max) {
            (0, Some(0)) => Self::Zero,
            (0, Some(1)) => Self::ZeroOrOne,
            (0, _) => Self::ZeroOrMore,
            (1, Some(1)) => Self::One,
            _ => Self::OneOrMore,
        })
    }

    /// Indicator describing a sequence of exactly `len` items
    pub fn exactly(len: usize) -> Self {
        match len {
            0 => Self::Zero,
            1 => Self::One,
            _ => Self::OneOrMore,
        }
    }

    /// Check if a sequence of `len` items satisfies this indicator
    pub fn check(&self, len: usize) -> bool {
        len >= self.min() && self.max().is_none_or(|max| len <= max)
    }

    /// Check if every cardinality of this indicator is allowed by `other`
    pub fn instance_of(&self, other: Occurrence) -> bool {
        let max_ok = match (self.max(), other.max()) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => a <= b,
        };
        self.min() >= other.min() && max_ok
    }

    /// Overlap of both ranges, `None` if they are disjoint
    pub fn intersect(&self, other: Occurrence) -> Option<Occurrence> {
        let min = self.min().max(other.min());
        let max = match (self.max(), other.max()) {
            (None, None) => None,
            (Some(a), None) | (None, Some(a)) => Some(a),
            (Some(a), Some(b)) => Some(a.min(b)),
        };
        Self::from_range(min, max)
    }

    /// Check if some cardinality satisfies both indicators
    pub fn intersects(&self, other: Occurrence) -> bool {
        self.intersect(other).is_some()
    }

    /// Smallest indicator covering both ranges
    pub fn union(&self, other: Occurrence) -> Occurrence {
        let min = self.min().min(other.min());
        let max = match (self.max(), other.max()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        Self::from_range(min, max).unwrap_or(Self::ZeroOrMore)
    }

    /// Indicator of the concatenation of two sequences
    pub fn add(&self, other: Occurrence) -> Occurrence {
        let min = self.min() + other.min();
        let max = match (self.max(), other.max()) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        };
        Self::from_range(min, max).unwrap_or(Self::ZeroOrMore)
    }

    /// Indicator symbol as appended to an item type
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Zero | Self::One => "",
            Self::ZeroOrOne => "?",
            Self::OneOrMore => "+",
            Self::ZeroOrMore => "*",
        }
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => f.write_str("0"),
            Self::One => f.write_str("1"),
            _ => f.write_str(self.symbol()),
        }
    }
}
