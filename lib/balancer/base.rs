//! Base types for the balancer.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Represents a contiguous half-open span of character positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    /// First position covered by the range.
    pub location: usize,
    /// Number of positions covered. Zero denotes a cursor.
    pub length: usize,
}

impl Range {
    /// Creates a new range.
    pub fn new(location: usize, length: usize) -> Self {
        Range { location, length }
    }

    /// Returns the first position past the range.
    pub fn end(&self) -> usize {
        self.location + self.length
    }

    /// Returns true if the range covers no positions.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns true if the range contains the given position.
    pub fn contains(&self, position: usize) -> bool {
        position >= self.location && position < self.end()
    }

    /// Returns true if the other range lies entirely within this range.
    pub fn contains_range(&self, other: Range) -> bool {
        other.location >= self.location && other.end() <= self.end()
    }

    /// Returns true if the two ranges share at least one position.
    pub fn intersects(&self, other: Range) -> bool {
        self.location < other.end() && other.location < self.end()
    }
}

/// Selects what the resolver reports for a balanced pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectMode {
    /// Report both delimiters.
    #[default]
    Both,
    /// Report only the delimiter opposite the anchor.
    Opposite,
}

/// Represents a failure to resolve a balancing delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// The selection shape or zone context qualifies for no strategy.
    NotApplicable,
    /// The anchor character is not a balanceable delimiter.
    NotBalanceable,
    /// The scan reached a buffer boundary before the nesting depth returned to zero.
    Unbalanced,
    /// The zone tree violated an invariant its producer must guarantee.
    MalformedZoneTree,
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::NotApplicable => write!(f, "Nothing to balance at the selection"),
            ResolveError::NotBalanceable => {
                write!(f, "No balanceable delimiter at the selection")
            }
            ResolveError::Unbalanced => {
                write!(f, "No balancing delimiter before the document boundary")
            }
            ResolveError::MalformedZoneTree => {
                write!(f, "Zone tree violated a balancing invariant")
            }
        }
    }
}
