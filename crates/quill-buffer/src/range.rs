//! Text ranges.
//!
//! ## Learning: Range Types
//!
//! Like Rust's `Range<T>`, a `TextRange` has an exclusive end. Empty
//! ranges (start == end) double as caret positions, and a range is always
//! kept normalized so that `start <= end`.

use serde::{Deserialize, Serialize};

use crate::TextPosition;

/// A span of text between two positions.
///
/// The start is always before or equal to the end (normalized).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextRange {
    /// Start position (inclusive)
    pub start: TextPosition,
    /// End position (exclusive)
    pub end: TextPosition,
}

impl TextRange {
    /// Creates a new range.
    ///
    /// Automatically normalizes so start <= end.
    pub fn new(start: TextPosition, end: TextPosition) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Creates a zero-width range (caret position).
    pub const fn point(position: TextPosition) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Creates a range on a single line.
    pub fn on_line(line: usize, start: usize, end: usize) -> Self {
        Self::new(TextPosition::new(line, start), TextPosition::new(line, end))
    }

    /// Returns true if this is a zero-width range.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if the range starts and ends on the same line.
    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    /// Returns true if a position is within this range.
    pub fn contains(&self, pos: TextPosition) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Returns true if `other` lies entirely inside this range.
    pub fn encloses(&self, other: &TextRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Returns true if this range overlaps with another.
    pub fn overlaps(&self, other: &TextRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Re-establishes `start <= end` after the fields were mutated directly.
    pub fn normalize(&mut self) {
        if self.start > self.end {
            std::mem::swap(&mut self.start, &mut self.end);
        }
        debug_assert!(self.start <= self.end);
    }

    /// Returns the number of lines this range touches.
    pub fn line_count(&self) -> usize {
        self.end.line - self.start.line + 1
    }
}

impl std::fmt::Display for TextRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
