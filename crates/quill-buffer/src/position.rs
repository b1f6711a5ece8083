//! Document coordinates.
//!
//! ## Learning: Newtype Pattern
//!
//! `TextPosition` wraps line/offset coordinates instead of a bare
//! `(usize, usize)`, so line and offset can never be swapped by accident
//! and ordering is defined once, here.

use serde::{Deserialize, Serialize};

use crate::TextRange;

/// A position in the text buffer.
///
/// `pos` counts Unicode scalar values (code points) from the start of the
/// line, not bytes. Positions order lexicographically: line first, then pos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextPosition {
    /// Line number (0-indexed)
    pub line: usize,
    /// Code point offset within the line (0-indexed)
    pub pos: usize,
}

impl TextPosition {
    /// Position at the start of the document.
    pub const ZERO: TextPosition = TextPosition { line: 0, pos: 0 };

    /// Creates a new position.
    pub const fn new(line: usize, pos: usize) -> Self {
        Self { line, pos }
    }

    /// Returns true if this position is before another.
    pub fn is_before(&self, other: &TextPosition) -> bool {
        self < other
    }

    /// Returns true if this position is after another.
    pub fn is_after(&self, other: &TextPosition) -> bool {
        self > other
    }

    /// Returns the position translated across an edit that replaced
    /// `before` with `after`.
    ///
    /// Positions ahead of the edit are untouched, positions behind it move
    /// with the text that follows the edit, and positions inside the
    /// replaced span collapse to the end of the inserted text.
    pub fn shifted(self, before: TextRange, after: TextRange) -> TextPosition {
        if self <= before.start {
            return self;
        }
        if self < before.end {
            return after.end;
        }
        if self.line == before.end.line {
            TextPosition::new(after.end.line, after.end.pos + (self.pos - before.end.pos))
        } else {
            let line = self.line + after.end.line - before.end.line;
            TextPosition::new(line, self.pos)
        }
    }
}

impl PartialOrd for TextPosition {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextPosition {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.line.cmp(&other.line) {
            std::cmp::Ordering::Equal => self.pos.cmp(&other.pos),
            other => other,
        }
    }
}

impl std::fmt::Display for TextPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display as 1-indexed for user-facing output
        write!(f, "{}:{}", self.line + 1, self.pos + 1)
    }
}
