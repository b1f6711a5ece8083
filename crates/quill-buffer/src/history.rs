//! Edit operations and undo/redo history.
//!
//! ## Learning: The Command Pattern
//!
//! Every mutation is an [`EditOperation`] value. Applying one yields its
//! inverse, and the pair is stored so the edit can be:
//! - Undone (apply the inverse)
//! - Redone (apply the forward operation again)
//!
//! Undo and redo replay operations directly against the rope and never
//! record fresh history entries.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::TextRange;

/// The type of edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditKind {
    /// Replace the text spanned by the range
    Replace,
    /// Replace the whole document (load/reload); clears history
    ReplaceContent,
    /// Record that the current state was saved
    SaveMarker,
}

/// One atomic mutation of a [`TextBuffer`](crate::TextBuffer).
///
/// `new_lines` holds the inserted text split at line breaks: `["a"]`
/// inserts `a`, `["a", "b"]` inserts `a\nb`, `[""]` deletes the range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOperation {
    /// What kind of edit this is
    pub kind: EditKind,
    /// The span being replaced
    pub range: TextRange,
    /// Replacement text, one entry per line
    pub new_lines: Vec<String>,
}

impl EditOperation {
    /// Creates a replace operation.
    pub fn replace(range: TextRange, new_lines: Vec<String>) -> Self {
        Self {
            kind: EditKind::Replace,
            range,
            new_lines,
        }
    }

    /// Creates a replace operation from a text containing line breaks.
    pub fn replace_text(range: TextRange, text: &str) -> Self {
        Self::replace(range, split_lines(text))
    }

    /// Creates an insertion at a position.
    pub fn insert(at: crate::TextPosition, text: &str) -> Self {
        Self::replace_text(TextRange::point(at), text)
    }

    /// Creates a deletion of a range.
    pub fn delete(range: TextRange) -> Self {
        Self::replace(range, vec![String::new()])
    }

    /// Creates a whole-document replacement.
    pub fn replace_content(text: &str) -> Self {
        Self {
            kind: EditKind::ReplaceContent,
            range: TextRange::default(),
            new_lines: split_lines(text),
        }
    }

    /// Creates a save-point marker.
    pub fn save_marker() -> Self {
        Self {
            kind: EditKind::SaveMarker,
            range: TextRange::default(),
            new_lines: Vec::new(),
        }
    }

    /// Returns the inserted text joined with `\n`.
    pub fn text(&self) -> String {
        self.new_lines.join("\n")
    }

    /// Returns true if this operation inserts a single character at a point
    /// without touching line structure (a typed keystroke).
    fn is_typed_char(&self) -> bool {
        self.kind == EditKind::Replace
            && self.range.is_empty()
            && self.new_lines.len() == 1
            && self.new_lines[0].chars().count() == 1
    }
}

/// Splits text into lines, normalizing `\r\n` and `\r` to line breaks.
pub fn split_lines(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    normalized.split('\n').map(str::to_string).collect()
}

/// A forward operation paired with the inverse that undoes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Re-applied on redo
    pub forward: EditOperation,
    /// Applied on undo
    pub inverse: EditOperation,
}

/// Edits that are undone and redone together.
#[derive(Debug, Clone, Default)]
pub struct EditGroup {
    /// The entries in application order
    pub entries: Vec<HistoryEntry>,
    /// Whether new typed characters may still merge into this group
    open_for_typing: bool,
}

/// Manages undo/redo history.
///
/// ## Design Decisions
///
/// 1. **Bounded history**: oldest groups are evicted past `max_size`
/// 2. **Typing coalescing**: adjacent keystrokes merge into one step,
///    split at word boundaries
/// 3. **Edit grouping**: compound commands become a single step
/// 4. **Save point**: tracks which depth matches the saved document
///
/// ## Learning: VecDeque
///
/// `VecDeque` gives cheap push/pop at the back (undo) and pop at the
/// front (eviction when at capacity).
#[derive(Debug, Clone)]
pub struct History {
    /// Stack of undoable edit groups
    undo_stack: VecDeque<EditGroup>,
    /// Stack of redoable edit groups
    redo_stack: Vec<EditGroup>,
    /// Maximum number of edit groups to keep
    max_size: usize,
    /// Nesting depth of open groups
    group_depth: usize,
    /// Whether the next push must start a fresh group
    group_started: bool,
    /// Undo depth at which the document was last saved
    saved_at: Option<usize>,
}

impl History {
    /// Creates a new history with the given capacity.
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(max_size.min(1024)),
            redo_stack: Vec::new(),
            max_size: max_size.max(1),
            group_depth: 0,
            group_started: false,
            saved_at: Some(0),
        }
    }

    /// Records an applied operation and its inverse.
    ///
    /// Clears the redo stack (can't redo after a new edit).
    pub fn push(&mut self, forward: EditOperation, inverse: EditOperation) {
        // Branching history is not supported
        if !self.redo_stack.is_empty() {
            self.redo_stack.clear();
            if self.saved_at.is_some_and(|at| at > self.undo_stack.len()) {
                self.saved_at = None;
            }
        }

        let depth = self.undo_stack.len();
        let at_save_point = self.saved_at == Some(depth);

        if self.group_depth > 0 && !self.group_started {
            if let Some(group) = self.undo_stack.back_mut() {
                group.open_for_typing = false;
                group.entries.push(HistoryEntry { forward, inverse });
                return;
            }
        }

        if self.group_depth == 0 && !at_save_point && forward.is_typed_char() {
            if let Some(group) = self.undo_stack.back_mut() {
                if group.open_for_typing && Self::coalesce(group, &forward, &inverse) {
                    return;
                }
            }
        }

        let open_for_typing = self.group_depth == 0 && forward.is_typed_char();
        self.group_started = false;
        self.undo_stack.push_back(EditGroup {
            entries: vec![HistoryEntry { forward, inverse }],
            open_for_typing,
        });

        // Enforce capacity
        while self.undo_stack.len() > self.max_size {
            self.undo_stack.pop_front();
            self.saved_at = match self.saved_at {
                Some(0) | None => None,
                Some(at) => Some(at - 1),
            };
        }
    }

    /// Merges a typed character into the last typing group when it directly
    /// follows the previous keystroke. Whitespace typed after a word starts a
    /// new undo step.
    fn coalesce(group: &mut EditGroup, forward: &EditOperation, inverse: &EditOperation) -> bool {
        let Some(last) = group.entries.last_mut() else {
            return false;
        };
        if last.inverse.range.end != forward.range.start {
            return false;
        }

        let prev_char = last.forward.new_lines[0].chars().last();
        let next_char = forward.new_lines[0].chars().next();
        if let (Some(prev), Some(next)) = (prev_char, next_char) {
            if next.is_whitespace() && !prev.is_whitespace() {
                return false;
            }
        }

        last.forward.new_lines[0].push_str(&forward.new_lines[0]);
        last.inverse.range.end = inverse.range.end;
        true
    }

    /// Starts an edit group.
    ///
    /// All edits until the matching `end_group()` are one undo step.
    pub fn begin_group(&mut self) {
        if self.group_depth == 0 {
            self.group_started = true;
        }
        self.group_depth += 1;
    }

    /// Ends the current edit group.
    pub fn end_group(&mut self) {
        self.group_depth = self.group_depth.saturating_sub(1);
        if self.group_depth == 0 {
            self.group_started = false;
        }
    }

    /// Prevents the next typed character from merging into the previous
    /// step (e.g. after the caret was moved).
    pub fn break_coalescing(&mut self) {
        if let Some(group) = self.undo_stack.back_mut() {
            group.open_for_typing = false;
        }
    }

    /// Pops the last group for undoing.
    ///
    /// The caller applies the inverses in reverse order.
    pub fn undo(&mut self) -> Option<EditGroup> {
        let mut group = self.undo_stack.pop_back()?;
        group.open_for_typing = false;
        self.redo_stack.push(group.clone());
        Some(group)
    }

    /// Pops the last undone group for redoing.
    pub fn redo(&mut self) -> Option<EditGroup> {
        let group = self.redo_stack.pop()?;
        self.undo_stack.push_back(group.clone());
        Some(group)
    }

    /// Records the current depth as the saved state.
    pub fn mark_saved(&mut self) {
        self.break_coalescing();
        self.saved_at = Some(self.undo_stack.len());
    }

    /// Returns true when the current depth matches the saved state.
    pub fn is_at_save_point(&self) -> bool {
        self.saved_at == Some(self.undo_stack.len())
    }

    /// Returns true if there are edits to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are edits to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Clears all history and treats the current state as saved.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.group_depth = 0;
        self.group_started = false;
        self.saved_at = Some(0);
    }

    /// Returns the number of undo steps available.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Returns the number of redo steps available.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}
