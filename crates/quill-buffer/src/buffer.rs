//! Core text buffer implementation using a rope data structure.
//!
//! ## Why Rope?
//!
//! The buffer is edited continuously (keystrokes, drags, paste), so edits
//! and line lookups must stay cheap as documents grow:
//! - **Edits**: O(log n) insertions/deletions vs O(n) for a flat string
//! - **Line access**: O(log n) line-to-char conversion
//!
//! The rope is built without Unicode/CR line-break support, so `\n` is the
//! only line separator and lines never contain a break character.
//!
//! ## Learning: Ownership in Action
//!
//! ```rust,ignore
//! let buffer = TextBuffer::from("hello");  // buffer OWNS the rope
//! let line = buffer.line(0);               // line BORROWS from buffer
//! // buffer.apply(op, actor);              // ERROR! Can't mutate while borrowed
//! drop(line);                              // Release borrow
//! buffer.apply(op, actor)?;                // Now OK!
//! ```

use ropey::Rope;
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;
use unicode_segmentation::UnicodeSegmentation;

use crate::history::{EditKind, EditOperation, History, split_lines};
use crate::observer::{Observers, SubscriptionId};
use crate::word;
use crate::{ActorId, BufferError, BufferResult, Direction, TextPosition, TextRange};

/// A buffer shared between several views; the buffer is the only writer.
pub type SharedBuffer = Rc<RefCell<TextBuffer>>;

/// Describes one applied mutation, delivered to buffer observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    /// The operation that was applied
    pub op: EditOperation,
    /// The span that was replaced, in pre-edit coordinates
    pub before: TextRange,
    /// The span of the inserted text, in post-edit coordinates
    pub after: TextRange,
    /// Who requested the edit
    pub actor: ActorId,
}

/// Notifications emitted by a [`TextBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferEvent {
    /// The content changed
    Changed(ContentChange),
    /// The modified flag flipped
    ModifiedChanged(bool),
}

/// Configuration for buffer behavior
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Maximum history entries to keep
    pub max_history: usize,

    /// Whether the buffer may hold more than one line
    pub multiline: bool,

    /// Reject all content mutations
    pub read_only: bool,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_history: 1000,
            multiline: true,
            read_only: false,
        }
    }
}

/// An editable sequence of lines backed by a rope.
///
/// # Thread Safety
///
/// `TextBuffer` holds boxed observer closures and is meant to live on the
/// UI thread. Share it between views with [`SharedBuffer`].
#[derive(Debug)]
pub struct TextBuffer {
    /// The rope holding our text content
    rope: Rope,

    /// Edit history for undo/redo
    history: History,

    /// Whether the buffer has unsaved changes
    modified: bool,

    /// Incremented on every content change
    revision: u64,

    /// Buffer-specific settings
    config: BufferConfig,

    /// Change subscribers
    observers: Observers<BufferEvent>,
}

impl TextBuffer {
    /// Creates a new empty multi-line buffer.
    ///
    /// # Example
    /// ```
    /// use quill_buffer::TextBuffer;
    ///
    /// let buffer = TextBuffer::new();
    /// assert!(buffer.is_empty());
    /// assert_eq!(buffer.len_lines(), 1);
    /// ```
    pub fn new() -> Self {
        Self::with_config(BufferConfig::default())
    }

    /// Creates an empty buffer that always holds exactly one line.
    pub fn single_line() -> Self {
        Self::with_config(BufferConfig {
            multiline: false,
            ..BufferConfig::default()
        })
    }

    /// Creates a buffer with custom configuration.
    pub fn with_config(config: BufferConfig) -> Self {
        Self {
            rope: Rope::new(),
            history: History::new(config.max_history),
            modified: false,
            revision: 0,
            config,
            observers: Observers::new(),
        }
    }

    /// Wraps the buffer in a shared handle.
    pub fn into_shared(self) -> SharedBuffer {
        Rc::new(RefCell::new(self))
    }

    // ==================== Text Access ====================

    /// Returns the entire text content, lines joined with `\n`.
    #[inline]
    pub fn text(&self) -> Cow<'_, str> {
        self.rope.slice(..).into()
    }

    /// Returns a line without its line break. Out-of-range indices are
    /// clamped to the last line.
    pub fn line(&self, line_idx: usize) -> Cow<'_, str> {
        let line_idx = self.clamp_line(line_idx);
        let len = self.line_len(line_idx);
        self.rope.line(line_idx).slice(..len).into()
    }

    /// Returns a line's code points.
    pub fn line_chars(&self, line_idx: usize) -> Vec<char> {
        let line_idx = self.clamp_line(line_idx);
        let len = self.line_len(line_idx);
        self.rope.line(line_idx).chars().take(len).collect()
    }

    /// Returns the character at a position, if there is one.
    pub fn char_at(&self, pos: TextPosition) -> Option<char> {
        let pos = self.corrected(pos);
        if pos.pos >= self.line_len(pos.line) {
            return None;
        }
        Some(self.rope.char(self.char_index(pos)))
    }

    /// Returns the text spanned by a range, lines joined with `\n`.
    pub fn text_in_range(&self, range: TextRange) -> String {
        let start = self.char_index(self.corrected(range.start));
        let end = self.char_index(self.corrected(range.end));
        self.rope.slice(start..end.max(start)).to_string()
    }

    /// Returns the text spanned by a range as separate lines.
    pub fn lines_in_range(&self, range: TextRange) -> Vec<String> {
        split_lines(&self.text_in_range(range))
    }

    // ==================== Measurements ====================

    /// Returns true if the buffer holds no text.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Returns the number of code points, counting line breaks.
    #[inline]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the number of lines. Never zero: an empty buffer has one
    /// empty line.
    #[inline]
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns the length of a line in code points, excluding the break.
    pub fn line_len(&self, line_idx: usize) -> usize {
        let line_idx = self.clamp_line(line_idx);
        let slice = self.rope.line(line_idx);
        let len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Returns the position just past the last character.
    pub fn max_position(&self) -> TextPosition {
        let last = self.len_lines() - 1;
        TextPosition::new(last, self.line_len(last))
    }

    /// Returns the range covering the whole document.
    pub fn full_range(&self) -> TextRange {
        TextRange::new(TextPosition::ZERO, self.max_position())
    }

    // ==================== Position Correction ====================

    /// Clamps a position into the document.
    ///
    /// Idempotent: correcting an already valid position leaves it unchanged.
    pub fn correct_position(&self, pos: &mut TextPosition) {
        pos.line = self.clamp_line(pos.line);
        pos.pos = pos.pos.min(self.line_len(pos.line));
    }

    /// Returns a clamped copy of a position.
    pub fn corrected(&self, mut pos: TextPosition) -> TextPosition {
        self.correct_position(&mut pos);
        pos
    }

    /// Clamps both ends of a range into the document.
    pub fn corrected_range(&self, range: TextRange) -> TextRange {
        TextRange::new(self.corrected(range.start), self.corrected(range.end))
    }

    fn clamp_line(&self, line_idx: usize) -> usize {
        line_idx.min(self.len_lines() - 1)
    }

    fn char_index(&self, pos: TextPosition) -> usize {
        self.rope.line_to_char(pos.line) + pos.pos
    }

    // ==================== Navigation ====================

    /// Expands a position to the word run containing or touching it.
    pub fn word_bounds(&self, pos: TextPosition) -> TextRange {
        let pos = self.corrected(pos);
        let chars = self.line_chars(pos.line);
        let (start, end) = word::word_bounds_in(&chars, pos.pos);
        TextRange::on_line(pos.line, start, end)
    }

    /// Moves to the next or previous word start, crossing line breaks.
    pub fn move_by_word(&self, pos: TextPosition, direction: Direction, camel_case: bool) -> TextPosition {
        let pos = self.corrected(pos);
        let chars = self.line_chars(pos.line);
        match direction {
            Direction::Forward => {
                if pos.pos >= chars.len() {
                    if pos.line + 1 < self.len_lines() {
                        return TextPosition::new(pos.line + 1, 0);
                    }
                    return pos;
                }
                TextPosition::new(pos.line, word::next_word_start(&chars, pos.pos, camel_case))
            }
            Direction::Backward => {
                if pos.pos == 0 {
                    if pos.line > 0 {
                        return TextPosition::new(pos.line - 1, self.line_len(pos.line - 1));
                    }
                    return pos;
                }
                TextPosition::new(pos.line, word::prev_word_start(&chars, pos.pos, camel_case))
            }
        }
    }

    /// Moves one grapheme cluster, crossing line breaks.
    pub fn move_by_grapheme(&self, pos: TextPosition, direction: Direction) -> TextPosition {
        let pos = self.corrected(pos);
        let line = self.line(pos.line);
        let mut boundaries = vec![0];
        let mut offset = 0;
        for grapheme in line.graphemes(true) {
            offset += grapheme.chars().count();
            boundaries.push(offset);
        }

        match direction {
            Direction::Forward => match boundaries.iter().find(|&&b| b > pos.pos) {
                Some(&next) => TextPosition::new(pos.line, next),
                None if pos.line + 1 < self.len_lines() => TextPosition::new(pos.line + 1, 0),
                None => pos,
            },
            Direction::Backward => match boundaries.iter().rev().find(|&&b| b < pos.pos) {
                Some(&prev) => TextPosition::new(pos.line, prev),
                None if pos.line > 0 => TextPosition::new(pos.line - 1, self.line_len(pos.line - 1)),
                None => pos,
            },
        }
    }

    // ==================== Mutations ====================

    /// Applies an edit operation and records its inverse for undo.
    ///
    /// Returns the replaced span (pre-edit coordinates) and the span of the
    /// inserted text (post-edit coordinates). Observers are notified before
    /// this returns; they must not call back into the buffer.
    pub fn apply(&mut self, op: EditOperation, actor: ActorId) -> BufferResult<(TextRange, TextRange)> {
        match op.kind {
            EditKind::SaveMarker => {
                self.history.mark_saved();
                self.set_modified(false);
                let at = TextRange::default();
                Ok((at, at))
            }
            EditKind::ReplaceContent => {
                self.ensure_writable()?;
                Ok(self.replace_content(op, actor))
            }
            EditKind::Replace => {
                self.ensure_writable()?;
                let (before, after, removed) = self.replace_raw(op.range, &op.new_lines);
                let forward = EditOperation::replace(before, self.lines_in_range(after));
                let inverse = EditOperation::replace(after, removed);
                self.history.push(forward.clone(), inverse);
                self.finish_change(forward, before, after, actor);
                Ok((before, after))
            }
        }
    }

    /// Replaces the whole document, clearing history and the modified flag.
    pub fn set_text(&mut self, text: &str, actor: ActorId) -> BufferResult<()> {
        self.apply(EditOperation::replace_content(text), actor).map(|_| ())
    }

    /// Records the current state as saved.
    pub fn mark_saved(&mut self, actor: ActorId) {
        // Save markers are accepted even on read-only buffers
        let _ = self.apply(EditOperation::save_marker(), actor);
    }

    fn ensure_writable(&self) -> BufferResult<()> {
        if self.config.read_only {
            tracing::debug!("rejected edit on read-only buffer");
            return Err(BufferError::ReadOnly);
        }
        Ok(())
    }

    fn replace_content(&mut self, op: EditOperation, actor: ActorId) -> (TextRange, TextRange) {
        let before = self.full_range();
        let lines = self.fit_lines(&op.new_lines);
        self.rope = Rope::from_str(&lines.join("\n"));
        self.history.clear();
        let after = self.full_range();

        self.revision += 1;
        let change = ContentChange {
            op,
            before,
            after,
            actor,
        };
        self.observers.notify(&BufferEvent::Changed(change));
        self.set_modified(false);
        (before, after)
    }

    /// Replaces `range` with `new_lines` without touching history.
    fn replace_raw(&mut self, range: TextRange, new_lines: &[String]) -> (TextRange, TextRange, Vec<String>) {
        let before = self.corrected_range(range);
        let lines = self.fit_lines(new_lines);

        let start_idx = self.char_index(before.start);
        let end_idx = self.char_index(before.end);
        let removed = split_lines(&self.rope.slice(start_idx..end_idx).to_string());

        self.rope.remove(start_idx..end_idx);
        self.rope.insert(start_idx, &lines.join("\n"));

        let end = match lines.as_slice() {
            [only] => TextPosition::new(before.start.line, before.start.pos + only.chars().count()),
            [.., last] => TextPosition::new(before.start.line + lines.len() - 1, last.chars().count()),
            [] => before.start,
        };
        let after = TextRange::new(before.start, end);
        (before, after, removed)
    }

    /// Normalizes replacement lines: no embedded breaks, at least one line,
    /// and a single line for single-line buffers.
    fn fit_lines(&self, new_lines: &[String]) -> Vec<String> {
        let lines = split_lines(&new_lines.join("\n"));
        if self.config.multiline || lines.len() == 1 {
            lines
        } else {
            vec![lines.join(" ")]
        }
    }

    fn finish_change(&mut self, op: EditOperation, before: TextRange, after: TextRange, actor: ActorId) {
        self.revision += 1;
        let change = ContentChange {
            op,
            before,
            after,
            actor,
        };
        self.observers.notify(&BufferEvent::Changed(change));
        let modified = !self.history.is_at_save_point();
        self.set_modified(modified);
    }

    fn set_modified(&mut self, modified: bool) {
        if self.modified != modified {
            self.modified = modified;
            self.observers.notify(&BufferEvent::ModifiedChanged(modified));
        }
    }

    // ==================== Undo/Redo ====================

    /// Undoes the last edit group.
    ///
    /// Returns the span of the text restored by the earliest edit of the
    /// group, which is where the caret belongs afterwards.
    pub fn undo(&mut self, actor: ActorId) -> BufferResult<TextRange> {
        self.ensure_writable()?;
        let group = self.history.undo().ok_or(BufferError::NothingToUndo)?;

        let mut restored = TextRange::default();
        for entry in group.entries.iter().rev() {
            let (before, after, _) = self.replace_raw(entry.inverse.range, &entry.inverse.new_lines);
            self.finish_change(entry.inverse.clone(), before, after, actor);
            restored = after;
        }
        Ok(restored)
    }

    /// Redoes the last undone edit group.
    pub fn redo(&mut self, actor: ActorId) -> BufferResult<TextRange> {
        self.ensure_writable()?;
        let group = self.history.redo().ok_or(BufferError::NothingToRedo)?;

        let mut inserted = TextRange::default();
        for entry in &group.entries {
            let (before, after, _) = self.replace_raw(entry.forward.range, &entry.forward.new_lines);
            self.finish_change(entry.forward.clone(), before, after, actor);
            inserted = after;
        }
        Ok(inserted)
    }

    /// Returns true if there are edits to undo.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Returns true if there are edits to redo.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Starts a compound edit that undoes as one step.
    pub fn begin_group(&mut self) {
        self.history.begin_group();
    }

    /// Ends a compound edit.
    pub fn end_group(&mut self) {
        self.history.end_group();
    }

    /// Stops the next typed character from merging into the last step.
    pub fn break_coalescing(&mut self) {
        self.history.break_coalescing();
    }

    /// Returns the edit history.
    pub fn history(&self) -> &History {
        &self.history
    }

    // ==================== Observers ====================

    /// Subscribes to buffer events.
    pub fn subscribe(&mut self, callback: impl FnMut(&BufferEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    /// Removes a subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    // ==================== State Queries ====================

    /// Returns true if the buffer has unsaved changes.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Returns true if mutations are rejected.
    pub fn is_read_only(&self) -> bool {
        self.config.read_only
    }

    /// Enables or disables read-only mode.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.config.read_only = read_only;
    }

    /// Returns true if the buffer may hold several lines.
    pub fn is_multiline(&self) -> bool {
        self.config.multiline
    }

    /// Returns a counter that changes whenever the content does.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the buffer's configuration.
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TextBuffer {
    fn from(s: &str) -> Self {
        let mut buffer = Self::new();
        buffer.rope = Rope::from_str(&split_lines(s).join("\n"));
        buffer
    }
}

impl From<String> for TextBuffer {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}
