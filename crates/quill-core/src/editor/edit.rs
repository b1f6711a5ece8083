//! Text editing commands.
//!
//! All edits go through [`Editor::apply_edit`], so a read-only buffer turns
//! every command here into a no-op. The caret is placed explicitly after
//! each edit; only edits from other views are tracked by shifting.

use std::ops::RangeInclusive;

use quill_buffer::{Direction, EditOperation, TextPosition, TextRange};

use super::{Editor, Reveal};
use crate::CoreResult;

impl Editor {
    // ==================== Typing ====================

    /// Inserts text at the caret, replacing the selection.
    ///
    /// In replace mode a single typed character overwrites the character
    /// after the caret instead of pushing it right.
    pub fn insert_text(&mut self, text: &str) -> CoreResult<()> {
        self.begin();
        let range = self.typing_range(text);
        if let Some((_, after)) = self.apply_edit(EditOperation::replace_text(range, text)) {
            self.caret.move_to(after.end, false);
        }
        self.finish(Reveal::Caret);
        Ok(())
    }

    /// Types one character.
    pub fn type_char(&mut self, ch: char) -> CoreResult<()> {
        let mut utf8 = [0u8; 4];
        self.insert_text(ch.encode_utf8(&mut utf8))
    }

    /// Breaks the line at the caret. Single-line editors ignore it.
    pub fn newline(&mut self) -> CoreResult<()> {
        self.begin();
        if !self.buffer.borrow().is_multiline() {
            return Ok(());
        }
        self.insert_text("\n")
    }

    fn typing_range(&self, text: &str) -> TextRange {
        let selection = self.caret.selection();
        if !selection.is_empty() {
            return selection;
        }

        let pos = self.caret.position();
        let single_char = text.chars().count() == 1 && !text.contains('\n');
        if self.replace_mode && single_char && pos.pos < self.buffer.borrow().line_len(pos.line) {
            return TextRange::on_line(pos.line, pos.pos, pos.pos + 1);
        }
        TextRange::point(pos)
    }

    // ==================== Deletion ====================

    fn delete_range(&mut self, range: TextRange) {
        if range.is_empty() {
            return;
        }
        if let Some((_, after)) = self.apply_edit(EditOperation::delete(range)) {
            self.caret.move_to(after.start, false);
        }
    }

    /// Deletes the selection; returns false if nothing was selected.
    pub fn delete_selection(&mut self) -> CoreResult<bool> {
        self.begin();
        let selection = self.caret.selection();
        if selection.is_empty() {
            return Ok(false);
        }
        self.delete_range(selection);
        self.finish(Reveal::Caret);
        Ok(true)
    }

    /// Deletes the selection, or one grapheme cluster next to the caret.
    pub fn delete_char(&mut self, direction: Direction) -> CoreResult<()> {
        self.begin();
        if self.delete_selection()? {
            return Ok(());
        }
        let pos = self.caret.position();
        let other = self.buffer.borrow().move_by_grapheme(pos, direction);
        self.delete_range(TextRange::new(pos, other));
        self.finish(Reveal::Caret);
        Ok(())
    }

    /// Deletes the selection, or up to the previous or next word start.
    pub fn delete_word(&mut self, direction: Direction) -> CoreResult<()> {
        self.begin();
        if self.delete_selection()? {
            return Ok(());
        }
        let pos = self.caret.position();
        let other = self
            .buffer
            .borrow()
            .move_by_word(pos, direction, self.config.camel_case_words);
        self.delete_range(TextRange::new(pos, other));
        self.finish(Reveal::Caret);
        Ok(())
    }

    // ==================== Clipboard ====================

    /// Copies the selection to the clipboard.
    pub fn copy(&mut self) -> CoreResult<()> {
        self.begin();
        if self.caret.has_selection() {
            self.clipboard.set_text(&self.selected_text());
        }
        Ok(())
    }

    /// Copies the selection to the clipboard and deletes it.
    pub fn cut(&mut self) -> CoreResult<()> {
        self.copy()?;
        self.delete_selection().map(|_| ())
    }

    /// Inserts the clipboard text at the caret.
    pub fn paste(&mut self) -> CoreResult<()> {
        self.begin();
        if !self.clipboard.has_text() {
            return Ok(());
        }
        let text = self.clipboard.get_text();
        self.buffer.borrow_mut().break_coalescing();
        self.insert_text(&text)
    }

    // ==================== Indentation ====================

    /// Lines touched by a multi-line selection. A selection ending at
    /// column 0 does not include that last line.
    fn block_lines(selection: TextRange) -> RangeInclusive<usize> {
        let last = if selection.end.pos == 0 && selection.end.line > selection.start.line {
            selection.end.line - 1
        } else {
            selection.end.line
        };
        selection.start.line..=last
    }

    fn select_block(&mut self, lines: RangeInclusive<usize>) {
        let end = TextPosition::new(*lines.end(), self.buffer.borrow().line_len(*lines.end()));
        let block = TextRange::new(TextPosition::new(*lines.start(), 0), end);
        if block.is_empty() {
            self.caret.move_to(block.start, false);
        } else {
            self.caret.set_selection(block);
        }
    }

    /// Indents. A multi-line selection indents every line it touches as
    /// one undo step; otherwise indentation is typed at the caret.
    pub fn indent(&mut self) -> CoreResult<()> {
        self.begin();
        let selection = self.caret.selection();
        if selection.is_single_line() {
            let unit = if self.config.use_spaces {
                let tab = self.config.tab_size.max(1);
                " ".repeat(tab - self.caret.position().pos % tab)
            } else {
                "\t".to_string()
            };
            self.buffer.borrow_mut().break_coalescing();
            return self.insert_text(&unit);
        }

        let lines = Self::block_lines(selection);
        let unit = self.config.indent_unit();
        self.buffer.borrow_mut().begin_group();
        for line in lines.clone() {
            self.apply_edit(EditOperation::insert(TextPosition::new(line, 0), &unit));
        }
        self.buffer.borrow_mut().end_group();

        self.select_block(lines);
        self.finish(Reveal::Caret);
        Ok(())
    }

    /// Removes one level of indentation from the caret line or from every
    /// line the selection touches, as one undo step.
    pub fn unindent(&mut self) -> CoreResult<()> {
        self.begin();
        let selection = self.caret.selection();
        let caret = self.caret.position();
        let anchor = self.caret.anchor();
        let single_line = selection.is_single_line();
        let lines = if single_line {
            caret.line..=caret.line
        } else {
            Self::block_lines(selection)
        };

        let mut removed_on_caret_line = 0;
        self.buffer.borrow_mut().begin_group();
        for line in lines.clone() {
            let chars = self.buffer.borrow().line_chars(line);
            let width = match chars.first() {
                Some('\t') => 1,
                _ => chars
                    .iter()
                    .take(self.config.tab_size.max(1))
                    .take_while(|&&ch| ch == ' ')
                    .count(),
            };
            if width > 0 && self.apply_edit(EditOperation::delete(TextRange::on_line(line, 0, width))).is_some() {
                if line == caret.line {
                    removed_on_caret_line = width;
                }
            }
        }
        self.buffer.borrow_mut().end_group();

        if single_line {
            let shift = |pos: TextPosition| TextPosition::new(pos.line, pos.pos.saturating_sub(removed_on_caret_line));
            self.caret.move_to(shift(anchor), false);
            self.caret.move_to(shift(caret), true);
        } else {
            self.select_block(lines);
        }
        self.finish(Reveal::Caret);
        Ok(())
    }

    // ==================== Undo/Redo ====================

    /// Undoes the last edit group; a no-op when there is none.
    pub fn undo(&mut self) -> CoreResult<()> {
        self.begin();
        let result = self.buffer.borrow_mut().undo(self.actor);
        match result {
            Ok(restored) => self.caret.move_to(restored.end, false),
            Err(err) => tracing::debug!("undo ignored: {}", err),
        }
        self.finish(Reveal::Caret);
        Ok(())
    }

    /// Redoes the last undone edit group; a no-op when there is none.
    pub fn redo(&mut self) -> CoreResult<()> {
        self.begin();
        let result = self.buffer.borrow_mut().redo(self.actor);
        match result {
            Ok(inserted) => self.caret.move_to(inserted.end, false),
            Err(err) => tracing::debug!("redo ignored: {}", err),
        }
        self.finish(Reveal::Caret);
        Ok(())
    }
}
