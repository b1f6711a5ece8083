//! Caret movement and mouse selection.

use quill_buffer::{Direction, TextPosition, TextRange};

use super::{Editor, Reveal};
use crate::CoreResult;
use crate::layout::Point;

impl Editor {
    /// Moves the caret as the user did it: typing no longer merges into
    /// the previous undo step.
    fn move_caret(&mut self, pos: TextPosition, extend: bool) {
        self.caret.move_to(pos, extend);
        self.buffer.borrow_mut().break_coalescing();
        self.finish(Reveal::Caret);
    }

    // ==================== Horizontal ====================

    /// Moves one grapheme cluster. Without `extend`, an existing selection
    /// collapses to its edge in the direction of travel instead.
    pub fn move_char(&mut self, direction: Direction, extend: bool) -> CoreResult<()> {
        self.begin();
        let selection = self.caret.selection();
        let target = if !extend && !selection.is_empty() {
            match direction {
                Direction::Backward => selection.start,
                Direction::Forward => selection.end,
            }
        } else {
            self.buffer.borrow().move_by_grapheme(self.caret.position(), direction)
        };
        self.move_caret(target, extend);
        Ok(())
    }

    /// Moves to the previous or next word start.
    pub fn move_word(&mut self, direction: Direction, extend: bool) -> CoreResult<()> {
        self.begin();
        let target = self
            .buffer
            .borrow()
            .move_by_word(self.caret.position(), direction, self.config.camel_case_words);
        self.move_caret(target, extend);
        Ok(())
    }

    /// Smart home: jumps to the first non-blank character, or to column 0
    /// when already there.
    pub fn move_line_start(&mut self, extend: bool) -> CoreResult<()> {
        self.begin();
        let pos = self.caret.position();
        let first_non_blank = self
            .buffer
            .borrow()
            .line_chars(pos.line)
            .iter()
            .position(|ch| !ch.is_whitespace());
        let target = match first_non_blank {
            Some(col) if col != pos.pos => col,
            _ => 0,
        };
        self.move_caret(TextPosition::new(pos.line, target), extend);
        Ok(())
    }

    /// Moves to the end of the line.
    pub fn move_line_end(&mut self, extend: bool) -> CoreResult<()> {
        self.begin();
        let line = self.caret.position().line;
        let len = self.buffer.borrow().line_len(line);
        self.move_caret(TextPosition::new(line, len), extend);
        Ok(())
    }

    /// Moves to the start of the document.
    pub fn move_doc_start(&mut self, extend: bool) -> CoreResult<()> {
        self.begin();
        self.move_caret(TextPosition::ZERO, extend);
        Ok(())
    }

    /// Moves to the end of the document.
    pub fn move_doc_end(&mut self, extend: bool) -> CoreResult<()> {
        self.begin();
        let end = self.buffer.borrow().max_position();
        self.move_caret(end, extend);
        Ok(())
    }

    // ==================== Vertical ====================

    /// Moves by visual rows, keeping the preferred horizontal offset.
    pub fn move_rows(&mut self, rows: isize, extend: bool) -> CoreResult<()> {
        self.begin();
        let pos = self.caret.position();
        let (target, x) = {
            let buffer = self.buffer.borrow();
            let measure = &*self.measure;
            let x = match self.caret.preferred_x() {
                Some(x) => x,
                None => self.layout.x_in_row(&buffer, measure, pos),
            };
            let total = self.layout.total_rows(&buffer, measure);
            let row = self.layout.row_of(&buffer, measure, pos);
            let target_row = row.saturating_add_signed(rows).min(total.saturating_sub(1));
            (self.layout.pos_at_row_x(&buffer, measure, target_row, x), x)
        };

        self.caret.move_to(target, extend);
        self.caret.set_preferred_x(x);
        self.buffer.borrow_mut().break_coalescing();
        self.finish(Reveal::Caret);
        Ok(())
    }

    /// Moves the viewport and the caret by one page.
    pub fn move_page(&mut self, direction: Direction, extend: bool) -> CoreResult<()> {
        self.begin();
        let page = self.viewport.page_rows() as isize;
        let delta = match direction {
            Direction::Forward => page,
            Direction::Backward => -page,
        };
        let total = self.row_count();
        if self.viewport.scroll_rows(delta, total) {
            self.events.emit(crate::EditorEvent::ViewportChanged);
        }
        self.move_rows(delta, extend)
    }

    // ==================== Selection ====================

    /// Selects the whole document.
    pub fn select_all(&mut self) -> CoreResult<()> {
        self.begin();
        let full = self.buffer.borrow().full_range();
        self.caret.set_selection(full);
        self.buffer.borrow_mut().break_coalescing();
        self.finish(Reveal::Keep);
        Ok(())
    }

    /// Selects the word at the caret.
    pub fn select_word(&mut self) -> CoreResult<()> {
        self.begin();
        let word = self.buffer.borrow().word_bounds(self.caret.position());
        self.caret.set_selection(word);
        self.finish(Reveal::Caret);
        Ok(())
    }

    fn line_range(&self, line: usize) -> TextRange {
        let buffer = self.buffer.borrow();
        let end = if line + 1 < buffer.len_lines() {
            TextPosition::new(line + 1, 0)
        } else {
            TextPosition::new(line, buffer.line_len(line))
        };
        TextRange::new(TextPosition::new(line, 0), end)
    }

    // ==================== Mouse ====================

    /// Handles a button press at a client point.
    ///
    /// One click places the caret (or extends the selection with
    /// `extend`), two select the word under the pointer, three the line.
    pub fn mouse_down(&mut self, point: Point, extend: bool, click_count: u32) -> CoreResult<()> {
        self.begin();
        let pos = self.client_to_text_pos(point);
        self.buffer.borrow_mut().break_coalescing();

        match click_count {
            0 | 1 => self.caret.move_to(pos, extend),
            2 => {
                let word = self.buffer.borrow().word_bounds(pos);
                if word.is_empty() {
                    self.caret.move_to(pos, false);
                } else {
                    self.caret.set_selection(word);
                }
            }
            _ => {
                let line = self.line_range(pos.line);
                if line.is_empty() {
                    self.caret.move_to(pos, false);
                } else {
                    self.caret.set_selection(line);
                }
            }
        }
        self.finish(Reveal::Caret);
        Ok(())
    }

    /// Extends the selection to the point under a dragged pointer.
    pub fn mouse_drag(&mut self, point: Point) -> CoreResult<()> {
        self.begin();
        let pos = self.client_to_text_pos(point);
        self.caret.move_to(pos, true);
        self.finish(Reveal::Caret);
        Ok(())
    }
}
