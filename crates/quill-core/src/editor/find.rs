//! Find, replace and passive highlighting.

use quill_buffer::{EditOperation, TextPosition, TextRange};

use super::{Editor, Reveal};
use crate::CoreResult;
use crate::search::{self, SearchHit, SearchOptions, SearchStep};

/// The state of the find panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindState {
    /// Text to search for
    pub pattern: String,
    /// Text substituted by replace
    pub replacement: String,
    /// Matching options
    pub options: SearchOptions,
    /// Range searched when `selection_only` is set
    pub scope: Option<TextRange>,
}

impl FindState {
    /// Creates an empty find state with default options.
    pub fn new(options: SearchOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}

impl Editor {
    // ==================== Find State ====================

    /// Returns the find state.
    pub fn find_state(&self) -> &FindState {
        &self.find
    }

    /// Sets the search pattern.
    pub fn set_find_pattern(&mut self, pattern: &str) {
        self.find.pattern = pattern.to_string();
    }

    /// Sets the replacement text.
    pub fn set_replacement(&mut self, replacement: &str) {
        self.find.replacement = replacement.to_string();
    }

    /// Sets the search options. Turning on `selection_only` captures the
    /// current selection as the search scope.
    pub fn set_search_options(&mut self, options: SearchOptions) {
        self.begin();
        self.find.options = options;
        self.find.scope = if options.selection_only && self.caret.has_selection() {
            Some(self.caret.selection())
        } else {
            None
        };
    }

    /// Closes the find panel: later find-next calls start from scratch.
    pub fn end_find(&mut self) {
        self.find.scope = None;
    }

    fn search_scope(&mut self) -> Option<TextRange> {
        if !self.find.options.selection_only {
            return None;
        }
        if self.find.scope.is_none() && self.caret.has_selection() {
            self.find.scope = Some(self.caret.selection());
        }
        self.find.scope
    }

    // ==================== Navigation ====================

    fn find_step(&mut self, step: SearchStep) -> Option<SearchHit> {
        let scope = self.search_scope();
        let hit = search::find_next_pattern(
            &self.buffer.borrow(),
            self.caret.position(),
            &self.find.pattern,
            &self.find.options,
            scope,
            step,
        );
        match hit {
            Some(hit) => {
                self.caret.set_selection(hit.range);
                self.buffer.borrow_mut().break_coalescing();
                let reveal = if self.config.center_on_find {
                    Reveal::Center
                } else {
                    Reveal::Caret
                };
                self.finish(reveal);
            }
            None => tracing::debug!(pattern = %self.find.pattern, "pattern not found"),
        }
        hit
    }

    /// Starts a search. A single-line selection becomes the pattern; the
    /// match at the caret is kept, otherwise the next one is selected.
    pub fn find(&mut self) -> CoreResult<Option<SearchHit>> {
        self.begin();
        let selection = self.caret.selection();
        if !selection.is_empty() && selection.is_single_line() && !self.find.options.selection_only {
            self.find.pattern = self.selected_text();
        }
        Ok(self.find_step(SearchStep::Stay))
    }

    /// Selects the next match, wrapping at the end of the document.
    pub fn find_next(&mut self) -> CoreResult<Option<SearchHit>> {
        self.begin();
        Ok(self.find_step(SearchStep::Forward))
    }

    /// Selects the previous match, wrapping at the start of the document.
    pub fn find_prev(&mut self) -> CoreResult<Option<SearchHit>> {
        self.begin();
        Ok(self.find_step(SearchStep::Backward))
    }

    // ==================== Replace ====================

    /// Replaces `range` with the replacement text and selects the result.
    fn replace_range(&mut self, range: TextRange) -> bool {
        let op = EditOperation::replace_text(range, &self.find.replacement);
        let Some((before, after)) = self.apply_edit(op) else {
            return false;
        };

        if after.is_empty() {
            self.caret.move_to(after.start, false);
        } else {
            self.caret.set_selection(after);
        }
        if let Some(scope) = self.find.scope {
            self.find.scope = Some(TextRange::new(
                scope.start.shifted(before, after),
                scope.end.shifted(before, after),
            ));
        }
        true
    }

    /// Replaces the match at or after the caret. Returns false when there
    /// is no match or the buffer is read-only.
    pub fn replace_one(&mut self) -> CoreResult<bool> {
        self.begin();
        let scope = self.search_scope();
        let hit = search::find_next_pattern(
            &self.buffer.borrow(),
            self.caret.position(),
            &self.find.pattern,
            &self.find.options,
            scope,
            SearchStep::Stay,
        );
        let replaced = match hit {
            Some(hit) => self.replace_range(hit.range),
            None => false,
        };
        self.finish(Reveal::Caret);
        Ok(replaced)
    }

    /// Replaces the current match and moves on to the next one.
    pub fn replace(&mut self) -> CoreResult<bool> {
        self.begin();
        if !self.replace_one()? {
            return Ok(false);
        }
        self.find_next()?;
        Ok(true)
    }

    /// Replaces every match as one undo step and returns how many were
    /// replaced.
    ///
    /// The scan runs forward from the start of the document (or of the
    /// scope). Each replacement resumes searching after the inserted text;
    /// the loop stops when no match remains ahead, so replacement text
    /// that matches the pattern again is never revisited.
    pub fn replace_all(&mut self) -> CoreResult<usize> {
        self.begin();
        if self.find.pattern.is_empty() || self.is_read_only() {
            return Ok(0);
        }

        let scope = self.search_scope();
        let mut cursor = scope.map_or(TextPosition::ZERO, |scope| scope.start);
        let mut count = 0;

        self.buffer.borrow_mut().begin_group();
        loop {
            let scope = self.find.scope.filter(|_| self.find.options.selection_only);
            let hit = search::find_from(
                &self.buffer.borrow(),
                cursor,
                &self.find.pattern,
                &self.find.options,
                scope,
            );
            let Some(hit) = hit.filter(|hit| !hit.wrapped) else {
                break;
            };
            // Every replacement must move the scan forward
            if hit.range.start < cursor || !self.replace_range(hit.range) {
                break;
            }
            count += 1;
            cursor = self.caret.position();
        }
        self.buffer.borrow_mut().end_group();

        tracing::info!(count, pattern = %self.find.pattern, "replaced all matches");
        self.finish(Reveal::Caret);
        Ok(count)
    }

    // ==================== Highlighting ====================

    /// Sets text to highlight everywhere it occurs.
    pub fn set_highlight(&mut self, text: &str, options: SearchOptions) {
        self.highlight = (!text.is_empty()).then(|| (text.to_string(), options));
    }

    /// Clears the explicit highlight.
    pub fn clear_highlight(&mut self) {
        self.highlight = None;
    }

    /// Returns the text being highlighted: the explicit highlight, or the
    /// selected word when the selection is exactly one whole word.
    pub fn highlight_text(&self) -> Option<(String, SearchOptions)> {
        if let Some(highlight) = &self.highlight {
            return Some(highlight.clone());
        }

        let selection = self.current_caret().selection();
        if selection.is_empty() || !selection.is_single_line() {
            return None;
        }
        let buffer = self.buffer.borrow();
        if buffer.word_bounds(selection.start) != selection {
            return None;
        }
        let options = SearchOptions {
            case_sensitive: true,
            whole_words: true,
            selection_only: false,
        };
        Some((buffer.text_in_range(selection), options))
    }

    /// Returns the highlighted occurrences on the visible rows.
    pub fn highlight_ranges(&mut self) -> Vec<TextRange> {
        self.begin();
        let Some((text, options)) = self.highlight_text() else {
            return Vec::new();
        };
        let rows = self.visible_rows();
        let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
            return Vec::new();
        };
        search::find_in_lines(&self.buffer.borrow(), &text, &options, first.line..last.line + 1)
    }
}
