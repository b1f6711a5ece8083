//! Caret and selection state.
//!
//! ## Learning: Keeping Invariants in One Place
//!
//! The caret always sits on one endpoint of the selection, and the
//! selection is always normalized. Every transition goes through a method
//! on [`Caret`], so those invariants cannot be broken from outside.

use quill_buffer::{TextBuffer, TextPosition, TextRange};

/// The insertion caret with its selection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Caret {
    /// Current caret position
    pos: TextPosition,

    /// Selected span; empty when nothing is selected
    selection: TextRange,

    /// Horizontal pixel offset kept across vertical movement
    preferred_x: Option<f32>,
}

impl Caret {
    /// Creates a caret at a position with no selection.
    pub fn new(pos: TextPosition) -> Self {
        Self {
            pos,
            selection: TextRange::point(pos),
            preferred_x: None,
        }
    }

    /// Returns the caret position.
    pub fn position(&self) -> TextPosition {
        self.pos
    }

    /// Returns the selected span.
    pub fn selection(&self) -> TextRange {
        self.selection
    }

    /// Returns true if text is selected.
    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Returns the selection endpoint the caret is not on.
    pub fn anchor(&self) -> TextPosition {
        if self.selection.start != self.pos {
            self.selection.start
        } else {
            self.selection.end
        }
    }

    /// Moves the caret, extending the selection from its anchor when
    /// `extend` is set and collapsing it otherwise.
    ///
    /// When an extend-move crosses the anchor the selection flips: the
    /// range is re-normalized and the caret ends up on its start.
    pub fn move_to(&mut self, new_pos: TextPosition, extend: bool) {
        if extend {
            let anchor = self.anchor();
            self.selection = TextRange::new(anchor, new_pos);
        } else {
            self.selection = TextRange::point(new_pos);
        }
        self.pos = new_pos;
        self.preferred_x = None;
        debug_assert!(self.pos == self.selection.start || self.pos == self.selection.end);
    }

    /// Sets the selection programmatically; the caret goes to its end.
    ///
    /// Empty ranges are ignored.
    pub fn set_selection(&mut self, range: TextRange) {
        if range.is_empty() {
            return;
        }
        self.selection = range;
        self.pos = range.end;
        self.preferred_x = None;
    }

    /// Selects `range` with the caret on its start, as after a backward
    /// extension.
    pub fn set_selection_reversed(&mut self, range: TextRange) {
        if range.is_empty() {
            return;
        }
        self.selection = range;
        self.pos = range.start;
        self.preferred_x = None;
    }

    /// Collapses the selection onto the caret.
    pub fn clear_selection(&mut self) {
        self.selection = TextRange::point(self.pos);
    }

    /// Returns the remembered horizontal offset for vertical moves.
    pub fn preferred_x(&self) -> Option<f32> {
        self.preferred_x
    }

    /// Remembers the horizontal offset for vertical moves.
    pub fn set_preferred_x(&mut self, x: f32) {
        self.preferred_x = Some(x);
    }

    /// Carries the caret and selection across an edit made by someone else.
    pub fn adjust_for_edit(&mut self, before: TextRange, after: TextRange) {
        let caret_on_start = self.pos == self.selection.start && self.has_selection();
        let start = self.selection.start.shifted(before, after);
        let end = self.selection.end.shifted(before, after);
        self.selection = TextRange::new(start, end);
        self.pos = if caret_on_start { self.selection.start } else { self.selection.end };
    }

    /// Clamps caret and selection into the buffer after a content change.
    ///
    /// A selection that collapsed to nothing is reset to a point at the
    /// caret.
    pub fn correct(&mut self, buffer: &TextBuffer) {
        buffer.correct_position(&mut self.pos);
        buffer.correct_position(&mut self.selection.start);
        buffer.correct_position(&mut self.selection.end);
        self.selection.normalize();

        if self.selection.is_empty() || (self.pos != self.selection.start && self.pos != self.selection.end) {
            self.selection = TextRange::point(self.pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize, col: usize) -> TextPosition {
        TextPosition::new(line, col)
    }

    #[test]
    fn test_plain_move_collapses_selection() {
        let mut caret = Caret::new(pos(0, 0));
        caret.move_to(pos(0, 4), true);
        assert!(caret.has_selection());

        caret.move_to(pos(1, 2), false);
        assert_eq!(caret.position(), pos(1, 2));
        assert_eq!(caret.selection(), TextRange::point(pos(1, 2)));
    }

    #[test]
    fn test_extend_keeps_anchor() {
        let mut caret = Caret::new(pos(1, 5));
        caret.move_to(pos(2, 3), true);
        assert_eq!(caret.selection(), TextRange::new(pos(1, 5), pos(2, 3)));
        assert_eq!(caret.anchor(), pos(1, 5));

        caret.move_to(pos(2, 8), true);
        assert_eq!(caret.selection(), TextRange::new(pos(1, 5), pos(2, 8)));
    }

    #[test]
    fn test_extend_flips_across_anchor() {
        let mut caret = Caret::new(pos(0, 5));
        caret.move_to(pos(0, 7), true);
        caret.move_to(pos(0, 2), true);

        assert_eq!(caret.selection(), TextRange::on_line(0, 2, 5));
        assert_eq!(caret.position(), pos(0, 2));
        assert_eq!(caret.anchor(), pos(0, 5));
    }

    #[test]
    fn test_programmatic_selection() {
        let mut caret = Caret::new(pos(0, 0));
        caret.set_selection(TextRange::point(pos(3, 3)));
        assert_eq!(caret.position(), pos(0, 0));

        caret.set_selection(TextRange::on_line(0, 1, 4));
        assert_eq!(caret.position(), pos(0, 4));
        assert_eq!(caret.anchor(), pos(0, 1));
    }

    #[test]
    fn test_correct_after_shrink() {
        let buffer = TextBuffer::from("short");
        let mut caret = Caret::new(pos(0, 0));
        caret.set_selection(TextRange::new(pos(2, 1), pos(4, 9)));
        caret.correct(&buffer);

        // Lines clamp first, then columns, so the selection survives on line 0
        assert_eq!(caret.position(), pos(0, 5));
        assert_eq!(caret.selection(), TextRange::on_line(0, 1, 5));
    }

    #[test]
    fn test_adjust_for_foreign_insert() {
        let mut caret = Caret::new(pos(0, 0));
        caret.set_selection(TextRange::on_line(0, 4, 6));
        caret.adjust_for_edit(TextRange::point(pos(0, 1)), TextRange::on_line(0, 1, 3));

        assert_eq!(caret.selection(), TextRange::on_line(0, 6, 8));
        assert_eq!(caret.position(), pos(0, 8));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn extend_moves_keep_selection_normalized(
                moves in prop::collection::vec((0usize..5, 0usize..10, any::<bool>()), 1..40)
            ) {
                let mut caret = Caret::new(pos(2, 5));
                for (line, col, extend) in moves {
                    caret.move_to(pos(line, col), extend);
                    let selection = caret.selection();
                    prop_assert!(selection.start <= selection.end);
                    prop_assert!(caret.position() == selection.start || caret.position() == selection.end);
                }
            }
        }
    }
}
