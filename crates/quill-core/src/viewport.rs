//! Scroll state and caret-visibility policy.
//!
//! The vertical position is kept in visual rows, so the same arithmetic
//! works whether or not lines are wrapped. Horizontal scrolling only
//! applies when wrapping is off.

/// The visible window onto the laid-out document.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// First visual row shown at the top
    first_row: usize,
    /// Horizontal scroll offset in pixels
    scroll_x: f32,
    /// Client area width in pixels
    width: f32,
    /// Client area height in pixels
    height: f32,
    /// Height of one visual row
    line_height: f32,
    /// Keep the caret this far from the left edge
    left_margin: f32,
    /// Keep the caret this far from the right edge
    right_margin: f32,
}

impl Viewport {
    /// Creates a viewport with no client area yet.
    pub fn new(line_height: f32, left_margin: f32, right_margin: f32) -> Self {
        Self {
            first_row: 0,
            scroll_x: 0.0,
            width: 0.0,
            height: 0.0,
            line_height: line_height.max(1.0),
            left_margin,
            right_margin,
        }
    }

    /// Returns the first visible row.
    pub fn first_row(&self) -> usize {
        self.first_row
    }

    /// Returns the horizontal scroll offset.
    pub fn scroll_x(&self) -> f32 {
        self.scroll_x
    }

    /// Returns the client width.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Returns the client height.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Returns the row height.
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Resizes the client area.
    pub fn set_client_size(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    /// Changes the row height, e.g. after a font change.
    pub fn set_line_height(&mut self, line_height: f32) {
        self.line_height = line_height.max(1.0);
    }

    /// Number of fully visible rows; at least one.
    pub fn visible_row_count(&self) -> usize {
        ((self.height / self.line_height).floor() as usize).max(1)
    }

    /// Rows moved by a page up/down.
    pub fn page_rows(&self) -> usize {
        self.visible_row_count()
    }

    fn max_first_row(&self, total_rows: usize) -> usize {
        total_rows.saturating_sub(self.visible_row_count())
    }

    /// Scrolls to a row, clamped so the last page stays full. Returns true
    /// if the position changed.
    pub fn set_first_row(&mut self, row: usize, total_rows: usize) -> bool {
        let row = row.min(self.max_first_row(total_rows));
        if row == self.first_row {
            return false;
        }
        self.first_row = row;
        true
    }

    /// Scrolls by a signed number of rows.
    pub fn scroll_rows(&mut self, delta: isize, total_rows: usize) -> bool {
        let row = self.first_row.saturating_add_signed(delta);
        self.set_first_row(row, total_rows)
    }

    /// Brings a row into view.
    ///
    /// Rows above the window scroll it up, rows below scroll it down by the
    /// minimal amount. With `center` the row is placed mid-window instead.
    pub fn ensure_row_visible(&mut self, row: usize, center: bool, total_rows: usize) -> bool {
        let visible = self.visible_row_count();
        let last_visible = self.first_row + visible;
        if row >= self.first_row && row < last_visible {
            return false;
        }

        let target = if center {
            row.saturating_sub(visible / 2)
        } else if row < self.first_row {
            row
        } else {
            row + 1 - visible
        };
        self.set_first_row(target, total_rows)
    }

    /// Nudges the horizontal offset so that pixel `x` is visible.
    ///
    /// Near an edge the view jumps by a quarter of its width rather than
    /// following the caret pixel by pixel.
    pub fn ensure_x_visible(&mut self, x: f32) -> bool {
        if self.width <= 0.0 {
            return false;
        }

        let old = self.scroll_x;
        let quarter = self.width / 4.0;
        if x < self.scroll_x + self.left_margin {
            self.scroll_x = (x - quarter).max(0.0);
        } else if x > self.scroll_x + self.width - self.right_margin {
            self.scroll_x = (x - self.width + quarter.max(self.right_margin)).max(0.0);
        }
        self.scroll_x != old
    }

    /// Resets horizontal scrolling.
    pub fn reset_scroll_x(&mut self) -> bool {
        let changed = self.scroll_x != 0.0;
        self.scroll_x = 0.0;
        changed
    }

    /// Clamps the scroll position after the document shrank.
    pub fn clamp(&mut self, total_rows: usize) -> bool {
        self.set_first_row(self.first_row, total_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        let mut viewport = Viewport::new(10.0, 8.0, 32.0);
        viewport.set_client_size(200.0, 55.0);
        viewport
    }

    #[test]
    fn test_visible_rows() {
        assert_eq!(viewport().visible_row_count(), 5);
        assert_eq!(Viewport::new(10.0, 0.0, 0.0).visible_row_count(), 1);
    }

    #[test]
    fn test_minimal_scroll_down_and_up() {
        let mut viewport = viewport();
        assert!(!viewport.ensure_row_visible(4, false, 100));

        assert!(viewport.ensure_row_visible(7, false, 100));
        assert_eq!(viewport.first_row(), 3);

        assert!(viewport.ensure_row_visible(1, false, 100));
        assert_eq!(viewport.first_row(), 1);
    }

    #[test]
    fn test_centering() {
        let mut viewport = viewport();
        viewport.ensure_row_visible(50, true, 100);
        assert_eq!(viewport.first_row(), 48);
    }

    #[test]
    fn test_clamped_to_document() {
        let mut viewport = viewport();
        viewport.ensure_row_visible(19, true, 20);
        assert_eq!(viewport.first_row(), 15);

        assert!(!viewport.scroll_rows(10, 20));
        assert!(viewport.scroll_rows(-20, 20));
        assert_eq!(viewport.first_row(), 0);
    }

    #[test]
    fn test_horizontal_nudge() {
        let mut viewport = viewport();
        assert!(!viewport.ensure_x_visible(100.0));

        assert!(viewport.ensure_x_visible(190.0));
        assert_eq!(viewport.scroll_x(), 40.0);

        assert!(viewport.ensure_x_visible(45.0));
        assert_eq!(viewport.scroll_x(), 0.0);
    }
}
