//! Mapping between document positions, visual rows and client pixels.
//!
//! ## Learning: Derived State
//!
//! Everything here can be recomputed from the buffer and the measurement
//! service. The [`Layout`] only caches: wrap spans live in the
//! [`WordWrapEngine`], the widest line width is kept separately, and both
//! are dropped together by [`Layout::invalidate`].

use quill_buffer::{TextBuffer, TextPosition};
use serde::Serialize;

use crate::services::TextMeasure;
use crate::viewport::Viewport;
use crate::wrap::WordWrapEngine;

/// A point in client coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A box in client coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One visual row handed to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualRow {
    /// Logical line the row belongs to
    pub line: usize,
    /// Index of the row within its line
    pub sub_row: usize,
    /// First character of the row
    pub start: usize,
    /// One past the last character of the row
    pub end: usize,
    /// The row's text
    pub text: String,
}

fn width_to(cumulative: &[f32], k: usize) -> f32 {
    match k {
        0 => 0.0,
        k => cumulative.get(k - 1).or(cumulative.last()).copied().unwrap_or(0.0),
    }
}

/// Cached layout of a buffer.
#[derive(Debug, Clone)]
pub struct Layout {
    wrap: WordWrapEngine,
    tab_size: usize,
    longest_line: Option<f32>,
}

impl Layout {
    /// Creates a layout with wrapping disabled.
    pub fn new(split_chars: Vec<char>, tab_size: usize) -> Self {
        Self {
            wrap: WordWrapEngine::new(split_chars, tab_size),
            tab_size,
            longest_line: None,
        }
    }

    /// Returns the tab width.
    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    /// Returns true if lines are wrapped.
    pub fn is_wrapping(&self) -> bool {
        self.wrap.is_wrapping()
    }

    /// Sets the wrap width; `None` disables wrapping.
    pub fn set_wrap_width(&mut self, width: Option<f32>) -> bool {
        self.wrap.set_max_width(width.unwrap_or(f32::INFINITY))
    }

    /// Drops all cached layout after a content or font change.
    pub fn invalidate(&mut self) {
        self.wrap.invalidate();
        self.longest_line = None;
    }

    /// Gives access to the wrap engine.
    pub fn wrap_engine(&mut self) -> &mut WordWrapEngine {
        &mut self.wrap
    }

    fn widths(&self, buffer: &TextBuffer, measure: &dyn TextMeasure, line: usize) -> Vec<f32> {
        measure.measure(&buffer.line(line), self.tab_size)
    }

    /// Returns the `[start, end)` characters of a visual row of a line.
    fn row_bounds(&mut self, buffer: &TextBuffer, measure: &dyn TextMeasure, line: usize, sub_row: usize) -> (usize, usize) {
        if self.wrap.is_wrapping() {
            self.wrap.span(buffer, measure, line).row_range(sub_row)
        } else {
            (0, buffer.line_len(line))
        }
    }

    /// Returns the number of visual rows.
    pub fn total_rows(&mut self, buffer: &TextBuffer, measure: &dyn TextMeasure) -> usize {
        if self.wrap.is_wrapping() {
            self.wrap.total_rows(buffer, measure)
        } else {
            buffer.len_lines()
        }
    }

    /// Returns the visual row and the row-relative column of a position.
    pub fn row_and_col(&mut self, buffer: &TextBuffer, measure: &dyn TextMeasure, pos: TextPosition) -> (usize, usize) {
        let pos = buffer.corrected(pos);
        if !self.wrap.is_wrapping() {
            return (pos.line, pos.pos);
        }
        let first = self.wrap.first_row_of_line(buffer, measure, pos.line);
        let (sub_row, col) = self.wrap.span(buffer, measure, pos.line).find_wrap_line(pos.pos);
        (first + sub_row, col)
    }

    /// Returns the visual row of a position.
    pub fn row_of(&mut self, buffer: &TextBuffer, measure: &dyn TextMeasure, pos: TextPosition) -> usize {
        self.row_and_col(buffer, measure, pos).0
    }

    /// Maps a visual row to its line and sub-row.
    pub fn line_at_row(&mut self, buffer: &TextBuffer, measure: &dyn TextMeasure, row: usize) -> (usize, usize) {
        if self.wrap.is_wrapping() {
            self.wrap.line_at_row(buffer, measure, row)
        } else {
            (row.min(buffer.len_lines() - 1), 0)
        }
    }

    /// Returns the pixel offset of a position from the start of its row.
    pub fn x_in_row(&mut self, buffer: &TextBuffer, measure: &dyn TextMeasure, pos: TextPosition) -> f32 {
        let pos = buffer.corrected(pos);
        let widths = self.widths(buffer, measure, pos.line);
        let row_start_x = if self.wrap.is_wrapping() {
            let span = self.wrap.span(buffer, measure, pos.line);
            let (sub_row, _) = span.find_wrap_line(pos.pos);
            span.row_start_x(sub_row)
        } else {
            0.0
        };
        width_to(&widths, pos.pos) - row_start_x
    }

    /// Returns the position on a visual row closest to a row-relative x.
    ///
    /// The caret lands on the nearer side of the character under `x`. On
    /// all but the last row of a wrapped line the row end is excluded,
    /// since that offset belongs to the next row.
    pub fn pos_at_row_x(&mut self, buffer: &TextBuffer, measure: &dyn TextMeasure, row: usize, x: f32) -> TextPosition {
        let (line, sub_row) = self.line_at_row(buffer, measure, row);
        let (start, end) = self.row_bounds(buffer, measure, line, sub_row);
        let widths = self.widths(buffer, measure, line);
        let base = width_to(&widths, start);
        let target = base + x.max(0.0);

        let mut col = end;
        for k in start..end {
            let mid = (width_to(&widths, k) + width_to(&widths, k + 1)) / 2.0;
            if target < mid {
                col = k;
                break;
            }
        }

        let last_row_of_line = end >= buffer.line_len(line);
        if !last_row_of_line && col == end && end > start {
            col = end - 1;
        }
        TextPosition::new(line, col)
    }

    /// Returns the width of the widest line, for horizontal scroll extents.
    pub fn longest_line_width(&mut self, buffer: &TextBuffer, measure: &dyn TextMeasure) -> f32 {
        if let Some(width) = self.longest_line {
            return width;
        }
        tracing::trace!(lines = buffer.len_lines(), "measuring longest line");
        let width = (0..buffer.len_lines())
            .map(|line| measure.text_width(&buffer.line(line), self.tab_size))
            .fold(0.0, f32::max);
        self.longest_line = Some(width);
        width
    }

    /// Returns the rows visible in a viewport, top to bottom.
    pub fn visible_rows(&mut self, buffer: &TextBuffer, measure: &dyn TextMeasure, viewport: &Viewport) -> Vec<VisualRow> {
        let total = self.total_rows(buffer, measure);
        let first = viewport.first_row().min(total);
        let last = (first + viewport.visible_row_count()).min(total);

        (first..last)
            .map(|row| {
                let (line, sub_row) = self.line_at_row(buffer, measure, row);
                let (start, end) = self.row_bounds(buffer, measure, line, sub_row);
                let text = buffer.line_chars(line)[start..end].iter().collect();
                VisualRow {
                    line,
                    sub_row,
                    start,
                    end,
                    text,
                }
            })
            .collect()
    }

    /// Returns the client-space box of the character cell at a position.
    ///
    /// The box has the width of the character after the position, or of a
    /// space at the end of a line.
    pub fn text_pos_to_client(
        &mut self,
        buffer: &TextBuffer,
        measure: &dyn TextMeasure,
        viewport: &Viewport,
        pos: TextPosition,
    ) -> Rect {
        let pos = buffer.corrected(pos);
        let row = self.row_of(buffer, measure, pos);
        let x = self.x_in_row(buffer, measure, pos);

        let widths = self.widths(buffer, measure, pos.line);
        let width = if pos.pos < widths.len() {
            width_to(&widths, pos.pos + 1) - width_to(&widths, pos.pos)
        } else {
            measure.text_width(" ", self.tab_size)
        };

        let line_height = viewport.line_height();
        Rect {
            x: x - viewport.scroll_x(),
            y: (row as f32 - viewport.first_row() as f32) * line_height,
            width,
            height: line_height,
        }
    }

    /// Returns the position nearest to a client-space point.
    pub fn client_to_text_pos(
        &mut self,
        buffer: &TextBuffer,
        measure: &dyn TextMeasure,
        viewport: &Viewport,
        point: Point,
    ) -> TextPosition {
        let row_offset = (point.y.max(0.0) / viewport.line_height()).floor() as usize;
        let row = viewport.first_row() + row_offset;
        self.pos_at_row_x(buffer, measure, row, point.x + viewport.scroll_x())
    }
}
