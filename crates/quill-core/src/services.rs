//! Collaborator interfaces consumed by the editing engine.
//!
//! ## Learning: Traits at the Seams
//!
//! Font metrics, the platform clipboard and syntax classification belong
//! to the host application. The engine only sees these traits, so a GUI
//! can plug in real font shaping while tests use [`MonospaceMeasure`] and
//! [`MemoryClipboard`].

use std::cell::RefCell;
use unicode_width::UnicodeWidthChar;

/// Measures text in pixels.
///
/// Must be deterministic for a given font and size: cached word-wrap
/// results are only valid as long as measurements do not change.
pub trait TextMeasure {
    /// Returns cumulative pixel widths: entry `i` is the width of the first
    /// `i + 1` characters of `text`. Tabs expand relative to the start of
    /// `text`.
    fn measure(&self, text: &str, tab_size: usize) -> Vec<f32>;

    /// Returns true if every printable cell has the same width.
    fn is_fixed_width(&self) -> bool;

    /// Height of one visual row in pixels.
    fn line_height(&self) -> f32;

    /// Returns the total width of `text`.
    fn text_width(&self, text: &str, tab_size: usize) -> f32 {
        self.measure(text, tab_size).last().copied().unwrap_or(0.0)
    }
}

/// Fixed-pitch measurement based on terminal cell widths.
///
/// Wide (CJK) characters take two cells, combining marks take none, and a
/// tab advances to the next multiple of `tab_size` cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasure {
    /// Width of one cell in pixels
    pub cell_width: f32,
    /// Height of one row in pixels
    pub row_height: f32,
}

impl MonospaceMeasure {
    /// Creates a measure with the given cell size.
    pub fn new(cell_width: f32, row_height: f32) -> Self {
        Self {
            cell_width,
            row_height,
        }
    }

    /// One pixel per cell; widths equal column counts.
    pub fn cells() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self::new(8.0, 16.0)
    }
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&self, text: &str, tab_size: usize) -> Vec<f32> {
        let tab_size = tab_size.max(1);
        let mut columns = 0usize;
        text.chars()
            .map(|ch| {
                columns += match ch {
                    '\t' => tab_size - columns % tab_size,
                    _ => ch.width().unwrap_or(1),
                };
                columns as f32 * self.cell_width
            })
            .collect()
    }

    fn is_fixed_width(&self) -> bool {
        true
    }

    fn line_height(&self) -> f32 {
        self.row_height
    }
}

/// Platform clipboard access.
pub trait Clipboard {
    /// Returns the clipboard text, empty if there is none.
    fn get_text(&self) -> String;

    /// Replaces the clipboard text.
    fn set_text(&self, text: &str);

    /// Returns true if the clipboard holds text.
    fn has_text(&self) -> bool {
        !self.get_text().is_empty()
    }
}

/// An in-process clipboard.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: RefCell<String>,
}

impl MemoryClipboard {
    /// Creates an empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for MemoryClipboard {
    fn get_text(&self) -> String {
        self.text.borrow().clone()
    }

    fn set_text(&self, text: &str) {
        *self.text.borrow_mut() = text.to_string();
    }
}

/// Assigns a display category to each character, e.g. from a syntax
/// highlighter. The engine passes the value through untouched.
pub trait TokenClassifier {
    /// Returns the category of the character at `char_index` on `line`.
    fn token_category(&self, line: usize, char_index: usize) -> u8;
}
