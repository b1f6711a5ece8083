//! Word wrap: splitting logical lines into visual rows.
//!
//! A line is tokenized at split characters, tokens are packed greedily
//! into rows no wider than the available width, and tokens that are too
//! wide on their own are cut at the widest prefix that fits. The result
//! for each line is a [`LineSpan`], cached until the content, the width or
//! the font changes. Invalidation drops the whole cache; spans are rebuilt
//! lazily the next time a line is laid out.

use quill_buffer::TextBuffer;

use crate::services::TextMeasure;

/// Where a logical line continues on the next visual row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrapPoint {
    /// Character offset at which the next row starts
    pub offset: usize,
    /// Pixel width of the line up to `offset`
    pub x: f32,
}

/// Word-wrap layout of one logical line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSpan {
    /// The logical line this span describes
    pub line: usize,
    /// Row breaks in ascending offset order
    pub wrap_points: Vec<WrapPoint>,
    /// The text of each visual row
    pub substrings: Vec<String>,
    /// Length of the line in characters
    pub len: usize,
}

impl LineSpan {
    /// A span with a single row.
    fn unwrapped(line: usize, text: &str) -> Self {
        Self {
            line,
            wrap_points: Vec::new(),
            substrings: vec![text.to_string()],
            len: text.chars().count(),
        }
    }

    /// Number of wrap points.
    pub fn wrap_point_count(&self) -> usize {
        self.wrap_points.len()
    }

    /// Number of visual rows.
    pub fn row_count(&self) -> usize {
        self.wrap_points.len() + 1
    }

    /// Returns the `[start, end)` character range of a row.
    pub fn row_range(&self, row: usize) -> (usize, usize) {
        let row = row.min(self.wrap_points.len());
        let start = if row == 0 { 0 } else { self.wrap_points[row - 1].offset };
        let end = self.wrap_points.get(row).map_or(self.len, |wp| wp.offset);
        (start, end)
    }

    /// Pixel offset of a row's first character from the line start.
    pub fn row_start_x(&self, row: usize) -> f32 {
        match row.min(self.wrap_points.len()) {
            0 => 0.0,
            r => self.wrap_points[r - 1].x,
        }
    }

    /// Maps a character offset to `(row, column within row)`.
    ///
    /// An offset equal to a wrap point belongs to the row it starts.
    pub fn find_wrap_line(&self, pos: usize) -> (usize, usize) {
        let mut row = 0;
        let mut col = pos.min(self.len);
        let mut row_start = 0;
        for wp in &self.wrap_points {
            if pos < wp.offset {
                break;
            }
            row += 1;
            col = pos.min(self.len) - wp.offset;
            row_start = wp.offset;
        }
        debug_assert!(row_start + col <= self.len);
        (row, col)
    }
}

/// Returns the widest cut `k` in `(start, end]` such that the characters
/// `start..k` fit in `max_width`. Always advances by at least one
/// character, even if that character alone is too wide.
pub fn find_wrap_point(cumulative: &[f32], start: usize, end: usize, max_width: f32) -> usize {
    let width_to = |k: usize| if k == 0 { 0.0 } else { cumulative[k - 1] };
    let base = width_to(start);

    let mut lo = start + 1;
    let mut hi = end;
    if lo >= hi || width_to(lo) - base > max_width {
        return lo.min(end);
    }
    while lo < hi {
        let mid = (lo + hi).div_ceil(2);
        if width_to(mid) - base <= max_width {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Splits a line into tokens at `split_chars`.
///
/// Whitespace split characters become standalone tokens; any other split
/// character stays attached to the token before it, so `well-known` wraps
/// after the hyphen.
fn tokenize(chars: &[char], split_chars: &[char]) -> Vec<(usize, usize)> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (idx, ch) in chars.iter().enumerate() {
        if !split_chars.contains(ch) {
            continue;
        }
        if ch.is_whitespace() {
            if start < idx {
                tokens.push((start, idx));
            }
            tokens.push((idx, idx + 1));
        } else {
            tokens.push((start, idx + 1));
        }
        start = idx + 1;
    }
    if start < chars.len() {
        tokens.push((start, chars.len()));
    }
    tokens
}

/// Computes the word-wrap layout of one line.
pub fn wrap_line(
    line: usize,
    text: &str,
    measure: &dyn TextMeasure,
    tab_size: usize,
    max_width: f32,
    split_chars: &[char],
) -> LineSpan {
    if !max_width.is_finite() || max_width <= 0.0 || text.is_empty() {
        return LineSpan::unwrapped(line, text);
    }

    let chars: Vec<char> = text.chars().collect();
    let cumulative = measure.measure(text, tab_size);
    let width_to = |k: usize| if k == 0 { 0.0 } else { cumulative[k - 1] };
    if width_to(chars.len()) <= max_width {
        return LineSpan::unwrapped(line, text);
    }

    let mut wrap_points = Vec::new();
    let mut row_start = 0;
    for (tok_start, tok_end) in tokenize(&chars, split_chars) {
        if width_to(tok_end) - width_to(row_start) <= max_width {
            continue;
        }

        // Close the current row before the overflowing token
        if row_start < tok_start {
            wrap_points.push(WrapPoint {
                offset: tok_start,
                x: width_to(tok_start),
            });
            row_start = tok_start;
        }

        // Cut tokens that do not fit on a row of their own
        while width_to(tok_end) - width_to(row_start) > max_width {
            let cut = find_wrap_point(&cumulative, row_start, tok_end, max_width);
            if cut >= tok_end {
                break;
            }
            wrap_points.push(WrapPoint {
                offset: cut,
                x: width_to(cut),
            });
            row_start = cut;
        }
    }

    let mut substrings = Vec::with_capacity(wrap_points.len() + 1);
    let mut start = 0;
    for end in wrap_points.iter().map(|wp| wp.offset).chain(std::iter::once(chars.len())) {
        substrings.push(chars[start..end].iter().collect());
        start = end;
    }

    LineSpan {
        line,
        wrap_points,
        substrings,
        len: chars.len(),
    }
}

/// Per-line word-wrap cache.
#[derive(Debug, Clone)]
pub struct WordWrapEngine {
    /// Available row width in pixels; infinite disables wrapping
    max_width: f32,
    /// Tab width in cells
    tab_size: usize,
    /// Characters at which lines may break
    split_chars: Vec<char>,
    /// Cached spans, indexed by line
    spans: Vec<Option<LineSpan>>,
    /// First visual row of each line, plus the total row count at the end
    row_starts: Option<Vec<usize>>,
}

impl WordWrapEngine {
    /// Creates an engine with wrapping disabled.
    pub fn new(split_chars: Vec<char>, tab_size: usize) -> Self {
        Self {
            max_width: f32::INFINITY,
            tab_size,
            split_chars,
            spans: Vec::new(),
            row_starts: None,
        }
    }

    /// Returns the available row width.
    pub fn max_width(&self) -> f32 {
        self.max_width
    }

    /// Returns true if lines are being wrapped.
    pub fn is_wrapping(&self) -> bool {
        self.max_width.is_finite() && self.max_width > 0.0
    }

    /// Changes the available width; returns true if the cache was dropped.
    pub fn set_max_width(&mut self, max_width: f32) -> bool {
        if self.max_width == max_width {
            return false;
        }
        self.max_width = max_width;
        self.invalidate();
        true
    }

    /// Changes the tab width.
    pub fn set_tab_size(&mut self, tab_size: usize) {
        if self.tab_size != tab_size {
            self.tab_size = tab_size;
            self.invalidate();
        }
    }

    /// Drops every cached span.
    pub fn invalidate(&mut self) {
        if !self.spans.is_empty() {
            tracing::trace!(lines = self.spans.len(), "dropping word-wrap cache");
        }
        self.spans.clear();
        self.row_starts = None;
    }

    fn sync_len(&mut self, buffer: &TextBuffer) {
        let lines = buffer.len_lines();
        if self.spans.len() != lines {
            self.spans.clear();
            self.spans.resize_with(lines, || None);
            self.row_starts = None;
        }
    }

    /// Returns the span of a line, computing it on first use.
    pub fn span(&mut self, buffer: &TextBuffer, measure: &dyn TextMeasure, line: usize) -> &LineSpan {
        self.sync_len(buffer);
        let line = line.min(buffer.len_lines() - 1);
        let (max_width, tab_size, split_chars) = (self.max_width, self.tab_size, &self.split_chars);
        self.spans[line]
            .get_or_insert_with(|| wrap_line(line, &buffer.line(line), measure, tab_size, max_width, split_chars))
    }

    /// Returns the first-row table, rebuilding it if needed.
    fn row_starts(&mut self, buffer: &TextBuffer, measure: &dyn TextMeasure) -> &[usize] {
        self.sync_len(buffer);
        if self.row_starts.is_none() {
            let lines = buffer.len_lines();
            let mut starts = Vec::with_capacity(lines + 1);
            let mut row = 0;
            for line in 0..lines {
                starts.push(row);
                row += if self.is_wrapping() {
                    self.span(buffer, measure, line).row_count()
                } else {
                    1
                };
            }
            starts.push(row);
            self.row_starts = Some(starts);
        }
        self.row_starts.as_deref().unwrap_or(&[])
    }

    /// Returns the visual row on which a logical line starts.
    pub fn first_row_of_line(&mut self, buffer: &TextBuffer, measure: &dyn TextMeasure, line: usize) -> usize {
        let line = line.min(buffer.len_lines() - 1);
        self.row_starts(buffer, measure).get(line).copied().unwrap_or(0)
    }

    /// Returns the number of visual rows in the document.
    pub fn total_rows(&mut self, buffer: &TextBuffer, measure: &dyn TextMeasure) -> usize {
        self.row_starts(buffer, measure).last().copied().unwrap_or(1)
    }

    /// Maps a visual row to `(line, row within line)`, clamping past the end.
    pub fn line_at_row(&mut self, buffer: &TextBuffer, measure: &dyn TextMeasure, row: usize) -> (usize, usize) {
        let starts = self.row_starts(buffer, measure);
        let lines = starts.len().saturating_sub(1).max(1);
        let total = starts.last().copied().unwrap_or(1);
        let row = row.min(total.saturating_sub(1));
        let line = starts[..lines].partition_point(|&start| start <= row).saturating_sub(1);
        (line, row - starts[line])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MonospaceMeasure;

    const SPLIT: [char; 3] = [' ', '-', '\t'];

    fn wrap(text: &str, width: f32) -> LineSpan {
        wrap_line(0, text, &MonospaceMeasure::cells(), 4, width, &SPLIT)
    }

    #[test]
    fn test_tokenize_keeps_spaces_and_fuses_hyphens() {
        let chars: Vec<char> = "ab cd-ef".chars().collect();
        assert_eq!(tokenize(&chars, &SPLIT), vec![(0, 2), (2, 3), (3, 6), (6, 8)]);
    }

    #[test]
    fn test_line_that_fits_is_not_wrapped() {
        let span = wrap("hello", 10.0);
        assert_eq!(span.wrap_point_count(), 0);
        assert_eq!(span.substrings, vec!["hello"]);
    }

    #[test]
    fn test_wraps_at_word_boundary() {
        let span = wrap("hello big world", 10.0);
        // The space still fits, so it ends the first row
        assert_eq!(span.substrings, vec!["hello big ", "world"]);
        assert_eq!(span.wrap_points, vec![WrapPoint { offset: 10, x: 10.0 }]);
    }

    #[test]
    fn test_wraps_after_hyphen() {
        let span = wrap("well-known fact", 8.0);
        assert_eq!(span.substrings, vec!["well-", "known ", "fact"]);
    }

    #[test]
    fn test_long_word_is_cut() {
        let span = wrap("abcdefghij xy", 4.0);
        assert_eq!(span.substrings, vec!["abcd", "efgh", "ij ", "xy"]);
    }

    #[test]
    fn test_char_wider_than_row() {
        // Each CJK glyph is two cells wide, the row only one
        let span = wrap("日本", 1.0);
        assert_eq!(span.substrings, vec!["日", "本"]);
    }

    #[test]
    fn test_find_wrap_point() {
        let cumulative = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(find_wrap_point(&cumulative, 0, 5, 3.0), 3);
        assert_eq!(find_wrap_point(&cumulative, 2, 5, 2.5), 4);
        assert_eq!(find_wrap_point(&cumulative, 0, 5, 0.5), 1);
    }

    #[test]
    fn test_find_wrap_line() {
        let span = wrap("hello big world", 10.0);
        assert_eq!(span.find_wrap_line(0), (0, 0));
        assert_eq!(span.find_wrap_line(9), (0, 9));
        assert_eq!(span.find_wrap_line(10), (1, 0));
        assert_eq!(span.find_wrap_line(15), (1, 5));
        assert_eq!(span.row_range(1), (10, 15));
        assert_eq!(span.row_start_x(1), 10.0);
    }

    #[test]
    fn test_engine_row_mapping() {
        let buffer = TextBuffer::from("short\nhello big world\nend");
        let measure = MonospaceMeasure::cells();
        let mut engine = WordWrapEngine::new(SPLIT.to_vec(), 4);

        assert_eq!(engine.total_rows(&buffer, &measure), 3);

        engine.set_max_width(10.0);
        assert_eq!(engine.total_rows(&buffer, &measure), 4);
        assert_eq!(engine.first_row_of_line(&buffer, &measure, 2), 3);
        assert_eq!(engine.line_at_row(&buffer, &measure, 2), (1, 1));
        assert_eq!(engine.line_at_row(&buffer, &measure, 3), (2, 0));
        assert_eq!(engine.line_at_row(&buffer, &measure, 99), (2, 0));
    }

    #[test]
    fn test_engine_invalidates_on_width_change() {
        let buffer = TextBuffer::from("hello big world");
        let measure = MonospaceMeasure::cells();
        let mut engine = WordWrapEngine::new(SPLIT.to_vec(), 4);

        engine.set_max_width(10.0);
        assert_eq!(engine.span(&buffer, &measure, 0).row_count(), 2);
        assert!(!engine.set_max_width(10.0));
        assert!(engine.set_max_width(6.0));
        assert_eq!(engine.span(&buffer, &measure, 0).row_count(), 3);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn substrings_reassemble_the_line(text in "[a-z -]{0,60}", width in 1u32..30) {
                let span = wrap(&text, width as f32);
                prop_assert_eq!(span.substrings.concat(), text);
                prop_assert_eq!(span.substrings.len(), span.row_count());
            }

            #[test]
            fn rows_fit_the_width(text in "[a-z -]{0,60}", width in 1u32..30) {
                let measure = MonospaceMeasure::cells();
                let span = wrap(&text, width as f32);
                for row in &span.substrings {
                    let row_width = measure.text_width(row, 4);
                    prop_assert!(row_width <= width as f32 || row.chars().count() == 1);
                }
            }
        }
    }
}
