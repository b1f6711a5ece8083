//! Pattern search over a buffer.
//!
//! Matching is literal and per line: a pattern never spans a line break.
//! Occurrences on a line do not overlap; after a match the scan resumes at
//! its end. Every query rescans the buffer, which keeps results exact after
//! arbitrary edits without maintaining an index.

use std::ops::Range;

use quill_buffer::{Direction, TextBuffer, TextPosition, TextRange, word};
use serde::{Deserialize, Serialize};

/// Options controlling how a pattern matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Match letter case exactly
    pub case_sensitive: bool,
    /// Only match occurrences not embedded in a longer word
    pub whole_words: bool,
    /// Restrict matches to the search scope
    pub selection_only: bool,
}

/// How [`find_next_pattern`] moves relative to the match at the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchStep {
    /// Previous match
    Backward,
    /// The match at the caret, or the next one
    Stay,
    /// Next match
    Forward,
}

impl From<Direction> for SearchStep {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => Self::Forward,
            Direction::Backward => Self::Backward,
        }
    }
}

/// A match located by a navigation query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    /// The matched span
    pub range: TextRange,
    /// True if the search went past a document end to find it
    pub wrapped: bool,
}

fn fold(ch: char, case_sensitive: bool) -> char {
    if case_sensitive {
        ch
    } else {
        ch.to_lowercase().next().unwrap_or(ch)
    }
}

/// Returns true if the characters around `start..end` are not word
/// characters. Line edges count as boundaries.
pub fn is_whole_word(chars: &[char], start: usize, end: usize) -> bool {
    let before = start.checked_sub(1).and_then(|idx| chars.get(idx));
    let after = chars.get(end);
    !before.is_some_and(|&ch| word::is_word_char(ch)) && !after.is_some_and(|&ch| word::is_word_char(ch))
}

/// Finds the non-overlapping occurrences of `pattern` in one line.
pub fn find_in_line(chars: &[char], pattern: &[char], options: &SearchOptions) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    if pattern.is_empty() || pattern.len() > chars.len() {
        return found;
    }

    let needle: Vec<char> = pattern.iter().map(|&ch| fold(ch, options.case_sensitive)).collect();
    let mut idx = 0;
    while idx + needle.len() <= chars.len() {
        let end = idx + needle.len();
        let hit = chars[idx..end]
            .iter()
            .zip(&needle)
            .all(|(&ch, &want)| fold(ch, options.case_sensitive) == want);
        if hit && (!options.whole_words || is_whole_word(chars, idx, end)) {
            found.push((idx, end));
            idx = end;
        } else {
            idx += 1;
        }
    }
    found
}

/// Finds all occurrences of `pattern` on the given lines.
pub fn find_in_lines(
    buffer: &TextBuffer,
    pattern: &str,
    options: &SearchOptions,
    lines: Range<usize>,
) -> Vec<TextRange> {
    if pattern.is_empty() || pattern.contains('\n') {
        return Vec::new();
    }

    let pattern: Vec<char> = pattern.chars().collect();
    let end = lines.end.min(buffer.len_lines());
    (lines.start..end)
        .flat_map(|line| {
            let chars = buffer.line_chars(line);
            find_in_line(&chars, &pattern, options)
                .into_iter()
                .map(move |(start, end)| TextRange::on_line(line, start, end))
        })
        .collect()
}

/// Finds every occurrence of `pattern` in the buffer, in document order.
///
/// With `selection_only` set and a scope given, only matches lying fully
/// inside the scope are returned.
pub fn find_all(
    buffer: &TextBuffer,
    pattern: &str,
    options: &SearchOptions,
    scope: Option<TextRange>,
) -> Vec<TextRange> {
    match scope.filter(|_| options.selection_only) {
        Some(scope) => find_in_lines(buffer, pattern, options, scope.start.line..scope.end.line + 1)
            .into_iter()
            .filter(|range| scope.encloses(range))
            .collect(),
        None => find_in_lines(buffer, pattern, options, 0..buffer.len_lines()),
    }
}

/// Locates the match to land on from `pos`.
///
/// If `pos` lies inside or at the end of a match, the step is taken
/// relative to that match: `Stay` returns it, `Forward` and `Backward`
/// move to its neighbour, wrapping around the list. Otherwise the nearest
/// match after `pos` (before it, for `Backward`) is returned, wrapping to
/// the other end of the document when there is none.
pub fn find_next_pattern(
    buffer: &TextBuffer,
    pos: TextPosition,
    pattern: &str,
    options: &SearchOptions,
    scope: Option<TextRange>,
    step: SearchStep,
) -> Option<SearchHit> {
    let matches = find_all(buffer, pattern, options, scope);
    let last = matches.len().checked_sub(1)?;
    let hit = |idx: usize, wrapped: bool| {
        Some(SearchHit {
            range: matches[idx],
            wrapped,
        })
    };

    if let Some(current) = matches.iter().position(|m| m.start <= pos && pos <= m.end) {
        return match step {
            SearchStep::Stay => hit(current, false),
            SearchStep::Forward if current == last => hit(0, true),
            SearchStep::Forward => hit(current + 1, false),
            SearchStep::Backward if current == 0 => hit(last, true),
            SearchStep::Backward => hit(current - 1, false),
        };
    }

    match step {
        SearchStep::Forward | SearchStep::Stay => match matches.iter().position(|m| m.start >= pos) {
            Some(idx) => hit(idx, false),
            None => hit(0, true),
        },
        SearchStep::Backward => match matches.iter().rposition(|m| m.end <= pos) {
            Some(idx) => hit(idx, false),
            None => hit(last, true),
        },
    }
}

/// Returns the first match starting at or after `pos`, without treating a
/// match that ends at `pos` as current. Wraps to the first match.
pub fn find_from(
    buffer: &TextBuffer,
    pos: TextPosition,
    pattern: &str,
    options: &SearchOptions,
    scope: Option<TextRange>,
) -> Option<SearchHit> {
    let matches = find_all(buffer, pattern, options, scope);
    match matches.iter().find(|m| m.start >= pos) {
        Some(&range) => Some(SearchHit { range, wrapped: false }),
        None => matches.first().map(|&range| SearchHit { range, wrapped: true }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> SearchOptions {
        SearchOptions::default()
    }

    fn pos(line: usize, col: usize) -> TextPosition {
        TextPosition::new(line, col)
    }

    #[test]
    fn test_find_all_non_overlapping() {
        let buffer = TextBuffer::from("abcabc");
        assert_eq!(
            find_all(&buffer, "abc", &plain(), None),
            vec![TextRange::on_line(0, 0, 3), TextRange::on_line(0, 3, 6)]
        );

        let buffer = TextBuffer::from("aaaa");
        assert_eq!(find_all(&buffer, "aa", &plain(), None).len(), 2);
    }

    #[test]
    fn test_whole_words() {
        let buffer = TextBuffer::from("cat catalog");
        let options = SearchOptions {
            whole_words: true,
            ..plain()
        };
        assert_eq!(find_all(&buffer, "cat", &options, None), vec![TextRange::on_line(0, 0, 3)]);
        assert_eq!(find_all(&buffer, "cat", &plain(), None).len(), 2);
    }

    #[test]
    fn test_case_folding() {
        let buffer = TextBuffer::from("Rust rust RUST");
        assert_eq!(find_all(&buffer, "rust", &plain(), None).len(), 3);

        let options = SearchOptions {
            case_sensitive: true,
            ..plain()
        };
        assert_eq!(find_all(&buffer, "rust", &options, None), vec![TextRange::on_line(0, 5, 9)]);
    }

    #[test]
    fn test_pattern_never_spans_lines() {
        let buffer = TextBuffer::from("ab\ncd");
        assert!(find_all(&buffer, "b\nc", &plain(), None).is_empty());
        assert!(find_all(&buffer, "", &plain(), None).is_empty());
    }

    #[test]
    fn test_selection_scope() {
        let buffer = TextBuffer::from("x x\nx x\nx x");
        let scope = TextRange::new(pos(0, 2), pos(1, 1));
        let options = SearchOptions {
            selection_only: true,
            ..plain()
        };
        assert_eq!(
            find_all(&buffer, "x", &options, Some(scope)),
            vec![TextRange::on_line(0, 2, 3), TextRange::on_line(1, 0, 1)]
        );

        // The scope is ignored unless selection_only is set
        assert_eq!(find_all(&buffer, "x", &plain(), Some(scope)).len(), 6);
    }

    #[test]
    fn test_find_next_wraps_forward() {
        // Matches at 2, 8 and 15
        let buffer = TextBuffer::from("..ab....ab.....ab");
        let hit = find_next_pattern(&buffer, pos(0, 15), "ab", &plain(), None, SearchStep::Forward).unwrap();
        assert_eq!(hit.range.start, pos(0, 2));
        assert!(hit.wrapped);
    }

    #[test]
    fn test_find_next_steps_from_current_match() {
        let buffer = TextBuffer::from("..ab....ab.....ab");
        let from_end = find_next_pattern(&buffer, pos(0, 4), "ab", &plain(), None, SearchStep::Forward).unwrap();
        assert_eq!(from_end.range, TextRange::on_line(0, 8, 10));

        let stay = find_next_pattern(&buffer, pos(0, 9), "ab", &plain(), None, SearchStep::Stay).unwrap();
        assert_eq!(stay.range, TextRange::on_line(0, 8, 10));

        let back = find_next_pattern(&buffer, pos(0, 2), "ab", &plain(), None, SearchStep::Backward).unwrap();
        assert_eq!(back.range, TextRange::on_line(0, 15, 17));
        assert!(back.wrapped);
    }

    #[test]
    fn test_find_next_between_matches() {
        let buffer = TextBuffer::from("ab\n\nab\nab");
        let forward = find_next_pattern(&buffer, pos(1, 0), "ab", &plain(), None, SearchStep::Forward).unwrap();
        assert_eq!(forward.range, TextRange::on_line(2, 0, 2));

        let backward = find_next_pattern(&buffer, pos(1, 0), "ab", &plain(), None, SearchStep::Backward).unwrap();
        assert_eq!(backward.range, TextRange::on_line(0, 0, 2));

        assert!(find_next_pattern(&buffer, pos(0, 0), "zz", &plain(), None, SearchStep::Forward).is_none());
    }

    #[test]
    fn test_find_from_ignores_match_ending_at_pos() {
        let buffer = TextBuffer::from("aXa");
        let hit = find_from(&buffer, pos(0, 1), "a", &plain(), None).unwrap();
        assert_eq!(hit.range, TextRange::on_line(0, 2, 3));

        let wrapped = find_from(&buffer, pos(0, 3), "a", &plain(), None).unwrap();
        assert!(wrapped.wrapped);
    }
}
