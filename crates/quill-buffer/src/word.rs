//! Character classification and word boundaries within a single line.
//!
//! A **word** is a run of word characters (letters, digits, underscore).
//! Any other non-blank character is punctuation, and punctuation runs are
//! traversed as a unit by word motions. These helpers operate on a line's
//! code points; crossing line boundaries is left to [`TextBuffer`].
//!
//! [`TextBuffer`]: crate::TextBuffer

/// Character class for word boundary detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Letters, digits, underscore.
    Word,
    /// Non-blank, non-word characters.
    Punctuation,
    /// Spaces, tabs and other whitespace.
    Blank,
}

/// Returns true for characters that belong to words.
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Classifies a character for word motions.
pub fn classify(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Blank
    } else if is_word_char(ch) {
        CharClass::Word
    } else {
        CharClass::Punctuation
    }
}

/// Returns true when `chars[idx]` starts a new camel-case hump,
/// i.e. a lowercase letter is immediately followed by an uppercase one.
fn is_camel_hump(chars: &[char], idx: usize) -> bool {
    idx > 0 && chars[idx - 1].is_lowercase() && chars[idx].is_uppercase()
}

/// Returns the `[start, end)` offsets of the word run containing or
/// touching `pos`, or `(pos, pos)` when no word character is adjacent.
pub fn word_bounds_in(chars: &[char], pos: usize) -> (usize, usize) {
    let pos = pos.min(chars.len());
    let touches_right = pos < chars.len() && is_word_char(chars[pos]);
    let touches_left = pos > 0 && is_word_char(chars[pos - 1]);
    if !touches_right && !touches_left {
        return (pos, pos);
    }

    let mut start = pos;
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    let mut end = pos;
    while end < chars.len() && is_word_char(chars[end]) {
        end += 1;
    }
    (start, end)
}

/// Moves forward from `pos` to the start of the next word on the line.
///
/// Skips the run the caret is in, then any blanks after it. With
/// `camel_case` the run also ends at a lowercase-to-uppercase transition.
pub fn next_word_start(chars: &[char], pos: usize, camel_case: bool) -> usize {
    let len = chars.len();
    let mut idx = pos.min(len);

    if idx < len && classify(chars[idx]) != CharClass::Blank {
        let class = classify(chars[idx]);
        idx += 1;
        while idx < len && classify(chars[idx]) == class {
            if camel_case && class == CharClass::Word && is_camel_hump(chars, idx) {
                return idx;
            }
            idx += 1;
        }
    }
    while idx < len && classify(chars[idx]) == CharClass::Blank {
        idx += 1;
    }
    idx
}

/// Moves backward from `pos` to the start of the previous word on the line.
pub fn prev_word_start(chars: &[char], pos: usize, camel_case: bool) -> usize {
    let mut idx = pos.min(chars.len());

    while idx > 0 && classify(chars[idx - 1]) == CharClass::Blank {
        idx -= 1;
    }
    if idx == 0 {
        return 0;
    }

    let class = classify(chars[idx - 1]);
    while idx > 0 && classify(chars[idx - 1]) == class {
        idx -= 1;
        if camel_case && class == CharClass::Word && is_camel_hump(chars, idx) {
            break;
        }
    }
    idx
}
