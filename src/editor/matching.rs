//! Literal text matching for `str_replace`
//!
//! The search fragment is never compiled into a pattern. Occurrences are
//! counted by plain, non-overlapping substring search.

/// Result of searching for a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCount {
    /// Number of non-overlapping occurrences
    pub count: usize,
    /// Byte offset of the first occurrence
    pub first: Option<usize>,
}

/// Count literal occurrences of `needle` in `haystack`
pub fn count_occurrences(haystack: &str, needle: &str) -> MatchCount {
    if needle.is_empty() {
        return MatchCount { count: 0, first: None };
    }
    let mut matches = haystack.match_indices(needle).map(|(at, _)| at);
    let first = matches.next();
    MatchCount {
        count: first.map_or(0, |_| 1 + matches.count()),
        first,
    }
}

/// Number of characters before byte offset `byte_offset`
pub fn char_offset(text: &str, byte_offset: usize) -> usize {
    text.char_indices()
        .take_while(|(i, _)| *i < byte_offset)
        .count()
}

/// 1-indexed line number containing byte offset `byte_offset`
pub fn line_of(text: &str, byte_offset: usize) -> usize {
    text.bytes().take(byte_offset).filter(|b| *b == b'\n').count() + 1
}
