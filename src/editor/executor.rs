//! Pure command execution against a text buffer
//!
//! Every function here takes the current content by reference and returns
//! a fresh value. Validation failures are returned inside the
//! `ExecutionResult` rather than as `Err`, because they are fed back to the
//! model as tool output.

use super::matching::{char_offset, count_occurrences, line_of};
use super::types::{EditCommand, EditError, EditSpan, ExecutionResult};

/// Execute a command against `content`
pub fn execute(command: &EditCommand, content: &str) -> ExecutionResult {
    let outcome = match command {
        EditCommand::View { view_range } => view(content, view_range.as_deref()),
        EditCommand::StrReplace { old_str, new_str } => replace(content, old_str, new_str),
        EditCommand::Insert {
            insert_line,
            new_str,
        } => insert(content, *insert_line, new_str),
        EditCommand::DeleteRange {
            start_line,
            end_line,
        } => delete_range(content, *start_line, *end_line),
    };
    outcome.unwrap_or_else(ExecutionResult::failed)
}

/// Line index over a buffer
///
/// Lines are the `'\n'`-separated pieces of the text. An empty buffer has
/// no lines; a trailing newline produces a final empty line.
struct Lines<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        let starts = if text.is_empty() {
            Vec::new()
        } else {
            std::iter::once(0)
                .chain(text.match_indices('\n').map(|(i, _)| i + 1))
                .collect()
        };
        Self { text, starts }
    }

    fn total(&self) -> usize {
        self.starts.len()
    }

    /// Byte offset where 1-indexed `line` begins
    fn start(&self, line: usize) -> usize {
        self.starts[line - 1]
    }

    /// Byte offset where 1-indexed `line` ends, excluding its newline
    fn end(&self, line: usize) -> usize {
        if line < self.total() {
            self.starts[line] - 1
        } else {
            self.text.len()
        }
    }
}

fn as_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn view(content: &str, range: Option<&[i64]>) -> Result<ExecutionResult, EditError> {
    let lines = Lines::new(content);
    let total = lines.total();

    let Some(range) = range else {
        return Ok(ExecutionResult::viewed(content.to_string(), total, total));
    };
    let [start, end] = range else {
        return Err(EditError::InvalidInput {
            detail: format!(
                "view_range must contain exactly two integers, got {}",
                range.len()
            ),
        });
    };

    // Clamp to the available lines; -1 means "through the last line"
    let start = (*start).max(1);
    let end = if *end == -1 {
        as_i64(total)
    } else {
        (*end).min(as_i64(total))
    };
    if start > end {
        return Ok(ExecutionResult::viewed(String::new(), 0, total));
    }

    let (Ok(start), Ok(end)) = (usize::try_from(start), usize::try_from(end)) else {
        return Ok(ExecutionResult::viewed(String::new(), 0, total));
    };
    let slice = content
        .get(lines.start(start)..lines.end(end))
        .unwrap_or_default()
        .to_string();
    Ok(ExecutionResult::viewed(slice, end - start + 1, total))
}

fn replace(content: &str, old_str: &str, new_str: &str) -> Result<ExecutionResult, EditError> {
    if old_str.is_empty() {
        return Err(EditError::InvalidInput {
            detail: "old_str must not be empty".to_string(),
        });
    }

    let found = count_occurrences(content, old_str);
    if found.count > 1 {
        return Err(EditError::AmbiguousMatch { count: found.count });
    }
    let Some(at) = found.first else {
        return Err(EditError::no_match(old_str));
    };

    let (before, after) = content.split_at(at);
    let after = after.strip_prefix(old_str).unwrap_or(after);
    let updated = format!("{before}{new_str}{after}");

    let start = char_offset(content, at);
    let span = EditSpan {
        start,
        end: start + new_str.chars().count(),
        removed: old_str.to_string(),
    };
    let message = format!("Replaced text at line {}", line_of(content, at));
    Ok(ExecutionResult::edited(updated, message, span))
}

fn insert(content: &str, insert_line: i64, text: &str) -> Result<ExecutionResult, EditError> {
    let lines = Lines::new(content);
    let total = lines.total();

    let Some(after_line) = usize::try_from(insert_line).ok().filter(|n| *n <= total) else {
        return Err(EditError::range("insert_line", insert_line, 0, as_i64(total)));
    };

    let (at, inserted) = if total == 0 {
        (0, text.to_string())
    } else if after_line == 0 {
        (0, format!("{text}\n"))
    } else {
        (lines.end(after_line), format!("\n{text}"))
    };

    let (before, after) = content.split_at(at);
    let updated = format!("{before}{inserted}{after}");

    let start = char_offset(content, at);
    let span = EditSpan {
        start,
        end: start + inserted.chars().count(),
        removed: String::new(),
    };
    let message = if after_line == 0 {
        "Inserted text at the top of the document".to_string()
    } else {
        format!("Inserted text after line {after_line}")
    };
    Ok(ExecutionResult::edited(updated, message, span))
}

fn delete_range(
    content: &str,
    start_line: i64,
    end_line: i64,
) -> Result<ExecutionResult, EditError> {
    let lines = Lines::new(content);
    let total = lines.total();
    let max = as_i64(total);

    if start_line < 1 || start_line > max {
        return Err(EditError::range("start_line", start_line, 1, max));
    }
    if end_line < start_line || end_line > max {
        return Err(EditError::range("end_line", end_line, start_line, max));
    }
    let (Ok(first), Ok(last)) = (usize::try_from(start_line), usize::try_from(end_line)) else {
        return Err(EditError::range("start_line", start_line, 1, max));
    };

    // Take one adjoining newline with the removed lines so the remaining
    // lines join exactly as if the range had been spliced out.
    let (from, to) = if last < total {
        (lines.start(first), lines.start(last + 1))
    } else if first > 1 {
        (lines.end(first - 1), content.len())
    } else {
        (0, content.len())
    };

    let (head, tail) = content.split_at(to);
    let (kept, removed) = head.split_at(from);
    let updated = format!("{kept}{tail}");

    let deleted = last - first + 1;
    let start = char_offset(content, from);
    let span = EditSpan {
        start,
        end: start,
        removed: removed.to_string(),
    };
    let message = format!("Deleted {} ({first}-{last})", plural(deleted, "line"));
    Ok(ExecutionResult::edited(updated, message, span))
}
