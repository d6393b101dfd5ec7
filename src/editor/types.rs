//! Types for the text editor tool

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Maximum number of characters of `old_str` echoed back in a `no_match` error
pub const MATCH_PREVIEW_CHARS: usize = 100;

/// A single edit command issued by the model
///
/// Discriminated by the `command` field. Fields belonging to other
/// commands are ignored during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditCommand {
    View {
        #[serde(default)]
        view_range: Option<Vec<i64>>,
    },
    StrReplace {
        old_str: String,
        #[serde(default)]
        new_str: String,
    },
    Insert {
        insert_line: i64,
        new_str: String,
    },
    DeleteRange {
        start_line: i64,
        end_line: i64,
    },
}

impl EditCommand {
    /// Parse a tool input object into a command
    pub fn from_input(input: &Value) -> Result<Self, EditError> {
        Self::deserialize(input).map_err(|e| EditError::InvalidInput {
            detail: e.to_string(),
        })
    }

    /// Wire name of the command
    pub fn kind(&self) -> &'static str {
        match self {
            EditCommand::View { .. } => "view",
            EditCommand::StrReplace { .. } => "str_replace",
            EditCommand::Insert { .. } => "insert",
            EditCommand::DeleteRange { .. } => "delete_range",
        }
    }
}

/// Validation failure of an edit command
///
/// Serialized with a `code` tag so the model receives structured detail
/// it can use to correct the next attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum EditError {
    #[error("Invalid input: {detail}")]
    InvalidInput { detail: String },

    #[error("No match found for old_str: {preview:?}")]
    NoMatch { preview: String },

    #[error("old_str matches {count} locations; include more surrounding context so it matches exactly once")]
    AmbiguousMatch { count: usize },

    #[error("{}", range_message(field, *attempted, *min, *max))]
    RangeError {
        field: String,
        attempted: i64,
        min: i64,
        max: i64,
    },
}

impl EditError {
    pub fn no_match(old_str: &str) -> Self {
        EditError::NoMatch {
            preview: old_str.chars().take(MATCH_PREVIEW_CHARS).collect(),
        }
    }

    pub fn range(field: impl Into<String>, attempted: i64, min: i64, max: i64) -> Self {
        EditError::RangeError {
            field: field.into(),
            attempted,
            min,
            max,
        }
    }
}

fn range_message(field: &str, attempted: i64, min: i64, max: i64) -> String {
    if max < min {
        format!("{field} {attempted} is out of range: the document has no lines")
    } else {
        format!("{field} {attempted} is out of range: must be between {min} and {max}")
    }
}

/// Location of an applied edit, in character offsets
///
/// `[start, end)` is the inserted text in the new content; `removed` is
/// the text that was taken out of the old content at `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditSpan {
    pub start: usize,
    pub end: usize,
    pub removed: String,
}

/// Outcome of executing one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EditError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_lines: Option<usize>,
    /// Span metadata for the client; never sent upstream
    #[serde(skip)]
    pub edit: Option<EditSpan>,
}

impl ExecutionResult {
    pub fn edited(content: String, message: impl Into<String>, edit: EditSpan) -> Self {
        Self {
            success: true,
            content: Some(content),
            message: Some(message.into()),
            error: None,
            line_count: None,
            total_lines: None,
            edit: Some(edit),
        }
    }

    pub fn viewed(slice: String, line_count: usize, total_lines: usize) -> Self {
        Self {
            success: true,
            content: Some(slice),
            message: None,
            error: None,
            line_count: Some(line_count),
            total_lines: Some(total_lines),
            edit: None,
        }
    }

    pub fn failed(error: EditError) -> Self {
        Self {
            success: false,
            content: None,
            message: Some(error.to_string()),
            error: Some(error),
            line_count: None,
            total_lines: None,
            edit: None,
        }
    }

    /// Whether the command changed the buffer
    pub fn is_mutation(&self) -> bool {
        self.success && self.edit.is_some()
    }

    /// JSON rendering sent back to the model as the tool result
    pub fn to_tool_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"message":"failed to serialize result: {e}"}}"#)
        })
    }
}
