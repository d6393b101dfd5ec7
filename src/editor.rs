//! Text editor tool - surgical edits to an in-memory document
//!
//! The core is a pure executor so it can be property-tested:
//!
//! 1. `types` - commands, results, and structured validation errors
//! 2. `matching` - literal substring counting for `str_replace`
//! 3. `executor` - applies one command to a buffer, returning a new value
//! 4. `tool` - the declaration sent to the model and input parsing
//!
//! # Example
//!
//! ```ignore
//! let result = executor::execute(&EditCommand::Insert { insert_line: 0, new_str: "id,name".into() }, "");
//! assert_eq!(result.content.as_deref(), Some("id,name"));
//! ```

pub mod executor;
pub mod matching;
pub mod tool;
pub mod types;

#[cfg(test)]
mod proptests;

pub use tool::{TextEditorTool, TOOL_NAME};
pub use types::*;
