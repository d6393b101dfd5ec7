//! Tool declaration sent upstream
//!
//! The schema is part of the wire contract with the model and must not
//! drift: field names and the command enum are what the model emits.

use super::executor::execute;
use super::types::{EditCommand, EditError, ExecutionResult};
use crate::llm::ToolDefinition;
use serde_json::{json, Value};

/// Name of the single tool exposed to the model
pub const TOOL_NAME: &str = "text_editor";

/// Text editor tool operating on an in-memory document
pub struct TextEditorTool;

impl TextEditorTool {
    pub fn name(&self) -> &'static str {
        TOOL_NAME
    }

    pub fn description(&self) -> String {
        r"Edit the document currently open in the editor.

Commands:
- view: Show the document with line numbers counted from 1. Pass view_range [start, end] to see part of it; end may be -1 for the last line.
- str_replace: Replace old_str with new_str. old_str must match the document EXACTLY (whitespace included) and appear EXACTLY ONCE. An empty new_str deletes the text.
- insert: Insert new_str as a new line after line insert_line. Use 0 to insert at the top.
- delete_range: Delete lines start_line through end_line, inclusive.

Usage notes:
- Prefer several small, targeted edits over rewriting large parts of the document
- If an edit fails, the result explains why (no match, multiple matches, or line out of range); correct the arguments and try again
- Line numbers change after insert and delete_range; view the document again if unsure".to_string()
    }

    pub fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["command"],
            "properties": {
                "command": {
                    "type": "string",
                    "enum": ["view", "str_replace", "insert", "delete_range"],
                    "description": "The edit command to run"
                },
                "view_range": {
                    "type": "array",
                    "items": { "type": "integer" },
                    "description": "Optional [start, end] line range for view"
                },
                "old_str": {
                    "type": "string",
                    "description": "Text to replace; must appear exactly once (str_replace)"
                },
                "new_str": {
                    "type": "string",
                    "description": "Replacement text (str_replace) or text to insert (insert)"
                },
                "insert_line": {
                    "type": "integer",
                    "description": "Line after which to insert; 0 inserts at the top (insert)"
                },
                "start_line": {
                    "type": "integer",
                    "description": "First line to delete (delete_range)"
                },
                "end_line": {
                    "type": "integer",
                    "description": "Last line to delete, inclusive (delete_range)"
                }
            }
        })
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }

    /// Parse the raw tool input and execute it against `content`
    ///
    /// Returns the command kind (if the input parsed) with the result.
    pub fn run(&self, input: &Value, content: &str) -> (Option<&'static str>, ExecutionResult) {
        match EditCommand::from_input(input) {
            Ok(command) => (Some(command.kind()), execute(&command, content)),
            Err(e) => (None, ExecutionResult::failed(e)),
        }
    }

    /// Result for a tool name the model invented
    pub fn unknown_tool(name: &str) -> ExecutionResult {
        ExecutionResult::failed(EditError::InvalidInput {
            detail: format!("unknown tool '{name}'; the only available tool is '{TOOL_NAME}'"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_wire_contract() {
        let schema = TextEditorTool.input_schema();
        assert_eq!(schema["required"], json!(["command"]));
        assert_eq!(
            schema["properties"]["command"]["enum"],
            json!(["view", "str_replace", "insert", "delete_range"])
        );

        let mut fields: Vec<&str> = schema["properties"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        fields.sort_unstable();
        assert_eq!(
            fields,
            vec!["command", "end_line", "insert_line", "new_str", "old_str", "start_line", "view_range"]
        );
        assert_eq!(schema["properties"]["view_range"]["items"]["type"], json!("integer"));
    }

    #[test]
    fn test_definition_name() {
        let def = TextEditorTool.definition();
        assert_eq!(def.name, "text_editor");
        assert!(def.description.contains("str_replace"));
    }

    #[test]
    fn test_run_parses_and_executes() {
        let (kind, result) = TextEditorTool.run(
            &json!({"command": "str_replace", "old_str": "b", "new_str": "B"}),
            "a,b,c",
        );
        assert_eq!(kind, Some("str_replace"));
        assert_eq!(result.content.as_deref(), Some("a,B,c"));
    }

    #[test]
    fn test_run_with_bad_input() {
        let (kind, result) = TextEditorTool.run(&json!({"command": "delete_range"}), "a");
        assert_eq!(kind, None);
        assert!(!result.success);
        assert!(result.message.unwrap().starts_with("Invalid input"));
    }
}
