//! Progress events streamed to the client

use crate::editor::EditSpan;
use serde::Serialize;

/// Terminal sentinel written after the last event
pub const DONE_SENTINEL: &str = "[DONE]";

/// Error codes carried by the `error` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    UpstreamError,
    ProtocolError,
    IterationLimit,
}

/// One progress event, consumed by the client strictly in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The model asked for a tool
    #[serde(rename = "tool_use")]
    ToolInvoked {
        tool: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },

    /// The buffer changed; carries the full new content
    #[serde(rename = "content_update")]
    ContentUpdated { content: String, edit: EditSpan },

    #[serde(rename = "tool_result")]
    ToolOutcome { success: bool, message: String },

    /// One text segment of the model's final reply
    #[serde(rename = "text")]
    FinalText { text: String },

    Error { message: String, code: ErrorCode },

    /// End of stream; never sent through the event channel
    #[serde(skip)]
    Done,
}

impl StreamEvent {
    /// Payload for the SSE `data:` field
    pub fn to_data(&self) -> String {
        if matches!(self, StreamEvent::Done) {
            return DONE_SENTINEL.to_string();
        }
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize stream event");
            format!(r#"{{"type":"error","message":"failed to serialize event: {e}","code":"protocol_error"}}"#)
        })
    }
}
