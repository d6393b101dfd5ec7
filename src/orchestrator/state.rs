//! Loop states, inputs, and effects

use super::event::{ErrorCode, StreamEvent};
use crate::llm::{LlmError, LlmMessage, LlmResponse};

/// State of one edit loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting on model call number `iteration` (1-based)
    AwaitingModel { iteration: u32 },

    /// The model replied without requesting a tool
    Completed,

    Failed { reason: FailureReason },

    /// Stopped by the caller; nothing is reported to the client
    Cancelled,
}

impl LoopState {
    pub fn initial() -> Self {
        LoopState::AwaitingModel { iteration: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Model call failed or returned a non-success status
    Upstream { message: String },
    /// `stop_reason` was `tool_use` but the reply held no tool call
    MissingToolPayload,
    /// The model still wanted tools after the last permitted call
    IterationLimit { ceiling: u32 },
}

impl FailureReason {
    pub fn code(&self) -> ErrorCode {
        match self {
            FailureReason::Upstream { .. } => ErrorCode::UpstreamError,
            FailureReason::MissingToolPayload => ErrorCode::ProtocolError,
            FailureReason::IterationLimit { .. } => ErrorCode::IterationLimit,
        }
    }

    pub fn message(&self) -> String {
        match self {
            FailureReason::Upstream { message } => format!("Model request failed: {message}"),
            FailureReason::MissingToolPayload => {
                "Model signalled a tool call but sent no tool payload".to_string()
            }
            FailureReason::IterationLimit { ceiling } => {
                format!("Stopped after {ceiling} model calls without a final reply")
            }
        }
    }

    /// The `error` event reporting this failure
    pub fn to_event(&self) -> StreamEvent {
        StreamEvent::Error {
            message: self.message(),
            code: self.code(),
        }
    }
}

/// Input to the loop
#[derive(Debug, Clone)]
pub enum Event {
    ModelReplied(LlmResponse),
    ModelFailed(LlmError),
    Cancelled,
}

/// Work the driver performs after a transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send an event to the client
    Emit(StreamEvent),
    /// Append a message to the transcript
    Append(LlmMessage),
}

/// Static limits of one loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    pub max_iterations: u32,
}
