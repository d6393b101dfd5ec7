//! Tool-use orchestrator
//!
//! Drives the edit loop for one request: ask the model, apply the tool
//! calls it makes to the buffer, stream progress, repeat until the model
//! gives a final reply or a limit is hit.
//!
//! Decisions are made by the pure [`transition`] function; [`Orchestrator`]
//! only performs the I/O around it (model calls and event delivery).

mod event;
mod state;
mod transition;

#[cfg(test)]
pub(crate) mod testing;

pub use event::StreamEvent;
pub use state::{LoopConfig, LoopState};

use state::{Effect, Event};
use transition::transition;

use crate::conversation::Conversation;
use crate::editor::TextEditorTool;
use crate::llm::{LlmMessage, LlmRequest, LlmService, ToolDefinition};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Final state of one run
#[derive(Debug)]
pub struct RunOutcome {
    pub state: LoopState,
    /// Number of model calls made
    pub iterations: u32,
    pub content: String,
    pub transcript: Vec<LlmMessage>,
}

pub struct Orchestrator {
    llm: Arc<dyn LlmService>,
    tool: ToolDefinition,
    config: LoopConfig,
    max_tokens: u32,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmService>, config: LoopConfig, max_tokens: u32) -> Self {
        Self {
            llm,
            tool: TextEditorTool.definition(),
            config,
            max_tokens,
        }
    }

    /// Run the loop to a terminal state
    ///
    /// Events go out through `events`, one send awaited at a time, and each
    /// follow-up model call waits for the client to drain them. If the
    /// receiver is gone the run is treated as cancelled.
    pub async fn run(
        &self,
        conversation: Conversation,
        events: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> RunOutcome {
        let Conversation {
            system,
            mut transcript,
            mut content,
        } = conversation;
        let mut state = LoopState::initial();
        let mut iterations = 0;

        while let LoopState::AwaitingModel { iteration } = state {
            if iteration > 1 && !drained(&events, &cancel).await {
                state = LoopState::Cancelled;
                break;
            }
            iterations = iteration;
            let request = LlmRequest {
                system: system.clone(),
                messages: transcript.clone(),
                tools: vec![self.tool.clone()],
                max_tokens: Some(self.max_tokens),
            };

            tracing::debug!(iteration, messages = transcript.len(), "Requesting model reply");

            let event = tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::info!(iteration, "Model request cancelled");
                    Event::Cancelled
                }

                result = self.llm.complete(&request) => match result {
                    Ok(response) => Event::ModelReplied(response),
                    Err(e) => Event::ModelFailed(e),
                },
            };

            let step = match transition(&state, &content, &self.config, event) {
                Ok(step) => step,
                Err(e) => {
                    tracing::error!(error = %e, "Invalid edit loop transition");
                    break;
                }
            };

            if let Some(new_content) = step.content {
                content = new_content;
            }
            state = step.state;

            for effect in step.effects {
                match effect {
                    Effect::Append(message) => transcript.push(message),
                    Effect::Emit(event) => {
                        if let StreamEvent::ToolInvoked { tool, command } = &event {
                            tracing::info!(iteration, tool = %tool, command = ?command, "Tool invoked");
                        }
                        if !deliver(&events, &cancel, event).await {
                            state = LoopState::Cancelled;
                            break;
                        }
                    }
                }
            }
        }

        match &state {
            LoopState::Failed { reason } => {
                tracing::warn!(iterations, code = ?reason.code(), reason = %reason.message(), "Edit loop failed");
            }
            other => tracing::info!(iterations, state = ?other, "Edit loop finished"),
        }

        RunOutcome {
            state,
            iterations,
            content,
            transcript,
        }
    }
}

/// Wait until the client has read every queued event
///
/// Holds the next model call back so the run stays at most one reply ahead
/// of the client. False when the client is gone or the run was cancelled.
async fn drained(events: &mpsc::Sender<StreamEvent>, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;

        () = cancel.cancelled() => false,
        permits = events.reserve_many(events.max_capacity()) => match permits {
            Ok(_permits) => true,
            Err(_) => {
                tracing::info!("Event receiver dropped, stopping edit loop");
                cancel.cancel();
                false
            }
        },
    }
}

/// Send one event; false when the client is gone or the run was cancelled
async fn deliver(
    events: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
    event: StreamEvent,
) -> bool {
    tokio::select! {
        biased;

        () = cancel.cancelled() => false,
        sent = events.send(event) => {
            if sent.is_err() {
                tracing::info!("Event receiver dropped, stopping edit loop");
                cancel.cancel();
            }
            sent.is_ok()
        }
    }
}
