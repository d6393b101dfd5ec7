//! Pure state transition function
//!
//! Given the same state, buffer and event this always produces the same
//! next state and effects. Tool execution happens here because the
//! executor is itself pure; only model calls and event delivery are left
//! to the driver.

use super::event::StreamEvent;
use super::state::{Effect, Event, FailureReason, LoopConfig, LoopState};
use crate::editor::{ExecutionResult, TextEditorTool, TOOL_NAME};
use crate::llm::{ContentBlock, LlmMessage, LlmResponse};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct Transition {
    pub state: LoopState,
    /// Replacement buffer, when a tool changed it
    pub content: Option<String>,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub fn new(state: LoopState) -> Self {
        Self {
            state,
            content: None,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    fn fail(reason: FailureReason) -> Self {
        let event = reason.to_event();
        Self::new(LoopState::Failed { reason }).with_effect(Effect::Emit(event))
    }
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Loop already finished in state {0:?}")]
    AlreadyFinished(LoopState),
}

/// What a single model reply asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    ToolRequested,
    FinalReply,
    /// Claims a tool call but carries none
    Malformed,
}

impl ReplyKind {
    pub fn classify(response: &LlmResponse) -> Self {
        if !response.tool_uses().is_empty() {
            ReplyKind::ToolRequested
        } else if response.stopped_for_tool() {
            ReplyKind::Malformed
        } else {
            ReplyKind::FinalReply
        }
    }
}

pub fn transition(
    state: &LoopState,
    content: &str,
    config: &LoopConfig,
    event: Event,
) -> Result<Transition, TransitionError> {
    let LoopState::AwaitingModel { iteration } = state else {
        return Err(TransitionError::AlreadyFinished(state.clone()));
    };

    let result = match event {
        Event::Cancelled => Transition::new(LoopState::Cancelled),

        Event::ModelFailed(error) => Transition::fail(FailureReason::Upstream {
            message: error.message,
        }),

        Event::ModelReplied(response) => match ReplyKind::classify(&response) {
            ReplyKind::Malformed => Transition::fail(FailureReason::MissingToolPayload),
            ReplyKind::FinalReply => final_reply(response),
            ReplyKind::ToolRequested => {
                let mut step = execute_tools(response, content);
                if *iteration >= config.max_iterations {
                    let reason = FailureReason::IterationLimit {
                        ceiling: config.max_iterations,
                    };
                    step.effects.push(Effect::Emit(reason.to_event()));
                    step.state = LoopState::Failed { reason };
                } else {
                    step.state = LoopState::AwaitingModel {
                        iteration: iteration + 1,
                    };
                }
                step
            }
        },
    };

    Ok(result)
}

fn final_reply(response: LlmResponse) -> Transition {
    let texts: Vec<Effect> = response
        .text_segments()
        .into_iter()
        .map(|text| {
            Effect::Emit(StreamEvent::FinalText {
                text: text.to_string(),
            })
        })
        .collect();

    let mut step = Transition::new(LoopState::Completed);
    if !response.content.is_empty() {
        step = step.with_effect(Effect::Append(LlmMessage::assistant(response.content)));
    }
    step.with_effects(texts)
}

/// Run every tool call of one reply in order against the buffer
///
/// The returned state is a placeholder; the caller decides whether the
/// loop continues.
fn execute_tools(response: LlmResponse, content: &str) -> Transition {
    let mut buffer: Option<String> = None;
    let mut emits = Vec::new();
    let mut results = Vec::new();

    for (id, name, input) in response.tool_uses() {
        let current = buffer.as_deref().unwrap_or(content);
        let (command, result) = if name == TOOL_NAME {
            TextEditorTool.run(input, current)
        } else {
            (None, TextEditorTool::unknown_tool(name))
        };

        emits.push(Effect::Emit(StreamEvent::ToolInvoked {
            tool: name.to_string(),
            command: command.map(str::to_string),
        }));

        if result.is_mutation() {
            if let (Some(new_content), Some(edit)) = (&result.content, &result.edit) {
                emits.push(Effect::Emit(StreamEvent::ContentUpdated {
                    content: new_content.clone(),
                    edit: edit.clone(),
                }));
                buffer = Some(new_content.clone());
            }
        }

        emits.push(Effect::Emit(StreamEvent::ToolOutcome {
            success: result.success,
            message: outcome_message(&result),
        }));
        results.push(ContentBlock::tool_result(
            id,
            result.to_tool_content(),
            !result.success,
        ));
    }

    let mut step = Transition::new(LoopState::Completed)
        .with_effect(Effect::Append(LlmMessage::assistant(response.content)))
        .with_effect(Effect::Append(LlmMessage::user(results)))
        .with_effects(emits);
    step.content = buffer;
    step
}

fn outcome_message(result: &ExecutionResult) -> String {
    if let Some(message) = &result.message {
        return message.clone();
    }
    match (result.line_count, result.total_lines) {
        (Some(shown), Some(total)) => format!("Viewed {shown} of {total} lines"),
        _ => "Done".to_string(),
    }
}
