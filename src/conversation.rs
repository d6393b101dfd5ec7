//! Conversation state builder
//!
//! Turns the caller's message list (or a legacy single prompt) into the
//! transcript sent upstream, the initial document buffer, and the system
//! prompt for the document type.
//!
//! The first user turn of an edit request usually looks like
//! `"Current content:\n<doc>\n\nInstruction: <text>"`. That turn is split
//! into a cacheable document prefix and an uncached instruction so the
//! provider can reuse the prefix across iterations.

use crate::llm::{ContentBlock, LlmMessage, MessageRole, SystemContent};
use crate::system_prompt::build_system_prompt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opening of a two-part edit payload
const CONTENT_PREFIX: &str = "Current content:\n";

/// Separator between document and instruction; the last occurrence wins
const INSTRUCTION_MARKER: &str = "\n\nInstruction:";

/// Client cache marks honoured in the first turn
///
/// The system prompt takes one of the provider's four cache breakpoints.
const MAX_CLIENT_CACHE_MARKS: usize = 3;

/// Kind of document being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Csv,
    Markdown,
}

/// Message as sent by the client
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub role: MessageRole,
    pub content: IncomingContent,
}

/// Either a plain string or a list of typed segments
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IncomingContent {
    Text(String),
    Segments(Vec<IncomingSegment>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncomingSegment {
    Text {
        text: String,
        #[serde(default)]
        cache_control: Option<serde_json::Value>,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

/// Where the transcript comes from
#[derive(Debug, Clone)]
pub enum Source {
    Messages(Vec<IncomingMessage>),
    /// Legacy single-prompt request
    Prompt(String),
}

impl Source {
    /// Pick the source from the optional request fields, preferring `messages`
    pub fn from_parts(
        messages: Option<Vec<IncomingMessage>>,
        prompt: Option<String>,
    ) -> Result<Self, BuildError> {
        match (messages, prompt) {
            (Some(messages), _) => Ok(Source::Messages(messages)),
            (None, Some(prompt)) => Ok(Source::Prompt(prompt)),
            (None, None) => Err(BuildError::MissingInput),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Request must include messages or prompt")]
    MissingInput,
    #[error("Conversation has no non-empty messages")]
    Empty,
    #[error("Conversation must start with a user message")]
    NotUserFirst,
}

/// Everything the orchestrator needs to start a run
#[derive(Debug, Clone)]
pub struct Conversation {
    pub system: Vec<SystemContent>,
    pub transcript: Vec<LlmMessage>,
    pub content: String,
}

/// Build the initial conversation for a request
///
/// `current_content` wins over any document embedded in the messages.
pub fn build(
    source: Source,
    content_type: ContentType,
    current_content: Option<String>,
) -> Result<Conversation, BuildError> {
    let (mut transcript, segment) = match source {
        Source::Messages(messages) => {
            let mut transcript = normalize(messages)?;
            limit_cache_marks(&mut transcript);
            (transcript, true)
        }
        Source::Prompt(prompt) if prompt.is_empty() => return Err(BuildError::Empty),
        Source::Prompt(prompt) => (vec![LlmMessage::user(vec![ContentBlock::text(prompt)])], false),
    };

    let content = current_content.unwrap_or_else(|| embedded_content(&transcript));
    if segment {
        segment_first_turn(&mut transcript);
    }

    Ok(Conversation {
        system: build_system_prompt(content_type),
        transcript,
        content,
    })
}

/// Drop empty messages, merge same-role neighbours, and require a user turn first
fn normalize(messages: Vec<IncomingMessage>) -> Result<Vec<LlmMessage>, BuildError> {
    let mut transcript: Vec<LlmMessage> = Vec::with_capacity(messages.len());

    for message in messages {
        let blocks = into_blocks(message.content);
        if blocks.is_empty() {
            continue;
        }
        match transcript.last_mut() {
            Some(last) if last.role == message.role => last.content.extend(blocks),
            _ => transcript.push(LlmMessage {
                role: message.role,
                content: blocks,
            }),
        }
    }

    match transcript.first() {
        None => Err(BuildError::Empty),
        Some(first) if first.role != MessageRole::User => Err(BuildError::NotUserFirst),
        Some(_) => Ok(transcript),
    }
}

fn into_blocks(content: IncomingContent) -> Vec<ContentBlock> {
    let blocks = match content {
        IncomingContent::Text(text) => vec![ContentBlock::text(text)],
        IncomingContent::Segments(segments) => segments
            .into_iter()
            .map(|segment| match segment {
                IncomingSegment::Text {
                    text,
                    cache_control: Some(_),
                } => ContentBlock::cached_text(text),
                IncomingSegment::Text { text, .. } => ContentBlock::text(text),
                IncomingSegment::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => ContentBlock::tool_result(tool_use_id, content, is_error),
            })
            .collect(),
    };
    blocks.into_iter().filter(|b| !b.is_empty_text()).collect()
}

/// Keep client cache marks only on the first turn, and only the first few there
fn limit_cache_marks(transcript: &mut [LlmMessage]) {
    let mut budget = MAX_CLIENT_CACHE_MARKS;
    for (index, message) in transcript.iter_mut().enumerate() {
        for block in &mut message.content {
            if let ContentBlock::Text { cacheable, .. } = block {
                if *cacheable {
                    if index == 0 && budget > 0 {
                        budget -= 1;
                    } else {
                        *cacheable = false;
                    }
                }
            }
        }
    }
}

/// Split a two-part payload into `(cacheable prefix, instruction suffix, document)`
fn split_payload(text: &str) -> Option<(&str, &str, &str)> {
    let rest = text.strip_prefix(CONTENT_PREFIX)?;
    let at = rest.rfind(INSTRUCTION_MARKER)?;
    let (document, _) = rest.split_at(at);
    let (prefix, suffix) = text.split_at(CONTENT_PREFIX.len() + at);
    Some((prefix, suffix, document))
}

/// Document embedded in the most recent user turn that carries one
fn embedded_content(transcript: &[LlmMessage]) -> String {
    transcript
        .iter()
        .rev()
        .filter(|m| m.role == MessageRole::User)
        .flat_map(|m| m.content.iter().rev())
        .find_map(|block| match block {
            ContentBlock::Text { text, .. } => split_payload(text).map(|(_, _, doc)| doc.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Mark the document part of the first user turn as cacheable
///
/// Applies only when that turn is a single plain text block.
fn segment_first_turn(transcript: &mut [LlmMessage]) {
    let Some(first) = transcript.first_mut() else {
        return;
    };
    let [ContentBlock::Text {
        text,
        cacheable: false,
    }] = first.content.as_slice()
    else {
        return;
    };
    let Some((prefix, suffix)) = split_payload(text).map(|(p, s, _)| (p.to_string(), s.to_string()))
    else {
        return;
    };
    first.content = vec![ContentBlock::cached_text(prefix), ContentBlock::text(suffix)];
}
