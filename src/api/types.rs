//! API request and response types

use crate::conversation::{ContentType, IncomingMessage};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`
///
/// Either `messages` or the legacy `prompt` must be present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub messages: Option<Vec<IncomingMessage>>,
    #[serde(default)]
    pub prompt: Option<String>,
    pub content_type: ContentType,
    /// Document to edit; overrides any document embedded in the messages
    #[serde(default)]
    pub current_content: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
