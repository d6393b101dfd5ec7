//! Mock model services for orchestrator tests

use crate::editor::TOOL_NAME;
use crate::llm::{ContentBlock, LlmError, LlmRequest, LlmResponse, LlmService, Usage};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// A reply asking for one `text_editor` call per `(id, input)` pair
pub fn tool_reply(calls: &[(&str, Value)]) -> LlmResponse {
    LlmResponse {
        content: calls
            .iter()
            .map(|(id, input)| ContentBlock::tool_use(*id, TOOL_NAME, input.clone()))
            .collect(),
        stop_reason: Some("tool_use".to_string()),
        usage: Usage::default(),
    }
}

/// A final reply with one text block
pub fn text_reply(text: &str) -> LlmResponse {
    LlmResponse {
        content: vec![ContentBlock::text(text)],
        stop_reason: Some("end_turn".to_string()),
        usage: Usage::default(),
    }
}

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: &LlmRequest) {
        self.requests.lock().unwrap().push(request.clone());
    }

    fn pop(&self) -> Result<LlmResponse, LlmError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }
}

#[async_trait]
impl LlmService for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.record(request);
        self.pop()
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Mock that answers every request with a tool call, forever
pub struct EndlessToolClient {
    input: Value,
    pub calls: Mutex<u32>,
}

impl EndlessToolClient {
    pub fn new(input: Value) -> Self {
        Self {
            input,
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl LlmService for EndlessToolClient {
    async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let id = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            format!("toolu_{calls}")
        };
        Ok(tool_reply(&[(id.as_str(), self.input.clone())]))
    }

    fn model_id(&self) -> &str {
        "endless"
    }
}

// ============================================================================
// Delayed Mock LLM Client (for cancellation testing)
// ============================================================================

/// Mock LLM client with configurable delay
pub struct DelayedMockLlmClient {
    inner: MockLlmClient,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockLlmClient {
    pub fn new(model_id: impl Into<String>, delay: Duration) -> Self {
        Self {
            inner: MockLlmClient::new(model_id),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_response(&self, response: LlmResponse) {
        self.inner.queue_response(response);
    }

    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl LlmService for DelayedMockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.inner.record(request);
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.pop()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
