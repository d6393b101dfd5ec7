//! HTTP request handlers

use super::sse::event_stream;
use super::types::{ErrorResponse, GenerateRequest};
use super::AppState;
use crate::conversation::{self, BuildError, Source};
use crate::orchestrator::{LoopConfig, Orchestrator};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Events buffered between the orchestrator and the client
const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .with_state(state)
}

/// Start an edit loop and stream its progress
async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let source = Source::from_parts(req.messages, req.prompt)?;
    let conversation = conversation::build(source, req.content_type, req.current_content)?;

    let llm = state.llm.clone().ok_or_else(|| {
        AppError::Internal(
            "No upstream credential configured. Set ANTHROPIC_API_KEY or LLM_GATEWAY.".to_string(),
        )
    })?;

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("generate", %request_id, content_type = ?req.content_type);

    let orchestrator = Orchestrator::new(
        llm,
        LoopConfig {
            max_iterations: state.config.max_iterations,
        },
        state.config.max_tokens,
    );
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    let timeout = state.config.request_timeout;

    tokio::spawn(
        async move {
            tracing::info!(
                messages = conversation.transcript.len(),
                content_len = conversation.content.len(),
                "Starting edit loop"
            );
            match tokio::time::timeout(timeout, orchestrator.run(conversation, tx, cancel)).await {
                Ok(outcome) => tracing::info!(
                    iterations = outcome.iterations,
                    state = ?outcome.state,
                    content_len = outcome.content.len(),
                    transcript_len = outcome.transcript.len(),
                    "Request finished"
                ),
                Err(_) => tracing::warn!(timeout_secs = timeout.as_secs(), "Request timed out"),
            }
        }
        .instrument(span),
    );

    Ok(event_stream(rx, guard).into_response())
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
}

impl From<BuildError> for AppError {
    fn from(e: BuildError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        tracing::warn!(status = %status, error = %message, "Rejecting generate request");

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::LlmService;
    use crate::orchestrator::testing::{text_reply, tool_reply, DelayedMockLlmClient, MockLlmClient};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    fn state(llm: Option<Arc<dyn LlmService>>) -> AppState {
        AppState::new(llm, Config::default())
    }

    fn request(body: Value) -> Result<Json<GenerateRequest>, JsonRejection> {
        Ok(Json(serde_json::from_value(body).unwrap()))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn error_of(result: Result<Response, AppError>) -> (StatusCode, String) {
        let response = result.unwrap_err().into_response();
        let status = response.status();
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        (status, body["error"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_generate_streams_edit_session() {
        let llm = Arc::new(MockLlmClient::new("mock"));
        llm.queue_response(tool_reply(&[(
            "t1",
            json!({"command": "insert", "insert_line": 1, "new_str": "2,grace"}),
        )]));
        llm.queue_response(text_reply("Added a row."));

        let response = generate(
            State(state(Some(llm.clone()))),
            request(json!({
                "messages": [{"role": "user", "content": "Current content:\nid,name\n1,ada\n\nInstruction: add grace"}],
                "contentType": "csv"
            })),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "text/event-stream"
        );

        let text = body_text(response).await;
        let frames: Vec<&str> = text
            .split("\n\n")
            .filter(|f| !f.is_empty())
            .map(|f| f.strip_prefix("data: ").unwrap())
            .collect();
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[4], "[DONE]");

        let types: Vec<String> = frames[..4]
            .iter()
            .map(|f| serde_json::from_str::<Value>(f).unwrap()["type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(types, vec!["tool_use", "content_update", "tool_result", "text"]);

        let update: Value = serde_json::from_str(frames[1]).unwrap();
        assert_eq!(update["content"], json!("id,name\n2,grace\n1,ada"));
        assert_eq!(llm.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_upstream_failure_streams_error_then_done() {
        let llm = Arc::new(MockLlmClient::new("mock"));
        let response = generate(
            State(state(Some(llm))),
            request(json!({"prompt": "Make a table of planets", "contentType": "markdown"})),
        )
        .await
        .unwrap();

        let text = body_text(response).await;
        assert!(text.starts_with("data: {\"type\":\"error\""));
        assert!(text.contains("\"code\":\"upstream_error\""));
        assert!(text.ends_with("data: [DONE]\n\n"));
    }

    #[tokio::test]
    async fn test_request_timeout_ends_stream_without_error() {
        let llm = Arc::new(DelayedMockLlmClient::new("slow", Duration::from_secs(30)));
        llm.queue_response(text_reply("too late"));
        let config = Config {
            request_timeout: Duration::from_millis(50),
            ..Config::default()
        };

        let response = generate(
            State(AppState::new(Some(llm.clone()), config)),
            request(json!({"prompt": "Make a table of planets", "contentType": "markdown"})),
        )
        .await
        .unwrap();

        let text = tokio::time::timeout(Duration::from_secs(5), body_text(response))
            .await
            .expect("timed-out run should close the stream");
        assert_eq!(text, "data: [DONE]\n\n");
        assert_eq!(llm.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_credential_is_500() {
        let result = generate(
            State(state(None)),
            request(json!({"prompt": "hi", "contentType": "csv"})),
        )
        .await;
        let (status, error) = error_of(result).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error.contains("ANTHROPIC_API_KEY"));
    }

    #[tokio::test]
    async fn test_invalid_requests_are_400() {
        let llm: Arc<dyn LlmService> = Arc::new(MockLlmClient::new("mock"));

        let result = generate(State(state(Some(llm.clone()))), request(json!({"contentType": "csv"}))).await;
        assert_eq!(error_of(result).await, (StatusCode::BAD_REQUEST, "Request must include messages or prompt".to_string()));

        let result = generate(
            State(state(Some(llm.clone()))),
            request(json!({"messages": [{"role": "assistant", "content": "hi"}], "contentType": "csv"})),
        )
        .await;
        assert_eq!(error_of(result).await.0, StatusCode::BAD_REQUEST);

        let malformed = Json::<GenerateRequest>::from_bytes(b"{\"prompt\": ");
        let result = generate(State(state(Some(llm))), malformed).await;
        assert_eq!(error_of(result).await.0, StatusCode::BAD_REQUEST);
    }
}
