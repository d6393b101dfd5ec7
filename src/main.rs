//! coedit - co-edit CSV and Markdown documents with a language model
//!
//! The model edits an in-memory copy of the document through a small text
//! editor tool while the server streams every step to the client.

mod api;
mod config;
mod conversation;
mod editor;
mod llm;
mod orchestrator;
mod system_prompt;

use api::{create_router, AppState};
use config::Config;
use llm::{AnthropicService, LlmService, LoggingService};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coedit=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env();

    let llm: Option<Arc<dyn LlmService>> = match config.credential() {
        Some(api_key) => {
            let service = AnthropicService::new(
                api_key,
                config.model.clone(),
                config.gateway.as_deref(),
                config.upstream_timeout,
            )?;
            tracing::info!(
                model = %config.model,
                gateway = config.gateway.as_deref().unwrap_or("none"),
                max_iterations = config.max_iterations,
                "LLM client initialized"
            );
            Some(Arc::new(LoggingService::new(Arc::new(service))))
        }
        None => {
            tracing::warn!("No LLM credential configured. Set ANTHROPIC_API_KEY or LLM_GATEWAY.");
            None
        }
    };

    let port = config.port;
    let state = AppState::new(llm, config);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("coedit server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
