//! HTTP API
//!
//! A single streaming endpoint, `POST /api/generate`.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::config::Config;
use crate::llm::LlmService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// `None` when no upstream credential is configured
    pub llm: Option<Arc<dyn LlmService>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(llm: Option<Arc<dyn LlmService>>, config: Config) -> Self {
        Self {
            llm,
            config: Arc::new(config),
        }
    }
}
