//! Server configuration read from the environment at startup

use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_TOKENS: u32 = 8192;
const DEFAULT_MAX_ITERATIONS: u32 = 25;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 600;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub anthropic_api_key: Option<String>,
    /// Gateway base URL (e.g., `http://169.254.169.254/gateway/llm`)
    pub gateway: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    /// Ceiling on model calls per request
    pub max_iterations: u32,
    pub request_timeout: Duration,
    pub upstream_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            anthropic_api_key: None,
            gateway: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            port: parse_or(&lookup, "COEDIT_PORT", defaults.port),
            anthropic_api_key: non_empty("ANTHROPIC_API_KEY"),
            gateway: non_empty("LLM_GATEWAY"),
            model: non_empty("COEDIT_MODEL").unwrap_or(defaults.model),
            max_tokens: parse_or(&lookup, "COEDIT_MAX_TOKENS", defaults.max_tokens),
            max_iterations: parse_or(&lookup, "COEDIT_MAX_ITERATIONS", defaults.max_iterations).max(1),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "COEDIT_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            upstream_timeout: Duration::from_secs(parse_or(
                &lookup,
                "COEDIT_UPSTREAM_TIMEOUT_SECS",
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )),
        }
    }

    /// API key to send upstream, if any credential is configured
    ///
    /// In gateway mode the gateway authenticates, so a placeholder is used.
    pub fn credential(&self) -> Option<String> {
        if self.gateway.is_some() {
            Some("implicit".to_string())
        } else {
            self.anthropic_api_key.clone()
        }
    }
}

fn parse_or<T: std::str::FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = %raw, "Ignoring unparsable configuration value");
        default
    })
}
