//! LLM error types

use thiserror::Error;

/// LLM error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::InvalidRequest, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message)
    }
}

/// Error classification
///
/// Requests are never retried automatically; the kind is reported in logs
/// so operators can tell transient failures from configuration problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Network issues, timeouts, truncated streams
    Network,
    /// Rate limited (429)
    RateLimit,
    /// Server error (5xx) or provider overload
    ServerError,
    /// Authentication failed (401, 403)
    Auth,
    /// Bad request (400)
    InvalidRequest,
    /// Unknown error
    Unknown,
}

impl LlmErrorKind {
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }

    /// Classify the `error.type` string Anthropic reports in bodies and stream frames
    pub fn from_api_error_type(error_type: &str) -> Self {
        match error_type {
            "authentication_error" | "permission_error" => Self::Auth,
            "rate_limit_error" => Self::RateLimit,
            "overloaded_error" | "api_error" => Self::ServerError,
            "invalid_request_error" | "not_found_error" | "request_too_large" => {
                Self::InvalidRequest
            }
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_types() {
        assert_eq!(LlmErrorKind::from_api_error_type("overloaded_error"), LlmErrorKind::ServerError);
        assert_eq!(LlmErrorKind::from_api_error_type("authentication_error"), LlmErrorKind::Auth);
        assert_eq!(LlmErrorKind::from_api_error_type("something_new"), LlmErrorKind::Unknown);
        assert!(LlmErrorKind::RateLimit.is_transient());
        assert!(!LlmErrorKind::InvalidRequest.is_transient());
    }
}
