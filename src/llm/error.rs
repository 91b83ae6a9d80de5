//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// LLM error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
    pub retry_after: Option<Duration>,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
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

    /// Classify a failed send (no HTTP status available)
    pub fn from_transport(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::network(format!("Request timeout: {e}"))
        } else if e.is_connect() {
            Self::network(format!("Connection failed: {e}"))
        } else {
            Self::unknown(format!("Request failed: {e}"))
        }
    }

    /// Classify a non-success HTTP response
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => Self::auth(format!("Authentication failed: {body}")),
            429 => {
                let err = Self::rate_limit(format!("Rate limited: {body}"));
                match retry_after_hint(body) {
                    Some(delay) => err.with_retry_after(delay),
                    None => err,
                }
            }
            400 => Self::invalid_request(format!("Invalid request: {body}")),
            500..=599 => Self::server_error(format!("Server error: {body}")),
            _ => Self::unknown(format!("HTTP {status}: {body}")),
        }
    }
}

/// Longest server-requested wait honored before re-prompting
const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

/// `error.retry_after` seconds from a JSON error body, if present
fn retry_after_hint(body: &str) -> Option<Duration> {
    let parsed: serde_json::Value = serde_json::from_str(body).ok()?;
    let seconds = parsed.get("error")?.get("retry_after")?.as_f64()?;
    Duration::try_from_secs_f64(seconds)
        .ok()
        .map(|delay| delay.min(MAX_RETRY_AFTER))
}

/// Error classification for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Network issues, timeouts - retryable
    Network,
    /// Rate limited (429) - retryable with backoff
    RateLimit,
    /// Server error (5xx) - retryable
    ServerError,
    /// Authentication failed (401, 403) - not retryable
    Auth,
    /// Bad request (400) - not retryable
    InvalidRequest,
    /// Unknown error
    Unknown,
}

impl LlmErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_classification() {
        assert_eq!(LlmError::from_status(StatusCode::UNAUTHORIZED, "").kind, LlmErrorKind::Auth);
        assert_eq!(LlmError::from_status(StatusCode::FORBIDDEN, "").kind, LlmErrorKind::Auth);
        assert_eq!(LlmError::from_status(StatusCode::BAD_REQUEST, "").kind, LlmErrorKind::InvalidRequest);
        assert_eq!(LlmError::from_status(StatusCode::BAD_GATEWAY, "").kind, LlmErrorKind::ServerError);
        assert_eq!(LlmError::from_status(StatusCode::IM_A_TEAPOT, "").kind, LlmErrorKind::Unknown);
    }

    #[test]
    fn test_rate_limit_reads_retry_after() {
        let err = LlmError::from_status(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"retry_after":2.5}}"#,
        );
        assert_eq!(err.kind, LlmErrorKind::RateLimit);
        assert_eq!(err.retry_after, Some(Duration::from_millis(2500)));

        let err = LlmError::from_status(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(err.retry_after, None);
    }

    #[test]
    fn test_retry_after_out_of_range() {
        let err = LlmError::from_status(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"retry_after":1e20}}"#,
        );
        assert_eq!(err.kind, LlmErrorKind::RateLimit);
        assert_eq!(err.retry_after, Some(MAX_RETRY_AFTER));

        let err = LlmError::from_status(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"retry_after":-3}}"#,
        );
        assert_eq!(err.retry_after, None);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(LlmErrorKind::Network.is_retryable());
        assert!(LlmErrorKind::RateLimit.is_retryable());
        assert!(LlmErrorKind::ServerError.is_retryable());
        assert!(!LlmErrorKind::Auth.is_retryable());
        assert!(!LlmErrorKind::InvalidRequest.is_retryable());
        assert!(!LlmErrorKind::Unknown.is_retryable());
    }
}
