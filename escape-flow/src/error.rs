use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker the Gemini API puts in quota errors.
pub const RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";

/// A failed call to the model provider.
///
/// `status` is the HTTP status when the provider answered at all; transport
/// failures (DNS, TLS, connection resets) leave it empty.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", describe(.status, .message))]
pub struct ProviderError {
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(Some(status), message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    /// True for HTTP 429, or a message carrying `429` or `RESOURCE_EXHAUSTED`.
    pub fn is_rate_limited(&self) -> bool {
        self.status == Some(429)
            || self.message.contains("429")
            || self.message.contains(RESOURCE_EXHAUSTED)
    }

    pub fn kind(&self) -> ErrorKind {
        if self.is_rate_limited() {
            ErrorKind::RateLimited
        } else {
            ErrorKind::Generic
        }
    }
}

fn describe(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("provider returned {status}: {message}"),
        None => format!("provider request failed: {message}"),
    }
}

/// The only distinction surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RateLimited,
    Generic,
}

#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

impl FlowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::Provider(e) => e.kind(),
            _ => ErrorKind::Generic,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind() == ErrorKind::RateLimited
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_429_is_rate_limited() {
        assert!(ProviderError::with_status(429, "Too Many Requests").is_rate_limited());
    }

    #[test]
    fn message_markers_are_rate_limited() {
        assert!(ProviderError::transport("got 429 from upstream").is_rate_limited());
        assert!(
            ProviderError::with_status(400, "RESOURCE_EXHAUSTED: quota exceeded").is_rate_limited()
        );
    }

    #[test]
    fn other_failures_are_generic() {
        let err = ProviderError::with_status(500, "internal error");
        assert!(!err.is_rate_limited());
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert_eq!(
            FlowError::SessionNotFound("abc".into()).kind(),
            ErrorKind::Generic
        );
    }

    #[test]
    fn display_includes_status() {
        let err = ProviderError::with_status(503, "unavailable");
        assert_eq!(err.to_string(), "provider returned 503: unavailable");
        let err = ProviderError::transport("connection reset");
        assert_eq!(err.to_string(), "provider request failed: connection reset");
    }
}
