//! Transport error types

use std::time::Duration;
use thiserror::Error;

/// Errors a fetch can end with
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Unauthorized (401)")]
    Unauthorized,

    #[error("HTTP error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Response could not be decoded: {0}")]
    Decode(String),

    #[error("Fetch aborted before completing")]
    Aborted,
}

impl FetchError {
    /// Check if the endpoint requires a login
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, FetchError::Unauthorized)
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Unauthorized => Some(401),
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map a non-success HTTP status to an error
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        if status == 401 {
            FetchError::Unauthorized
        } else {
            FetchError::Status {
                status,
                body: body.into(),
            }
        }
    }
}

impl FetchError {
    /// Map a reqwest error, reporting timeouts with the configured limit
    pub fn from_reqwest(err: reqwest::Error, limit: Duration) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout(limit);
        }
        FetchError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_unauthorized() {
        let err = FetchError::from_status(401, "nope");
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_from_status_other() {
        let err = FetchError::from_status(500, "boom");
        assert!(!err.is_unauthorized());
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "HTTP error 500: boom");
    }

    #[test]
    fn test_status_absent_for_network_errors() {
        assert_eq!(FetchError::Network("refused".to_string()).status(), None);
        assert_eq!(FetchError::Timeout(Duration::from_secs(5)).status(), None);
        assert_eq!(FetchError::Aborted.status(), None);
        assert_eq!(FetchError::Decode("eof".to_string()).status(), None);
    }

    #[test]
    fn test_timeout_message_names_limit() {
        let err = FetchError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Timeout after 250ms");
    }
}
