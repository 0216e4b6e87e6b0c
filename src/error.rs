use std::time::Duration;

use thiserror::Error;

/// Failure of a backend call. Always recoverable; shown inline by the view that asked.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("network error: {0}")]
    Transport(String),

    #[error("backend returned HTTP {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status { status: u16, message: Option<String> },

    #[error("backend rejected request: {0}")]
    Rejected(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("could not encode request: {0}")]
    Encode(String),
}

impl FetchError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}

/// Bad user input for a selection or trade
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("quantity must be a whole number")]
    NotInteger,

    #[error("quantity must be at least 1")]
    NonPositive,

    #[error("quantity is too large")]
    TooLarge,

    #[error("price must not be negative")]
    NegativePrice,

    #[error("no instrument selected")]
    NoSelection,
}

/// Errors surfaced by user actions
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("login required")]
    AuthRequired,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("could not save change: {0}")]
    Persistence(FetchError),
}

impl AppError {
    /// Classify a failed write: an expired session asks for login, anything else may be retried
    pub fn from_write(err: FetchError) -> Self {
        if err.is_unauthorized() {
            Self::AuthRequired
        } else {
            Self::Persistence(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, FetchError};
    use std::time::Duration;

    #[test]
    fn status_message_is_rendered() {
        let err = FetchError::Status {
            status: 503,
            message: Some("maintenance".to_string()),
        };
        assert_eq!(err.to_string(), "backend returned HTTP 503: maintenance");

        let err = FetchError::Status {
            status: 500,
            message: None,
        };
        assert_eq!(err.to_string(), "backend returned HTTP 500");
    }

    #[test]
    fn timeout_is_rendered_in_seconds() {
        let err = FetchError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "request timed out after 10s");
    }

    #[test]
    fn unauthorized_write_requires_login() {
        let err = FetchError::Status {
            status: 401,
            message: None,
        };
        assert_eq!(AppError::from_write(err), AppError::AuthRequired);

        let err = FetchError::Rejected("insufficient funds".to_string());
        assert!(matches!(AppError::from_write(err), AppError::Persistence(_)));
    }
}
