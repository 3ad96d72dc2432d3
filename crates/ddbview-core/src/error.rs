//! Core error type for browse operations.

use ddbview_model::error::DynamoDBError;
use thiserror::Error;

/// Errors surfaced to the presentation layer.
#[derive(Debug, Error)]
pub enum BrowseError {
    /// The request was rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The table (or index) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote call failed; retrying is safe.
    #[error("remote call failed: {0}")]
    Transient(#[source] DynamoDBError),

    /// Another fetch is already in flight for this session.
    #[error("a request is already in progress")]
    Busy,

    /// The session was reconfigured while the request was in flight; the
    /// response was dropped.
    #[error("request superseded by a newer configuration")]
    Superseded,
}

impl BrowseError {
    /// Validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the caller may retry the same request unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Busy)
    }
}

impl From<DynamoDBError> for BrowseError {
    fn from(e: DynamoDBError) -> Self {
        remote_error_to_browse(e)
    }
}

/// Classify a remote failure: a missing resource is `NotFound`, anything else is transient.
#[must_use]
pub fn remote_error_to_browse(e: DynamoDBError) -> BrowseError {
    if e.is_not_found() {
        BrowseError::NotFound(e.message)
    } else {
        BrowseError::Transient(e)
    }
}

/// Result alias for browse operations.
pub type BrowseResult<T> = Result<T, BrowseError>;

#[cfg(test)]
mod tests {
    use ddbview_model::dynamodb_error;

    use super::*;

    #[test]
    fn test_should_map_not_found() {
        let err = remote_error_to_browse(dynamodb_error!(
            ResourceNotFoundException,
            "Table: Orders not found"
        ));
        assert!(matches!(err, BrowseError::NotFound(ref m) if m == "Table: Orders not found"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_should_map_other_failures_to_transient() {
        let err: BrowseError = dynamodb_error!(TransportError, "connection refused").into();
        assert!(matches!(err, BrowseError::Transient(_)));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("connection refused"));
    }
}
