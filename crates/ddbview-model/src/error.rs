//! DynamoDB error types.
//!
//! Every remote store implementation reports failures as a [`DynamoDBError`]
//! carrying the service error code when the service answered, or
//! [`DynamoDBErrorCode::TransportError`] when no response was received.

use std::fmt;

use crate::operations::DynamoDBOperation;

/// Well-known DynamoDB error codes seen on the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum DynamoDBErrorCode {
    /// Table or index not found.
    ResourceNotFoundException,
    /// Validation error (malformed expression, bad limit, ...).
    ValidationException,
    /// Provisioned throughput exceeded.
    ProvisionedThroughputExceededException,
    /// Request limit exceeded.
    RequestLimitExceeded,
    /// Request throttled.
    ThrottlingException,
    /// Access denied.
    AccessDeniedException,
    /// Credentials not recognized.
    UnrecognizedClientException,
    /// Internal server error.
    InternalServerError,
    /// Service temporarily unavailable.
    ServiceUnavailable,
    /// The request never produced a service response (connect, timeout, dispatch).
    TransportError,
    /// Any code this crate does not model.
    #[default]
    Unknown,
}

impl DynamoDBErrorCode {
    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceNotFoundException => "ResourceNotFoundException",
            Self::ValidationException => "ValidationException",
            Self::ProvisionedThroughputExceededException => {
                "ProvisionedThroughputExceededException"
            }
            Self::RequestLimitExceeded => "RequestLimitExceeded",
            Self::ThrottlingException => "ThrottlingException",
            Self::AccessDeniedException => "AccessDeniedException",
            Self::UnrecognizedClientException => "UnrecognizedClientException",
            Self::InternalServerError => "InternalServerError",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::TransportError => "TransportError",
            Self::Unknown => "Unknown",
        }
    }

    /// Parse a service error code as reported in the `__type` field or by an
    /// SDK's error metadata. Fully-qualified names (`prefix#Code`) are accepted.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let short = code.rsplit('#').next().unwrap_or(code);
        match short {
            "ResourceNotFoundException" => Self::ResourceNotFoundException,
            "ValidationException" => Self::ValidationException,
            "ProvisionedThroughputExceededException" => {
                Self::ProvisionedThroughputExceededException
            }
            "RequestLimitExceeded" => Self::RequestLimitExceeded,
            "ThrottlingException" => Self::ThrottlingException,
            "AccessDeniedException" => Self::AccessDeniedException,
            "UnrecognizedClientException" => Self::UnrecognizedClientException,
            "InternalServerError" => Self::InternalServerError,
            "ServiceUnavailable" => Self::ServiceUnavailable,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for DynamoDBErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed DynamoDB call.
#[derive(Debug)]
pub struct DynamoDBError {
    /// The error code.
    pub code: DynamoDBErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The operation that failed, when known.
    pub operation: Option<DynamoDBOperation>,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for DynamoDBError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation {
            Some(op) => write!(f, "{op} failed ({}): {}", self.code, self.message),
            None => write!(f, "DynamoDBError({}): {}", self.code, self.message),
        }
    }
}

impl std::error::Error for DynamoDBError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl DynamoDBError {
    /// Create a new `DynamoDBError` from an error code.
    #[must_use]
    pub fn new(code: DynamoDBErrorCode) -> Self {
        Self {
            message: code.as_str().to_owned(),
            code,
            operation: None,
            source: None,
        }
    }

    /// Create a new `DynamoDBError` with a custom message.
    #[must_use]
    pub fn with_message(code: DynamoDBErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            operation: None,
            source: None,
        }
    }

    /// Tag the error with the operation that produced it.
    #[must_use]
    pub fn for_operation(mut self, operation: DynamoDBOperation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns `true` when the table (or index) does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code == DynamoDBErrorCode::ResourceNotFoundException
    }

    // -- Convenience constructors --

    /// Table or resource not found.
    #[must_use]
    pub fn resource_not_found(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::ResourceNotFoundException, message)
    }

    /// Validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::ValidationException, message)
    }

    /// Internal server error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::InternalServerError, message)
    }

    /// No response was received from the service.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::TransportError, message)
    }
}

/// Create a `DynamoDBError` from an error code.
///
/// # Examples
///
/// ```
/// use ddbview_model::dynamodb_error;
/// use ddbview_model::error::DynamoDBErrorCode;
///
/// let err = dynamodb_error!(ResourceNotFoundException);
/// assert_eq!(err.code, DynamoDBErrorCode::ResourceNotFoundException);
///
/// let err = dynamodb_error!(TransportError, "connection refused");
/// assert_eq!(err.message, "connection refused");
/// ```
#[macro_export]
macro_rules! dynamodb_error {
    ($code:ident) => {
        $crate::error::DynamoDBError::new($crate::error::DynamoDBErrorCode::$code)
    };
    ($code:ident, $msg:expr) => {
        $crate::error::DynamoDBError::with_message($crate::error::DynamoDBErrorCode::$code, $msg)
    };
}
