//! Errors reported by the store.
//!
//! A store adapter maps whatever its SDK returns onto a [`StoreErrorCode`];
//! failures that never reached the store use [`StoreErrorCode::Transport`].

use std::fmt;

/// Well-known store error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum StoreErrorCode {
    /// Table or index not found.
    ResourceNotFoundException,
    /// A condition expression evaluated to false.
    ConditionalCheckFailedException,
    /// Provisioned throughput exceeded.
    ProvisionedThroughputExceededException,
    /// Request throttled.
    ThrottlingException,
    /// Request failed validation.
    #[default]
    ValidationException,
    /// The store failed internally.
    InternalServerError,
    /// The request never produced a store response.
    Transport,
}

impl StoreErrorCode {
    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceNotFoundException => "ResourceNotFoundException",
            Self::ConditionalCheckFailedException => "ConditionalCheckFailedException",
            Self::ProvisionedThroughputExceededException => {
                "ProvisionedThroughputExceededException"
            }
            Self::ThrottlingException => "ThrottlingException",
            Self::ValidationException => "ValidationException",
            Self::InternalServerError => "InternalServerError",
            Self::Transport => "Transport",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error returned by the store or by the transport in front of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// The error code.
    pub code: StoreErrorCode,
    /// A human-readable message.
    pub message: String,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    /// Create an error with a custom message.
    #[must_use]
    pub fn with_message(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// A failure that happened before the store answered.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::with_message(StoreErrorCode::Transport, message)
    }

    /// The conditional write was rejected.
    #[must_use]
    pub fn conditional_check_failed(message: impl Into<String>) -> Self {
        Self::with_message(StoreErrorCode::ConditionalCheckFailedException, message)
    }

    /// Request failed validation.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(StoreErrorCode::ValidationException, message)
    }

    /// Returns `true` when the store rejected a conditional write.
    #[must_use]
    pub fn is_conditional_check_failed(&self) -> bool {
        self.code == StoreErrorCode::ConditionalCheckFailedException
    }
}
