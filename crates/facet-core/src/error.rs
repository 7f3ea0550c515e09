//! Error type for facet operations.

use facet_model::StoreError;
use thiserror::Error;

/// Everything that can go wrong inside the data-access layer.
///
/// The type is `Clone` so that a single chunk-level failure can be attached
/// to every record of that chunk.
#[derive(Debug, Clone, Error)]
pub enum FacetError {
    /// A condition or filter used an operator token that is not recognized,
    /// or one that is not allowed in that position.
    #[error("unsupported operator: {operator}")]
    UnsupportedOperator {
        /// The offending token.
        operator: String,
    },

    /// A condition tree is structurally malformed.
    #[error("invalid condition: {0}")]
    InvalidCondition(String),

    /// The requested secondary index is not configured on this facet.
    #[error("no such index: {index}")]
    NoSuchIndex {
        /// The slot name or alias that was looked up.
        index: String,
    },

    /// The encoded record already carries an attribute the layer reserves
    /// for keys or TTL.
    #[error("record attribute '{name}' collides with a reserved attribute")]
    ReservedAttribute {
        /// The colliding attribute name.
        name: String,
    },

    /// A record could not be converted to or from its wire form.
    #[error("codec error: {0}")]
    Codec(String),

    /// A decoded record was rejected by its validator.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A pagination cursor could not be encoded or decoded.
    #[error("invalid cursor: {0}")]
    Cursor(String),

    /// The facet configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The store (or the transport in front of it) rejected a request.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The store kept returning the item as unprocessed until retries ran out.
    #[error("item was not processed")]
    NotProcessed,
}

impl FacetError {
    /// Returns `true` when a conditional write was rejected by the store.
    #[must_use]
    pub fn is_conditional_check_failed(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_conditional_check_failed())
    }

    pub(crate) fn unsupported(operator: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            operator: operator.into(),
        }
    }
}

/// Result alias for facet operations.
pub type FacetResult<T> = Result<T, FacetError>;
