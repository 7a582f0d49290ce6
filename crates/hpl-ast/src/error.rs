//! Error types for AST evaluation.

use thiserror::Error;

/// Errors that can occur while evaluating a predicate against a message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PredicateError {
    /// The predicate referenced a field that the message does not have.
    #[error("message on topic {topic:?} has no field {field:?}")]
    MissingField {
        /// Topic of the message being evaluated.
        topic: String,
        /// Field name that was missing.
        field: String,
    },
    /// The predicate referenced an alias with no captured binding.
    #[error("no message bound for alias {alias:?}")]
    UnboundAlias {
        /// Alias that had no binding.
        alias: String,
    },
    /// Comparison between incompatible value types.
    #[error("cannot compare {left} and {right}")]
    TypeMismatch {
        /// Rendered left-hand value.
        left: String,
        /// Rendered right-hand value.
        right: String,
    },
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, PredicateError>;
