//! Model-level error type.

use thiserror::Error;

/// Result type used across the model layer.
pub type ModelResult<T> = Result<T, ModelError>;

/// Deterministic model failures (parsing, vocabulary lookups).
///
/// Transport and session concerns carry their own error types; nothing here
/// wraps I/O.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A status or priority value is not part of the known vocabulary.
    #[error("unknown {kind} value: '{value}'")]
    UnknownValue { kind: &'static str, value: String },
}

impl ModelError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn unknown_value(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownValue {
            kind,
            value: value.into(),
        }
    }
}
