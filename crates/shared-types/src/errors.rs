//! # Error Types
//!
//! Errors raised while decoding, classifying and validating messages.

use crate::ids::FunctionId;
use thiserror::Error;

/// Errors related to message decoding and validation.
///
/// All variants are resolved at the transport boundary; a message that
/// fails here never reaches the command factory or the request controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Bytes are not valid JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Top-level value is not a JSON object.
    #[error("Message is not a JSON object")]
    NotAnObject,

    /// No recognizable function reference (`method`, `result.method` or
    /// `error.data.method`), or a structurally invalid field.
    #[error("Malformed message: {reason}")]
    Malformed { reason: String },

    /// A request, response or error response without an `id`.
    #[error("Missing correlation id for {function}")]
    MissingCorrelationId { function: FunctionId },

    /// `id` present but not an unsigned 32-bit integer.
    #[error("Invalid correlation id: {0}")]
    InvalidCorrelationId(String),

    /// Payload does not match the schema expected for the function.
    #[error("Invalid payload for {function}: {reason}")]
    InvalidPayload { function: FunctionId, reason: String },

    /// Attempt to construct a message that breaks the kind/id rule.
    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

impl MessageError {
    /// Shorthand for [`MessageError::Malformed`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Result alias for message operations.
pub type MessageResult<T> = Result<T, MessageError>;
