//! Error types for the request controller.

use shared_types::CorrelationId;
use std::time::Duration;
use thiserror::Error;

/// Request controller errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The id is already pending; the existing entry is left untouched.
    #[error("Correlation id {0} is already pending")]
    DuplicateCorrelationId(CorrelationId),

    /// The deadline would overflow the clock.
    #[error("Timeout {0:?} is out of range")]
    InvalidTimeout(Duration),
}

/// Result type for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;
