//! Error types for the CAN bridge.

use crate::domain::{ConnectionState, Inbound};
use shared_types::{FunctionId, MessageError};
use thiserror::Error;

/// Failures of the private bus transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("transport is not connected")]
    NotConnected,

    #[error("operation timed out")]
    Timeout,

    #[error("frame of {len} bytes exceeds limit of {max} bytes")]
    FrameTooLarge { len: usize, max: usize },
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe => Self::ConnectionClosed,
            std::io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::Io(err.to_string()),
        }
    }
}

/// Module-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// A request arrived where the module only expects replies and
    /// notifications.
    #[error("unexpected request {function} received from the {origin}")]
    UnexpectedRequest { function: FunctionId, origin: Inbound },

    #[error("malformed frame: {0}")]
    Malformed(#[from] MessageError),

    #[error("invalid connection transition {from} -> {to}")]
    InvalidState {
        from: ConnectionState,
        to: ConnectionState,
    },
}

pub type ModuleResult<T> = Result<T, ModuleError>;
