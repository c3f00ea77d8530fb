//! Error types for commands, the factory and outbound sinks.

use crate::sink::Endpoint;
use shared_bus::SubscriptionError;
use shared_types::{FunctionId, MessageError, MessageKind};
use thiserror::Error;
use vl_02_request_controller::ControllerError;

/// Outbound delivery errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The endpoint's channel is closed.
    #[error("Endpoint {0} disconnected")]
    Disconnected(Endpoint),

    /// The sink has no route to the endpoint.
    #[error("No route to endpoint {0}")]
    Unroutable(Endpoint),
}

/// Errors raised while running a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Request {0} carries no correlation id")]
    MissingCorrelationId(FunctionId),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    InvalidPayload(#[from] MessageError),
}

/// Factory registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    #[error("A command is already registered for {function} ({kind})")]
    AlreadyRegistered {
        function: FunctionId,
        kind: MessageKind,
    },
}

/// Result type for command execution.
pub type CommandResult<T> = Result<T, CommandError>;
