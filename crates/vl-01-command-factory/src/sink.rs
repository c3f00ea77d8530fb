//! Outbound message sinks.
//!
//! Commands never touch transports directly; they hand finished messages to
//! a [`MessageSink`] together with the endpoint they are meant for.

use crate::error::SinkError;
use shared_types::Message;
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

/// Destination of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// The app-facing side (mobile application).
    Upstream,
    /// The HMI-facing side.
    Downstream,
    /// A module's private vehicle bus.
    Bus,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream => write!(f, "upstream"),
            Self::Downstream => write!(f, "downstream"),
            Self::Bus => write!(f, "bus"),
        }
    }
}

/// Non-blocking outbound delivery.
///
/// `send` is called from event observers, which may run on a transport's
/// reader task, so implementations must only enqueue.
pub trait MessageSink: Send + Sync {
    fn send(&self, endpoint: Endpoint, message: Message) -> Result<(), SinkError>;
}

/// Sink backed by an unbounded channel; the receiver owns delivery.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<(Endpoint, Message)>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(Endpoint, Message)>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl MessageSink for ChannelSink {
    fn send(&self, endpoint: Endpoint, message: Message) -> Result<(), SinkError> {
        debug!(endpoint = %endpoint, message = %message, "Queued outbound message");
        self.sender
            .send((endpoint, message))
            .map_err(|_| SinkError::Disconnected(endpoint))
    }
}
