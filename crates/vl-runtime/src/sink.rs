//! Outbound sink for the binary.
//!
//! The app and HMI transports live outside this workspace; the process
//! logs what it would hand them.

use shared_types::{codec, Message};
use tracing::info;
use vl_01_command_factory::{Endpoint, MessageSink, SinkError};

/// Logs every outbound message with its encoded size.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl MessageSink for LoggingSink {
    fn send(&self, endpoint: Endpoint, message: Message) -> Result<(), SinkError> {
        if endpoint == Endpoint::Bus {
            // Bus traffic is owned by the module sinks.
            return Err(SinkError::Unroutable(endpoint));
        }
        let bytes = codec::encode(&message).len();
        info!(
            endpoint = %endpoint,
            function = %message.function_id(),
            kind = %message.kind(),
            bytes,
            "Outbound message"
        );
        Ok(())
    }
}
