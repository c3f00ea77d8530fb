//! The "from bus" and "to bus" loops and the outbound queue between them.

use super::Shared;
use crate::error::TransportError;
use crate::ports::{FrameReader, FrameWriter};
use parking_lot::Mutex;
use shared_types::{codec, Message};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};
use vl_01_command_factory::{Endpoint, MessageSink, SinkError};

pub(crate) type WriteAck = oneshot::Sender<Result<(), TransportError>>;

pub(crate) struct Outbound {
    pub(crate) frame: Vec<u8>,
    pub(crate) ack: Option<WriteAck>,
}

/// Queue feeding the writer task; empty while the bus is not open.
#[derive(Default)]
pub(crate) struct BusQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<Outbound>>>,
}

impl BusQueue {
    pub(crate) fn install(&self, sender: mpsc::UnboundedSender<Outbound>) {
        *self.sender.lock() = Some(sender);
    }

    pub(crate) fn close(&self) {
        self.sender.lock().take();
    }

    pub(crate) fn push(&self, frame: Vec<u8>, ack: Option<WriteAck>) -> Result<(), TransportError> {
        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(TransportError::NotConnected)?;
        sender
            .send(Outbound { frame, ack })
            .map_err(|_| TransportError::ConnectionClosed)
    }
}

/// Routes [`Endpoint::Bus`] onto the module's queue and everything else to
/// the core sink.
pub(crate) struct ModuleSink {
    pub(crate) core: Arc<dyn MessageSink>,
    pub(crate) bus: Arc<BusQueue>,
}

impl MessageSink for ModuleSink {
    fn send(&self, endpoint: Endpoint, message: Message) -> Result<(), SinkError> {
        match endpoint {
            Endpoint::Bus => self.bus.push(codec::encode(&message), None).map_err(|err| {
                debug!(message = %message, error = %err, "Bus unavailable");
                SinkError::Disconnected(Endpoint::Bus)
            }),
            other => self.core.send(other, message),
        }
    }
}

pub(crate) async fn read_loop(
    shared: Arc<Shared>,
    mut reader: Box<dyn FrameReader>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            frame = reader.read_frame() => match frame {
                Ok(Some(frame)) => {
                    let result = shared.handle_frame(&frame);
                    debug!(result = %result, len = frame.len(), "Handled bus frame");
                }
                Ok(None) => {
                    shared.on_transport_failure(TransportError::ConnectionClosed);
                    break;
                }
                Err(err) => {
                    shared.on_transport_failure(err);
                    break;
                }
            }
        }
    }
    debug!("Bus reader stopped");
}

pub(crate) async fn write_loop(
    shared: Arc<Shared>,
    mut writer: Box<dyn FrameWriter>,
    mut queue: mpsc::UnboundedReceiver<Outbound>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            next = queue.recv() => {
                let Some(Outbound { frame, ack }) = next else {
                    break;
                };
                let result = writer.write_frame(&frame).await;
                let failure = result.as_ref().err().cloned();
                if let Some(ack) = ack {
                    let _ = ack.send(result);
                }
                if let Some(err) = failure {
                    shared.on_transport_failure(err);
                    break;
                }
            }
        }
    }

    queue.close();
    while let Ok(Outbound { ack, .. }) = queue.try_recv() {
        if let Some(ack) = ack {
            let _ = ack.send(Err(TransportError::ConnectionClosed));
        }
    }
    if let Err(err) = writer.close().await {
        warn!(error = %err, "Failed to close bus writer");
    }
    debug!("Bus writer stopped");
}
