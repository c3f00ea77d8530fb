//! In-process bus transport.
//!
//! [`pair`] returns a connector for the module and the peer end standing in
//! for the vehicle bus.

use crate::error::TransportError;
use crate::ports::{BusConnector, FrameReader, FrameWriter};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{codec, Message};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

type Channels = (mpsc::UnboundedReceiver<Vec<u8>>, mpsc::UnboundedSender<Vec<u8>>);

/// Create a connected connector/peer pair.
pub fn pair() -> (MemoryBusConnector, MemoryBusPeer) {
    let (to_module, from_peer) = mpsc::unbounded_channel();
    let (to_peer, from_module) = mpsc::unbounded_channel();
    let fail_writes = Arc::new(AtomicBool::new(false));

    let connector = MemoryBusConnector {
        channels: Mutex::new(Some((from_peer, to_peer))),
        fail_writes: Arc::clone(&fail_writes),
    };
    let peer = MemoryBusPeer {
        to_module: Some(to_module),
        from_module,
        fail_writes,
    };
    (connector, peer)
}

/// Connector handing out the module end of a [`pair`]. Connects once.
pub struct MemoryBusConnector {
    channels: Mutex<Option<Channels>>,
    fail_writes: Arc<AtomicBool>,
}

#[async_trait]
impl BusConnector for MemoryBusConnector {
    async fn connect(
        &self,
    ) -> Result<(Box<dyn FrameReader>, Box<dyn FrameWriter>), TransportError> {
        let (inbound, outbound) = self
            .channels
            .lock()
            .take()
            .ok_or(TransportError::NotConnected)?;
        let reader = MemoryFrameReader { inbound };
        let writer = MemoryFrameWriter {
            outbound: Some(outbound),
            fail_writes: Arc::clone(&self.fail_writes),
        };
        Ok((Box::new(reader), Box::new(writer)))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

struct MemoryFrameReader {
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

#[async_trait]
impl FrameReader for MemoryFrameReader {
    async fn read_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.inbound.recv().await)
    }
}

struct MemoryFrameWriter {
    outbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    fail_writes: Arc<AtomicBool>,
}

#[async_trait]
impl FrameWriter for MemoryFrameWriter {
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::Io("write rejected by peer".to_string()));
        }
        let outbound = self.outbound.as_ref().ok_or(TransportError::NotConnected)?;
        outbound
            .send(frame.to_vec())
            .map_err(|_| TransportError::ConnectionClosed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.outbound = None;
        Ok(())
    }
}

/// The bus side of a [`pair`].
pub struct MemoryBusPeer {
    to_module: Option<mpsc::UnboundedSender<Vec<u8>>>,
    from_module: mpsc::UnboundedReceiver<Vec<u8>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryBusPeer {
    /// Push a raw frame towards the module. Returns `false` once the module
    /// side is gone.
    pub fn send_frame(&self, frame: impl Into<Vec<u8>>) -> bool {
        self.to_module
            .as_ref()
            .is_some_and(|tx| tx.send(frame.into()).is_ok())
    }

    pub fn send_message(&self, message: &Message) -> bool {
        self.send_frame(codec::encode(message))
    }

    /// Next frame written by the module; `None` once its writer closed.
    pub async fn recv_frame(&mut self) -> Option<Vec<u8>> {
        self.from_module.recv().await
    }

    /// Next frame written by the module, decoded. Undecodable frames are
    /// skipped.
    pub async fn recv_message(&mut self) -> Option<Message> {
        while let Some(frame) = self.recv_frame().await {
            if let Ok(message) = codec::decode(&frame) {
                return Some(message);
            }
        }
        None
    }

    /// Make every subsequent module write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Close the bus from the peer side; the module reader sees end of stream.
    pub fn disconnect(&mut self) {
        self.to_module = None;
    }
}
