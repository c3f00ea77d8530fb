//! Bus transport contract.
//!
//! A connector opens the private bus and splits it into a reader half,
//! owned by the "from bus" task, and a writer half, owned by the "to bus"
//! task. Frames are complete serialized messages without delimiters.

use crate::error::TransportError;
use async_trait::async_trait;

/// Opens the private bus connection.
#[async_trait]
pub trait BusConnector: Send + Sync {
    async fn connect(&self)
        -> Result<(Box<dyn FrameReader>, Box<dyn FrameWriter>), TransportError>;

    /// Human-readable peer description for logs.
    fn describe(&self) -> String;
}

/// Reading half of a bus connection.
#[async_trait]
pub trait FrameReader: Send {
    /// Wait for the next frame. `Ok(None)` means the peer closed the
    /// connection.
    async fn read_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}

/// Writing half of a bus connection.
#[async_trait]
pub trait FrameWriter: Send {
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Flush and close the write side.
    async fn close(&mut self) -> Result<(), TransportError>;
}
