//! Outbound ports (SPI) for the CAN bridge.

pub mod transport;

pub use transport::{BusConnector, FrameReader, FrameWriter};
