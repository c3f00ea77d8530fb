//! Transport adapters implementing the bus ports.

pub mod memory;
pub mod tcp;

pub use memory::{MemoryBusConnector, MemoryBusPeer};
pub use tcp::{TcpBusConfig, TcpBusConnector};
