//! # CAN Bridge Module (vl-04)
//!
//! A pluggable functional module that owns a private connection to the
//! vehicle CAN gateway. App requests for the radio and access functions are
//! relayed to the bus; replies read from the bus are raised on the shared
//! event dispatcher and reach the waiting request's command.
//!
//! ## Architecture
//!
//! - `domain`: connection lifecycle and the owned function catalog
//! - `ports`: the bus transport contract
//! - `adapters`: TCP and in-memory transports
//! - `service`: [`CanModule`], the [`shared_types::FunctionalModule`]
//!   implementation
//!
//! ## Teardown
//!
//! `shutdown` stops the reader and writer tasks, then cancels the module's
//! dispatcher subscriptions, then aborts its pending requests.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{memory, MemoryBusConnector, MemoryBusPeer, TcpBusConfig, TcpBusConnector};
pub use domain::{plugin_info, ConnectionState, Inbound, PLUGIN_NAME, PLUGIN_VERSION};
pub use error::{ModuleError, ModuleResult, TransportError};
pub use ports::{BusConnector, FrameReader, FrameWriter};
pub use service::{CanModule, CanModuleConfig};
