//! Domain layer: connection lifecycle and the module's function catalog.

pub mod connection;
pub mod functions;

pub use connection::{ConnectionState, Inbound};
pub use functions::{plugin_info, PLUGIN_NAME, PLUGIN_VERSION};
