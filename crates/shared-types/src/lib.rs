//! # Shared Types Crate
//!
//! Message model, wire codec and module contract shared by every
//! Vehicle-Link crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the [`Message`] type is the only in-memory
//!   representation of RPC traffic. Nothing downstream of the codec ever
//!   sees raw JSON.
//! - **Validated at the Boundary**: [`codec::decode`] classifies and
//!   validates; a malformed message is rejected before dispatch.
//! - **Opaque Escape Hatch**: payloads the core only forwards stay
//!   `serde_json` documents; payloads the core inspects have a typed
//!   schema in [`schema`].

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod codec;
pub mod errors;
pub mod ids;
pub mod message;
pub mod module;
pub mod schema;

pub use codec::{decode, decode_value, encode, to_value};
pub use errors::{MessageError, MessageResult};
pub use ids::{functions, CorrelationId, FunctionId};
pub use message::{Message, MessageKind, Payload, ProtocolVersion};
pub use module::{FunctionalModule, PluginInfo, ProcessResult};
pub use schema::{
    language_name, GetSystemInfoResult, HmiCapabilityFlags, ResultBody, ResultCode,
    SystemCapabilities, UiCapabilitiesResult,
};
