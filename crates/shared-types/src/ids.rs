//! Identifier newtypes for RPC traffic.
//!
//! A [`CorrelationId`] is chosen by the requester and links a request to its
//! eventual response. A [`FunctionId`] names the RPC operation.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Requester-chosen correlation identifier.
///
/// Unique only while the request is pending; the same numeric value may be
/// reused once the previous request has completed or timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(u32);

impl CorrelationId {
    /// Wrap a raw wire value.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw wire value.
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CorrelationId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<CorrelationId> for u32 {
    fn from(id: CorrelationId) -> Self {
        id.0
    }
}

/// Name of an RPC operation, e.g. `GetSystemInfo` or `UI.GetCapabilities`.
///
/// Dotted names carry the interface prefix used on the HMI side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(String);

impl FunctionId {
    /// Create a function identifier from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The function name as it appears on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interface prefix of a dotted name (`UI` for `UI.GetCapabilities`).
    pub fn interface(&self) -> Option<&str> {
        self.0.split_once('.').map(|(prefix, _)| prefix)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FunctionId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for FunctionId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for FunctionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FunctionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Function names used by the built-in commands.
pub mod functions {
    /// System information query answered by the HMI.
    pub const GET_SYSTEM_INFO: &str = "GetSystemInfo";
    /// UI capability query answered by the HMI.
    pub const UI_GET_CAPABILITIES: &str = "UI.GetCapabilities";
}
