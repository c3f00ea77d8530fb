//! Bus connection lifecycle.
//!
//! ```text
//! Closed ──open──► Opening ──connected──► Opened
//!    ▲                │                     │
//!    └────failed──────┘◄──failure/shutdown──┘
//! ```

use crate::error::{ModuleError, ModuleResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the module's private transport connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Closed,
    Opening,
    Opened,
}

impl ConnectionState {
    /// Validate a move to `to`.
    pub fn transition(self, to: ConnectionState) -> ModuleResult<ConnectionState> {
        use ConnectionState::{Closed, Opened, Opening};
        match (self, to) {
            (Closed, Opening) | (Opening, Opened) | (Opening, Closed) | (Opened, Closed) => Ok(to),
            (from, to) => Err(ModuleError::InvalidState { from, to }),
        }
    }

    pub fn is_open(self) -> bool {
        self == Self::Opened
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Opening => write!(f, "Opening"),
            Self::Opened => write!(f, "Opened"),
        }
    }
}

/// Where an inbound message reached the module from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Inbound {
    /// Read from the private bus connection.
    Bus,
    /// Routed from the HMI side by the runtime.
    Hmi,
}

impl fmt::Display for Inbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "bus"),
            Self::Hmi => write!(f, "HMI"),
        }
    }
}
