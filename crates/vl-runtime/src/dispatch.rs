//! Dispatch inputs and outcomes.

use std::fmt;

/// Side an inbound message arrived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// The mobile application.
    Upstream,
    /// The vehicle HMI.
    Downstream,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream => write!(f, "upstream"),
            Self::Downstream => write!(f, "downstream"),
        }
    }
}

/// What the runtime did with one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A core command ran.
    Executed,
    /// Handed to the named module.
    RoutedToModule(String),
    /// A reply reached its waiting handler.
    Delivered,
    /// A reply matched no subscription and was dropped.
    Unmatched,
    /// No command and no module handles the function.
    UnknownFunction,
    /// The message or its handler failed.
    Rejected(String),
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(
            self,
            Self::Executed | Self::RoutedToModule(_) | Self::Delivered
        )
    }
}
