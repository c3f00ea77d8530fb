//! # Event Keys
//!
//! Composite subscription keys used to route asynchronous replies to the
//! handler waiting for them.
//!
//! A key is the originating function plus, when the waiter knows it, the
//! correlation id. The same numeric id space may be reused per function, so
//! the function part is always present. Keys are derived from a reply in
//! exactly one place ([`EventKey::for_message`]) and commands build theirs
//! with [`EventKey::correlated`], so `subscribe` and `raise` agree.

use serde::{Deserialize, Serialize};
use shared_types::{CorrelationId, FunctionId, Message};
use std::fmt;

/// Subscription key: function identity with an optional correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub function: FunctionId,
    pub correlation_id: Option<CorrelationId>,
}

impl EventKey {
    /// Key matching one specific request of `function`.
    pub fn correlated(function: impl Into<FunctionId>, correlation_id: CorrelationId) -> Self {
        Self {
            function: function.into(),
            correlation_id: Some(correlation_id),
        }
    }

    /// Key matching any reply of `function` (legacy shapes without a usable id).
    pub fn function_only(function: impl Into<FunctionId>) -> Self {
        Self {
            function: function.into(),
            correlation_id: None,
        }
    }

    /// Derive the dispatch key of a reply.
    ///
    /// Returns `None` for requests and notifications, which are never
    /// delivered through the dispatcher.
    pub fn for_message(message: &Message) -> Option<Self> {
        if !message.kind().is_reply() {
            return None;
        }
        Some(Self {
            function: message.function_id().clone(),
            correlation_id: message.correlation_id(),
        })
    }

    /// The function-only key this key falls back to, if it is correlated.
    pub fn fallback(&self) -> Option<Self> {
        self.correlation_id
            .map(|_| Self::function_only(self.function.clone()))
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.correlation_id {
            Some(id) => write!(f, "{}#{}", self.function, id),
            None => write!(f, "{}", self.function),
        }
    }
}
