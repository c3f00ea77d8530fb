//! # Event Subscriber
//!
//! Defines the subscription side of the event dispatcher.

use crate::events::EventKey;
use serde::{Deserialize, Serialize};
use shared_types::Message;
use thiserror::Error;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// A live subscription already exists for the key.
    #[error("Duplicate subscription for key {key}")]
    DuplicateKey { key: EventKey },
}

/// What `subscribe` does when the key already has a live subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail with [`SubscriptionError::DuplicateKey`].
    #[default]
    Reject,
    /// Drop the previous observer and install the new one.
    Replace,
}

/// Receiver of a one-shot event.
///
/// Invoked synchronously on the thread that raised the event, which may be
/// a transport's sole reader. Implementations must not block.
pub trait EventObserver: Send + Sync {
    /// Deliver the reply that matched this observer's key.
    fn on_event(&self, message: &Message);
}

impl<F> EventObserver for F
where
    F: Fn(&Message) + Send + Sync,
{
    fn on_event(&self, message: &Message) {
        self(message)
    }
}
