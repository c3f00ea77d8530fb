//! # Event Dispatcher
//!
//! One-shot keyed subscriptions. A raised event is delivered to at most one
//! observer, which is removed from the table before it is invoked.
//!
//! ```text
//!   command ── subscribe(key) ──► ┌──────────────────┐
//!                                 │ EventDispatcher  │
//!   reply  ───── raise(key) ────► │  key → observer  │ ──► observer.on_event()
//!                                 └──────────────────┘      (lock released)
//! ```

use crate::events::EventKey;
use crate::subscriber::{DuplicatePolicy, EventObserver, SubscriptionError};
use parking_lot::Mutex;
use shared_types::{FunctionId, Message};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Statistics for the dispatcher.
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Subscriptions installed
    pub total_subscribed: AtomicU64,
    /// Subscriptions that displaced a live one under `Replace`
    pub total_replaced: AtomicU64,
    /// Events delivered to an observer
    pub total_delivered: AtomicU64,
    /// Events raised with no matching subscription
    pub total_unmatched: AtomicU64,
    /// Subscriptions removed by `unsubscribe`
    pub total_cancelled: AtomicU64,
}

/// Publish/subscribe registry keyed by [`EventKey`].
pub struct EventDispatcher {
    subscriptions: Mutex<HashMap<EventKey, Arc<dyn EventObserver>>>,
    policy: DuplicatePolicy,
    stats: DispatcherStats,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher {
    /// Create a dispatcher that rejects duplicate keys.
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::Reject)
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            subscriptions: Mutex::new(HashMap::new()),
            policy,
            stats: DispatcherStats::default(),
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Register `observer` for exactly one event under `key`.
    pub fn subscribe(
        &self,
        key: EventKey,
        observer: Arc<dyn EventObserver>,
    ) -> Result<(), SubscriptionError> {
        let mut subscriptions = self.subscriptions.lock();

        if subscriptions.contains_key(&key) {
            match self.policy {
                DuplicatePolicy::Reject => {
                    warn!(key = %key, "Rejected duplicate subscription");
                    return Err(SubscriptionError::DuplicateKey { key });
                }
                DuplicatePolicy::Replace => {
                    warn!(key = %key, "Replacing live subscription");
                    self.stats.total_replaced.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        debug!(key = %key, "Subscribed");
        subscriptions.insert(key, observer);
        self.stats.total_subscribed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Deliver `message` to the observer registered under `key`.
    ///
    /// A correlated key that has no exact match falls back to the
    /// function-only key. The subscription is removed before the observer
    /// runs, so the observer may subscribe again. Returns whether a
    /// subscriber was found.
    pub fn raise(&self, key: &EventKey, message: &Message) -> bool {
        let observer = {
            let mut subscriptions = self.subscriptions.lock();
            subscriptions.remove(key).or_else(|| {
                key.fallback()
                    .and_then(|fallback| subscriptions.remove(&fallback))
            })
        };

        match observer {
            Some(observer) => {
                self.stats.total_delivered.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Delivering event");
                observer.on_event(message);
                true
            }
            None => {
                self.stats.total_unmatched.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, "No subscriber for event");
                false
            }
        }
    }

    /// Derive the key of a reply and raise it.
    ///
    /// Requests and notifications have no key and return `false`.
    pub fn raise_message(&self, message: &Message) -> bool {
        match EventKey::for_message(message) {
            Some(key) => self.raise(&key, message),
            None => {
                debug!(message = %message, "Not a reply, nothing to raise");
                false
            }
        }
    }

    /// Cancel the subscription under `key`. Returns whether one existed.
    pub fn unsubscribe(&self, key: &EventKey) -> bool {
        let removed = self.subscriptions.lock().remove(key).is_some();
        if removed {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Unsubscribed");
        }
        removed
    }

    /// Cancel every subscription whose function is in `functions`.
    ///
    /// Used when a module that owns those functions is torn down.
    pub fn unsubscribe_functions(&self, functions: &BTreeSet<FunctionId>) -> usize {
        let mut subscriptions = self.subscriptions.lock();
        let before = subscriptions.len();
        subscriptions.retain(|key, _| !functions.contains(&key.function));
        let removed = before - subscriptions.len();
        drop(subscriptions);

        if removed > 0 {
            self.stats
                .total_cancelled
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed = removed, "Cancelled subscriptions for functions");
        }
        removed
    }

    pub fn is_subscribed(&self, key: &EventKey) -> bool {
        self.subscriptions.lock().contains_key(key)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    pub fn stats(&self) -> &DispatcherStats {
        &self.stats
    }
}
