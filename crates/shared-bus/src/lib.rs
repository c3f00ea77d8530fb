//! # Shared Bus - Event Dispatcher for Reply Correlation
//!
//! Routes asynchronous replies (responses and error responses) to the one
//! command instance waiting for them.
//!
//! ## Delivery Rules
//!
//! - **One-shot:** a subscription is removed before its observer runs
//! - **At most one observer per key:** duplicates are rejected by default
//! - **Unmatched is benign:** `raise` returns `false`, never an error
//!
//! ```text
//! ┌──────────────┐   subscribe(key)   ┌──────────────────┐
//! │   Command    │ ─────────────────► │ Event Dispatcher │
//! │  (waiting)   │ ◄───────────────── │                  │ ◄── raise(reply)
//! └──────────────┘   on_event(reply)  └──────────────────┘
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod dispatcher;
pub mod events;
pub mod subscriber;

// Re-export main types
pub use dispatcher::{DispatcherStats, EventDispatcher};
pub use events::EventKey;
pub use subscriber::{DuplicatePolicy, EventObserver, SubscriptionError};
