//! # Request Controller (vl-02)
//!
//! Owns the set of in-flight outbound requests, indexed by correlation id,
//! and reclaims requests whose deadline passed.
//!
//! ## Guarantees
//!
//! | Operation | Behavior |
//! |-----------|----------|
//! | `add` | Rejects an id that is already pending; the original entry is kept |
//! | `complete` | Atomic remove; `None` for unknown, completed or expired ids |
//! | `sweep(now)` | Atomic remove of every entry with `deadline <= now` |
//!
//! For a single id, `complete` and `sweep` race through the same removal,
//! so exactly one of them observes the entry. A swept request can never be
//! completed afterwards.
//!
//! The controller is generic over the handler type; the command layer
//! stores `Arc<dyn Command>` here.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod controller;
pub mod error;
pub mod sweeper;

pub use controller::{ControllerStats, RequestController, Ticket};
pub use error::{ControllerError, ControllerResult};
pub use sweeper::{spawn_sweeper, MIN_SWEEP_INTERVAL};
