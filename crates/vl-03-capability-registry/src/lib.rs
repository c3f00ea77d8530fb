//! # Capability Registry (vl-03)
//!
//! Accumulates capability and state facts reported asynchronously by the
//! HMI endpoint.
//!
//! - Each [`CapabilitySlot`] holds either nothing or the latest reported value.
//! - Updates replace the whole value; there is no merge within a slot.
//! - The preload latch starts set and is cleared once by the first
//!   capability-style response.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod registry;
pub mod slots;

pub use registry::CapabilityRegistry;
pub use slots::CapabilitySlot;
