//! Cross-crate integration scenarios.

pub mod can_bridge;
pub mod classification;
pub mod correlation;
pub mod modules;
pub mod timeouts;
