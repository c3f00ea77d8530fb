//! # Vehicle-Link Test Suite
//!
//! Unified test crate for scenarios that cross crate boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── dispatch_benchmarks.rs   # controller, dispatcher and runtime hot paths
//! └── src/integration/
//!     ├── classification.rs        # wire decoding into the four kinds
//!     ├── correlation.rs           # request → reply through the runtime
//!     ├── timeouts.rs              # sweeper-driven expiry and shutdown
//!     ├── modules.rs               # module registration and routing
//!     └── can_bridge.rs            # CAN module behind the runtime
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p vl-tests
//!
//! # One scenario group
//! cargo test -p vl-tests integration::can_bridge::
//!
//! # Benchmarks
//! cargo bench -p vl-tests
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
