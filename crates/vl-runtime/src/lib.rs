//! # Vehicle-Link Runtime Library
//!
//! Assembles the dispatch core. The `vl-runtime` binary in `main.rs` is a
//! thin process wrapper around [`CoreRuntime`].
//!
//! - `container/` - configuration loading and validation
//! - `registry/` - functional module registration and routing
//! - `runtime` - the `dispatch` pipeline and sweeper lifecycle

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod container;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod runtime;
pub mod sink;

pub use container::{CanModuleSettings, ConfigError, DispatcherConfig, RuntimeConfig, TimeoutConfig};
pub use dispatch::{DispatchOutcome, Source};
pub use error::{RuntimeError, RuntimeResult};
pub use registry::{ModuleRegistry, RegistryError};
pub use runtime::{CoreRuntime, CORE_OWNER};
pub use sink::LoggingSink;
