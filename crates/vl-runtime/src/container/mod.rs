//! Runtime configuration.

pub mod config;

pub use config::{
    CanModuleSettings, ConfigError, DispatcherConfig, RuntimeConfig, TimeoutConfig,
};
