//! Runtime error type.

use crate::container::ConfigError;
use crate::registry::RegistryError;
use thiserror::Error;
use vl_01_command_factory::FactoryError;

/// Errors raised while assembling or driving the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Command registration failed: {0}")]
    Factory(#[from] FactoryError),

    #[error("Module registration failed: {0}")]
    Registry(#[from] RegistryError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
