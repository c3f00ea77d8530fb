//! Command Factory.
//!
//! Maps `(function, kind)` to a constructor for the right command variant.
//! New operations are added by registering a constructor; the factory
//! itself never changes.

use crate::command::Command;
use crate::commands::register_builtin_commands;
use crate::context::CommandContext;
use crate::error::FactoryError;
use shared_types::{FunctionId, Message, MessageKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Builds a command instance for one message.
pub type CommandConstructor =
    Box<dyn Fn(Message, &CommandContext) -> Arc<dyn Command> + Send + Sync>;

/// Registration table of command constructors.
pub struct CommandFactory {
    context: CommandContext,
    constructors: HashMap<(FunctionId, MessageKind), CommandConstructor>,
}

impl CommandFactory {
    /// Empty factory.
    pub fn new(context: CommandContext) -> Self {
        Self {
            context,
            constructors: HashMap::new(),
        }
    }

    /// Factory with the core's own commands registered.
    pub fn with_builtin_commands(context: CommandContext) -> Result<Self, FactoryError> {
        let mut factory = Self::new(context);
        register_builtin_commands(&mut factory)?;
        Ok(factory)
    }

    /// Register a constructor for `(function, kind)`.
    pub fn register<F>(
        &mut self,
        function: impl Into<FunctionId>,
        kind: MessageKind,
        constructor: F,
    ) -> Result<(), FactoryError>
    where
        F: Fn(Message, &CommandContext) -> Arc<dyn Command> + Send + Sync + 'static,
    {
        let function = function.into();
        let key = (function.clone(), kind);
        if self.constructors.contains_key(&key) {
            return Err(FactoryError::AlreadyRegistered { function, kind });
        }
        debug!(function = %function, kind = %kind, "Registered command");
        self.constructors.insert(key, Box::new(constructor));
        Ok(())
    }

    /// Build the command registered for the message's function and kind.
    ///
    /// `None` means nothing is registered; the caller drops the message.
    pub fn create(&self, message: &Message) -> Option<Arc<dyn Command>> {
        let key = (message.function_id().clone(), message.kind());
        let constructor = self.constructors.get(&key)?;
        Some(constructor(message.clone(), &self.context))
    }

    pub fn is_registered(&self, function: &FunctionId, kind: MessageKind) -> bool {
        self.constructors.contains_key(&(function.clone(), kind))
    }

    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}
