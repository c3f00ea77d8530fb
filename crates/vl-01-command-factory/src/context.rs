//! Shared collaborators handed to every command.

use crate::command::PendingCommands;
use crate::sink::MessageSink;
use shared_bus::EventDispatcher;
use shared_types::FunctionId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use vl_03_capability_registry::CapabilityRegistry;

/// Per-function request timeouts.
///
/// A command reads its timeout from here when it registers with the
/// request controller. Functions without an override use the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutPolicy {
    default: Duration,
    overrides: HashMap<FunctionId, Duration>,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl TimeoutPolicy {
    pub fn new(default: Duration) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_override(mut self, function: impl Into<FunctionId>, timeout: Duration) -> Self {
        self.overrides.insert(function.into(), timeout);
        self
    }

    pub fn timeout_for(&self, function: &FunctionId) -> Duration {
        self.overrides.get(function).copied().unwrap_or(self.default)
    }

    pub fn default_timeout(&self) -> Duration {
        self.default
    }
}

/// Explicitly constructed collaborators shared by all commands.
#[derive(Clone)]
pub struct CommandContext {
    pub controller: Arc<PendingCommands>,
    pub dispatcher: Arc<EventDispatcher>,
    pub capabilities: Arc<CapabilityRegistry>,
    pub sink: Arc<dyn MessageSink>,
    pub timeouts: Arc<TimeoutPolicy>,
}

impl CommandContext {
    pub fn new(
        controller: Arc<PendingCommands>,
        dispatcher: Arc<EventDispatcher>,
        capabilities: Arc<CapabilityRegistry>,
        sink: Arc<dyn MessageSink>,
        timeouts: TimeoutPolicy,
    ) -> Self {
        Self {
            controller,
            dispatcher,
            capabilities,
            sink,
            timeouts: Arc::new(timeouts),
        }
    }

    /// Same collaborators with a different outbound sink.
    ///
    /// Modules use this to route [`crate::Endpoint::Bus`] to their own
    /// transport while sharing the controller and dispatcher.
    #[must_use]
    pub fn with_sink(&self, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            sink,
            ..self.clone()
        }
    }
}
