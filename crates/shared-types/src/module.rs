//! # Functional Module Contract
//!
//! Defines the contract that every pluggable vehicle-function module must
//! implement to receive RPC traffic for its function identifiers.
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! use shared_types::{FunctionalModule, Message, PluginInfo, ProcessResult};
//! use async_trait::async_trait;
//!
//! pub struct ClimateModule { info: PluginInfo }
//!
//! #[async_trait]
//! impl FunctionalModule for ClimateModule {
//!     fn plugin_info(&self) -> &PluginInfo { &self.info }
//!     async fn process_message(&self, message: Message) -> ProcessResult { ProcessResult::Processed }
//!     async fn process_hmi_message(&self, message: Message) -> ProcessResult { ProcessResult::CannotProcess }
//!     fn remove_app_extension(&self, app_id: u32) {}
//!     async fn shutdown(&self) {}
//! }
//! ```

use crate::ids::FunctionId;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Static description of a module and the functions it owns.
///
/// Each function identifier may be owned by at most one registered module;
/// the runtime checks this at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: u32,
    /// Functions owned on the app-facing side.
    pub mobile_function_ids: BTreeSet<FunctionId>,
    /// Functions owned on the HMI-facing side.
    pub hmi_function_ids: BTreeSet<FunctionId>,
}

impl PluginInfo {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            mobile_function_ids: BTreeSet::new(),
            hmi_function_ids: BTreeSet::new(),
        }
    }

    /// Add app-facing functions.
    #[must_use]
    pub fn with_mobile_functions<I, F>(mut self, functions: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FunctionId>,
    {
        self.mobile_function_ids
            .extend(functions.into_iter().map(Into::into));
        self
    }

    /// Add HMI-facing functions.
    #[must_use]
    pub fn with_hmi_functions<I, F>(mut self, functions: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FunctionId>,
    {
        self.hmi_function_ids
            .extend(functions.into_iter().map(Into::into));
        self
    }

    pub fn owns_mobile(&self, function: &FunctionId) -> bool {
        self.mobile_function_ids.contains(function)
    }

    pub fn owns_hmi(&self, function: &FunctionId) -> bool {
        self.hmi_function_ids.contains(function)
    }

    /// Every function the module owns on either side.
    pub fn all_functions(&self) -> BTreeSet<FunctionId> {
        self.mobile_function_ids
            .union(&self.hmi_function_ids)
            .cloned()
            .collect()
    }
}

/// Outcome of handing a message to a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessResult {
    /// The module handled the message.
    Processed,
    /// The message violated the module's protocol; the condition is
    /// observable rather than silently dropped.
    Failed,
    /// The module does not handle this message.
    CannotProcess,
}

impl fmt::Display for ProcessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processed => write!(f, "Processed"),
            Self::Failed => write!(f, "Failed"),
            Self::CannotProcess => write!(f, "CannotProcess"),
        }
    }
}

/// A pluggable unit owning a private transport and a range of functions.
#[async_trait]
pub trait FunctionalModule: Send + Sync {
    /// Name, version and owned functions.
    fn plugin_info(&self) -> &PluginInfo;

    /// Handle a message from the app-facing side.
    async fn process_message(&self, message: Message) -> ProcessResult;

    /// Handle a message from the HMI-facing side.
    async fn process_hmi_message(&self, message: Message) -> ProcessResult;

    /// Forget per-application state for `app_id`.
    fn remove_app_extension(&self, app_id: u32);

    /// Structured teardown: stop readers, cancel subscriptions, fail
    /// pending requests owned by the module.
    async fn shutdown(&self);
}
