//! `GetSystemInfo`: forwarded to the HMI; the reply updates the system
//! info slots and clears the preload latch.

use super::exchange::Exchange;
use crate::command::{Command, RequestFailure};
use crate::context::CommandContext;
use crate::error::CommandResult;
use crate::sink::Endpoint;
use shared_bus::EventObserver;
use shared_types::{CorrelationId, FunctionId, GetSystemInfoResult, Message, MessageKind};
use std::sync::Arc;
use tracing::{debug, warn};
use vl_03_capability_registry::{CapabilityRegistry, CapabilitySlot};

pub struct GetSystemInfo {
    exchange: Exchange,
}

impl GetSystemInfo {
    pub fn new(request: Message, ctx: &CommandContext) -> Self {
        Self {
            exchange: Exchange::new(ctx, request, Endpoint::Upstream),
        }
    }

    pub fn create(request: Message, ctx: &CommandContext) -> Arc<dyn Command> {
        Arc::new(Self::new(request, ctx))
    }

    fn apply(&self, reply: &Message) {
        let registry = &self.exchange.ctx().capabilities;

        // Any GetSystemInfo response clears the latch, whatever its code.
        registry.clear_preloaded();

        match reply.parse_payload::<GetSystemInfoResult>() {
            Ok(info) if info.code.is_success() => store_system_info(registry, &info),
            Ok(info) => {
                warn!(code = %info.code, "GetSystemInfo returned an error code");
            }
            Err(err) => {
                warn!(error = %err, "Ignoring invalid GetSystemInfo payload");
            }
        }
    }
}

fn store_system_info(registry: &CapabilityRegistry, info: &GetSystemInfoResult) {
    if let Some(version) = &info.ccpu_version {
        registry.set_ccpu_version(version.clone());
    }
    if let Some(country) = &info.wers_country_code {
        registry.update(CapabilitySlot::WersCountryCode, country.clone().into());
    }
    if let Some(language) = info.language_name() {
        registry.update(CapabilitySlot::Language, language.into());
    }
    debug!(
        ccpu_version = info.ccpu_version.as_deref().unwrap_or_default(),
        "Stored system info"
    );
}

impl EventObserver for GetSystemInfo {
    fn on_event(&self, message: &Message) {
        if !self.exchange.claim(self) {
            return;
        }
        if message.kind() == MessageKind::Response {
            self.apply(message);
        }
        self.exchange.relay(message);
    }
}

impl Command for GetSystemInfo {
    fn function_id(&self) -> &FunctionId {
        self.exchange.request().function_id()
    }

    fn correlation_id(&self) -> Option<CorrelationId> {
        self.exchange.correlation_id()
    }

    fn run(self: Arc<Self>) -> CommandResult<()> {
        self.exchange.begin(&self, Endpoint::Downstream)
    }

    fn on_failure(&self, failure: RequestFailure) {
        self.exchange.fail(failure);
    }
}
