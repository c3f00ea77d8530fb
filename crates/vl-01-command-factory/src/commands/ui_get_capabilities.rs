//! `UI.GetCapabilities`: forwarded to the HMI; the reply fills the display,
//! audio, navigation, phone and video-streaming slots.

use super::exchange::Exchange;
use crate::command::{Command, RequestFailure};
use crate::context::CommandContext;
use crate::error::CommandResult;
use crate::sink::Endpoint;
use shared_bus::EventObserver;
use shared_types::{CorrelationId, FunctionId, Message, MessageKind, UiCapabilitiesResult};
use std::sync::Arc;
use tracing::{debug, warn};
use vl_03_capability_registry::{CapabilityRegistry, CapabilitySlot};

pub struct UiGetCapabilities {
    exchange: Exchange,
}

impl UiGetCapabilities {
    pub fn new(request: Message, ctx: &CommandContext) -> Self {
        Self {
            exchange: Exchange::new(ctx, request, Endpoint::Upstream),
        }
    }

    pub fn create(request: Message, ctx: &CommandContext) -> Arc<dyn Command> {
        Arc::new(Self::new(request, ctx))
    }
}

fn store_capabilities(registry: &CapabilityRegistry, caps: UiCapabilitiesResult) {
    let audio = caps.audio_pass_thru_list();
    let mut stored = 0usize;
    let mut put = |slot, value: Option<serde_json::Value>| {
        if let Some(value) = value {
            registry.update(slot, value);
            stored += 1;
        }
    };

    put(CapabilitySlot::Display, caps.display_capabilities);
    put(CapabilitySlot::HmiZone, caps.hmi_zone_capabilities);
    put(CapabilitySlot::SoftButton, caps.soft_button_capabilities);
    put(CapabilitySlot::AudioPassThru, audio);

    if let Some(flags) = caps.hmi_capabilities {
        put(CapabilitySlot::NavigationSupported, flags.navigation.map(Into::into));
        put(CapabilitySlot::PhoneCallSupported, flags.phone_call.map(Into::into));
        put(CapabilitySlot::VideoStreamingSupported, flags.video_streaming.map(Into::into));
    }

    if let Some(system) = caps.system_capabilities {
        put(CapabilitySlot::NavigationCapability, system.navigation_capability);
        put(CapabilitySlot::PhoneCapability, system.phone_capability);
        put(CapabilitySlot::VideoStreamingCapability, system.video_streaming_capability);
        put(CapabilitySlot::SystemDisplayCapabilities, system.display_capabilities);
    }

    debug!(slots = stored, "Stored UI capabilities");
}

impl EventObserver for UiGetCapabilities {
    fn on_event(&self, message: &Message) {
        if !self.exchange.claim(self) {
            return;
        }
        if message.kind() == MessageKind::Response {
            let registry = &self.exchange.ctx().capabilities;
            registry.clear_preloaded();
            match message.parse_payload::<UiCapabilitiesResult>() {
                Ok(caps) => store_capabilities(registry, caps),
                Err(err) => warn!(error = %err, "Ignoring invalid UI capabilities payload"),
            }
        }
        self.exchange.relay(message);
    }
}

impl Command for UiGetCapabilities {
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
