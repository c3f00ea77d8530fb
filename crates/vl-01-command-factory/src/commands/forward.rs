//! Generic relay commands used by modules.
//!
//! [`ForwardRequest`] relays a request to another endpoint and the reply
//! back to the requester. [`ForwardNotification`] relays a notification
//! without creating pending state.

use super::exchange::Exchange;
use crate::command::{Command, RequestFailure};
use crate::context::CommandContext;
use crate::error::CommandResult;
use crate::sink::Endpoint;
use shared_bus::EventObserver;
use shared_types::{CorrelationId, FunctionId, Message};
use std::sync::Arc;
use tracing::debug;

/// Callback run with `(request, reply)` before the reply is relayed.
pub type ReplyHook = Arc<dyn Fn(&Message, &Message) + Send + Sync>;

pub struct ForwardRequest {
    exchange: Exchange,
    forward_to: Endpoint,
    on_reply: Option<ReplyHook>,
}

impl ForwardRequest {
    pub fn new(request: Message, ctx: &CommandContext, forward_to: Endpoint, reply_to: Endpoint) -> Self {
        Self {
            exchange: Exchange::new(ctx, request, reply_to),
            forward_to,
            on_reply: None,
        }
    }

    #[must_use]
    pub fn with_reply_hook(mut self, hook: ReplyHook) -> Self {
        self.on_reply = Some(hook);
        self
    }
}

impl EventObserver for ForwardRequest {
    fn on_event(&self, message: &Message) {
        if !self.exchange.claim(self) {
            return;
        }
        if let Some(hook) = &self.on_reply {
            hook(self.exchange.request(), message);
        }
        self.exchange.relay(message);
    }
}

impl Command for ForwardRequest {
    fn function_id(&self) -> &FunctionId {
        self.exchange.request().function_id()
    }

    fn correlation_id(&self) -> Option<CorrelationId> {
        self.exchange.correlation_id()
    }

    fn run(self: Arc<Self>) -> CommandResult<()> {
        self.exchange.begin(&self, self.forward_to)
    }

    fn on_failure(&self, failure: RequestFailure) {
        self.exchange.fail(failure);
    }
}

pub struct ForwardNotification {
    ctx: CommandContext,
    message: Message,
    forward_to: Endpoint,
}

impl ForwardNotification {
    pub fn new(message: Message, ctx: &CommandContext, forward_to: Endpoint) -> Self {
        Self {
            ctx: ctx.clone(),
            message,
            forward_to,
        }
    }
}

impl EventObserver for ForwardNotification {
    fn on_event(&self, message: &Message) {
        debug!(message = %message, "Notification relay ignores events");
    }
}

impl Command for ForwardNotification {
    fn function_id(&self) -> &FunctionId {
        self.message.function_id()
    }

    fn correlation_id(&self) -> Option<CorrelationId> {
        None
    }

    fn run(self: Arc<Self>) -> CommandResult<()> {
        debug!(message = %self.message, endpoint = %self.forward_to, "Relaying notification");
        self.ctx.sink.send(self.forward_to, self.message.clone())?;
        Ok(())
    }

    fn on_failure(&self, _failure: RequestFailure) {}
}
