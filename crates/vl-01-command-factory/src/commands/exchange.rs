//! Request/reply bookkeeping shared by the correlated commands.
//!
//! `begin` subscribes for the reply, registers the pending request and
//! forwards the request, rolling back whichever step succeeded if a later
//! one fails. `claim` retires the pending entry when the reply arrives and
//! tells the command whether it may act on it.

use crate::command::{is_same_command, Command, RequestFailure};
use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult};
use crate::sink::Endpoint;
use shared_bus::{EventKey, EventObserver};
use shared_types::{CorrelationId, Message, ResultCode};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub(crate) struct Exchange {
    ctx: CommandContext,
    request: Message,
    reply_to: Endpoint,
}

impl Exchange {
    pub(crate) fn new(ctx: &CommandContext, request: Message, reply_to: Endpoint) -> Self {
        Self {
            ctx: ctx.clone(),
            request,
            reply_to,
        }
    }

    pub(crate) fn ctx(&self) -> &CommandContext {
        &self.ctx
    }

    pub(crate) fn request(&self) -> &Message {
        &self.request
    }

    pub(crate) fn correlation_id(&self) -> Option<CorrelationId> {
        self.request.correlation_id()
    }

    fn key(&self, id: CorrelationId) -> EventKey {
        EventKey::correlated(self.request.function_id().clone(), id)
    }

    /// Register, subscribe and forward the request to `forward_to`.
    pub(crate) fn begin<C>(&self, command: &Arc<C>, forward_to: Endpoint) -> CommandResult<()>
    where
        C: Command + 'static,
    {
        let function = self.request.function_id();
        let id = self
            .correlation_id()
            .ok_or_else(|| CommandError::MissingCorrelationId(function.clone()))?;
        let timeout = self.ctx.timeouts.timeout_for(function);

        // The subscription must exist before the sweeper can see the entry.
        let key = self.key(id);
        let observer: Arc<dyn EventObserver> = Arc::clone(command) as Arc<dyn EventObserver>;
        if let Err(err) = self.ctx.dispatcher.subscribe(key.clone(), observer) {
            self.reply_error(id, ResultCode::INVALID_ID, &err.to_string());
            return Err(err.into());
        }

        let handler: Arc<dyn Command> = Arc::clone(command) as Arc<dyn Command>;
        if let Err(err) = self.ctx.controller.add(id, handler, timeout) {
            self.ctx.dispatcher.unsubscribe(&key);
            self.reply_error(id, ResultCode::INVALID_ID, &err.to_string());
            return Err(err.into());
        }

        if let Err(err) = self.ctx.sink.send(forward_to, self.request.clone()) {
            // None: the sweeper expired it first and on_failure replied.
            if self.ctx.controller.cancel(id).is_some() {
                self.ctx.dispatcher.unsubscribe(&key);
                self.reply_error(id, ResultCode::GENERIC_ERROR, &err.to_string());
            }
            return Err(err.into());
        }

        debug!(
            correlation_id = %id,
            function = %function,
            endpoint = %forward_to,
            timeout_ms = timeout.as_millis(),
            "Forwarded request awaiting reply"
        );
        Ok(())
    }

    /// Retire the pending entry for an arrived reply.
    ///
    /// Returns `false` when the request already timed out or was aborted,
    /// or when the entry belongs to a different command; the reply must
    /// then be ignored.
    pub(crate) fn claim<C: Command>(&self, command: &C) -> bool {
        let Some(id) = self.correlation_id() else {
            return false;
        };

        let Some(handler) = self.ctx.controller.complete(id) else {
            warn!(
                correlation_id = %id,
                function = %self.request.function_id(),
                "Reply arrived after the request was retired"
            );
            return false;
        };

        let same = is_same_command(&handler, command);
        if !same {
            error!(
                correlation_id = %id,
                function = %self.request.function_id(),
                "Pending entry belongs to another command; dropping it"
            );
            debug_assert!(same, "pending entry and subscription disagree for {id}");
        }
        same
    }

    /// Pass `reply` through to the requester.
    pub(crate) fn relay(&self, reply: &Message) {
        self.send_reply(reply.clone());
    }

    /// Cancel the subscription and report `failure` to the requester.
    pub(crate) fn fail(&self, failure: RequestFailure) {
        let Some(id) = self.correlation_id() else {
            return;
        };
        self.ctx.dispatcher.unsubscribe(&self.key(id));
        warn!(
            correlation_id = %id,
            function = %self.request.function_id(),
            failure = %failure,
            "Request failed without reply"
        );
        self.reply_error(id, failure.result_code(), &failure.to_string());
    }

    fn reply_error(&self, id: CorrelationId, code: ResultCode, text: &str) {
        let reply = Message::error_response(self.request.function_id().clone(), id, code, text);
        self.send_reply(reply);
    }

    fn send_reply(&self, reply: Message) {
        if let Err(err) = self.ctx.sink.send(self.reply_to, reply) {
            warn!(
                function = %self.request.function_id(),
                endpoint = %self.reply_to,
                error = %err,
                "Failed to deliver reply"
            );
        }
    }
}
