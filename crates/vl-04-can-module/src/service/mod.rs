//! # CAN Bridge Service
//!
//! Owns the private bus connection and relays traffic between the app
//! side, the HMI side and the vehicle bus.
//!
//! ```text
//! app request ──► ForwardRequest ──► queue ──► [to bus] ──► bus
//!                                                            │
//! app ◄── relay ◄── dispatcher.raise ◄── handle_frame ◄── [from bus]
//! ```

mod bus;

use crate::adapters::{TcpBusConfig, TcpBusConnector};
use crate::domain::functions::{
    APP_ID_FIELD, CANCEL_ACCESS, GRANT_ACCESS, START_SCAN, STOP_SCAN,
};
use crate::domain::{plugin_info, ConnectionState, Inbound};
use crate::error::{ModuleError, ModuleResult, TransportError};
use crate::ports::BusConnector;
use async_trait::async_trait;
use bus::{BusQueue, ModuleSink};
use parking_lot::Mutex;
use serde_json::Value;
use shared_types::{codec, FunctionalModule, Message, MessageKind, PluginInfo, ProcessResult};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use vl_01_command_factory::{
    Command, CommandContext, Endpoint, ForwardNotification, ForwardRequest, ReplyHook,
    RequestFailure,
};

/// Module settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanModuleConfig {
    /// Timeout applied to every request relayed to the bus.
    pub request_timeout: Duration,
}

impl Default for CanModuleConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// State shared between the module handle and its bus tasks.
pub(crate) struct Shared {
    info: PluginInfo,
    ctx: CommandContext,
    state: watch::Sender<ConnectionState>,
    shutdown: watch::Sender<bool>,
    bus: Arc<BusQueue>,
    scan_started: AtomicBool,
    access_grants: Mutex<BTreeSet<u32>>,
}

struct BusTasks {
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

/// The CAN-bus bridge.
pub struct CanModule {
    shared: Arc<Shared>,
    connector: Box<dyn BusConnector>,
    tasks: Mutex<Option<BusTasks>>,
}

impl CanModule {
    /// Build the module on the core's collaborators.
    ///
    /// The module shares the core's controller, dispatcher and capability
    /// registry; its sink routes [`Endpoint::Bus`] to its own transport.
    pub fn new(ctx: &CommandContext, connector: Box<dyn BusConnector>, config: CanModuleConfig) -> Self {
        let info = plugin_info();
        let bus = Arc::new(BusQueue::default());
        let sink = Arc::new(ModuleSink {
            core: Arc::clone(&ctx.sink),
            bus: Arc::clone(&bus),
        });

        let mut ctx = ctx.with_sink(sink);
        let timeouts = info
            .mobile_function_ids
            .iter()
            .fold((*ctx.timeouts).clone(), |policy, function| {
                policy.with_override(function.clone(), config.request_timeout)
            });
        ctx.timeouts = Arc::new(timeouts);

        let (state, _) = watch::channel(ConnectionState::Closed);
        let (shutdown, _) = watch::channel(false);

        Self {
            shared: Arc::new(Shared {
                info,
                ctx,
                state,
                shutdown,
                bus,
                scan_started: AtomicBool::new(false),
                access_grants: Mutex::new(BTreeSet::new()),
            }),
            connector,
            tasks: Mutex::new(None),
        }
    }

    /// Module talking newline-delimited JSON over TCP.
    pub fn tcp(ctx: &CommandContext, bus: TcpBusConfig, config: CanModuleConfig) -> Self {
        Self::new(ctx, Box::new(TcpBusConnector::new(bus)), config)
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Observe connection state changes, including failures detected by
    /// the bus tasks.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    pub fn is_scan_started(&self) -> bool {
        self.shared.scan_started.load(Ordering::SeqCst)
    }

    pub fn set_scan_started(&self, started: bool) {
        self.shared.set_scan_started(started);
    }

    /// Whether `app_id` holds a granted access right.
    pub fn has_access(&self, app_id: u32) -> bool {
        self.shared.access_grants.lock().contains(&app_id)
    }

    /// Connect the bus and start the reader and writer tasks.
    pub async fn open(&self) -> ModuleResult<()> {
        self.shared.transition(ConnectionState::Opening)?;

        let (reader, writer) = match self.connector.connect().await {
            Ok(halves) => halves,
            Err(err) => {
                self.shared.mark_closed();
                vl_telemetry::TRANSPORT_FAILURES.inc();
                error!(peer = %self.connector.describe(), error = %err, "Failed to open CAN bus");
                return Err(err.into());
            }
        };

        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        self.shared.bus.install(queue_tx);
        self.shared.shutdown.send_replace(false);
        if let Err(err) = self.shared.transition(ConnectionState::Opened) {
            self.shared.bus.close();
            return Err(err);
        }

        let reader = tokio::spawn(bus::read_loop(
            Arc::clone(&self.shared),
            reader,
            self.shared.shutdown.subscribe(),
        ));
        let writer = tokio::spawn(bus::write_loop(
            Arc::clone(&self.shared),
            writer,
            queue_rx,
            self.shared.shutdown.subscribe(),
        ));
        *self.tasks.lock() = Some(BusTasks { reader, writer });

        info!(peer = %self.connector.describe(), "CAN bus opened");
        Ok(())
    }

    /// Write a serialized message to the bus and wait for the write result.
    ///
    /// Failed writes are reported, not retried.
    pub async fn send_to_bus(&self, frame: Vec<u8>) -> ModuleResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.shared.bus.push(frame, Some(ack_tx))?;
        let written = ack_rx.await.map_err(|_| TransportError::ConnectionClosed)?;
        written?;
        Ok(())
    }

    /// Classify and handle one raw frame read from the bus.
    pub fn handle_frame(&self, frame: &[u8]) -> ProcessResult {
        self.shared.handle_frame(frame)
    }

    fn reply_hook(&self) -> ReplyHook {
        let shared = Arc::downgrade(&self.shared);
        Arc::new(move |request: &Message, reply: &Message| {
            if let Some(shared) = shared.upgrade() {
                shared.on_reply(request, reply);
            }
        })
    }
}

#[async_trait]
impl FunctionalModule for CanModule {
    fn plugin_info(&self) -> &PluginInfo {
        &self.shared.info
    }

    async fn process_message(&self, message: Message) -> ProcessResult {
        let function = message.function_id().clone();
        if !self.shared.info.owns_mobile(&function) {
            return ProcessResult::CannotProcess;
        }

        let ctx = &self.shared.ctx;
        let result = match message.kind() {
            MessageKind::Request => {
                let command = ForwardRequest::new(message, ctx, Endpoint::Bus, Endpoint::Upstream)
                    .with_reply_hook(self.reply_hook());
                Arc::new(command).run()
            }
            MessageKind::Notification => {
                Arc::new(ForwardNotification::new(message, ctx, Endpoint::Bus)).run()
            }
            MessageKind::Response | MessageKind::ErrorResponse => {
                debug!(function = %function, "App replies are not handled by the CAN bridge");
                return ProcessResult::CannotProcess;
            }
        };

        match result {
            Ok(()) => ProcessResult::Processed,
            Err(err) => {
                warn!(function = %function, error = %err, "Failed to relay app message to bus");
                ProcessResult::Failed
            }
        }
    }

    async fn process_hmi_message(&self, message: Message) -> ProcessResult {
        if !self.shared.info.owns_hmi(message.function_id()) {
            return ProcessResult::CannotProcess;
        }
        self.shared.handle_message(message, Inbound::Hmi)
    }

    fn remove_app_extension(&self, app_id: u32) {
        if self.shared.access_grants.lock().remove(&app_id) {
            debug!(app_id = app_id, "Removed CAN access grant");
        }
    }

    async fn shutdown(&self) {
        self.shared.shutdown.send_replace(true);
        self.shared.bus.close();

        let tasks = self.tasks.lock().take();
        if let Some(BusTasks { reader, writer }) = tasks {
            for handle in [reader, writer] {
                if let Err(err) = handle.await {
                    warn!(error = %err, "Bus task ended abnormally");
                }
            }
        }

        self.shared.mark_closed();
        self.shared.release_outstanding();
        info!(module = %self.shared.info.name, "CAN module stopped");
    }
}

impl Shared {
    fn transition(&self, to: ConnectionState) -> ModuleResult<()> {
        let mut result = Ok(());
        self.state.send_if_modified(|current| match current.transition(to) {
            Ok(next) => {
                *current = next;
                true
            }
            Err(err) => {
                result = Err(err);
                false
            }
        });
        result
    }

    /// Move to `Closed` from any other state. Returns whether the state
    /// changed.
    fn mark_closed(&self) -> bool {
        self.state.send_if_modified(|current| {
            if *current == ConnectionState::Closed {
                false
            } else {
                *current = ConnectionState::Closed;
                true
            }
        })
    }

    fn set_scan_started(&self, started: bool) {
        let previous = self.scan_started.swap(started, Ordering::SeqCst);
        if previous != started {
            debug!(started = started, "Radio scan state changed");
        }
    }

    pub(crate) fn handle_frame(&self, frame: &[u8]) -> ProcessResult {
        match codec::decode(frame) {
            Ok(message) => self.handle_message(message, Inbound::Bus),
            Err(err) => {
                let err = ModuleError::from(err);
                warn!(error = %err, "Dropping bus frame");
                vl_telemetry::MESSAGES_MALFORMED.inc();
                ProcessResult::Failed
            }
        }
    }

    fn handle_message(&self, message: Message, origin: Inbound) -> ProcessResult {
        match message.kind() {
            MessageKind::Request => {
                let err = ModuleError::UnexpectedRequest {
                    function: message.function_id().clone(),
                    origin,
                };
                error!(
                    error = %err,
                    origin = %origin,
                    correlation_id = ?message.correlation_id(),
                    "Rejecting inbound request"
                );
                ProcessResult::Failed
            }
            MessageKind::Notification => self.relay_notification(message),
            MessageKind::Response | MessageKind::ErrorResponse => {
                if self.ctx.dispatcher.raise_message(&message) {
                    ProcessResult::Processed
                } else {
                    vl_telemetry::UNMATCHED_EVENTS.inc();
                    debug!(message = %message, "No subscriber for reply");
                    ProcessResult::CannotProcess
                }
            }
        }
    }

    fn relay_notification(&self, message: Message) -> ProcessResult {
        let function = message.function_id().clone();
        if !self.info.owns_mobile(&function) && !self.info.owns_hmi(&function) {
            debug!(function = %function, "Ignoring notification for a foreign function");
            return ProcessResult::CannotProcess;
        }
        match Arc::new(ForwardNotification::new(message, &self.ctx, Endpoint::Upstream)).run() {
            Ok(()) => ProcessResult::Processed,
            Err(err) => {
                warn!(function = %function, error = %err, "Failed to relay notification");
                ProcessResult::Failed
            }
        }
    }

    fn on_reply(&self, request: &Message, reply: &Message) {
        if !reply.is_success() {
            return;
        }
        match request.function_id().as_str() {
            START_SCAN => self.set_scan_started(true),
            STOP_SCAN => self.set_scan_started(false),
            GRANT_ACCESS => {
                if let Some(app_id) = app_id(request) {
                    self.access_grants.lock().insert(app_id);
                    info!(app_id = app_id, "CAN access granted");
                }
            }
            CANCEL_ACCESS => {
                if let Some(app_id) = app_id(request) {
                    self.access_grants.lock().remove(&app_id);
                    info!(app_id = app_id, "CAN access cancelled");
                }
            }
            _ => {}
        }
    }

    pub(crate) fn on_transport_failure(&self, err: TransportError) {
        if !self.mark_closed() {
            return;
        }
        vl_telemetry::TRANSPORT_FAILURES.inc();
        error!(error = %err, "CAN bus transport failed");
        self.shutdown.send_replace(true);
        self.bus.close();
        self.release_outstanding();
    }

    /// Cancel subscriptions and abort pending requests for owned functions.
    fn release_outstanding(&self) {
        let functions = self.info.all_functions();
        let unsubscribed = self.ctx.dispatcher.unsubscribe_functions(&functions);
        let aborted = self
            .ctx
            .controller
            .remove_matching(|_, handler| functions.contains(handler.function_id()));

        let aborted_count = aborted.len();
        for (_, handler) in aborted {
            handler.on_failure(RequestFailure::Aborted);
        }
        if unsubscribed > 0 || aborted_count > 0 {
            info!(
                unsubscribed = unsubscribed,
                aborted = aborted_count,
                "Released outstanding CAN requests"
            );
        }
    }
}

fn app_id(message: &Message) -> Option<u32> {
    message
        .payload()
        .get(APP_ID_FIELD)
        .and_then(Value::as_u64)
        .and_then(|id| u32::try_from(id).ok())
}
