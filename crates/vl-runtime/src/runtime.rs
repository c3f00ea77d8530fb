//! # Core Runtime
//!
//! Single entry point for inbound traffic from both external sides.
//!
//! ```text
//!  request/notification ─┬─► CommandFactory ──► command.run()       (Executed)
//!                        └─► ModuleRegistry ──► module.process_*() (RoutedToModule)
//!  response/error ──────────► EventDispatcher.raise()               (Delivered | Unmatched)
//! ```
//!
//! Core commands only serve the app side; HMI-originated requests and
//! notifications go to the module owning the function on the HMI side.

use std::sync::Arc;

use parking_lot::Mutex;
use shared_bus::EventDispatcher;
use shared_types::{codec, FunctionalModule, Message, MessageKind, ProcessResult};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use vl_01_command_factory::{
    Command, CommandContext, CommandFactory, MessageSink, PendingCommands, RequestFailure,
};
use vl_02_request_controller::spawn_sweeper;
use vl_03_capability_registry::CapabilityRegistry;
use vl_telemetry::{log_rpc_event, metric_inc};
use vl_telemetry::metrics::{
    HistogramTimer, DISPATCH_DURATION, MESSAGES_DISPATCHED, MESSAGES_MALFORMED,
    PENDING_REQUESTS, REQUEST_TIMEOUTS, UNKNOWN_FUNCTIONS, UNMATCHED_EVENTS,
};

use crate::container::RuntimeConfig;
use crate::dispatch::{DispatchOutcome, Source};
use crate::error::RuntimeResult;
use crate::registry::{ModuleRegistry, RegistryError};

/// Name reported as the owner of functions served by core commands.
pub const CORE_OWNER: &str = "core";

struct Sweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// The dispatch core.
pub struct CoreRuntime {
    config: RuntimeConfig,
    factory: CommandFactory,
    modules: ModuleRegistry,
    sweeper: Mutex<Option<Sweeper>>,
}

impl CoreRuntime {
    /// Build the runtime around `sink`, which delivers to the app and HMI.
    pub fn new(config: RuntimeConfig, sink: Arc<dyn MessageSink>) -> RuntimeResult<Self> {
        config.validate()?;

        let context = CommandContext::new(
            Arc::new(PendingCommands::new()),
            Arc::new(EventDispatcher::with_policy(config.dispatcher.duplicate_policy)),
            Arc::new(CapabilityRegistry::new()),
            sink,
            config.timeout_policy(),
        );
        let factory = CommandFactory::with_builtin_commands(context)?;

        info!(
            default_timeout = ?config.timeouts.default,
            sweep_interval = ?config.timeouts.sweep_interval,
            duplicate_policy = ?config.dispatcher.duplicate_policy,
            commands = factory.len(),
            "Core runtime created"
        );

        Ok(Self {
            config,
            factory,
            modules: ModuleRegistry::new(),
            sweeper: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Collaborators shared with commands and modules.
    pub fn context(&self) -> &CommandContext {
        self.factory.context()
    }

    /// Register additional core commands before the runtime is shared.
    pub fn factory_mut(&mut self) -> &mut CommandFactory {
        &mut self.factory
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    /// Plug in a module.
    ///
    /// Fails if the module claims an app-side function a core command
    /// already serves, or a function another module owns.
    pub fn register_module(&self, module: Arc<dyn FunctionalModule>) -> RuntimeResult<()> {
        let info = module.plugin_info();
        if let Some(function) = info.mobile_function_ids.iter().find(|function| {
            self.factory.is_registered(function, MessageKind::Request)
                || self.factory.is_registered(function, MessageKind::Notification)
        }) {
            return Err(RegistryError::OverlappingFunction {
                function: function.clone(),
                existing: CORE_OWNER.to_string(),
                module: info.name.clone(),
            }
            .into());
        }
        self.modules.register(module)?;
        Ok(())
    }

    /// Dispatch one decoded inbound message.
    pub async fn dispatch(&self, source: Source, message: Message) -> DispatchOutcome {
        let _timer = HistogramTimer::new(&DISPATCH_DURATION);
        let kind = message.kind();
        MESSAGES_DISPATCHED
            .with_label_values(&[kind.to_string().as_str()])
            .inc();
        debug!(source = %source, message = %message, "Dispatching");

        let outcome = if kind.is_reply() {
            self.deliver(&message)
        } else {
            self.execute(source, message).await
        };

        self.refresh_pending_gauge();
        outcome
    }

    /// Decode and dispatch one inbound frame.
    pub async fn dispatch_bytes(&self, source: Source, bytes: &[u8]) -> DispatchOutcome {
        match codec::decode(bytes) {
            Ok(message) => self.dispatch(source, message).await,
            Err(e) => {
                MESSAGES_MALFORMED.inc();
                warn!(source = %source, error = %e, "Rejected malformed message");
                DispatchOutcome::Rejected(e.to_string())
            }
        }
    }

    fn deliver(&self, message: &Message) -> DispatchOutcome {
        if self.context().dispatcher.raise_message(message) {
            DispatchOutcome::Delivered
        } else {
            UNMATCHED_EVENTS.inc();
            warn!(
                function = %message.function_id(),
                correlation_id = ?message.correlation_id(),
                "No pending request for reply"
            );
            DispatchOutcome::Unmatched
        }
    }

    async fn execute(&self, source: Source, message: Message) -> DispatchOutcome {
        if source == Source::Upstream {
            if let Some(command) = self.factory.create(&message) {
                return match command.run() {
                    Ok(()) => DispatchOutcome::Executed,
                    Err(e) => {
                        warn!(function = %message.function_id(), error = %e, "Command failed");
                        DispatchOutcome::Rejected(e.to_string())
                    }
                };
            }
        }

        let function = message.function_id().clone();
        let module = match source {
            Source::Upstream => self.modules.route_mobile(&function),
            Source::Downstream => self.modules.route_hmi(&function),
        };
        let Some(module) = module else {
            metric_inc!(UNKNOWN_FUNCTIONS);
            log_rpc_event!(warn, "runtime", "Unknown function", source = %source, function = %function);
            return DispatchOutcome::UnknownFunction;
        };

        let name = module.plugin_info().name.clone();
        let result = match source {
            Source::Upstream => module.process_message(message).await,
            Source::Downstream => module.process_hmi_message(message).await,
        };
        match result {
            ProcessResult::Processed => DispatchOutcome::RoutedToModule(name),
            ProcessResult::Failed => {
                warn!(module = %name, function = %function, "Module failed to process message");
                DispatchOutcome::Rejected(format!("{name} failed to process {function}"))
            }
            ProcessResult::CannotProcess => {
                UNKNOWN_FUNCTIONS.inc();
                warn!(module = %name, function = %function, "Module cannot process message");
                DispatchOutcome::UnknownFunction
            }
        }
    }

    /// Spawn the deadline sweeper. Idempotent.
    pub fn start(&self) {
        let mut slot = self.sweeper.lock();
        if slot.is_some() {
            return;
        }

        let controller = Arc::clone(&self.context().controller);
        let gauge_source = Arc::clone(&controller);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = spawn_sweeper(
            controller,
            self.config.timeouts.sweep_interval,
            shutdown_rx,
            move |correlation_id, command: Arc<dyn Command>| {
                metric_inc!(REQUEST_TIMEOUTS);
                log_rpc_event!(
                    warn,
                    "controller",
                    "Request timed out",
                    correlation_id = %correlation_id,
                    function = %command.function_id()
                );
                command.on_failure(RequestFailure::TimedOut);
                PENDING_REQUESTS.set(gauge_source.pending_count() as i64);
            },
        );

        info!(interval = ?self.config.timeouts.sweep_interval, "Request sweeper started");
        *slot = Some(Sweeper { shutdown, handle });
    }

    pub fn is_running(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    /// Forget per-application state in every module.
    pub fn remove_app_extension(&self, app_id: u32) {
        self.modules.remove_app_extension(app_id);
    }

    /// Stop modules, stop the sweeper, then abort whatever is still pending.
    pub async fn shutdown(&self) {
        info!("Shutting down core runtime");
        self.modules.shutdown_all().await;

        let sweeper = self.sweeper.lock().take();
        if let Some(Sweeper { shutdown, handle }) = sweeper {
            let _ = shutdown.send(true);
            if let Err(e) = handle.await {
                error!(error = %e, "Request sweeper ended abnormally");
            }
        }

        let remaining = self.context().controller.drain();
        if !remaining.is_empty() {
            warn!(count = remaining.len(), "Aborting pending requests");
        }
        for (_, command) in remaining {
            command.on_failure(RequestFailure::Aborted);
        }
        self.refresh_pending_gauge();
        info!("Core runtime stopped");
    }

    fn refresh_pending_gauge(&self) {
        PENDING_REQUESTS.set(self.context().controller.pending_count() as i64);
    }
}
