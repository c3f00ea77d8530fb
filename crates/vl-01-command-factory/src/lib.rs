//! # Command Factory (vl-01)
//!
//! Instantiates the handler ("command") for an inbound request or
//! notification and runs it against explicitly passed collaborators.
//!
//! ## Correlated Command Flow
//!
//! ```text
//!  request ──► CommandFactory::create ──► command.run()
//!                                          │ controller.add(id)
//!                                          │ dispatcher.subscribe(fn#id)
//!                                          │ sink.send(downstream)
//!                                          ▼
//!  reply ───► dispatcher.raise(fn#id) ──► command.on_event()
//!                                          │ controller.complete(id)?
//!                                          │ update capabilities
//!                                          ▼ sink.send(upstream)
//!  sweeper ─► controller.sweep(now) ────► command.on_failure(TimedOut)
//! ```
//!
//! Exactly one of `on_event` (after a successful `complete`) and
//! `on_failure` acts for a given request.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod command;
pub mod commands;
pub mod context;
pub mod error;
pub mod factory;
pub mod sink;

pub use command::{Command, PendingCommands, RequestFailure};
pub use commands::{
    register_builtin_commands, ForwardNotification, ForwardRequest, GetSystemInfo, ReplyHook,
    UiGetCapabilities,
};
pub use context::{CommandContext, TimeoutPolicy};
pub use error::{CommandError, CommandResult, FactoryError, SinkError};
pub use factory::{CommandConstructor, CommandFactory};
pub use sink::{ChannelSink, Endpoint, MessageSink};
