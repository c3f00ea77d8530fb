//! The command capability shared by every RPC handler.

use crate::error::CommandResult;
use shared_bus::EventObserver;
use shared_types::{CorrelationId, FunctionId, ResultCode};
use std::fmt;
use std::sync::Arc;
use vl_02_request_controller::RequestController;

/// Terminal failure of a pending request that never got its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFailure {
    /// Reclaimed by the sweeper after its deadline.
    TimedOut,
    /// Failed during teardown of its owner.
    Aborted,
}

impl RequestFailure {
    /// Result code reported to the requester.
    pub const fn result_code(self) -> ResultCode {
        match self {
            Self::TimedOut => ResultCode::TIMED_OUT,
            Self::Aborted => ResultCode::ABORTED,
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut => write!(f, "request timed out"),
            Self::Aborted => write!(f, "request aborted"),
        }
    }
}

/// A unit of execution instantiated per inbound request or notification.
///
/// Commands that expect an asynchronous reply register themselves with the
/// request controller and subscribe as an [`EventObserver`]; the reply
/// arrives through `on_event`, a timeout or abort through `on_failure`.
pub trait Command: EventObserver {
    fn function_id(&self) -> &FunctionId;

    /// Correlation id of the request this command serves, if any.
    fn correlation_id(&self) -> Option<CorrelationId>;

    /// Execute. Must not block.
    fn run(self: Arc<Self>) -> CommandResult<()>;

    /// The pending request was retired without a reply.
    fn on_failure(&self, failure: RequestFailure);
}

/// Request controller specialised to commands.
pub type PendingCommands = RequestController<Arc<dyn Command>>;

/// Whether `handler` is the same allocation as `command`.
pub(crate) fn is_same_command<C: Command>(handler: &Arc<dyn Command>, command: &C) -> bool {
    std::ptr::eq(
        Arc::as_ptr(handler).cast::<()>(),
        (command as *const C).cast::<()>(),
    )
}
