//! Shared fixtures for integration scenarios and benchmarks.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use shared_types::{CorrelationId, Message, Payload};
use tokio::sync::mpsc::UnboundedReceiver;
use vl_01_command_factory::{ChannelSink, Endpoint};
use vl_runtime::{CoreRuntime, RuntimeConfig};

/// Messages the runtime hands to the app and HMI sides.
pub type Outbox = UnboundedReceiver<(Endpoint, Message)>;

/// Upper bound for anything that crosses a task boundary.
pub const WAIT: Duration = Duration::from_secs(2);

pub fn runtime_with(config: RuntimeConfig) -> (Arc<CoreRuntime>, Outbox) {
    let (sink, outbox) = ChannelSink::new();
    let runtime = match CoreRuntime::new(config, Arc::new(sink)) {
        Ok(runtime) => runtime,
        Err(e) => panic!("fixture runtime rejected its config: {e}"),
    };
    (Arc::new(runtime), outbox)
}

pub fn runtime() -> (Arc<CoreRuntime>, Outbox) {
    runtime_with(RuntimeConfig::default())
}

pub fn id(raw: u32) -> CorrelationId {
    CorrelationId::new(raw)
}

/// Object payload from a `json!` literal; anything else is empty.
pub fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// Next outbound message, failing the test after [`WAIT`].
pub async fn next(outbox: &mut Outbox) -> (Endpoint, Message) {
    match tokio::time::timeout(WAIT, outbox.recv()).await {
        Ok(Some(item)) => item,
        Ok(None) => panic!("outbox closed"),
        Err(_) => panic!("no outbound message within {WAIT:?}"),
    }
}
