//! # Wire Codec
//!
//! Converts between JSON wire objects and [`Message`] values.
//!
//! Classification rules, applied in order:
//!
//! 1. `method` and `id` present: request.
//! 2. `method` present, no `id`: notification.
//! 3. `result.method` present: response.
//! 4. `error.data.method` present: error response.
//! 5. Anything else is malformed and never enters the dispatch pipeline.
//!
//! Responses and error responses without an `id` are rejected with
//! [`MessageError::MissingCorrelationId`].

use crate::errors::{MessageError, MessageResult};
use crate::ids::{CorrelationId, FunctionId};
use crate::message::{Message, MessageKind, Payload, ProtocolVersion};
use serde_json::Value;

/// JSON-RPC version string written on every outbound message.
pub const JSONRPC_VERSION: &str = "2.0";

/// Decode one wire message.
pub fn decode(bytes: &[u8]) -> MessageResult<Message> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| MessageError::InvalidJson(e.to_string()))?;
    decode_value(value)
}

/// Classify an already-parsed JSON value.
pub fn decode_value(value: Value) -> MessageResult<Message> {
    let Value::Object(mut object) = value else {
        return Err(MessageError::NotAnObject);
    };

    object.remove("jsonrpc");
    let correlation_id = take_correlation_id(&mut object)?;
    let (kind, function_id, payload) = classify(object, correlation_id.is_some())?;

    Message::from_parts(
        kind,
        function_id,
        correlation_id,
        ProtocolVersion::V3,
        payload,
    )
}

/// Encode a message into its wire object.
pub fn to_value(message: &Message) -> Value {
    let mut object = Payload::new();
    object.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
    if let Some(id) = message.correlation_id() {
        object.insert("id".into(), Value::from(id.value()));
    }

    let method = Value::String(message.function_id().as_str().to_string());
    match message.kind() {
        MessageKind::Request | MessageKind::Notification => {
            object.insert("method".into(), method);
            object.insert("params".into(), Value::Object(message.payload().clone()));
        }
        MessageKind::Response => {
            let mut result = message.payload().clone();
            result.insert("method".into(), method);
            object.insert("result".into(), Value::Object(result));
        }
        MessageKind::ErrorResponse => {
            let mut error = message.payload().clone();
            let mut data = match error.remove("data") {
                Some(Value::Object(data)) => data,
                _ => Payload::new(),
            };
            data.insert("method".into(), method);
            error.insert("data".into(), Value::Object(data));
            object.insert("error".into(), Value::Object(error));
        }
    }

    Value::Object(object)
}

/// Encode a message into wire bytes (no trailing delimiter).
pub fn encode(message: &Message) -> Vec<u8> {
    to_value(message).to_string().into_bytes()
}

fn take_correlation_id(object: &mut Payload) -> MessageResult<Option<CorrelationId>> {
    match object.remove("id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|raw| u32::try_from(raw).ok())
            .map(|raw| Some(CorrelationId::new(raw)))
            .ok_or_else(|| MessageError::InvalidCorrelationId(n.to_string())),
        Some(other) => Err(MessageError::InvalidCorrelationId(other.to_string())),
    }
}

fn classify(
    mut object: Payload,
    has_id: bool,
) -> MessageResult<(MessageKind, FunctionId, Payload)> {
    if let Some(method) = object.remove("method") {
        let Value::String(name) = method else {
            return Err(MessageError::malformed("method is not a string"));
        };
        let params = match object.remove("params") {
            None | Some(Value::Null) => Payload::new(),
            Some(Value::Object(params)) => params,
            Some(_) => return Err(MessageError::malformed("params is not an object")),
        };
        let kind = if has_id {
            MessageKind::Request
        } else {
            MessageKind::Notification
        };
        return Ok((kind, FunctionId::new(name), params));
    }

    if let Some(Value::Object(mut result)) = object.remove("result") {
        if let Some(Value::String(name)) = result.remove("method") {
            return Ok((MessageKind::Response, FunctionId::new(name), result));
        }
    }

    if let Some(Value::Object(mut error)) = object.remove("error") {
        if let Some(name) = take_error_method(&mut error) {
            return Ok((MessageKind::ErrorResponse, FunctionId::new(name), error));
        }
    }

    Err(MessageError::malformed(
        "no method, result.method or error.data.method",
    ))
}

fn take_error_method(error: &mut Payload) -> Option<String> {
    let Some(Value::Object(data)) = error.get_mut("data") else {
        return None;
    };
    let name = match data.remove("method") {
        Some(Value::String(name)) => name,
        Some(other) => {
            data.insert("method".into(), other);
            return None;
        }
        None => return None,
    };
    if data.is_empty() {
        error.remove("data");
    }
    Some(name)
}
