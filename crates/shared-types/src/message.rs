//! # Message Model
//!
//! The classified, validated in-memory form of one wire message.
//!
//! ## Invariant
//!
//! `kind == Notification` if and only if `correlation_id` is absent. The
//! fields are private and every constructor enforces the rule, so a
//! `Message` value that exists is always well formed.

use crate::errors::{MessageError, MessageResult};
use crate::ids::{CorrelationId, FunctionId};
use crate::schema::ResultCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Unordered key/value document carried by a message.
///
/// For requests and notifications this is `params`; for responses the
/// `result` body; for error responses the `error` body. The function
/// back-reference (`result.method`, `error.data.method`) is lifted into
/// [`Message::function_id`] and not duplicated here.
pub type Payload = Map<String, Value>;

/// Message classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Carries `method` and `id`; expects a reply.
    Request,
    /// Carries `method` without `id`; fire and forget.
    Notification,
    /// Carries `id` and a `result` naming its originating method.
    Response,
    /// Carries `id` and an `error` whose `data` names its originating method.
    ErrorResponse,
}

impl MessageKind {
    /// Responses and error responses are delivered through the event dispatcher.
    pub const fn is_reply(self) -> bool {
        matches!(self, Self::Response | Self::ErrorResponse)
    }

    /// Every kind except notification must carry a correlation id.
    pub const fn requires_correlation_id(self) -> bool {
        !matches!(self, Self::Notification)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Notification => write!(f, "notification"),
            Self::Response => write!(f, "response"),
            Self::ErrorResponse => write!(f, "error_response"),
        }
    }
}

/// Wire protocol revision tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersion(u8);

impl ProtocolVersion {
    pub const V1: Self = Self(1);
    pub const V2: Self = Self(2);
    /// Revision used for JSON traffic on the HMI and bus links.
    pub const V3: Self = Self(3);

    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::V3
    }
}

/// One classified RPC message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    kind: MessageKind,
    function_id: FunctionId,
    correlation_id: Option<CorrelationId>,
    protocol_version: ProtocolVersion,
    payload: Payload,
}

impl Message {
    /// Build a message from its parts, checking the kind/id rule.
    pub fn from_parts(
        kind: MessageKind,
        function_id: FunctionId,
        correlation_id: Option<CorrelationId>,
        protocol_version: ProtocolVersion,
        payload: Payload,
    ) -> MessageResult<Self> {
        match (kind.requires_correlation_id(), correlation_id) {
            (true, None) => {
                return Err(MessageError::MissingCorrelationId {
                    function: function_id,
                })
            }
            (false, Some(_)) => {
                return Err(MessageError::InvariantViolation(
                    "notification must not carry a correlation id",
                ))
            }
            _ => {}
        }

        Ok(Self {
            kind,
            function_id,
            correlation_id,
            protocol_version,
            payload,
        })
    }

    /// A request expecting a reply under `id`.
    pub fn request(function_id: impl Into<FunctionId>, id: CorrelationId, params: Payload) -> Self {
        Self {
            kind: MessageKind::Request,
            function_id: function_id.into(),
            correlation_id: Some(id),
            protocol_version: ProtocolVersion::default(),
            payload: params,
        }
    }

    /// A notification; never carries a correlation id.
    pub fn notification(function_id: impl Into<FunctionId>, params: Payload) -> Self {
        Self {
            kind: MessageKind::Notification,
            function_id: function_id.into(),
            correlation_id: None,
            protocol_version: ProtocolVersion::default(),
            payload: params,
        }
    }

    /// A successful reply; `result` should carry a `code` field.
    pub fn response(function_id: impl Into<FunctionId>, id: CorrelationId, result: Payload) -> Self {
        Self {
            kind: MessageKind::Response,
            function_id: function_id.into(),
            correlation_id: Some(id),
            protocol_version: ProtocolVersion::default(),
            payload: result,
        }
    }

    /// An error reply with a result code and a human-readable message.
    pub fn error_response(
        function_id: impl Into<FunctionId>,
        id: CorrelationId,
        code: ResultCode,
        message: impl Into<String>,
    ) -> Self {
        let mut body = Payload::new();
        body.insert("code".into(), Value::from(code.value()));
        body.insert("message".into(), Value::String(message.into()));
        Self {
            kind: MessageKind::ErrorResponse,
            function_id: function_id.into(),
            correlation_id: Some(id),
            protocol_version: ProtocolVersion::default(),
            payload: body,
        }
    }

    /// Override the protocol revision tag.
    #[must_use]
    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn function_id(&self) -> &FunctionId {
        &self.function_id
    }

    pub fn correlation_id(&self) -> Option<CorrelationId> {
        self.correlation_id
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// The `code` field of a response or error body, if present.
    pub fn result_code(&self) -> Option<ResultCode> {
        if !self.kind.is_reply() {
            return None;
        }
        self.payload
            .get("code")
            .and_then(Value::as_i64)
            .map(ResultCode::new)
    }

    /// True for a `Response` whose code is absent or `SUCCESS`.
    pub fn is_success(&self) -> bool {
        self.kind == MessageKind::Response
            && self.result_code().map_or(true, ResultCode::is_success)
    }

    /// Deserialize the payload into a typed schema.
    pub fn parse_payload<T: DeserializeOwned>(&self) -> MessageResult<T> {
        serde_json::from_value(Value::Object(self.payload.clone())).map_err(|e| {
            MessageError::InvalidPayload {
                function: self.function_id.clone(),
                reason: e.to_string(),
            }
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.correlation_id {
            Some(id) => write!(f, "{} {}#{}", self.kind, self.function_id, id),
            None => write!(f, "{} {}", self.kind, self.function_id),
        }
    }
}
