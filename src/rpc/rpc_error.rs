use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Standard JSON-RPC 2.0 error codes.
pub const PARSE_ERROR_CODE: i64 = -32700;
pub const INVALID_REQUEST_CODE: i64 = -32600;
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;
pub const INVALID_PARAMS_CODE: i64 = -32602;
pub const INTERNAL_ERROR_CODE: i64 = -32603;

/// Everything that can go wrong between building a request and receiving its result.
///
/// Every variant resolves exactly the call it concerns. Transport, protocol and
/// internal failures of one call never affect other in-flight calls.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum RpcError {
    /// The request arguments were malformed. Never reaches the network.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A parameter could not be represented as JSON.
    #[error("parameter {index} could not be serialized: {message}")]
    Serialization { index: usize, message: String },

    /// The underlying byte channel failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The remote peer sent something that is not a valid response envelope.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The remote node rejected the call.
    #[error(transparent)]
    Remote(#[from] JsonRpcError),

    /// The call was abandoned because the client was torn down or the
    /// connection was permanently lost.
    #[error("call cancelled: {0}")]
    Cancelled(String),

    /// An internal invariant was violated (e.g. a duplicate request id).
    #[error("internal error: {0}")]
    Internal(String),
}

impl RpcError {
    pub fn malformed_envelope(detail: impl std::fmt::Display) -> Self {
        RpcError::Protocol(format!("malformed envelope: {detail}"))
    }

    /// A short, stable name for the variant. Used when the error crosses a
    /// foreign boundary as a structured object.
    pub fn kind(&self) -> &'static str {
        match self {
            RpcError::InvalidArgument(_) => "InvalidArgument",
            RpcError::Serialization { .. } => "SerializationError",
            RpcError::Transport(_) => "TransportError",
            RpcError::Protocol(_) => "ProtocolError",
            RpcError::Remote(_) => "RpcError",
            RpcError::Cancelled(_) => "Cancelled",
            RpcError::Internal(_) => "InternalError",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RpcError::Cancelled(_))
    }
}

/// Failures of the byte-level channel.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection refused")]
    ConnectionRefused,
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => TransportError::Timeout,
            std::io::ErrorKind::ConnectionRefused => TransportError::ConnectionRefused,
            _ => TransportError::Io(err.to_string()),
        }
    }
}

/// A JSON-RPC error object, as sent by the remote node.
#[derive(Clone, Debug, PartialEq, Error, Deserialize, Serialize)]
#[error("JSON-RPC error (code: {code}): {message}")]
pub struct JsonRpcError {
    /// Indicates the error type that occurred.
    pub code: i64,
    /// Short description of the error.
    pub message: String,
    /// Additional information about the error, passed through uninterpreted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Creates a new JSON-RPC error without `data`.
    pub fn new(code: impl Into<i64>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_parse_error(&self) -> bool {
        self.code == PARSE_ERROR_CODE
    }

    pub fn is_invalid_request(&self) -> bool {
        self.code == INVALID_REQUEST_CODE
    }

    pub fn is_method_not_found(&self) -> bool {
        self.code == METHOD_NOT_FOUND_CODE
    }
}
