//! JSON-RPC 2.0 envelope codec.
//!
//! Requests are encoded from [`RequestArguments`] plus an allocated id.
//! Responses are decoded into a [`ResponseEnvelope`], which enforces at parse
//! time that exactly one of `result` / `error` is present.

use crate::constants::JSONRPC_VERSION;
use crate::rpc::{JsonRpcError, RequestArguments, RpcError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Identifier assigned to every outbound request.
pub type RequestId = u64;

#[derive(Serialize)]
struct RequestEnvelope<'a> {
    jsonrpc: &'static str,
    id: RequestId,
    method: &'a str,
    params: &'a [Value],
}

/// The `id` member of a response as sent by the peer.
///
/// Requests are always sent with numeric ids; the other shapes exist so that
/// foreign or degenerate responses can be reported rather than rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResponseId {
    Number(u64),
    String(String),
    /// The server could not determine the request id (parse error / invalid request).
    Null,
}

impl ResponseId {
    pub fn as_number(&self) -> Option<u64> {
        match self {
            ResponseId::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ResponseId::Null)
    }

    fn to_value(&self) -> Value {
        match self {
            ResponseId::Number(n) => Value::from(*n),
            ResponseId::String(s) => Value::from(s.as_str()),
            ResponseId::Null => Value::Null,
        }
    }
}

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseId::Number(n) => write!(f, "{n}"),
            ResponseId::String(s) => write!(f, "{s:?}"),
            ResponseId::Null => write!(f, "null"),
        }
    }
}

impl From<u64> for ResponseId {
    fn from(id: u64) -> Self {
        ResponseId::Number(id)
    }
}

/// A decoded response: success or failure, never both.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseEnvelope {
    Success { id: ResponseId, result: Value },
    Failure { id: ResponseId, error: JsonRpcError },
}

impl ResponseEnvelope {
    pub fn id(&self) -> &ResponseId {
        match self {
            ResponseEnvelope::Success { id, .. } | ResponseEnvelope::Failure { id, .. } => id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success { .. })
    }

    /// Converts the envelope into the outcome delivered to the caller.
    pub fn into_outcome(self) -> Result<Value, RpcError> {
        match self {
            ResponseEnvelope::Success { result, .. } => Ok(result),
            ResponseEnvelope::Failure { error, .. } => Err(RpcError::Remote(error)),
        }
    }
}

/// A server-initiated message carrying no response id, e.g. `eth_subscription`.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub method: String,
    pub params: Value,
}

impl Notification {
    /// The subscription id of an `eth_subscription`-style notification.
    pub fn subscription_id(&self) -> Option<&str> {
        self.params.get("subscription").and_then(Value::as_str)
    }

    pub fn into_subscription_result(self) -> Option<Value> {
        match self.params {
            Value::Object(mut params) => params.remove("result"),
            _ => None,
        }
    }
}

/// Anything a duplex peer may send to the client.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundMessage {
    Response(ResponseEnvelope),
    Notification(Notification),
}

/// Encodes the canonical request envelope
/// `{"jsonrpc":"2.0","id":<id>,"method":<method>,"params":[...]}`.
pub fn encode_request(id: RequestId, args: &RequestArguments) -> Result<Vec<u8>, RpcError> {
    let envelope = RequestEnvelope {
        jsonrpc: JSONRPC_VERSION,
        id,
        method: args.method(),
        params: args.params(),
    };

    serde_json::to_vec(&envelope)
        .map_err(|e| RpcError::Internal(format!("failed to encode request {id}: {e}")))
}

/// Decodes a request envelope. The inverse of [`encode_request`].
pub fn decode_request(bytes: &[u8]) -> Result<(RequestId, RequestArguments), RpcError> {
    let mut object = parse_object(bytes)?;
    check_version(&object)?;

    let id = object
        .remove("id")
        .ok_or_else(|| RpcError::malformed_envelope("missing `id`"))?
        .as_u64()
        .ok_or_else(|| RpcError::malformed_envelope("request `id` must be an unsigned integer"))?;

    let method = match object.remove("method") {
        Some(Value::String(method)) => method,
        _ => return Err(RpcError::malformed_envelope("missing or non-string `method`")),
    };

    let params = match object.remove("params") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(params)) => params,
        Some(_) => return Err(RpcError::malformed_envelope("`params` must be an array")),
    };

    let args = RequestArguments::new(method, params)
        .map_err(|_| RpcError::malformed_envelope("empty `method`"))?;

    Ok((id, args))
}

/// Decodes a response envelope.
///
/// Fails with [`RpcError::Protocol`] if the payload is not a JSON object, lacks
/// an `id`, carries both or neither of `result` / `error`, or has a
/// non-integer `error.code`. `error.data` is passed through untouched.
pub fn decode_response(bytes: &[u8]) -> Result<ResponseEnvelope, RpcError> {
    let object = parse_object(bytes)?;
    parse_response(object)
}

/// Decodes any inbound frame of a duplex transport.
pub fn decode_inbound(bytes: &[u8]) -> Result<InboundMessage, RpcError> {
    let mut object = parse_object(bytes)?;

    let is_notification = !object.contains_key("result")
        && !object.contains_key("error")
        && object.contains_key("method");

    if is_notification {
        check_version(&object)?;
        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            _ => return Err(RpcError::malformed_envelope("non-string notification `method`")),
        };
        let params = object.remove("params").unwrap_or(Value::Null);
        return Ok(InboundMessage::Notification(Notification { method, params }));
    }

    parse_response(object).map(InboundMessage::Response)
}

/// Encodes a response envelope. Used by peers and test nodes.
pub fn encode_response(envelope: &ResponseEnvelope) -> Result<Vec<u8>, RpcError> {
    let mut object = Map::new();
    object.insert("jsonrpc".into(), Value::from(JSONRPC_VERSION));
    object.insert("id".into(), envelope.id().to_value());
    match envelope {
        ResponseEnvelope::Success { result, .. } => {
            object.insert("result".into(), result.clone());
        }
        ResponseEnvelope::Failure { error, .. } => {
            let error = serde_json::to_value(error)
                .map_err(|e| RpcError::Internal(format!("unencodable error object: {e}")))?;
            object.insert("error".into(), error);
        }
    }

    serde_json::to_vec(&Value::Object(object))
        .map_err(|e| RpcError::Internal(format!("unencodable response: {e}")))
}

fn parse_object(bytes: &[u8]) -> Result<Map<String, Value>, RpcError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(RpcError::malformed_envelope("expected a JSON object")),
        Err(e) => Err(RpcError::malformed_envelope(format!("invalid JSON: {e}"))),
    }
}

fn check_version(object: &Map<String, Value>) -> Result<(), RpcError> {
    match object.get("jsonrpc") {
        None => Ok(()),
        Some(Value::String(version)) if version == JSONRPC_VERSION => Ok(()),
        Some(other) => Err(RpcError::malformed_envelope(format!(
            "unsupported `jsonrpc` version {other}"
        ))),
    }
}

fn parse_response(mut object: Map<String, Value>) -> Result<ResponseEnvelope, RpcError> {
    check_version(&object)?;

    let id = match object.remove("id") {
        Some(id) => parse_response_id(id)?,
        None => return Err(RpcError::malformed_envelope("missing `id`")),
    };

    match (object.remove("result"), object.remove("error")) {
        (Some(_), Some(_)) => Err(RpcError::malformed_envelope(
            "both `result` and `error` present",
        )),
        (None, None) => Err(RpcError::malformed_envelope(
            "neither `result` nor `error` present",
        )),
        (Some(_), None) if id.is_null() => Err(RpcError::malformed_envelope(
            "null `id` on a success response",
        )),
        (Some(result), None) => Ok(ResponseEnvelope::Success { id, result }),
        (None, Some(error)) => Ok(ResponseEnvelope::Failure {
            id,
            error: parse_error_object(error)?,
        }),
    }
}

fn parse_response_id(id: Value) -> Result<ResponseId, RpcError> {
    match id {
        Value::Null => Ok(ResponseId::Null),
        Value::String(s) => Ok(ResponseId::String(s)),
        Value::Number(n) => n
            .as_u64()
            .map(ResponseId::Number)
            .ok_or_else(|| RpcError::malformed_envelope(format!("unsupported numeric `id` {n}"))),
        other => Err(RpcError::malformed_envelope(format!(
            "`id` must be a number, string or null, got {other}"
        ))),
    }
}

fn parse_error_object(error: Value) -> Result<JsonRpcError, RpcError> {
    let Value::Object(mut error) = error else {
        return Err(RpcError::malformed_envelope("`error` must be an object"));
    };

    let code = error
        .get("code")
        .and_then(Value::as_i64)
        .ok_or_else(|| RpcError::malformed_envelope("missing or non-integer `error.code`"))?;

    let message = match error.remove("message") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(message)) => message,
        Some(_) => return Err(RpcError::malformed_envelope("non-string `error.message`")),
    };

    Ok(JsonRpcError {
        code,
        message,
        data: error.remove("data"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_canonical_request() {
        let args = RequestArguments::new("eth_syncing", vec![]).unwrap();
        let bytes = encode_request(1, &args).unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"jsonrpc":"2.0","id":1,"method":"eth_syncing","params":[]}"#
        );
    }

    #[test]
    fn encoding_is_deterministic() {
        let args = RequestArguments::new(
            "eth_call",
            vec![json!({"to": "0x00", "data": "0x"}), json!("latest")],
        )
        .unwrap();
        assert_eq!(encode_request(9, &args).unwrap(), encode_request(9, &args).unwrap());
    }

    #[test]
    fn error_data_is_passed_through() {
        let envelope = decode_response(
            br#"{"jsonrpc":"2.0","id":4,"error":{"code":3,"message":"execution reverted","data":{"nested":[1,2]}}}"#,
        )
        .unwrap();

        assert_eq!(
            envelope,
            ResponseEnvelope::Failure {
                id: ResponseId::Number(4),
                error: JsonRpcError::new(3, "execution reverted")
                    .with_data(json!({"nested": [1, 2]})),
            }
        );
    }

    #[test]
    fn null_result_is_a_success() {
        let envelope = decode_response(br#"{"jsonrpc":"2.0","id":2,"result":null}"#).unwrap();
        assert_eq!(envelope.into_outcome(), Ok(Value::Null));
    }

    #[test]
    fn notification_is_recognized() {
        let inbound = decode_inbound(
            br#"{"jsonrpc":"2.0","method":"eth_subscription","params":{"subscription":"0xabc","result":{"number":"0x1"}}}"#,
        )
        .unwrap();

        let InboundMessage::Notification(notification) = inbound else {
            panic!("expected a notification");
        };
        assert_eq!(notification.subscription_id(), Some("0xabc"));
        assert_eq!(
            notification.into_subscription_result(),
            Some(json!({"number": "0x1"}))
        );
    }

    #[test]
    fn encoded_response_decodes_to_itself() {
        let envelope = ResponseEnvelope::Failure {
            id: ResponseId::Null,
            error: JsonRpcError::new(-32700, "Parse error"),
        };
        let bytes = encode_response(&envelope).unwrap();
        assert_eq!(decode_response(&bytes).unwrap(), envelope);
    }
}
