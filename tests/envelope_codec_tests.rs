use assert_matches::assert_matches;
use ethane_rpc::rpc::{
    InboundMessage, JsonRpcError, RequestArguments, ResponseEnvelope, ResponseId, RpcError,
    decode_inbound, decode_request, decode_response, encode_request,
};
use proptest::prelude::*;
use serde_json::{Value, json};

#[test]
fn eth_syncing_envelope_matches_wire_format() {
    let args = RequestArguments::new("eth_syncing", vec![]).unwrap();
    let bytes = encode_request(1, &args).unwrap();

    let encoded: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        encoded,
        json!({"jsonrpc": "2.0", "id": 1, "method": "eth_syncing", "params": []})
    );
}

#[test]
fn success_response_decodes() {
    let envelope = decode_response(br#"{"jsonrpc":"2.0","id":1,"result":false}"#).unwrap();
    assert_eq!(
        envelope,
        ResponseEnvelope::Success {
            id: ResponseId::Number(1),
            result: json!(false),
        }
    );
}

#[test]
fn failure_response_decodes_without_data() {
    let envelope = decode_response(
        br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#,
    )
    .unwrap();

    assert_eq!(
        envelope.into_outcome(),
        Err(RpcError::Remote(JsonRpcError {
            code: -32601,
            message: "Method not found".to_string(),
            data: None,
        }))
    );
}

#[test]
fn malformed_envelopes_are_protocol_errors() {
    let cases: [&[u8]; 9] = [
        b"not json",
        b"[1, 2, 3]",
        br#"{"jsonrpc":"2.0","result":1}"#,
        br#"{"jsonrpc":"2.0","id":1}"#,
        br#"{"jsonrpc":"2.0","id":1,"result":1,"error":{"code":1,"message":"x"}}"#,
        br#"{"jsonrpc":"2.0","id":1,"error":{"code":"oops","message":"x"}}"#,
        br#"{"jsonrpc":"2.0","id":1,"error":{"message":"no code"}}"#,
        br#"{"jsonrpc":"1.0","id":1,"result":1}"#,
        br#"{"jsonrpc":"2.0","id":null,"result":1}"#,
    ];

    for case in cases {
        let err = decode_response(case).expect_err(&String::from_utf8_lossy(case));
        assert_matches!(err, RpcError::Protocol(message) if message.starts_with("malformed envelope"));
    }
}

#[test]
fn null_id_is_accepted_on_failures() {
    let envelope = decode_response(
        br#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#,
    )
    .unwrap();
    assert_eq!(envelope.id(), &ResponseId::Null);
    assert!(!envelope.is_success());
}

#[test]
fn missing_error_message_defaults_to_empty() {
    let envelope = decode_response(br#"{"id":3,"error":{"code":-32000}}"#).unwrap();
    assert_matches!(
        envelope,
        ResponseEnvelope::Failure { error, .. } if error.message.is_empty() && error.code == -32000
    );
}

#[test]
fn inbound_frames_distinguish_responses_from_notifications() {
    let response = decode_inbound(br#"{"jsonrpc":"2.0","id":7,"result":"0x1"}"#).unwrap();
    assert_matches!(response, InboundMessage::Response(ResponseEnvelope::Success { .. }));

    let notification = decode_inbound(
        br#"{"jsonrpc":"2.0","method":"eth_subscription","params":{"subscription":"0x9","result":"0xdead"}}"#,
    )
    .unwrap();
    assert_matches!(notification, InboundMessage::Notification(n) if n.subscription_id() == Some("0x9"));
}

#[test]
fn request_without_params_decodes_to_zero_arity() {
    let (id, args) = decode_request(br#"{"jsonrpc":"2.0","id":5,"method":"eth_chainId"}"#).unwrap();
    assert_eq!(id, 5);
    assert_eq!(args, RequestArguments::new("eth_chainId", vec![]).unwrap());
}

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        "[a-zA-Z0-9 _x]{0,24}".prop_map(Value::from),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn encode_then_decode_round_trips(
        id in any::<u64>(),
        method in "[a-z]{1,12}_[a-zA-Z]{1,16}",
        params in prop::collection::vec(json_value(), 0..6),
    ) {
        let args = RequestArguments::new(method, params).unwrap();
        let bytes = encode_request(id, &args).unwrap();
        let (decoded_id, decoded_args) = decode_request(&bytes).unwrap();

        prop_assert_eq!(decoded_id, id);
        prop_assert_eq!(decoded_args, args);
    }
}
