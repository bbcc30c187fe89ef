#![allow(dead_code)]

use ethane_rpc::rpc::{RpcDispatcher, TransportError};
use ethane_rpc_caller::{ParamValidation, RpcCallerInterface, TransportReply};
use futures::channel::mpsc;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

type Responder = Arc<dyn Fn(&Value) -> Result<TransportReply, TransportError> + Send + Sync>;

/// Request/response mock: every request is answered by `responder`, the way
/// an HTTP POST pairs its body with the request.
#[derive(Clone)]
pub struct ExchangeClient {
    pub dispatcher: Arc<Mutex<RpcDispatcher>>,
    pub sent: Arc<Mutex<Vec<Value>>>,
    pub validation: ParamValidation,
    responder: Responder,
}

impl ExchangeClient {
    pub fn new(
        responder: impl Fn(&Value) -> Result<TransportReply, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            dispatcher: Arc::new(Mutex::new(RpcDispatcher::new())),
            sent: Arc::default(),
            validation: ParamValidation::Off,
            responder: Arc::new(responder),
        }
    }

    /// Answers every request with `result`, echoing its id.
    pub fn answering(result: Value) -> Self {
        Self::new(move |request| Ok(reply(json!({"jsonrpc": "2.0", "id": request["id"], "result": result}))))
    }

    pub fn sent(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RpcCallerInterface for ExchangeClient {
    fn dispatcher(&self) -> Arc<Mutex<RpcDispatcher>> {
        self.dispatcher.clone()
    }

    async fn transmit(&self, request_bytes: Vec<u8>) -> Result<TransportReply, TransportError> {
        let request: Value = serde_json::from_slice(&request_bytes).unwrap();
        self.sent.lock().unwrap().push(request.clone());
        (self.responder)(&request)
    }

    fn param_validation(&self) -> ParamValidation {
        self.validation
    }
}

/// Duplex mock: requests go out on a channel and replies are fed back
/// through the dispatcher by whoever holds the receiving end.
pub struct DuplexClient {
    pub dispatcher: Arc<Mutex<RpcDispatcher>>,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
}

impl DuplexClient {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (outbound, requests) = mpsc::unbounded();
        let client = Self {
            dispatcher: Arc::new(Mutex::new(RpcDispatcher::new())),
            outbound,
        };
        (client, requests)
    }

    pub fn feed(&self, frame: Value) {
        self.dispatcher
            .lock()
            .unwrap()
            .read_bytes(&serde_json::to_vec(&frame).unwrap())
            .unwrap();
    }
}

#[async_trait::async_trait]
impl RpcCallerInterface for DuplexClient {
    fn dispatcher(&self) -> Arc<Mutex<RpcDispatcher>> {
        self.dispatcher.clone()
    }

    async fn transmit(&self, request_bytes: Vec<u8>) -> Result<TransportReply, TransportError> {
        self.outbound
            .unbounded_send(request_bytes)
            .map_err(|_| TransportError::Io("outbound channel closed".into()))?;
        Ok(TransportReply::Deferred)
    }

    fn supports_subscriptions(&self) -> bool {
        true
    }
}

pub fn reply(body: Value) -> TransportReply {
    TransportReply::Response(serde_json::to_vec(&body).unwrap())
}

pub fn decode(frame: &[u8]) -> Value {
    serde_json::from_slice(frame).unwrap()
}
