//! JavaScript-facing API.
//!
//! ```js
//! import { Ethane, RequestArguments } from "ethane-wasm-rpc-client";
//!
//! const socket = new WebSocket("ws://127.0.0.1:8546");
//! const ethane = new Ethane((text) => socket.send(text));
//! socket.onopen = () => ethane.web3.handleConnect();
//! socket.onmessage = (event) => ethane.web3.receiveText(event.data);
//! socket.onclose = () => ethane.web3.handleDisconnect("socket closed");
//!
//! const accounts = await ethane.eth_request_accounts();
//! const syncing = await ethane.web3.call(new RequestArguments("eth_syncing", []));
//! ```

use crate::RpcWasmClient;
use crate::js_convert::{error_to_js, js_to_json, json_to_js};
use ethane_rpc::rpc::{RequestArguments, RpcError};
use ethane_rpc_caller::{EthApi, RpcCallerInterface};
use futures::StreamExt;
use futures::channel::mpsc;
use js_sys::{Array, Function, Object, Promise, Reflect, Uint8Array};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::console;

/// Method name plus ordered parameters, converted to JSON on construction.
#[wasm_bindgen(js_name = RequestArguments)]
pub struct JsRequestArguments {
    inner: RequestArguments,
}

#[wasm_bindgen(js_class = RequestArguments)]
impl JsRequestArguments {
    /// Throws `{ kind: "InvalidArgument" }` for an empty method and
    /// `{ kind: "SerializationError", index }` for a parameter with no JSON form.
    #[wasm_bindgen(constructor)]
    pub fn new(method: String, params: Option<Array>) -> Result<JsRequestArguments, JsValue> {
        let params = match params {
            Some(params) => params
                .iter()
                .enumerate()
                .map(|(index, value)| js_to_json(index, &value))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| error_to_js(&err))?,
            None => Vec::new(),
        };

        RequestArguments::new(method, params)
            .map(|inner| Self { inner })
            .map_err(|err| error_to_js(&err))
    }

    #[wasm_bindgen(getter)]
    pub fn method(&self) -> String {
        self.inner.method().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn params(&self) -> Result<Array, JsValue> {
        self.inner
            .params()
            .iter()
            .map(json_to_js)
            .collect::<Result<Array, _>>()
            .map_err(|err| error_to_js(&err))
    }

    /// Envelope preview without an id; ids are assigned at dispatch.
    #[wasm_bindgen(js_name = toJSON)]
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        let object = Object::new();
        let method = JsValue::from_str(self.inner.method());
        let params: JsValue = self.params()?.into();
        for (key, value) in [("jsonrpc", JsValue::from_str("2.0")), ("method", method), ("params", params)] {
            Reflect::set(&object, &JsValue::from_str(key), &value)?;
        }
        Ok(object.into())
    }
}

/// A client instance whose socket is owned by the host.
///
/// The constructor takes the host's send function; it receives each
/// outbound envelope as a JSON string, in dispatch order.
#[wasm_bindgen]
#[derive(Clone)]
pub struct Web3 {
    client: Arc<RpcWasmClient>,
}

#[wasm_bindgen]
impl Web3 {
    #[wasm_bindgen(constructor)]
    pub fn new(emit: Function) -> Web3 {
        let (tx, mut rx) = mpsc::unbounded::<Vec<u8>>();

        spawn_local(async move {
            while let Some(bytes) = rx.next().await {
                let text = String::from_utf8_lossy(&bytes);
                if let Err(err) = emit.call1(&JsValue::NULL, &JsValue::from_str(&text)) {
                    console::error_2(&"Host emit callback threw:".into(), &err);
                }
            }
        });

        let client = RpcWasmClient::new(move |bytes| {
            if tx.unbounded_send(bytes).is_err() {
                tracing::error!("Outbound queue closed; dropping envelope");
            }
        });

        Web3 {
            client: Arc::new(client),
        }
    }

    /// Resolves with the call's result, or rejects with
    /// `{ kind, message, code?, data?, index? }`.
    pub fn call(&self, args: &JsRequestArguments) -> Promise {
        let client = self.client.clone();
        let args = args.inner.clone();
        into_promise(async move { client.call(args).await })
    }

    /// Feeds one text frame received by the host.
    #[wasm_bindgen(js_name = receiveText)]
    pub fn receive_text(&self, text: &str) -> Result<(), JsValue> {
        self.client
            .read_bytes(text.as_bytes())
            .map_err(|err| error_to_js(&err))
    }

    /// Feeds one binary frame received by the host.
    #[wasm_bindgen(js_name = readBytes)]
    pub fn read_bytes(&self, data: Uint8Array) -> Result<(), JsValue> {
        self.client
            .read_bytes(&data.to_vec())
            .map_err(|err| error_to_js(&err))
    }

    #[wasm_bindgen(js_name = handleConnect)]
    pub fn handle_connect(&self) {
        self.client.handle_connect();
    }

    #[wasm_bindgen(js_name = handleDisconnect)]
    pub fn handle_disconnect(&self, reason: Option<String>) {
        self.client
            .handle_disconnect(reason.as_deref().unwrap_or("host transport disconnected"));
    }

    /// Tears the instance down; pending and later calls reject with `Cancelled`.
    pub fn close(&self) -> Result<usize, JsValue> {
        self.client
            .close("closed by host")
            .map_err(|err| error_to_js(&err))
    }
}

/// Named convenience wrappers over a [`Web3`] instance.
#[wasm_bindgen]
pub struct Ethane {
    web3: Web3,
}

#[wasm_bindgen]
impl Ethane {
    #[wasm_bindgen(constructor)]
    pub fn new(emit: Function) -> Ethane {
        Ethane {
            web3: Web3::new(emit),
        }
    }

    #[wasm_bindgen(js_name = fromWeb3)]
    pub fn from_web3(web3: &Web3) -> Ethane {
        Ethane { web3: web3.clone() }
    }

    #[wasm_bindgen(getter)]
    pub fn web3(&self) -> Web3 {
        self.web3.clone()
    }

    pub fn eth_request_accounts(&self) -> Promise {
        let client = self.web3.client.clone();
        into_promise(async move { client.eth_request_accounts().await })
    }

    pub fn eth_accounts(&self) -> Promise {
        let client = self.web3.client.clone();
        into_promise(async move { client.eth_accounts().await })
    }

    pub fn eth_chain_id(&self) -> Promise {
        let client = self.web3.client.clone();
        into_promise(async move { client.eth_chain_id().await })
    }

    pub fn eth_block_number(&self) -> Promise {
        let client = self.web3.client.clone();
        into_promise(async move { client.eth_block_number().await })
    }

    pub fn eth_get_balance(&self, address: String, block: String) -> Promise {
        let client = self.web3.client.clone();
        into_promise(async move { client.eth_get_balance(&address, &block).await })
    }

    pub fn net_version(&self) -> Promise {
        let client = self.web3.client.clone();
        into_promise(async move { client.net_version().await })
    }

    pub fn web3_client_version(&self) -> Promise {
        let client = self.web3.client.clone();
        into_promise(async move { client.web3_client_version().await })
    }
}

fn into_promise<F>(future: F) -> Promise
where
    F: Future<Output = Result<Value, RpcError>> + 'static,
{
    future_to_promise(async move {
        let value = future.await.map_err(|err| error_to_js(&err))?;
        json_to_js(&value).map_err(|err| error_to_js(&err))
    })
}
