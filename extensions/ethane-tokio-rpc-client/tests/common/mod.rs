#![allow(dead_code)]

use axum::{
    Router,
    body::Bytes,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use ethane_rpc::rpc::{
    JsonRpcError, METHOD_NOT_FOUND_CODE, PARSE_ERROR_CODE, ResponseEnvelope, ResponseId,
    decode_request, encode_response,
};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const SUBSCRIPTION_ID: &str = "0xcd0c3e8af590364c09d0fa6a1210faf5";

/// What the mock node does with one request.
pub enum Action {
    Reply(Vec<u8>),
    ReplyAfter(Duration, Vec<u8>),
    /// Push notifications, then the reply.
    Notify(Vec<Value>, Vec<u8>),
    HangUp,
    HttpStatus(StatusCode),
}

/// Canned node behaviour shared by the HTTP, WebSocket and IPC mocks.
pub fn handle_request(bytes: &[u8]) -> Action {
    let Ok((id, args)) = decode_request(bytes) else {
        return Action::Reply(failure(ResponseId::Null, PARSE_ERROR_CODE, "Parse error", None));
    };
    let params = args.params();
    let success = |result: Value| {
        encode_response(&ResponseEnvelope::Success {
            id: id.into(),
            result,
        })
        .unwrap()
    };

    match args.method() {
        "eth_syncing" => Action::Reply(success(json!(false))),
        "eth_chainId" => Action::Reply(success(json!("0x1"))),
        "eth_blockNumber" => Action::Reply(success(json!("0x10"))),
        "net_version" => Action::Reply(success(json!("1"))),
        "web3_clientVersion" => Action::Reply(success(json!("MockNode/v0.1.0"))),
        "eth_getBalance" => Action::Reply(success(json!("0x0234c8a3397aab58"))),
        "eth_subscribe" => Action::Reply(success(json!(SUBSCRIPTION_ID))),
        "eth_unsubscribe" => Action::Reply(success(json!(
            params.first() == Some(&json!(SUBSCRIPTION_ID))
        ))),
        "mock_echo" => Action::Reply(success(json!(params))),
        "mock_sleep" => {
            let millis = params.first().and_then(Value::as_u64).unwrap_or(0);
            Action::ReplyAfter(Duration::from_millis(millis), success(json!("slept")))
        }
        "mock_fail" => Action::Reply(failure(
            id.into(),
            -32000,
            "execution reverted",
            Some(json!("0x08c379a0")),
        )),
        "mock_wrong_id" => Action::Reply(
            encode_response(&ResponseEnvelope::Success {
                id: (id + 100).into(),
                result: json!("0x1"),
            })
            .unwrap(),
        ),
        "mock_emit" => {
            let count = params.first().and_then(Value::as_u64).unwrap_or(0);
            let notifications = (1..=count)
                .map(|number| {
                    json!({
                        "jsonrpc": "2.0",
                        "method": "eth_subscription",
                        "params": {
                            "subscription": SUBSCRIPTION_ID,
                            "result": {"number": format!("{number:#x}")}
                        }
                    })
                })
                .collect();
            Action::Notify(notifications, success(json!(count)))
        }
        "mock_hangup" => Action::HangUp,
        "mock_http_500" => Action::HttpStatus(StatusCode::INTERNAL_SERVER_ERROR),
        _ => Action::Reply(failure(
            id.into(),
            METHOD_NOT_FOUND_CODE,
            "Method not found",
            None,
        )),
    }
}

fn failure(id: ResponseId, code: i64, message: &str, data: Option<Value>) -> Vec<u8> {
    let mut error = JsonRpcError::new(code, message);
    error.data = data;
    encode_response(&ResponseEnvelope::Failure { id, error }).unwrap()
}

/// Executes `action` against a duplex writer. `None` asks the writer to hang up.
/// Returns `false` once the connection should stop reading.
pub fn drive_duplex(action: Action, tx: &mpsc::UnboundedSender<Option<Vec<u8>>>) -> bool {
    match action {
        Action::Reply(bytes) => {
            let _ = tx.send(Some(bytes));
        }
        Action::ReplyAfter(delay, bytes) => {
            let tx = tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(Some(bytes));
            });
        }
        Action::Notify(notifications, bytes) => {
            for notification in notifications {
                let _ = tx.send(Some(serde_json::to_vec(&notification).unwrap()));
            }
            let _ = tx.send(Some(bytes));
        }
        Action::HangUp => {
            let _ = tx.send(None);
            return false;
        }
        Action::HttpStatus(_) => {
            let _ = tx.send(Some(failure(
                ResponseId::Null,
                METHOD_NOT_FOUND_CODE,
                "Method not found",
                None,
            )));
        }
    }
    true
}

#[derive(Clone, Default)]
pub struct NodeState {
    authorizations: Arc<Mutex<Vec<Option<String>>>>,
}

impl NodeState {
    fn record(&self, headers: &HeaderMap) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        self.authorizations.lock().unwrap().push(authorization);
    }
}

/// An axum JSON-RPC node on an ephemeral port: POST `/` and WebSocket `/ws`.
pub struct MockNode {
    pub addr: SocketAddr,
    state: NodeState,
    task: JoinHandle<()>,
}

impl MockNode {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = NodeState::default();

        let app = Router::new()
            .route("/", post(http_handler))
            .route("/ws", get(ws_handler))
            .with_state(state.clone());

        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, task }
    }

    pub fn http_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// `Authorization` headers seen so far, one entry per HTTP request or
    /// WebSocket handshake.
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.state.authorizations.lock().unwrap().clone()
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn http_handler(State(state): State<NodeState>, headers: HeaderMap, body: Bytes) -> Response {
    state.record(&headers);

    let bytes = match handle_request(&body) {
        Action::Reply(bytes) | Action::Notify(_, bytes) => bytes,
        Action::ReplyAfter(delay, bytes) => {
            tokio::time::sleep(delay).await;
            bytes
        }
        Action::HttpStatus(status) => return (status, "internal failure").into_response(),
        Action::HangUp => return StatusCode::BAD_GATEWAY.into_response(),
    };
    ([(header::CONTENT_TYPE, "application/json")], bytes).into_response()
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<NodeState>,
    headers: HeaderMap,
) -> Response {
    state.record(&headers);
    ws.on_upgrade(handle_socket)
}

async fn handle_socket(socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Option<Vec<u8>>>();

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let Some(bytes) = frame else {
                let _ = sender.close().await;
                break;
            };
            let text = String::from_utf8(bytes).unwrap();
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        if !drive_duplex(handle_request(text.as_str().as_bytes()), &tx) {
            break;
        }
    }

    drop(tx);
    let _ = writer.await;
}

#[cfg(unix)]
pub use ipc::MockIpcNode;

#[cfg(unix)]
mod ipc {
    use super::{drive_duplex, handle_request};
    use ethane_tokio_rpc_client::JsonObjectCodec;
    use futures::StreamExt;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::AsyncWriteExt;
    use tokio::net::{UnixListener, UnixStream};
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;
    use tokio_util::codec::FramedRead;

    static NEXT_SOCKET: AtomicUsize = AtomicUsize::new(0);

    /// A JSON-RPC node listening on a Unix domain socket in the temp dir.
    pub struct MockIpcNode {
        pub path: PathBuf,
        task: JoinHandle<()>,
    }

    impl MockIpcNode {
        pub async fn spawn() -> Self {
            let path = std::env::temp_dir().join(format!(
                "ethane-mock-{}-{}.ipc",
                std::process::id(),
                NEXT_SOCKET.fetch_add(1, Ordering::SeqCst)
            ));
            let _ = std::fs::remove_file(&path);
            let listener = UnixListener::bind(&path).unwrap();

            let task = tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    tokio::spawn(serve(stream));
                }
            });

            Self { path, task }
        }

        pub fn endpoint(&self) -> String {
            format!("ipc://{}", self.path.display())
        }
    }

    impl Drop for MockIpcNode {
        fn drop(&mut self) {
            self.task.abort();
            let _ = std::fs::remove_file(&self.path);
        }
    }

    async fn serve(stream: UnixStream) {
        let (reader, mut writer) = stream.into_split();
        let mut frames = FramedRead::new(reader, JsonObjectCodec::new());
        let (tx, mut rx) = mpsc::unbounded_channel::<Option<Vec<u8>>>();

        // Replies are written back to back without delimiters, split in two
        // writes so the client has to reassemble them.
        let writer_task = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                let Some(bytes) = frame else {
                    let _ = writer.shutdown().await;
                    break;
                };
                let (head, tail) = bytes.split_at(bytes.len() / 2);
                if writer.write_all(head).await.is_err() {
                    break;
                }
                let _ = writer.flush().await;
                if writer.write_all(tail).await.is_err() {
                    break;
                }
            }
        });

        while let Some(Ok(frame)) = frames.next().await {
            if !drive_duplex(handle_request(&frame), &tx) {
                break;
            }
        }

        drop(tx);
        let _ = writer_task.await;
    }
}
