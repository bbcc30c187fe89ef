#[cfg(unix)]
use crate::JsonObjectCodec;
use ethane_rpc::rpc::{CallOutcome, CompletionHandle, RpcDispatcher, RpcError, TransportError};
use ethane_rpc_caller::{
    ClientConfig, ParamValidation, RpcCallerInterface, StateChangeHandler, TransportReply,
    TransportState, WithDispatcher,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt, future};
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Error as WsError, Message as WsMessage, client::IntoClientRequest,
        http::HeaderValue, http::header::AUTHORIZATION,
    },
};

/// Connection liveness shared between the client and its I/O tasks.
struct ConnectionState {
    is_connected: AtomicBool,
    state_change_handler: Mutex<Option<StateChangeHandler>>,
}

impl ConnectionState {
    fn connected() -> Self {
        Self {
            is_connected: AtomicBool::new(true),
            state_change_handler: Mutex::new(None),
        }
    }

    /// Runs once per connection: closes the dispatcher so every pending call
    /// and subscription ends, then reports `Disconnected`.
    fn mark_disconnected(&self, dispatcher: &Mutex<RpcDispatcher>, reason: &str) {
        if !self.is_connected.swap(false, Ordering::SeqCst) {
            return;
        }

        tracing::info!("Transport disconnected: {}", reason);
        match dispatcher.with_dispatcher(|d| d.close(reason)) {
            Ok(0) => {}
            Ok(cancelled) => tracing::error!("Cancelled {} pending calls: {}", cancelled, reason),
            Err(err) => tracing::error!("Failed to close dispatcher: {}", err),
        }

        if let Ok(handler) = self.state_change_handler.lock() {
            if let Some(handler) = handler.as_ref() {
                handler(TransportState::Disconnected);
            }
        }
    }
}

/// JSON-RPC over a persistent connection (WebSocket or IPC).
///
/// Requests are written by a send task; a receive task feeds every inbound
/// frame to the dispatcher, which resolves calls by id in whatever order the
/// node answers and routes subscription notifications. Losing the connection
/// cancels everything in flight. Dropping the client stops both tasks.
pub struct DuplexRpcClient {
    dispatcher: Arc<Mutex<RpcDispatcher>>,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    config: ClientConfig,
    connection: Arc<ConnectionState>,
    task_handles: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for DuplexRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplexRpcClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DuplexRpcClient {
    /// Connects to a `ws://` or `wss://` endpoint.
    pub async fn connect_websocket(endpoint: &str, config: ClientConfig) -> Result<Self, RpcError> {
        let mut request = endpoint.into_client_request().map_err(|err| {
            RpcError::InvalidArgument(format!("invalid endpoint {endpoint:?}: {err}"))
        })?;
        if let Some(authorization) = config.authorization() {
            let value = HeaderValue::from_str(&authorization).map_err(|_| {
                RpcError::InvalidArgument("credentials are not a valid header value".to_string())
            })?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (ws_stream, _) = tokio::time::timeout(config.connect_timeout, connect_async(request))
            .await
            .map_err(|_| RpcError::Transport(TransportError::Timeout))?
            .map_err(map_ws_error)?;

        tracing::info!("Connected to {}", endpoint);

        let (sink, stream) = ws_stream.split();
        let sink = sink.with(|bytes: Vec<u8>| future::ready(text_message(bytes)));
        let inbound = stream.map(|message| {
            message.map(|message| match message {
                WsMessage::Text(text) => Some(text.as_bytes().to_vec()),
                WsMessage::Binary(bytes) => Some(bytes.to_vec()),
                // Ping/Pong are answered by tungstenite; Close ends the stream.
                _ => None,
            })
        });

        Ok(Self::spawn(sink, inbound, config))
    }

    /// Connects to a node's IPC socket.
    #[cfg(unix)]
    pub async fn connect_ipc(
        path: impl AsRef<std::path::Path>,
        config: ClientConfig,
    ) -> Result<Self, RpcError> {
        let path = path.as_ref();
        let stream = tokio::time::timeout(
            config.connect_timeout,
            tokio::net::UnixStream::connect(path),
        )
        .await
        .map_err(|_| RpcError::Transport(TransportError::Timeout))?
        .map_err(|err| RpcError::Transport(err.into()))?;

        tracing::info!("Connected to {}", path.display());

        let (sink, frames) = tokio_util::codec::Framed::new(stream, JsonObjectCodec::new()).split();
        let inbound = frames.map(|frame| frame.map(|frame| Some(frame.to_vec())));

        Ok(Self::spawn(sink, inbound, config))
    }

    fn spawn<S, R, E>(mut sink: S, mut inbound: R, config: ClientConfig) -> Self
    where
        S: Sink<Vec<u8>> + Send + Unpin + 'static,
        S::Error: Display,
        R: Stream<Item = Result<Option<Vec<u8>>, E>> + Send + Unpin + 'static,
        E: Display,
    {
        let dispatcher = Arc::new(Mutex::new(RpcDispatcher::new()));
        let connection = Arc::new(ConnectionState::connected());
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

        // Send loop
        let send_task = tokio::spawn({
            let dispatcher = dispatcher.clone();
            let connection = connection.clone();
            async move {
                while let Some(bytes) = rx.recv().await {
                    if let Err(err) = sink.send(bytes).await {
                        tracing::error!("Write failed: {}", err);
                        connection.mark_disconnected(&dispatcher, "connection lost");
                        break;
                    }
                }
            }
        });

        // Receive loop
        let recv_task = tokio::spawn({
            let dispatcher = dispatcher.clone();
            let connection = connection.clone();
            async move {
                while let Some(frame) = inbound.next().await {
                    match frame {
                        Ok(Some(bytes)) => feed_frame(&dispatcher, &bytes),
                        Ok(None) => {}
                        Err(err) => {
                            tracing::error!("Read failed: {}", err);
                            break;
                        }
                    }
                }
                connection.mark_disconnected(&dispatcher, "connection closed by peer");
            }
        });

        Self {
            dispatcher,
            tx,
            config,
            connection,
            task_handles: vec![send_task, recv_task],
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected.load(Ordering::SeqCst)
    }

    /// Registers a handler for connection lifecycle changes.
    ///
    /// If the client is already connected the handler is immediately called
    /// with [`TransportState::Connected`].
    pub fn set_state_change_handler(
        &self,
        handler: impl Fn(TransportState) + Send + Sync + 'static,
    ) {
        let Ok(mut slot) = self.connection.state_change_handler.lock() else {
            tracing::error!("State change handler lock poisoned");
            return;
        };
        if self.is_connected() {
            handler(TransportState::Connected);
        }
        *slot = Some(Box::new(handler));
    }
}

#[async_trait::async_trait]
impl RpcCallerInterface for DuplexRpcClient {
    fn dispatcher(&self) -> Arc<Mutex<RpcDispatcher>> {
        self.dispatcher.clone()
    }

    async fn transmit(&self, request_bytes: Vec<u8>) -> Result<TransportReply, TransportError> {
        self.tx
            .send(request_bytes)
            .map_err(|_| TransportError::Io("connection closed".to_string()))?;
        Ok(TransportReply::Deferred)
    }

    fn param_validation(&self) -> ParamValidation {
        self.config.param_validation
    }

    fn supports_subscriptions(&self) -> bool {
        true
    }

    async fn await_completion(&self, handle: CompletionHandle) -> CallOutcome {
        let Some(request_timeout) = self.config.request_timeout else {
            return handle.await;
        };

        let id = handle.id();
        match tokio::time::timeout(request_timeout, handle).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!("Call {} timed out after {:?}", id, request_timeout);
                let timeout = RpcError::Transport(TransportError::Timeout);
                self.dispatcher.with_dispatcher(|d| d.fail(id, timeout.clone()))?;
                Err(timeout)
            }
        }
    }
}

impl Drop for DuplexRpcClient {
    fn drop(&mut self) {
        for handle in &self.task_handles {
            handle.abort();
        }
        self.connection
            .mark_disconnected(&self.dispatcher, "client dropped");
    }
}

fn feed_frame(dispatcher: &Mutex<RpcDispatcher>, bytes: &[u8]) {
    match dispatcher.with_dispatcher(|d| d.read_bytes(bytes)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!("Discarding inbound frame: {}", err),
        Err(err) => tracing::error!("Failed to route inbound frame: {}", err),
    }
}

// Envelopes are produced by serde_json and are always valid UTF-8.
fn text_message(bytes: Vec<u8>) -> Result<WsMessage, WsError> {
    Ok(WsMessage::text(String::from_utf8_lossy(&bytes).into_owned()))
}

fn map_ws_error(err: WsError) -> RpcError {
    match err {
        WsError::Io(err) => RpcError::Transport(err.into()),
        other => RpcError::Transport(TransportError::Io(other.to_string())),
    }
}
