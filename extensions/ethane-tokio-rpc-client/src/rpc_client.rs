use crate::{DuplexRpcClient, Endpoint, HttpRpcClient};
use ethane_rpc::rpc::{CallOutcome, CompletionHandle, RpcDispatcher, RpcError, TransportError};
use ethane_rpc_caller::{
    ClientConfig, ParamValidation, RpcCallerInterface, TransportReply, TransportState,
};
use std::sync::{Arc, Mutex};

/// A client for any supported endpoint, with the transport picked from the
/// endpoint string.
///
/// ```no_run
/// use ethane_rpc::rpc::RequestArguments;
/// use ethane_tokio_rpc_client::{EthApi, RpcCallerInterface, RpcClient};
///
/// # async fn run() -> Result<(), ethane_rpc::rpc::RpcError> {
/// let client = RpcClient::new("http://127.0.0.1:8545").await?;
/// let syncing = client.call(RequestArguments::no_params("eth_syncing")?).await?;
/// let chain_id = client.eth_chain_id().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub enum RpcClient {
    Http(HttpRpcClient),
    Duplex(DuplexRpcClient),
}

impl RpcClient {
    /// `http(s)://` uses HTTP, `ws(s)://` a WebSocket, and `ipc://<path>` or
    /// an absolute path a Unix domain socket.
    pub async fn new(endpoint: &str) -> Result<Self, RpcError> {
        Self::with_config(endpoint, ClientConfig::default()).await
    }

    pub async fn with_config(endpoint: &str, config: ClientConfig) -> Result<Self, RpcError> {
        match Endpoint::parse(endpoint)? {
            Endpoint::Http(url) => Ok(Self::Http(HttpRpcClient::from_url(url, config)?)),
            Endpoint::WebSocket(url) => Ok(Self::Duplex(
                DuplexRpcClient::connect_websocket(url.as_str(), config).await?,
            )),
            #[cfg(unix)]
            Endpoint::Ipc(path) => Ok(Self::Duplex(
                DuplexRpcClient::connect_ipc(path, config).await?,
            )),
            #[cfg(not(unix))]
            Endpoint::Ipc(path) => Err(RpcError::InvalidArgument(format!(
                "IPC endpoints are not supported on this platform: {}",
                path.display()
            ))),
        }
    }

    /// Registers a lifecycle handler. HTTP has no persistent connection, so
    /// the handler is only ever called for duplex clients.
    pub fn set_state_change_handler(
        &self,
        handler: impl Fn(TransportState) + Send + Sync + 'static,
    ) {
        if let Self::Duplex(client) = self {
            client.set_state_change_handler(handler);
        }
    }
}

#[async_trait::async_trait]
impl RpcCallerInterface for RpcClient {
    fn dispatcher(&self) -> Arc<Mutex<RpcDispatcher>> {
        match self {
            Self::Http(client) => client.dispatcher(),
            Self::Duplex(client) => client.dispatcher(),
        }
    }

    async fn transmit(&self, request_bytes: Vec<u8>) -> Result<TransportReply, TransportError> {
        match self {
            Self::Http(client) => client.transmit(request_bytes).await,
            Self::Duplex(client) => client.transmit(request_bytes).await,
        }
    }

    fn param_validation(&self) -> ParamValidation {
        match self {
            Self::Http(client) => client.param_validation(),
            Self::Duplex(client) => client.param_validation(),
        }
    }

    fn supports_subscriptions(&self) -> bool {
        matches!(self, Self::Duplex(_))
    }

    async fn await_completion(&self, handle: CompletionHandle) -> CallOutcome {
        match self {
            Self::Http(client) => client.await_completion(handle).await,
            Self::Duplex(client) => client.await_completion(handle).await,
        }
    }
}
