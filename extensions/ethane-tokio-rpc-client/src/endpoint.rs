use ethane_rpc::rpc::RpcError;
use std::path::{Path, PathBuf};
use url::Url;

const IPC_SCHEME_PREFIX: &str = "ipc://";

/// Where a client connects, as chosen from the endpoint string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `http://` or `https://`
    Http(Url),
    /// `ws://` or `wss://`
    WebSocket(Url),
    /// `ipc://<path>` or an absolute filesystem path.
    Ipc(PathBuf),
}

impl Endpoint {
    pub fn parse(endpoint: &str) -> Result<Self, RpcError> {
        if let Some(path) = endpoint.strip_prefix(IPC_SCHEME_PREFIX) {
            return Ok(Self::Ipc(PathBuf::from(path)));
        }
        if Path::new(endpoint).is_absolute() {
            return Ok(Self::Ipc(PathBuf::from(endpoint)));
        }

        let url = Url::parse(endpoint).map_err(|err| {
            RpcError::InvalidArgument(format!("invalid endpoint {endpoint:?}: {err}"))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(Self::Http(url)),
            "ws" | "wss" => Ok(Self::WebSocket(url)),
            scheme => Err(RpcError::InvalidArgument(format!(
                "unsupported endpoint scheme {scheme:?}"
            ))),
        }
    }
}
