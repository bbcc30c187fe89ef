use ethane_rpc::rpc::{RpcDispatcher, RpcError, TransportError};
use ethane_rpc_caller::{ClientConfig, ParamValidation, RpcCallerInterface, TransportReply};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::sync::{Arc, Mutex};
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";

/// JSON-RPC over HTTP(S) POST.
///
/// Each call is one request/response exchange, so replies pair with their
/// request directly. The underlying connection pool is shared by clones.
#[derive(Debug, Clone)]
pub struct HttpRpcClient {
    endpoint: Url,
    http: reqwest::Client,
    dispatcher: Arc<Mutex<RpcDispatcher>>,
    config: ClientConfig,
}

impl HttpRpcClient {
    pub fn new(endpoint: &str) -> Result<Self, RpcError> {
        Self::with_config(endpoint, ClientConfig::default())
    }

    pub fn with_config(endpoint: &str, config: ClientConfig) -> Result<Self, RpcError> {
        let endpoint = Url::parse(endpoint).map_err(|err| {
            RpcError::InvalidArgument(format!("invalid endpoint {endpoint:?}: {err}"))
        })?;
        Self::from_url(endpoint, config)
    }

    pub fn from_url(endpoint: Url, config: ClientConfig) -> Result<Self, RpcError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
        if let Some(authorization) = config.authorization() {
            let mut value = HeaderValue::from_str(&authorization).map_err(|_| {
                RpcError::InvalidArgument("credentials are not a valid header value".to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout);
        if let Some(request_timeout) = config.request_timeout {
            builder = builder.timeout(request_timeout);
        }
        let http = builder
            .build()
            .map_err(|err| RpcError::Internal(format!("failed to build HTTP client: {err}")))?;

        tracing::debug!("HTTP client ready for {}", endpoint);

        Ok(Self {
            endpoint,
            http,
            dispatcher: Arc::new(Mutex::new(RpcDispatcher::new())),
            config,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl RpcCallerInterface for HttpRpcClient {
    fn dispatcher(&self) -> Arc<Mutex<RpcDispatcher>> {
        self.dispatcher.clone()
    }

    async fn transmit(&self, request_bytes: Vec<u8>) -> Result<TransportReply, TransportError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .body(request_bytes)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(JSON_CONTENT_TYPE));

        // Nodes commonly attach a JSON-RPC error body to 4xx/5xx statuses.
        if !status.is_success() && !is_json {
            return Err(TransportError::Io(format!("HTTP status {status}")));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(TransportReply::Response(body.to_vec()))
    }

    fn param_validation(&self) -> ParamValidation {
        self.config.param_validation
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::ConnectionRefused
    } else {
        TransportError::Io(err.to_string())
    }
}
