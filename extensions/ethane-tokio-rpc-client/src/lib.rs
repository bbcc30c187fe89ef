mod duplex_client;
pub use duplex_client::DuplexRpcClient;

mod endpoint;
pub use endpoint::Endpoint;

mod http_client;
pub use http_client::HttpRpcClient;

mod json_object_codec;
pub use json_object_codec::JsonObjectCodec;

mod rpc_client;
pub use rpc_client::RpcClient;

// Re-expose for simplicity
pub use ethane_rpc_caller::{
    ClientConfig, Credentials, EthApi, ParamValidation, RpcCallerInterface, Subscription,
    TransportState,
};
pub use ethane_rpc::rpc::{JsonRpcError, RequestArguments, RpcError, TransportError};
