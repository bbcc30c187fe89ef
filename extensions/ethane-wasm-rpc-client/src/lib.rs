mod rpc_wasm_client;
pub use rpc_wasm_client::*;

pub mod bindings;
pub mod js_convert;

// Re-expose for simplicity
pub use ethane_rpc_caller::{EthApi, RpcCallerInterface, TransportState};
