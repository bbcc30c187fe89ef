//! Runtime-agnostic core of a JSON-RPC 2.0 client for Ethereum-style nodes.
//!
//! This crate builds request envelopes, allocates request ids, tracks pending
//! calls and decodes responses. It performs no I/O: transports live in the
//! extension crates and feed bytes into an [`rpc::RpcDispatcher`].
//!
//! ```rust
//! use ethane_rpc::rpc::{RequestArguments, RpcDispatcher};
//!
//! let mut dispatcher = RpcDispatcher::new();
//! let args = RequestArguments::new("eth_syncing", vec![]).unwrap();
//! let call = dispatcher.dispatch(&args).unwrap();
//! assert_eq!(
//!     call.request_bytes,
//!     br#"{"jsonrpc":"2.0","id":1,"method":"eth_syncing","params":[]}"#
//! );
//!
//! dispatcher
//!     .read_bytes(br#"{"jsonrpc":"2.0","id":1,"result":false}"#)
//!     .unwrap();
//! ```

pub mod constants;
pub mod rpc;
