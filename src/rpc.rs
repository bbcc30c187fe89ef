mod rpc_completion_handle;
mod rpc_dispatcher;
mod rpc_envelope;
mod rpc_error;
mod rpc_id_allocator;
mod rpc_pending_call_table;
mod rpc_request_arguments;
mod rpc_subscription_registry;

pub use rpc_completion_handle::{CallOutcome, CompletionHandle};
pub use rpc_dispatcher::{OutboundCall, RpcDispatcher};
pub use rpc_envelope::{
    InboundMessage, Notification, RequestId, ResponseEnvelope, ResponseId, decode_inbound,
    decode_request, decode_response, encode_request, encode_response,
};
pub use rpc_error::{
    INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE, INVALID_REQUEST_CODE, JsonRpcError,
    METHOD_NOT_FOUND_CODE, PARSE_ERROR_CODE, RpcError, TransportError,
};
pub use rpc_id_allocator::IdAllocator;
pub use rpc_pending_call_table::{
    PendingCallTable, Resolution, UnsolicitedResponse, UnsolicitedResponseHandler,
};
pub use rpc_request_arguments::RequestArguments;
pub use rpc_subscription_registry::SubscriptionRegistry;
