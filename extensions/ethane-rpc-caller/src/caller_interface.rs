use crate::{ParamValidation, Subscription, TransportReply, WithDispatcher};
use ethane_rpc::rpc::{
    CallOutcome, CompletionHandle, OutboundCall, RequestArguments, RpcDispatcher, RpcError,
    TransportError,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Defines a generic capability for making JSON-RPC calls.
///
/// Any client that can provide an [`RpcDispatcher`] and write request bytes to
/// some transport gains `call`, `call_as`, `subscribe` and `close`, plus every
/// named wrapper in [`EthApi`](crate::EthApi).
#[async_trait::async_trait]
pub trait RpcCallerInterface: Send + Sync {
    // --- METHODS TO BE IMPLEMENTED BY THE CLIENT ---

    /// The shared dispatcher holding this client's pending calls.
    fn dispatcher(&self) -> Arc<Mutex<RpcDispatcher>>;

    /// Writes one encoded request to the transport.
    ///
    /// Request/response transports return the paired reply body; duplex
    /// transports return [`TransportReply::Deferred`] and feed the reply to
    /// the dispatcher from their receive loop.
    async fn transmit(&self, request_bytes: Vec<u8>) -> Result<TransportReply, TransportError>;

    fn param_validation(&self) -> ParamValidation {
        ParamValidation::Off
    }

    fn supports_subscriptions(&self) -> bool {
        false
    }

    /// Waits for a deferred reply. Clients with a request timeout override this.
    async fn await_completion(&self, handle: CompletionHandle) -> CallOutcome {
        handle.await
    }

    // --- METHODS PROVIDED AUTOMATICALLY BY THE TRAIT ---

    /// Performs one call and resolves with its result.
    ///
    /// Failures only ever concern this call: a transport error, a malformed
    /// or mismatched reply, or the node's error object. Transport failures
    /// are not retried.
    async fn call(&self, args: RequestArguments) -> Result<Value, RpcError> {
        let dispatcher = self.dispatcher();
        let outbound = dispatcher.with_dispatcher(|d| d.dispatch(&args))??;
        exchange(self, &dispatcher, outbound).await
    }

    /// Performs a call and deserializes its result.
    async fn call_as<T>(&self, args: RequestArguments) -> Result<T, RpcError>
    where
        T: DeserializeOwned + Send,
    {
        let method = args.method().to_string();
        let value = self.call(args).await?;
        serde_json::from_value(value).map_err(|err| {
            RpcError::Protocol(format!("unexpected result for `{method}`: {err}"))
        })
    }

    /// Opens a server-push subscription, e.g. `eth_subscribe ["newHeads"]`.
    async fn subscribe(&self, args: RequestArguments) -> Result<Subscription, RpcError> {
        if !self.supports_subscriptions() {
            return Err(RpcError::InvalidArgument(format!(
                "`{}` needs a duplex transport",
                args.method()
            )));
        }

        let dispatcher = self.dispatcher();
        let outbound = dispatcher.with_dispatcher(|d| d.dispatch_subscription(&args))??;
        let id = outbound.id;
        let outcome = exchange(self, &dispatcher, outbound).await;

        // The dispatcher registered the stream while resolving the reply.
        let opened = dispatcher.with_dispatcher(|d| {
            let opened = d.take_subscription(id);
            if outcome.is_err() {
                if let Some((subscription_id, _)) = &opened {
                    d.remove_subscription(subscription_id);
                }
            }
            opened
        })?;

        match (outcome?, opened) {
            (Value::String(_), Some((subscription_id, receiver))) => {
                Ok(Subscription::new(subscription_id, receiver, &dispatcher))
            }
            (Value::String(subscription_id), None) => Err(RpcError::Cancelled(format!(
                "subscription {subscription_id} was closed before it opened"
            ))),
            (other, _) => Err(RpcError::Protocol(format!(
                "expected a subscription id, got {other}"
            ))),
        }
    }

    /// Tears the client down. Pending calls fail with [`RpcError::Cancelled`],
    /// subscription streams end, and later calls fail without any I/O.
    ///
    /// Returns how many pending calls were cancelled.
    fn close(&self, reason: &str) -> Result<usize, RpcError> {
        self.dispatcher().with_dispatcher(|d| d.close(reason))
    }
}

/// Transmits a dispatched call and waits for its outcome.
async fn exchange<C>(
    client: &C,
    dispatcher: &Mutex<RpcDispatcher>,
    outbound: OutboundCall,
) -> CallOutcome
where
    C: RpcCallerInterface + ?Sized,
{
    let OutboundCall {
        id,
        request_bytes,
        handle,
    } = outbound;

    match client.transmit(request_bytes).await {
        Ok(TransportReply::Response(response_bytes)) => {
            dispatcher.with_dispatcher(|d| d.complete_exchange(id, &response_bytes))?;
            handle.await
        }
        Ok(TransportReply::Deferred) => client.await_completion(handle).await,
        Err(err) => {
            tracing::debug!("Transport failed for call {}: {}", id, err);
            dispatcher.with_dispatcher(|d| d.fail(id, RpcError::Transport(err)))?;
            handle.await
        }
    }
}
