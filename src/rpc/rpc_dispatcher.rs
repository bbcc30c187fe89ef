use crate::rpc::{
    CallOutcome, CompletionHandle, IdAllocator, InboundMessage, PendingCallTable, RequestArguments,
    RequestId, Resolution, ResponseEnvelope, ResponseId, RpcError, SubscriptionRegistry,
    UnsolicitedResponse, decode_inbound, decode_response, encode_request,
};
use futures::channel::mpsc;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// A request that has been encoded and registered, ready for the transport.
#[derive(Debug)]
pub struct OutboundCall {
    pub id: RequestId,
    pub request_bytes: Vec<u8>,
    pub handle: CompletionHandle,
}

/// Runtime-agnostic bookkeeping for one client.
///
/// Owns the id allocator, the pending-call table and the subscription
/// registry. Transports feed inbound bytes into it; it never performs I/O
/// itself, so the same dispatcher serves HTTP, duplex and host-fed transports.
#[derive(Debug, Default)]
pub struct RpcDispatcher {
    id_allocator: IdAllocator,
    pending_calls: PendingCallTable,
    subscriptions: SubscriptionRegistry,
    subscribe_calls: HashSet<RequestId>,
    opened_subscriptions: HashMap<RequestId, (String, mpsc::UnboundedReceiver<Value>)>,
    closed_reason: Option<String>,
}

impl RpcDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an id, encodes the envelope and registers the pending call.
    ///
    /// A dispatcher that has been closed fails immediately with
    /// [`RpcError::Cancelled`] and allocates nothing.
    pub fn dispatch(&mut self, args: &RequestArguments) -> Result<OutboundCall, RpcError> {
        if let Some(reason) = &self.closed_reason {
            return Err(RpcError::Cancelled(reason.clone()));
        }

        let id = self.id_allocator.next();
        let request_bytes = encode_request(id, args)?;
        let handle = self.pending_calls.register(id)?;

        tracing::debug!("Dispatching `{}` with id {}", args.method(), id);
        tracing::trace!(
            "Outbound envelope: {}",
            String::from_utf8_lossy(&request_bytes)
        );

        Ok(OutboundCall {
            id,
            request_bytes,
            handle,
        })
    }

    /// Dispatches a call whose result is a subscription id, e.g. `eth_subscribe`.
    ///
    /// When the reply arrives, the subscription is registered before the call
    /// resolves, so notifications that follow the reply on the same stream are
    /// never dropped. Collect the stream with [`Self::take_subscription`].
    pub fn dispatch_subscription(
        &mut self,
        args: &RequestArguments,
    ) -> Result<OutboundCall, RpcError> {
        let call = self.dispatch(args)?;

        let pending_calls = &self.pending_calls;
        self.subscribe_calls.retain(|id| pending_calls.contains(*id));
        self.subscribe_calls.insert(call.id);

        Ok(call)
    }

    /// Hands over the stream opened by the reply to subscribe call `id`.
    pub fn take_subscription(
        &mut self,
        id: RequestId,
    ) -> Option<(String, mpsc::UnboundedReceiver<Value>)> {
        self.opened_subscriptions.remove(&id)
    }

    /// Completes a request/response exchange, where `response_bytes` is known
    /// to answer request `id` (e.g. the body of its HTTP response).
    ///
    /// The response id must match; a null id is accepted on failures, as the
    /// server could not read the request id. Any other id fails this call with
    /// [`RpcError::Protocol`] and is reported as unsolicited.
    pub fn complete_exchange(&mut self, id: RequestId, response_bytes: &[u8]) -> Resolution {
        tracing::trace!(
            "Inbound envelope for {}: {}",
            id,
            String::from_utf8_lossy(response_bytes)
        );

        let envelope = match decode_response(response_bytes) {
            Ok(envelope) => envelope,
            Err(err) => return self.resolve(id, Err(err)),
        };

        let matches_request = match envelope.id() {
            ResponseId::Number(response_id) => *response_id == id,
            ResponseId::Null => !envelope.is_success(),
            ResponseId::String(_) => false,
        };

        if matches_request {
            return self.resolve(id, envelope.into_outcome());
        }

        let foreign_id = envelope.id().clone();
        self.pending_calls.report_unsolicited(UnsolicitedResponse {
            id: foreign_id.clone(),
            outcome: envelope.into_outcome(),
        });
        self.resolve(
            id,
            Err(RpcError::Protocol(format!(
                "response id {foreign_id} does not match request id {id}"
            ))),
        )
    }

    /// Demultiplexes one inbound frame of a duplex transport.
    ///
    /// Responses resolve their pending call by id, in whatever order they
    /// arrive. Notifications go to their subscription. A malformed frame that
    /// still names a pending id fails only that call; otherwise the error is
    /// returned to the transport loop for logging.
    pub fn read_bytes(&mut self, bytes: &[u8]) -> Result<(), RpcError> {
        tracing::trace!("Inbound frame: {}", String::from_utf8_lossy(bytes));

        match decode_inbound(bytes) {
            Ok(InboundMessage::Response(envelope)) => {
                self.route_response(envelope);
                Ok(())
            }
            Ok(InboundMessage::Notification(notification)) => {
                self.subscriptions.deliver(notification);
                Ok(())
            }
            Err(err) => match salvage_request_id(bytes) {
                Some(id) if self.pending_calls.contains(id) => {
                    self.resolve(id, Err(err));
                    Ok(())
                }
                _ => Err(err),
            },
        }
    }

    fn route_response(&mut self, envelope: ResponseEnvelope) {
        match envelope.id().as_number() {
            Some(id) => {
                self.resolve(id, envelope.into_outcome());
            }
            None => {
                let id = envelope.id().clone();
                self.pending_calls.report_unsolicited(UnsolicitedResponse {
                    id,
                    outcome: envelope.into_outcome(),
                });
            }
        }
    }

    /// Resolves one call. A successful subscribe call has its subscription
    /// registered first; if its caller is gone, the registration is undone.
    fn resolve(&mut self, id: RequestId, outcome: CallOutcome) -> Resolution {
        let opened = match (self.subscribe_calls.remove(&id), &outcome) {
            (true, Ok(Value::String(subscription_id))) => {
                tracing::debug!(
                    "Registering subscription {} for call {}",
                    subscription_id,
                    id
                );
                let receiver = self.subscriptions.register(subscription_id.as_str());
                self.opened_subscriptions
                    .insert(id, (subscription_id.clone(), receiver));
                Some(subscription_id.clone())
            }
            _ => None,
        };

        let resolution = self.pending_calls.resolve(id, outcome);

        if let Some(subscription_id) = opened {
            if resolution != Resolution::Delivered {
                tracing::debug!(
                    "Subscription {} has no caller; deregistering",
                    subscription_id
                );
                self.subscriptions.remove(&subscription_id);
                self.opened_subscriptions.remove(&id);
            }
        }

        resolution
    }

    /// Fails one pending call.
    pub fn fail(&mut self, id: RequestId, error: RpcError) -> Resolution {
        self.resolve(id, Err(error))
    }

    /// Fails every pending call with [`RpcError::Cancelled`] and ends every
    /// subscription stream. The dispatcher stays usable.
    pub fn cancel_all(&mut self, reason: &str) -> usize {
        self.subscribe_calls.clear();
        self.opened_subscriptions.clear();
        self.subscriptions.close_all();
        self.pending_calls.cancel_all(reason)
    }

    /// Tears the dispatcher down: cancels everything and rejects later calls.
    pub fn close(&mut self, reason: &str) -> usize {
        if self.closed_reason.is_none() {
            tracing::debug!("Closing dispatcher: {}", reason);
            self.closed_reason = Some(reason.to_string());
        }
        self.cancel_all(reason)
    }

    pub fn is_closed(&self) -> bool {
        self.closed_reason.is_some()
    }

    pub fn closed_reason(&self) -> Option<&str> {
        self.closed_reason.as_deref()
    }

    pub fn register_subscription(
        &mut self,
        subscription_id: &str,
    ) -> Result<mpsc::UnboundedReceiver<Value>, RpcError> {
        if let Some(reason) = &self.closed_reason {
            return Err(RpcError::Cancelled(reason.clone()));
        }
        tracing::debug!("Registering subscription {}", subscription_id);
        Ok(self.subscriptions.register(subscription_id))
    }

    pub fn remove_subscription(&mut self, subscription_id: &str) -> bool {
        self.subscriptions.remove(subscription_id)
    }

    pub fn set_unsolicited_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&UnsolicitedResponse) + Send + 'static,
    {
        self.pending_calls.set_unsolicited_handler(handler);
    }

    pub fn pending_calls(&self) -> &PendingCallTable {
        &self.pending_calls
    }

    pub fn pending_calls_mut(&mut self) -> &mut PendingCallTable {
        &mut self.pending_calls
    }

    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }
}

fn salvage_request_id(bytes: &[u8]) -> Option<RequestId> {
    serde_json::from_slice::<Value>(bytes)
        .ok()?
        .get("id")?
        .as_u64()
}
