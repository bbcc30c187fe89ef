use crate::{RpcCallerInterface, WithDispatcher, constants::UNSUBSCRIBE_METHOD};
use ethane_rpc::rpc::{RequestArguments, RpcDispatcher, RpcError};
use futures::Stream;
use futures::channel::mpsc;
use serde_json::Value;
use std::pin::Pin;
use std::sync::{Arc, Mutex, Weak};
use std::task::{Context, Poll};

/// An active subscription, yielding each `params.result` the node pushes.
///
/// The stream ends when the client is closed or its connection is lost.
/// Dropping it stops local delivery; use [`Subscription::unsubscribe`] to
/// also tell the node.
#[derive(Debug)]
pub struct Subscription {
    id: String,
    receiver: mpsc::UnboundedReceiver<Value>,
    dispatcher: Weak<Mutex<RpcDispatcher>>,
}

impl Subscription {
    pub fn new(
        id: String,
        receiver: mpsc::UnboundedReceiver<Value>,
        dispatcher: &Arc<Mutex<RpcDispatcher>>,
    ) -> Self {
        Self {
            id,
            receiver,
            dispatcher: Arc::downgrade(dispatcher),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Sends `eth_unsubscribe` and resolves with the node's answer.
    pub async fn unsubscribe<C>(self, client: &C) -> Result<bool, RpcError>
    where
        C: RpcCallerInterface,
    {
        self.deregister();
        let args = RequestArguments::new(UNSUBSCRIBE_METHOD, vec![Value::String(self.id.clone())])?;
        client.call_as::<bool>(args).await
    }

    fn deregister(&self) {
        if let Some(dispatcher) = self.dispatcher.upgrade() {
            let _ = dispatcher.with_dispatcher(|d| d.remove_subscription(&self.id));
        }
    }
}

impl Stream for Subscription {
    type Item = Value;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.deregister();
    }
}
