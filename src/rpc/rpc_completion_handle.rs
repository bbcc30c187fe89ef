use crate::rpc::{RequestId, RpcError};
use futures::channel::oneshot;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Outcome delivered to a waiting caller.
pub type CallOutcome = Result<Value, RpcError>;

/// The caller's half of a pending call.
///
/// Resolves exactly once, with the outcome the [`PendingCallTable`] delivers.
/// Dropping the handle abandons interest in the call; the in-flight request
/// is not cancelled, but its eventual resolution becomes a no-op.
///
/// [`PendingCallTable`]: crate::rpc::PendingCallTable
#[derive(Debug)]
pub struct CompletionHandle {
    id: RequestId,
    receiver: oneshot::Receiver<CallOutcome>,
}

impl CompletionHandle {
    pub(crate) fn new(id: RequestId, receiver: oneshot::Receiver<CallOutcome>) -> Self {
        Self { id, receiver }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the outcome if it has already been delivered.
    pub fn try_outcome(&mut self) -> Option<CallOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::Canceled) => Some(Err(dropped_without_resolution(self.id))),
        }
    }
}

impl Future for CompletionHandle {
    type Output = CallOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id;
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(dropped_without_resolution(id))),
            Poll::Pending => Poll::Pending,
        }
    }
}

fn dropped_without_resolution(id: RequestId) -> RpcError {
    RpcError::Cancelled(format!("pending call {id} was dropped without resolution"))
}
