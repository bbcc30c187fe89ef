use crate::constants::PENDING_SWEEP_THRESHOLD;
use crate::rpc::{CallOutcome, CompletionHandle, RequestId, ResponseId, RpcError};
use futures::channel::oneshot;
use std::collections::HashMap;

/// A response that matched no pending call.
#[derive(Clone, Debug, PartialEq)]
pub struct UnsolicitedResponse {
    pub id: ResponseId,
    pub outcome: CallOutcome,
}

/// Observability hook for responses nobody is waiting for.
pub type UnsolicitedResponseHandler = Box<dyn FnMut(&UnsolicitedResponse) + Send>;

/// What happened to an outcome handed to [`PendingCallTable::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The waiting caller received the outcome.
    Delivered,
    /// The entry existed but its caller had already dropped the handle.
    Abandoned,
    /// No entry existed for the id.
    Unsolicited,
}

/// Maps in-flight request ids to the completion senders of waiting callers.
///
/// Every entry is fulfilled at most once: resolving removes it.
pub struct PendingCallTable {
    pending: HashMap<RequestId, oneshot::Sender<CallOutcome>>,
    sweep_at: usize,
    unsolicited_handler: Option<UnsolicitedResponseHandler>,
}

impl PendingCallTable {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            sweep_at: PENDING_SWEEP_THRESHOLD,
            unsolicited_handler: None,
        }
    }

    /// Registers a pending call and returns the caller's completion handle.
    ///
    /// A duplicate id means the id allocator is broken; it is reported as
    /// [`RpcError::Internal`] and the existing entry is left untouched.
    ///
    /// Once the table reaches the sweep threshold, entries whose callers have
    /// gone away are swept first and the threshold moves to twice the
    /// surviving size, so sweeping stays amortized O(1) per registration.
    pub fn register(&mut self, id: RequestId) -> Result<CompletionHandle, RpcError> {
        if self.pending.len() >= self.sweep_at {
            self.purge_abandoned();
            self.sweep_at = (self.pending.len() * 2).max(PENDING_SWEEP_THRESHOLD);
        }

        if self.pending.contains_key(&id) {
            return Err(RpcError::Internal(format!("duplicate id {id}")));
        }

        let (sender, receiver) = oneshot::channel();
        self.pending.insert(id, sender);
        Ok(CompletionHandle::new(id, receiver))
    }

    /// Removes the entry for `id` and delivers `outcome` to it.
    pub fn resolve(&mut self, id: RequestId, outcome: CallOutcome) -> Resolution {
        match self.pending.remove(&id) {
            Some(sender) => match sender.send(outcome) {
                Ok(()) => Resolution::Delivered,
                Err(_) => {
                    tracing::debug!("Pending call {} was abandoned by its caller", id);
                    Resolution::Abandoned
                }
            },
            None => {
                self.report_unsolicited(UnsolicitedResponse {
                    id: ResponseId::Number(id),
                    outcome,
                });
                Resolution::Unsolicited
            }
        }
    }

    /// Fires the unsolicited-response hook without touching any entry.
    pub fn report_unsolicited(&mut self, response: UnsolicitedResponse) {
        tracing::warn!(
            "Discarding unsolicited response with id {} ({})",
            response.id,
            if response.outcome.is_ok() { "success" } else { "error" }
        );
        if let Some(handler) = self.unsolicited_handler.as_mut() {
            handler(&response);
        }
    }

    /// Fails every outstanding call with [`RpcError::Cancelled`] and clears the table.
    pub fn cancel_all(&mut self, reason: &str) -> usize {
        let count = self.pending.len();
        for (id, sender) in self.pending.drain() {
            tracing::debug!("Cancelling pending call {}: {}", id, reason);
            let _ = sender.send(Err(RpcError::Cancelled(reason.to_string())));
        }
        count
    }

    /// Drops entries whose callers no longer hold their completion handle.
    pub fn purge_abandoned(&mut self) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, sender| !sender.is_canceled());
        before - self.pending.len()
    }

    pub fn set_unsolicited_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&UnsolicitedResponse) + Send + 'static,
    {
        self.unsolicited_handler = Some(Box::new(handler));
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for PendingCallTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PendingCallTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCallTable")
            .field("pending", &self.pending.len())
            .field("sweep_at", &self.sweep_at)
            .field("has_unsolicited_handler", &self.unsolicited_handler.is_some())
            .finish()
    }
}
