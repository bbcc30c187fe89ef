use ethane_rpc::rpc::{RpcDispatcher, RpcError};
use std::sync::Mutex;

/// Closure-passing access to a shared [`RpcDispatcher`].
///
/// The lock is taken, the closure runs, and the lock is released before
/// returning, so a guard can never be held across an `.await`. A poisoned
/// lock surfaces as [`RpcError::Internal`] instead of a panic.
pub trait WithDispatcher: Send + Sync {
    fn with_dispatcher<F, R>(&self, f: F) -> Result<R, RpcError>
    where
        F: FnOnce(&mut RpcDispatcher) -> R;
}

impl WithDispatcher for Mutex<RpcDispatcher> {
    fn with_dispatcher<F, R>(&self, f: F) -> Result<R, RpcError>
    where
        F: FnOnce(&mut RpcDispatcher) -> R,
    {
        let mut guard = self
            .lock()
            .map_err(|_| RpcError::Internal("dispatcher lock poisoned".to_string()))?;
        Ok(f(&mut guard))
    }
}
