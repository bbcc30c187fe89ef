use ethane_rpc::rpc::{RpcDispatcher, RpcError, TransportError};
use ethane_rpc_caller::{
    ParamValidation, RpcCallerInterface, StateChangeHandler, TransportReply, TransportState,
    WithDispatcher,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A client whose transport lives in the host environment.
///
/// Outbound envelopes are handed to `emit_callback`; the host writes them to
/// its socket and feeds whatever comes back through [`RpcWasmClient::read_bytes`].
/// The host also reports connection changes, and a reported disconnect
/// cancels everything in flight.
pub struct RpcWasmClient {
    dispatcher: Arc<Mutex<RpcDispatcher>>,
    emit_callback: Arc<dyn Fn(Vec<u8>) + Send + Sync>,
    state_change_handler: Mutex<Option<StateChangeHandler>>,
    is_connected: AtomicBool,
    param_validation: ParamValidation,
}

impl RpcWasmClient {
    pub fn new(emit_callback: impl Fn(Vec<u8>) + Send + Sync + 'static) -> Self {
        Self {
            dispatcher: Arc::new(Mutex::new(RpcDispatcher::new())),
            emit_callback: Arc::new(emit_callback),
            state_change_handler: Mutex::new(None),
            is_connected: AtomicBool::new(false),
            param_validation: ParamValidation::Off,
        }
    }

    pub fn with_param_validation(mut self, param_validation: ParamValidation) -> Self {
        self.param_validation = param_validation;
        self
    }

    /// Feeds one inbound frame from the host.
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<(), RpcError> {
        self.dispatcher.with_dispatcher(|d| d.read_bytes(bytes))?
    }

    pub fn handle_connect(&self) {
        if !self.is_connected.swap(true, Ordering::SeqCst) {
            tracing::info!("Host transport connected");
            self.notify(TransportState::Connected);
        }
    }

    /// Fails every pending call and ends every subscription. The client can
    /// be used again once the host reconnects.
    pub fn handle_disconnect(&self, reason: &str) {
        let was_connected = self.is_connected.swap(false, Ordering::SeqCst);
        match self.dispatcher.with_dispatcher(|d| d.cancel_all(reason)) {
            Ok(0) => {}
            Ok(cancelled) => tracing::error!("Cancelled {} pending calls: {}", cancelled, reason),
            Err(err) => tracing::error!("Failed to cancel pending calls: {}", err),
        }
        if was_connected {
            self.notify(TransportState::Disconnected);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    pub fn set_state_change_handler(
        &self,
        handler: impl Fn(TransportState) + Send + Sync + 'static,
    ) {
        if let Ok(mut slot) = self.state_change_handler.lock() {
            *slot = Some(Box::new(handler));
        }
    }

    fn notify(&self, state: TransportState) {
        if let Ok(handler) = self.state_change_handler.lock() {
            if let Some(handler) = handler.as_ref() {
                handler(state);
            }
        }
    }
}

#[async_trait::async_trait]
impl RpcCallerInterface for RpcWasmClient {
    fn dispatcher(&self) -> Arc<Mutex<RpcDispatcher>> {
        self.dispatcher.clone()
    }

    async fn transmit(&self, request_bytes: Vec<u8>) -> Result<TransportReply, TransportError> {
        (self.emit_callback)(request_bytes);
        Ok(TransportReply::Deferred)
    }

    fn param_validation(&self) -> ParamValidation {
        self.param_validation
    }

    fn supports_subscriptions(&self) -> bool {
        true
    }
}
