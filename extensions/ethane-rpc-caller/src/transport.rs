/// What a transport hands back after writing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportReply {
    /// The response body paired with the request that was just sent (HTTP).
    Response(Vec<u8>),
    /// The response will arrive on the inbound stream and be routed by id.
    Deferred,
}

/// Connection lifecycle reported by duplex and host-fed clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Connected,
    Disconnected,
}

pub type StateChangeHandler = Box<dyn Fn(TransportState) + Send + Sync>;
