/// Value of the `jsonrpc` member of every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// The id handed to the first request of a fresh client.
pub const FIRST_REQUEST_ID: u64 = 1;

/// Method used by nodes to push subscription items.
pub const SUBSCRIPTION_NOTIFICATION_METHOD: &str = "eth_subscription";

/// Pending-call count at which registration first sweeps abandoned entries.
/// After each sweep the threshold doubles relative to what survived.
pub const PENDING_SWEEP_THRESHOLD: usize = 64;
