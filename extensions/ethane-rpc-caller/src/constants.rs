use std::time::Duration;

/// How long a call may wait for its response before failing with a timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long establishing a connection may take.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub const SUBSCRIBE_METHOD: &str = "eth_subscribe";
pub const UNSUBSCRIBE_METHOD: &str = "eth_unsubscribe";
