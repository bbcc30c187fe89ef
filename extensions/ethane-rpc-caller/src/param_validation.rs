use ethane_rpc::rpc::RpcError;

const BLOCK_TAGS: [&str; 5] = ["latest", "earliest", "pending", "safe", "finalized"];

/// Whether named wrappers check parameter shapes before dispatching.
///
/// With [`ParamValidation::Off`] every string is forwarded as-is and the node
/// gets to reject it. [`ParamValidation::Strict`] catches malformed hex
/// locally as [`RpcError::InvalidArgument`], naming the offending position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParamValidation {
    #[default]
    Off,
    Strict,
}

impl ParamValidation {
    /// `0x` followed by 40 hex digits.
    pub fn address(self, index: usize, value: &str) -> Result<(), RpcError> {
        self.check(index, value, "a 20-byte address", |digits| {
            digits.len() == 40 && is_hex(digits)
        })
    }

    /// `0x` followed by 64 hex digits.
    pub fn hash(self, index: usize, value: &str) -> Result<(), RpcError> {
        self.check(index, value, "a 32-byte hash", |digits| {
            digits.len() == 64 && is_hex(digits)
        })
    }

    /// A block tag or a `0x` quantity without leading zeros.
    pub fn block(self, index: usize, value: &str) -> Result<(), RpcError> {
        if self == Self::Off || BLOCK_TAGS.contains(&value) {
            return Ok(());
        }
        self.check(index, value, "a block tag or quantity", is_quantity)
    }

    /// `0x`-prefixed hex of even length.
    pub fn data(self, index: usize, value: &str) -> Result<(), RpcError> {
        self.check(index, value, "hex data", |digits| {
            digits.len() % 2 == 0 && is_hex(digits)
        })
    }

    fn check(
        self,
        index: usize,
        value: &str,
        expected: &str,
        accept: impl Fn(&str) -> bool,
    ) -> Result<(), RpcError> {
        if self == Self::Off {
            return Ok(());
        }
        match value.strip_prefix("0x") {
            Some(digits) if accept(digits) => Ok(()),
            _ => Err(RpcError::InvalidArgument(format!(
                "param {index}: expected {expected}, got {value:?}"
            ))),
        }
    }
}

fn is_hex(digits: &str) -> bool {
    digits.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_quantity(digits: &str) -> bool {
    match digits.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        _ => is_hex(digits),
    }
}
