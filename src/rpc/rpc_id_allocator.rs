use crate::constants::FIRST_REQUEST_ID;
use crate::rpc::RequestId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out request ids for one client.
///
/// Every value returned is strictly greater than all values previously
/// returned by the same allocator, including under concurrent use.
/// Wraparound after `u64::MAX` is not handled.
#[derive(Debug)]
pub struct IdAllocator {
    next_id: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::starting_at(FIRST_REQUEST_ID)
    }

    pub fn starting_at(first: RequestId) -> Self {
        Self {
            next_id: AtomicU64::new(first),
        }
    }

    #[inline]
    pub fn next(&self) -> RequestId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// The id the next call to [`IdAllocator::next`] would return.
    pub fn peek(&self) -> RequestId {
        self.next_id.load(Ordering::Relaxed)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
