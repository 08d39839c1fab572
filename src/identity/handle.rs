//! Tensor handles — lazily allocated process-unique identity
//!
//! Ids come from one process-wide counter. A handle allocates its id the
//! first time it is read; an explicit set (the deserialization path)
//! overwrites whatever is there so received tensors adopt a foreign id.

use super::Context;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a fresh id, unique for the lifetime of this process
pub fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identity and placement metadata attached to every tensor-like object
#[derive(Debug)]
pub struct TensorHandle {
    /// 0 = not yet allocated
    id: AtomicU64,
    /// Context responsible for this object
    pub owner: Arc<Context>,
    /// Remote context holding the underlying data, if any
    pub location: Option<Arc<Context>>,
    /// True for proxy nodes that are not the data leaf
    pub is_wrapper: bool,
}

impl TensorHandle {
    /// Handle for a local leaf tensor
    pub fn new_local() -> Self {
        Self::with_owner(Context::local())
    }

    pub fn with_owner(owner: Arc<Context>) -> Self {
        Self {
            id: AtomicU64::new(0),
            owner,
            location: None,
            is_wrapper: false,
        }
    }

    /// Handle for a wrapper layer
    pub fn wrapper(owner: Arc<Context>, location: Option<Arc<Context>>) -> Self {
        Self {
            id: AtomicU64::new(0),
            owner,
            location,
            is_wrapper: true,
        }
    }

    /// The tensor id, allocated on first read. Under a first-read race
    /// exactly one candidate wins and is observed by every caller; losing
    /// candidates are discarded.
    pub fn id(&self) -> u64 {
        let current = self.id.load(Ordering::Acquire);
        if current != 0 {
            return current;
        }
        let candidate = next_id();
        match self
            .id
            .compare_exchange(0, candidate, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => candidate,
            Err(winner) => winner,
        }
    }

    /// Peek at the id without allocating one
    pub fn raw_id(&self) -> Option<u64> {
        match self.id.load(Ordering::Acquire) {
            0 => None,
            v => Some(v),
        }
    }

    /// Adopt an externally issued id, overwriting any previous value.
    /// Deserialized tensors take the id they were serialized with.
    pub fn set_id(&self, id: u64) {
        assert_ne!(id, 0, "tensor id must be nonzero");
        self.id.store(id, Ordering::Release);
    }
}

impl Clone for TensorHandle {
    fn clone(&self) -> Self {
        Self {
            id: AtomicU64::new(self.id.load(Ordering::Acquire)),
            owner: self.owner.clone(),
            location: self.location.clone(),
            is_wrapper: self.is_wrapper,
        }
    }
}
