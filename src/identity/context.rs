//! Execution contexts — who owns a tensor and where its data lives
//!
//! A context stands for one execution environment: the local process, or
//! a remote peer holding data on our behalf. Contexts compare by id only;
//! ids are meaningful across processes ("me", "alice", ...).

use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// Id of the process-default local context
pub const LOCAL_CONTEXT_ID: &str = "me";

/// An execution context a tensor can belong to or live on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// Stable identifier, shared across process boundaries
    pub id: String,
    /// Whether this context drives computation (vs. only hosting data)
    pub is_client: bool,
}

static LOCAL: OnceLock<Arc<Context>> = OnceLock::new();

impl Context {
    pub fn new(id: impl Into<String>, is_client: bool) -> Arc<Self> {
        Arc::new(Self { id: id.into(), is_client })
    }

    /// The process-default local context, created on first use
    pub fn local() -> Arc<Self> {
        LOCAL.get_or_init(|| Self::new(LOCAL_CONTEXT_ID, true)).clone()
    }

    /// Reference to a remote context known by id
    pub fn remote(id: impl Into<String>) -> Arc<Self> {
        Self::new(id, false)
    }

    /// A context with a random identity, for peers that never named themselves
    pub fn anonymous(is_client: bool) -> Arc<Self> {
        Self::new(Uuid::new_v4().to_string(), is_client)
    }

    pub fn is_local(&self) -> bool {
        self.id == LOCAL_CONTEXT_ID
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Context {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_context_is_me() {
        let local = Context::local();
        assert_eq!(local.id, "me");
        assert!(local.is_client);
        assert!(local.is_local());
    }

    #[test]
    fn test_local_context_is_shared() {
        let a = Context::local();
        let b = Context::local();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_remote_context() {
        let alice = Context::remote("alice");
        assert_eq!(alice.id, "alice");
        assert!(!alice.is_client);
        assert!(!alice.is_local());
    }

    #[test]
    fn test_contexts_compare_by_id() {
        let a = Context::new("alice", false);
        let b = Context::new("alice", true);
        assert_eq!(*a, *b);
    }

    #[test]
    fn test_anonymous_contexts_differ() {
        let a = Context::anonymous(false);
        let b = Context::anonymous(false);
        assert_ne!(a.id, b.id);
    }
}
