//! Interception engine — rewrite a native type's operation set, once
//!
//! `hook` preserves every eligible operation under its `native_` name,
//! installs dispatcher stand-ins, and records the result in a
//! process-scoped table keyed by type name. Hooking the same type again
//! returns the recorded context unchanged.

use super::native::{Member, NativeType};
use super::registry::{eligible_operations, ExclusionList};
use crate::capability::Capabilities;
use crate::identity::Context;
use crate::tensor::ops::NativeFn;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, OnceLock};

/// Identity accessors installed on every hooked type
const IDENTITY_ACCESSORS: &[&str] = &["id", "owner", "location", "is_wrapper"];

/// Result of hooking one native type
#[derive(Debug)]
pub struct HookContext {
    pub type_name: String,
    ty: NativeType,
    /// Operation names intercepted on this type
    pub operations: BTreeSet<String>,
    /// Context interfacing with remote peers on this process's behalf
    pub local_context: Arc<Context>,
    pub is_client: bool,
    pub created_at: DateTime<Utc>,
}

impl HookContext {
    pub fn is_intercepted(&self, op: &str) -> bool {
        self.operations.contains(op)
    }

    /// The preserved original for an intercepted operation
    pub fn native_fn(&self, op: &str) -> Option<NativeFn> {
        self.ty.native_fn(op)
    }

    /// The transformed type description
    pub fn native_type(&self) -> &NativeType {
        &self.ty
    }
}

static HOOKED: OnceLock<Mutex<HashMap<String, Arc<HookContext>>>> = OnceLock::new();

fn hooked_table() -> &'static Mutex<HashMap<String, Arc<HookContext>>> {
    HOOKED.get_or_init(Mutex::default)
}

/// Hook `ty` with the fixed default exclusion list
pub fn hook(ty: NativeType, local: Option<Arc<Context>>, is_client: bool) -> Arc<HookContext> {
    hook_with(ty, local, is_client, ExclusionList::default())
}

/// Hook `ty`: preserve eligible operations, install dispatchers, record
/// the context. Idempotent per type name — a second hook is a logged
/// no-op returning the existing context.
pub fn hook_with(
    mut ty: NativeType,
    local: Option<Arc<Context>>,
    is_client: bool,
    exclusions: ExclusionList,
) -> Arc<HookContext> {
    let mut hooked = hooked_table().lock().expect("hook table poisoned");
    if let Some(existing) = hooked.get(&ty.name) {
        warn!(
            "type '{}' was already hooked... skipping hooking process",
            ty.name
        );
        return existing.clone();
    }

    let local_context = local.unwrap_or_else(Context::local);
    let operations = eligible_operations(&ty, &exclusions);
    for op in &operations {
        ty.intercept(op);
    }
    for accessor in IDENTITY_ACCESSORS {
        ty.define(*accessor, Member::Attribute);
    }
    info!(
        "hooked type '{}': {} operations intercepted",
        ty.name,
        operations.len()
    );

    let ctx = Arc::new(HookContext {
        type_name: ty.name.clone(),
        ty,
        operations,
        local_context,
        is_client,
        created_at: Utc::now(),
    });
    hooked.insert(ctx.type_name.clone(), ctx.clone());
    ctx
}

/// Hook `ty` only when its backend is present. An absent backend is a
/// valid state, not an error: the hook is skipped and `None` returned.
pub fn hook_if_available(
    caps: &Capabilities,
    ty: NativeType,
    local: Option<Arc<Context>>,
    is_client: bool,
) -> Option<Arc<HookContext>> {
    if !caps.supports(&ty.name) {
        info!("backend '{}' not available, skipping hook", ty.name);
        return None;
    }
    Some(hook(ty, local, is_client))
}
