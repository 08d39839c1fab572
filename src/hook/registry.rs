//! Operation registry — which member names are eligible for interception
//!
//! Eligibility is a pure function of the type description and a fixed
//! exclusion list; only set membership matters.

use super::native::{NativeType, NATIVE_PREFIX};
use std::collections::BTreeSet;

/// Members every type shares with the universal base. Structural plumbing
/// is never hooked.
pub const BASE_MEMBERS: &[&str] = &["clone", "fmt", "hash", "eq", "type_id", "drop"];

/// Relational comparisons are always intercepted when the type has them,
/// even if a list elsewhere would exclude them.
pub const COMPARATORS: &[&str] = &["gt", "ge", "lt", "le"];

/// Fixed, versioned set of names never eligible for interception
#[derive(Debug, Clone)]
pub struct ExclusionList {
    pub version: u32,
    names: BTreeSet<String>,
}

/// v1: construction/representation/attribute plumbing, identity
/// accessors, serialization hooks, and the curated always-native set.
const EXCLUSIONS_V1: &[&str] = &[
    "new", "init", "repr", "to_string", "getattr", "setattr", "id", "owner", "location",
    "is_wrapper", "serialize", "deserialize", "dtype", "shape", "len", "fingerprint",
];

impl Default for ExclusionList {
    fn default() -> Self {
        Self {
            version: 1,
            names: EXCLUSIONS_V1.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ExclusionList {
    /// The fixed set plus embedder-supplied extras
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        list.names.extend(extra.into_iter().map(Into::into));
        list
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Operation names of `ty` eligible for interception
pub fn eligible_operations(ty: &NativeType, exclusions: &ExclusionList) -> BTreeSet<String> {
    let mut ops = BTreeSet::new();
    for name in ty.member_names() {
        if name.starts_with(NATIVE_PREFIX) {
            // preserved original from an earlier hook
            continue;
        }
        if BASE_MEMBERS.contains(&name) || exclusions.contains(name) {
            continue;
        }
        if ty.get(name).is_some_and(|m| m.is_callable()) {
            ops.insert(name.to_string());
        }
    }
    for cmp in COMPARATORS {
        if ty.get(cmp).is_some_and(|m| m.is_callable()) {
            ops.insert((*cmp).to_string());
        }
    }
    ops
}
