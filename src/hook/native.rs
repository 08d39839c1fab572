//! Native type descriptions — the member table the engine rewrites
//!
//! A foreign numeric type is described as a named set of members. Hooking
//! moves each eligible callable under the reserved `native_` key and
//! leaves a dispatcher stand-in at the original name.

use crate::tensor::ops::{self, NativeFn};
use std::collections::BTreeMap;

/// Reserved prefix under which preserved originals live
pub const NATIVE_PREFIX: &str = "native_";

pub fn preserved_name(op: &str) -> String {
    format!("{NATIVE_PREFIX}{op}")
}

/// One member of a native type
#[derive(Debug, Clone)]
pub enum Member {
    /// A callable native operation
    Op(NativeFn),
    /// A plain data member
    Attribute,
    /// Installed stand-in that routes calls through the wrapper chain,
    /// closing over the operation name it replaced
    Dispatcher(String),
}

impl Member {
    pub fn is_callable(&self) -> bool {
        matches!(self, Member::Op(_) | Member::Dispatcher(_))
    }
}

/// A native numeric type, described member by member
#[derive(Debug, Clone)]
pub struct NativeType {
    pub name: String,
    members: BTreeMap<String, Member>,
}

impl NativeType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeMap::new(),
        }
    }

    pub fn define(&mut self, name: impl Into<String>, member: Member) {
        self.members.insert(name.into(), member);
    }

    /// Register a callable operation
    pub fn op(&mut self, name: impl Into<String>, f: NativeFn) {
        self.define(name, Member::Op(f));
    }

    /// Register a plain data member
    pub fn attribute(&mut self, name: impl Into<String>) {
        self.define(name, Member::Attribute);
    }

    pub fn get(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether `op` already has a preserved original
    pub fn has_preserved(&self, op: &str) -> bool {
        self.members.contains_key(&preserved_name(op))
    }

    /// Preserve `op` under its `native_` name and install a dispatcher in
    /// its place. Preservation happens at most once: a second call for the
    /// same name changes nothing.
    pub fn intercept(&mut self, op: &str) -> bool {
        if self.has_preserved(op) {
            return false;
        }
        let Some(Member::Op(f)) = self.members.get(op) else {
            return false;
        };
        let f = *f;
        self.members.insert(preserved_name(op), Member::Op(f));
        self.members
            .insert(op.to_string(), Member::Dispatcher(op.to_string()));
        true
    }

    /// The preserved original for `op`, if it was intercepted
    pub fn native_fn(&self, op: &str) -> Option<NativeFn> {
        match self.members.get(&preserved_name(op)) {
            Some(Member::Op(f)) => Some(*f),
            _ => None,
        }
    }
}

/// The built-in dense backend, described for hooking
pub fn dense_type() -> NativeType {
    let mut ty = NativeType::new("dense");
    ty.op("add", ops::add);
    ty.op("sub", ops::sub);
    ty.op("mul", ops::mul);
    ty.op("neg", ops::neg);
    ty.op("matmul", ops::matmul);
    ty.op("sum", ops::sum);
    ty.op("transpose", ops::transpose);
    ty.op("gt", ops::gt);
    ty.op("ge", ops::ge);
    ty.op("lt", ops::lt);
    ty.op("le", ops::le);
    ty.attribute("dtype");
    ty.attribute("shape");
    ty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let mut ty = NativeType::new("t");
        ty.op("add", ops::add);
        ty.attribute("shape");
        assert!(ty.get("add").is_some_and(Member::is_callable));
        assert!(!ty.get("shape").unwrap().is_callable());
        assert!(ty.get("missing").is_none());
    }

    #[test]
    fn test_intercept_preserves_and_replaces() {
        let mut ty = NativeType::new("t");
        ty.op("add", ops::add);
        assert!(ty.intercept("add"));

        assert!(ty.has_preserved("add"));
        assert!(ty.native_fn("add").is_some());
        assert!(matches!(ty.get("add"), Some(Member::Dispatcher(op)) if op == "add"));
    }

    #[test]
    fn test_intercept_twice_is_a_noop() {
        let mut ty = NativeType::new("t");
        ty.op("add", ops::add);
        assert!(ty.intercept("add"));
        let count = ty.member_count();
        assert!(!ty.intercept("add"));
        assert_eq!(ty.member_count(), count);
        // the preserved original is still the real native fn
        assert!(ty.native_fn("add").is_some());
    }

    #[test]
    fn test_intercept_skips_non_callables() {
        let mut ty = NativeType::new("t");
        ty.attribute("shape");
        assert!(!ty.intercept("shape"));
        assert!(!ty.has_preserved("shape"));
    }

    #[test]
    fn test_dense_type_has_the_usual_surface() {
        let ty = dense_type();
        for op in ["add", "sub", "mul", "neg", "matmul", "gt", "le"] {
            assert!(ty.get(op).is_some_and(Member::is_callable), "missing {op}");
        }
        assert!(matches!(ty.get("dtype"), Some(Member::Attribute)));
    }
}
