//! Wrapper-chain dispatch — delegate through proxies, execute at the leaf
//!
//! This is the behavior installed behind every intercepted operation. A
//! wrapper node peels itself (and one layer off each wrapper argument)
//! and recurses into its child; the leaf runs the preserved native
//! implementation on raw data. Results are wrapped back up in the same
//! kinds, picking up fresh handles on the way.

use super::dense::{DenseTensor, NativeError};
use super::node::{LeafTensor, TensorNode, WrapperLayer};
use crate::hook::HookContext;
use crate::identity::TensorHandle;
use log::trace;

/// Errors surfaced by an intercepted call
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("operation '{op}' is not intercepted on this type")]
    UnsupportedOperation { op: String },
    /// Native leaf errors pass through every layer unchanged
    #[error(transparent)]
    Native(#[from] NativeError),
}

impl TensorNode {
    /// Invoke intercepted operation `op` on this chain.
    ///
    /// Exactly one native invocation happens, at the leaf; every wrapper
    /// layer above it is traversed once down and once up.
    pub fn invoke(
        &self,
        ctx: &HookContext,
        op: &str,
        args: &[TensorNode],
    ) -> Result<TensorNode, DispatchError> {
        if !ctx.is_intercepted(op) {
            return Err(DispatchError::UnsupportedOperation { op: op.to_string() });
        }
        self.dispatch(ctx, op, args)
    }

    fn dispatch(
        &self,
        ctx: &HookContext,
        op: &str,
        args: &[TensorNode],
    ) -> Result<TensorNode, DispatchError> {
        match self {
            TensorNode::Leaf(leaf) => {
                let native = ctx
                    .native_fn(op)
                    .ok_or_else(|| DispatchError::UnsupportedOperation { op: op.to_string() })?;
                let raw: Vec<&DenseTensor> = args.iter().map(TensorNode::data).collect();
                let out = native(&leaf.data, &raw)?;
                Ok(TensorNode::Leaf(LeafTensor {
                    handle: TensorHandle::with_owner(leaf.handle.owner.clone()),
                    data: out,
                }))
            }
            TensorNode::Trace(layer) => {
                trace!("'{}' delegated through trace wrapper", op);
                self.delegate(TensorNode::Trace, layer, ctx, op, args)
            }
            TensorNode::Pointer(layer) => self.delegate(TensorNode::Pointer, layer, ctx, op, args),
        }
    }

    fn delegate(
        &self,
        kind: fn(WrapperLayer) -> TensorNode,
        layer: &WrapperLayer,
        ctx: &HookContext,
        op: &str,
        args: &[TensorNode],
    ) -> Result<TensorNode, DispatchError> {
        let peeled: Vec<TensorNode> = args.iter().map(TensorNode::unwrap_once).collect();
        let result = layer.child.dispatch(ctx, op, &peeled)?;
        // The deepest layer that names a location wins; the recursion
        // result carries it upward.
        let location = result
            .location()
            .cloned()
            .or_else(|| layer.handle.location.clone());
        let handle = TensorHandle::wrapper(layer.handle.owner.clone(), location);
        Ok(kind(WrapperLayer {
            handle,
            child: Box::new(result),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::{dense_type, hook, NativeType};
    use crate::identity::Context;
    use crate::tensor::{ops, Dtype};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    static COUNTED_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counting_add(
        recv: &DenseTensor,
        args: &[&DenseTensor],
    ) -> Result<DenseTensor, NativeError> {
        COUNTED_CALLS.fetch_add(1, Ordering::SeqCst);
        ops::add(recv, args)
    }

    fn dense_ctx() -> Arc<HookContext> {
        hook(dense_type(), None, true)
    }

    #[test]
    fn test_wrapped_add_returns_wrapped_result() {
        let ctx = dense_ctx();
        let five = TensorNode::wrap_trace(TensorNode::leaf(DenseTensor::scalar(5.0)));
        let three = TensorNode::leaf(DenseTensor::scalar(3.0));
        let wrapped_id = five.id();

        let out = five.invoke(&ctx, "add", &[three]).unwrap();
        assert!(matches!(out, TensorNode::Trace(_)));
        assert_eq!(out.depth(), 1);
        assert_eq!(out.data().data, vec![8.0]);
        assert_ne!(out.id(), wrapped_id);
    }

    #[test]
    fn test_leaf_add_returns_raw_leaf() {
        let ctx = dense_ctx();
        let five = TensorNode::leaf(DenseTensor::scalar(5.0));
        let three = TensorNode::leaf(DenseTensor::scalar(3.0));
        let out = five.invoke(&ctx, "add", &[three]).unwrap();
        assert!(matches!(out, TensorNode::Leaf(_)));
        assert_eq!(out.data().data, vec![8.0]);
    }

    #[test]
    fn test_exactly_one_native_call_at_depth_three() {
        let mut ty = NativeType::new("counted-dense");
        ty.op("add", counting_add);
        let ctx = hook(ty, None, true);

        let chain = TensorNode::wrap_trace(TensorNode::wrap_trace(TensorNode::wrap_trace(
            TensorNode::leaf(DenseTensor::scalar(1.0)),
        )));
        let arg = TensorNode::leaf(DenseTensor::scalar(2.0));

        COUNTED_CALLS.store(0, Ordering::SeqCst);
        let out = chain.invoke(&ctx, "add", &[arg]).unwrap();
        assert_eq!(COUNTED_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(out.depth(), 3);
        assert_eq!(out.data().data, vec![3.0]);
    }

    #[test]
    fn test_wrapper_arguments_are_unwrapped() {
        let ctx = dense_ctx();
        let recv = TensorNode::wrap_trace(TensorNode::leaf(DenseTensor::scalar(5.0)));
        let arg = TensorNode::wrap_trace(TensorNode::wrap_trace(TensorNode::leaf(
            DenseTensor::scalar(3.0),
        )));
        let out = recv.invoke(&ctx, "add", &[arg]).unwrap();
        assert_eq!(out.data().data, vec![8.0]);
    }

    #[test]
    fn test_unsupported_operation_names_the_op() {
        let ctx = dense_ctx();
        let leaf = TensorNode::leaf(DenseTensor::scalar(1.0));
        let err = leaf.invoke(&ctx, "fft", &[]).unwrap_err();
        match &err {
            DispatchError::UnsupportedOperation { op } => assert_eq!(op, "fft"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("fft"));
    }

    #[test]
    fn test_native_error_propagates_through_chain() {
        let ctx = dense_ctx();
        let chain = TensorNode::wrap_trace(TensorNode::wrap_trace(TensorNode::leaf(
            DenseTensor::vector(vec![1.0, 2.0]),
        )));
        let arg = TensorNode::leaf(DenseTensor::vector(vec![1.0, 2.0, 3.0]));
        let err = chain.invoke(&ctx, "add", &[arg]).unwrap_err();
        match err {
            DispatchError::Native(NativeError::ShapeMismatch { op, .. }) => assert_eq!(op, "add"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_deepest_location_wins_on_rewrap() {
        let ctx = dense_ctx();
        let alice = Context::remote("alice");
        let chain = TensorNode::wrap_trace(TensorNode::point_to(
            TensorNode::leaf(DenseTensor::scalar(1.0)),
            alice.clone(),
        ));
        let arg = TensorNode::leaf(DenseTensor::scalar(1.0));
        let out = chain.invoke(&ctx, "add", &[arg]).unwrap();
        // outer trace layer inherits the pointer's location from below
        assert_eq!(out.location().unwrap().id, "alice");
        assert_eq!(out.child().unwrap().location().unwrap().id, "alice");
    }

    #[test]
    fn test_comparison_dispatches_like_any_op() {
        let ctx = dense_ctx();
        let a = TensorNode::wrap_trace(TensorNode::leaf(DenseTensor::vector(vec![1.0, 5.0])));
        let b = TensorNode::leaf(DenseTensor::vector(vec![2.0, 2.0]));
        let out = a.invoke(&ctx, "gt", &[b]).unwrap();
        assert_eq!(out.data().dtype, Dtype::Bool);
        assert_eq!(out.data().data, vec![0.0, 1.0]);
    }

    #[test]
    fn test_result_owner_follows_receiver() {
        let ctx = dense_ctx();
        let owner = Context::remote("bob");
        let recv = TensorNode::wrap_trace(TensorNode::leaf_with_owner(
            DenseTensor::scalar(1.0),
            owner.clone(),
        ));
        let arg = TensorNode::leaf(DenseTensor::scalar(2.0));
        let out = recv.invoke(&ctx, "add", &[arg]).unwrap();
        assert_eq!(out.owner().id, "bob");
    }
}
