//! Wrapper chains — tensor nodes and the proxies standing in for them
//!
//! A chain is a closed tagged union. Wrapper layers exclusively own their
//! boxed child, so chains are finite and acyclic by construction and end
//! in exactly one data leaf.

use super::dense::DenseTensor;
use crate::identity::{Context, TensorHandle};
use std::sync::Arc;

/// A tensor-like object: the data leaf or a proxy layer around one
#[derive(Debug, Clone)]
pub enum TensorNode {
    /// Concrete native data
    Leaf(LeafTensor),
    /// Stand-in for data held on a remote context
    Pointer(WrapperLayer),
    /// Diagnostic wrapper that traces operations flowing through it
    Trace(WrapperLayer),
}

/// The data-holding end of every chain
#[derive(Debug, Clone)]
pub struct LeafTensor {
    pub handle: TensorHandle,
    pub data: DenseTensor,
}

/// One proxy layer and the chain below it
#[derive(Debug, Clone)]
pub struct WrapperLayer {
    pub handle: TensorHandle,
    pub child: Box<TensorNode>,
}

impl TensorNode {
    /// Local leaf around concrete data
    pub fn leaf(data: DenseTensor) -> Self {
        TensorNode::Leaf(LeafTensor {
            handle: TensorHandle::new_local(),
            data,
        })
    }

    pub fn leaf_with_owner(data: DenseTensor, owner: Arc<Context>) -> Self {
        TensorNode::Leaf(LeafTensor {
            handle: TensorHandle::with_owner(owner),
            data,
        })
    }

    /// Wrap `child` in a trace layer owned by the same context
    pub fn wrap_trace(child: TensorNode) -> Self {
        let handle = TensorHandle::wrapper(child.owner().clone(), None);
        TensorNode::Trace(WrapperLayer {
            handle,
            child: Box::new(child),
        })
    }

    /// Wrap `child` in a pointer layer locating its data on `location`
    pub fn point_to(child: TensorNode, location: Arc<Context>) -> Self {
        let handle = TensorHandle::wrapper(child.owner().clone(), Some(location));
        TensorNode::Pointer(WrapperLayer {
            handle,
            child: Box::new(child),
        })
    }

    pub fn handle(&self) -> &TensorHandle {
        match self {
            TensorNode::Leaf(leaf) => &leaf.handle,
            TensorNode::Pointer(layer) | TensorNode::Trace(layer) => &layer.handle,
        }
    }

    /// This node's id, allocated on first read
    pub fn id(&self) -> u64 {
        self.handle().id()
    }

    pub fn owner(&self) -> &Arc<Context> {
        &self.handle().owner
    }

    pub fn location(&self) -> Option<&Arc<Context>> {
        self.handle().location.as_ref()
    }

    pub fn is_wrapper(&self) -> bool {
        self.handle().is_wrapper
    }

    pub fn child(&self) -> Option<&TensorNode> {
        match self {
            TensorNode::Leaf(_) => None,
            TensorNode::Pointer(layer) | TensorNode::Trace(layer) => Some(&layer.child),
        }
    }

    /// Walk to the data leaf terminating this chain
    pub fn data_leaf(&self) -> &LeafTensor {
        match self {
            TensorNode::Leaf(leaf) => leaf,
            TensorNode::Pointer(layer) | TensorNode::Trace(layer) => layer.child.data_leaf(),
        }
    }

    /// The concrete payload at the bottom of the chain
    pub fn data(&self) -> &DenseTensor {
        &self.data_leaf().data
    }

    /// Number of wrapper layers above the leaf
    pub fn depth(&self) -> usize {
        match self {
            TensorNode::Leaf(_) => 0,
            TensorNode::Pointer(layer) | TensorNode::Trace(layer) => 1 + layer.child.depth(),
        }
    }

    /// Wire tag of this node kind
    pub fn kind(&self) -> &'static str {
        match self {
            TensorNode::Leaf(_) => "leaf",
            TensorNode::Pointer(_) => "pointer",
            TensorNode::Trace(_) => "trace",
        }
    }

    /// Peel one wrapper layer, or return the node itself for leaves
    pub(crate) fn unwrap_once(&self) -> TensorNode {
        match self {
            TensorNode::Pointer(layer) | TensorNode::Trace(layer) => (*layer.child).clone(),
            leaf => leaf.clone(),
        }
    }
}
