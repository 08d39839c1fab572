//! Tensors — dense payloads, wrapper chains, and dispatch
//!
//! The dense backend plays the role of the foreign numeric library; the
//! node/dispatch half is the proxy machinery installed over it.

pub mod dense;
pub mod dispatch;
pub mod node;
pub mod ops;

pub use dense::{DenseTensor, Dtype, NativeError};
pub use dispatch::DispatchError;
pub use node::{LeafTensor, TensorNode, WrapperLayer};
