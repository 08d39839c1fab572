//! Veil — transparent tensor interception
//!
//! A dispatch layer over a native numeric-tensor type: every operation can
//! be silently redirected through a chain of proxy wrappers (remote
//! pointers, trace layers) without changing call sites, with identity
//! metadata and a wire codec that survive process boundaries.

pub mod capability;
pub mod codec;
pub mod hook;
pub mod identity;
pub mod tensor;

pub use capability::Capabilities;
pub use codec::{CodecError, Envelope};
pub use hook::{dense_type, hook, hook_if_available, ExclusionList, HookContext, NativeType};
pub use identity::{Context, TensorHandle};
pub use tensor::{DenseTensor, DispatchError, Dtype, NativeError, TensorNode};
