//! Interception — native type descriptions, the operation registry, and
//! the engine that rewrites types and hands out hook contexts.

pub mod engine;
pub mod native;
pub mod registry;

pub use engine::{hook, hook_if_available, hook_with, HookContext};
pub use native::{dense_type, preserved_name, Member, NativeType, NATIVE_PREFIX};
pub use registry::{eligible_operations, ExclusionList, BASE_MEMBERS, COMPARATORS};
