//! Identity registry — process-unique ids, tensor handles, execution contexts
//!
//! Everything tensor-shaped in Veil carries a [`TensorHandle`]: a lazily
//! allocated id plus owner/location metadata pointing at [`Context`] values.

mod context;
mod handle;

pub use context::{Context, LOCAL_CONTEXT_ID};
pub use handle::{next_id, TensorHandle};
