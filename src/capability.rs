//! Capability flags — which native numeric backends this build provides
//!
//! A deployment may lack a backend entirely. "Absent" is a valid state
//! the caller consults before hooking, never an error.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Capabilities {
    /// Built-in dense tensor backend, always shipped
    pub dense: bool,
    /// Sparse backend, not shipped in this build
    pub sparse: bool,
}

/// Probe which backends are present
pub fn detect() -> Capabilities {
    Capabilities {
        dense: true,
        sparse: false,
    }
}

impl Capabilities {
    /// Whether the backend behind `type_name` is present
    pub fn supports(&self, type_name: &str) -> bool {
        match type_name {
            "dense" => self.dense,
            "sparse" => self.sparse,
            _ => false,
        }
    }
}
