//! Hooking into the host's loader.
//!
//! The host owns the actual method patching; it is consumed through
//! [`MethodPatcher`]. What this module decides is where the hooks go
//! ([`targets`]), how the start routine is rewritten ([`Transpiler`]) and
//! what happens when a plugin is activated ([`on_activated`]).

pub mod il;
pub mod targets;
pub mod transpiler;

use thiserror::Error;

use crate::core::PluginEntry;

pub use il::{Instruction, MethodRef, OpCode, Operand};
pub use transpiler::{Rewrite, Transpiler, CANDIDATE_LOCAL_SLOT};

/// Error installing a hook.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("method not found: {method}")]
    MethodNotFound { method: String },

    #[error("failed to patch {method}: {message}")]
    Rejected { method: String, message: String },
}

/// The host's method-patching capability.
pub trait MethodPatcher {
    /// Run `hook` after every return from `target`.
    fn install_postfix(&mut self, target: &MethodRef, hook: &MethodRef) -> Result<(), PatchError>;

    /// Decode `target`'s body, pass it through `transpiler` and re-encode
    /// the result in place.
    fn install_transpiler(&mut self, target: &MethodRef, transpiler: &Transpiler) -> Result<(), PatchError>;
}

/// Late-initialization hook for a freshly activated plugin entry.
///
/// Calls `init_dredge_mod` on the entry's instance if the instance opts in
/// through [`LateInitializable`](crate::core::LateInitializable). Returns
/// whether it was called.
pub fn on_activated(entry: &mut PluginEntry) -> bool {
    let id = entry.id();

    let Some(instance) = entry.instance_mut() else {
        tracing::debug!("{} was activated without an instance", id);
        return false;
    };

    match instance.as_late_initializable() {
        Some(target) => {
            tracing::debug!("Running late initialization for {}", id);
            target.init_dredge_mod();
            true
        }
        None => false,
    }
}
