//! The instruction-stream rewriter.
//!
//! A single pass over the host's start routine. Every instruction is kept
//! as-is; two call sites additionally get instructions spliced in right
//! after them:
//!
//! - the discovery lookup is followed by a call to the discovery hook, which
//!   takes the lookup's result off the stack and pushes the augmented one;
//! - the activation setter is followed by a load of the in-scope plugin
//!   entry and a call to the activation hook.

use super::il::{Instruction, MethodRef};
use super::targets;

/// Local slot holding the current plugin entry at the activation setter.
///
/// Positional: valid only for the host build whose `Chainloader.Start`
/// local layout it was read from. A recompiled host can move it.
pub const CANDIDATE_LOCAL_SLOT: u16 = 23;

/// Output of a rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// The rewritten stream
    pub instructions: Vec<Instruction>,

    /// Number of discovery call sites hooked
    pub discovery_sites: usize,

    /// Number of activation call sites hooked
    pub activation_sites: usize,
}

impl Rewrite {
    /// Number of instructions added.
    pub fn inserted(&self) -> usize {
        self.discovery_sites + 2 * self.activation_sites
    }
}

/// Rewrites the host's start routine to call the initializer's hooks.
#[derive(Debug, Clone)]
pub struct Transpiler {
    discovery_site: MethodRef,
    activation_site: MethodRef,
    discovery_hook: MethodRef,
    activation_hook: MethodRef,
    candidate_slot: u16,
}

impl Default for Transpiler {
    fn default() -> Self {
        Transpiler {
            discovery_site: targets::find_plugin_types(),
            activation_site: targets::plugin_instance_setter(),
            discovery_hook: targets::discovery_hook(),
            activation_hook: targets::activation_hook(),
            candidate_slot: CANDIDATE_LOCAL_SLOT,
        }
    }
}

impl Transpiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the plugin entry from a different local slot.
    pub fn with_candidate_slot(mut self, slot: u16) -> Self {
        self.candidate_slot = slot;
        self
    }

    pub fn candidate_slot(&self) -> u16 {
        self.candidate_slot
    }

    /// Rewrite `instructions`.
    pub fn rewrite(&self, instructions: Vec<Instruction>) -> Rewrite {
        let mut out = Vec::with_capacity(instructions.len() + 3);
        let mut discovery_sites = 0;
        let mut activation_sites = 0;

        for instruction in instructions {
            let hook = if instruction.calls(&self.discovery_site) {
                discovery_sites += 1;
                Some(Site::Discovery)
            } else if instruction.calls(&self.activation_site) {
                activation_sites += 1;
                Some(Site::Activation)
            } else {
                None
            };

            out.push(instruction);

            match hook {
                Some(Site::Discovery) => {
                    out.push(Instruction::call(self.discovery_hook.clone()));
                }
                Some(Site::Activation) => {
                    out.push(Instruction::ldloc(self.candidate_slot));
                    out.push(Instruction::call(self.activation_hook.clone()));
                }
                None => {}
            }
        }

        if discovery_sites == 0 {
            tracing::warn!(
                "No call to {} found; missing dependencies will not be downloaded",
                self.discovery_site
            );
        }
        if activation_sites == 0 {
            tracing::warn!(
                "No call to {} found; late initialization is disabled",
                self.activation_site
            );
        }
        tracing::debug!(
            "Rewrote start routine: {} discovery site(s), {} activation site(s)",
            discovery_sites,
            activation_sites
        );

        Rewrite {
            instructions: out,
            discovery_sites,
            activation_sites,
        }
    }
}

enum Site {
    Discovery,
    Activation,
}
