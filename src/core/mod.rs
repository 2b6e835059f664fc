//! Core data structures for the initializer.
//!
//! This module contains the types shared by every stage:
//! - Module records, references and type candidates
//! - Plugin entries and their optional late-init capability
//! - The grow-only result set handed back to the host

pub mod module;
pub mod plugin;
pub mod result_set;

pub use module::{
    short_name, ModuleRecord, ModuleVersion, ReferenceDescriptor, ReferenceName, TypeCandidate,
    TypeName, REFERENCE_PREFIX,
};
pub use plugin::{Activation, LateInitializable, PluginEntry, PluginInstance};
pub use result_set::ResultSet;
