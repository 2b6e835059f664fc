//! Abyss initializer - completes a mod loader's plugin set before it loads.
//!
//! This crate provides the library the preloader is built from: reading
//! module metadata, resolving and downloading missing `Abyss` modules,
//! rewriting the chain loader's start routine to call back into the
//! resolver, and bootstrapping the companion framework.

pub mod companion;
pub mod core;
pub mod initializer;
pub mod inspect;
pub mod patch;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities and mocks for unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides mock implementations of the host's
/// capabilities and builders for module images and archives.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    module::ModuleRecord, module::ReferenceName, plugin::PluginEntry, result_set::ResultSet,
};

pub use initializer::Initializer;
pub use resolver::Resolver;
pub use util::context::InitContext;
