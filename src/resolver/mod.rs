//! Dependency resolution.
//!
//! Given the modules the host discovered, find the `Abyss` modules they
//! reference but that are not installed, download each of them once, and
//! merge their plugin entries into the discovery result. Newly downloaded
//! modules are searched the same way, depth first.
//!
//! There are no versions: a reference is satisfied by any module with the
//! same name, and a missing one is always fetched from the latest release.

pub mod errors;
pub mod pending;
pub mod resolve;

pub use errors::ResolveError;
pub use pending::{PendingReferences, VisitedSet};
pub use resolve::Resolver;
