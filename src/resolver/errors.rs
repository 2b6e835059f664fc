//! Resolution error types.

use thiserror::Error;

use crate::core::ReferenceName;
use crate::inspect::{ClassifyError, InspectError};
use crate::sources::FetchError;

/// Error that ends one branch of resolution.
///
/// None of these abort the whole pass; siblings of the failed branch are
/// still resolved.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to download `{name}`")]
    Fetch {
        name: ReferenceName,
        #[source]
        source: FetchError,
    },

    #[error("`{name}` is not a readable module")]
    Read {
        name: ReferenceName,
        #[source]
        source: InspectError,
    },

    #[error("cannot tell whether `{name}` contains plugins")]
    Classification {
        name: ReferenceName,
        #[source]
        source: ClassifyError,
    },

    #[error("dependency chain deeper than {limit} at `{name}`")]
    DepthExceeded { name: ReferenceName, limit: usize },

    #[error("`{name}` is not a valid module file name")]
    InvalidName { name: ReferenceName },
}

impl ResolveError {
    /// Name of the module whose branch failed.
    pub fn name(&self) -> &ReferenceName {
        match self {
            ResolveError::Fetch { name, .. }
            | ResolveError::Read { name, .. }
            | ResolveError::Classification { name, .. }
            | ResolveError::DepthExceeded { name, .. }
            | ResolveError::InvalidName { name } => name,
        }
    }

    /// One-line description including the underlying cause.
    pub fn detail(&self) -> String {
        match self {
            ResolveError::Fetch { source, .. } => format!("{}: {}", self, source.detail()),
            ResolveError::Read { source, .. } => format!("{}: {}", self, source),
            ResolveError::Classification { source, .. } => format!("{}: {}", self, source),
            ResolveError::DepthExceeded { .. } | ResolveError::InvalidName { .. } => {
                self.to_string()
            }
        }
    }
}
