//! Fetcher trait - common interface for all byte sources.

use std::path::Path;

use thiserror::Error;
use url::Url;

/// Error fetching a remote resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote could not be reached (DNS, connect, TLS, read).
    #[error("failed to reach {url}: {message}")]
    Transport { url: String, message: String },

    /// The remote answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Network access is disabled by configuration.
    #[error("offline mode: refusing to fetch {url}")]
    Offline { url: String },

    /// The response could not be written locally.
    #[error("failed to write {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Check whether this is a transport-level failure, as opposed to a local
    /// one.
    pub fn is_transport(&self) -> bool {
        !matches!(self, FetchError::Io { .. })
    }

    /// Transport-specific detail for log lines.
    pub fn detail(&self) -> String {
        match self {
            FetchError::Transport { message, .. } => format!("transport error: {}", message),
            FetchError::Status { status, .. } => format!("transport error: HTTP status {}", status),
            FetchError::Offline { .. } => "transport error: offline mode".to_string(),
            FetchError::Io { source, .. } => format!("local error: {}", source),
        }
    }
}

/// Retrieves remote resources to local files.
pub trait Fetcher {
    /// Fetch `url` into `dest`. On failure `dest` is left as it was.
    fn fetch(&self, url: &Url, dest: &Path) -> Result<(), FetchError>;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<(), FetchError> {
        (**self).fetch(url, dest)
    }
}
