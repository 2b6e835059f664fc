//! Release asset layout.
//!
//! Every module is published as the latest release of its own repository:
//!
//! ```text
//! https://github.com/AbyssMod/<name>/releases/latest/download/<name>.dll
//! https://github.com/AbyssMod/<name>/releases/latest/download/<name>.xml
//! ```

use url::Url;

use crate::core::ReferenceName;
use crate::sources::FetchError;

/// Host serving release assets.
pub const RELEASE_HOST: &str = "https://github.com";

/// Organisation owning module repositories.
pub const RELEASE_ORG: &str = "AbyssMod";

/// Release archive of the companion framework.
pub const COMPANION_ARCHIVE_URL: &str =
    "https://github.com/Hacktix/Winch/releases/latest/download/Winch.zip";

/// Computes asset URLs for modules.
#[derive(Debug, Clone)]
pub struct ReleaseLayout {
    host: String,
    org: String,
}

impl Default for ReleaseLayout {
    fn default() -> Self {
        ReleaseLayout::new(RELEASE_HOST, RELEASE_ORG)
    }
}

impl ReleaseLayout {
    pub fn new(host: impl Into<String>, org: impl Into<String>) -> Self {
        ReleaseLayout {
            host: host.into(),
            org: org.into(),
        }
    }

    /// URL of a module's binary.
    pub fn module_url(&self, name: &ReferenceName) -> Result<Url, FetchError> {
        self.asset_url(name, "dll")
    }

    /// URL of a module's documentation sidecar.
    pub fn metadata_url(&self, name: &ReferenceName) -> Result<Url, FetchError> {
        self.asset_url(name, "xml")
    }

    fn asset_url(&self, name: &ReferenceName, extension: &str) -> Result<Url, FetchError> {
        let raw = format!(
            "{}/{}/{}/releases/latest/download/{}.{}",
            self.host.trim_end_matches('/'),
            self.org,
            name,
            name,
            extension
        );
        Url::parse(&raw).map_err(|e| FetchError::Transport {
            url: raw.clone(),
            message: format!("invalid URL: {}", e),
        })
    }
}
