//! Companion framework bootstrapping.
//!
//! The companion framework ships as a release archive. If its binary is not
//! under the game root yet, the archive is downloaded and unpacked there.
//! The binary is then loaded through the host ([`CompanionRuntime`]) and its
//! log events are routed into the host's sink through a [`LogBridge`].

pub mod bridge;

use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

use crate::sources::{FetchError, Fetcher, COMPANION_ARCHIVE_URL};
use crate::util::archive::{self, ArchiveKind};
use crate::util::context::COMPANION_DIR_NAME;
use crate::util::InitContext;

pub use bridge::{map_level, LogBridge, SEVERITY_TABLE};

/// File name of the companion binary inside its directory.
pub const COMPANION_BINARY: &str = "Winch.dll";

/// Error bringing up the companion framework.
#[derive(Debug, Error)]
pub enum CompanionError {
    #[error("failed to download companion archive from {url}")]
    Download {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("failed to unpack companion archive into {path}: {message}")]
    Extract { path: String, message: String },

    #[error("failed to load companion binary {path}: {message}")]
    Load { path: String, message: String },
}

/// The host's capability to load and start the companion binary.
pub trait CompanionRuntime {
    /// Load the binary at `binary` and run its entry point.
    fn load(&mut self, binary: &Path) -> anyhow::Result<()>;

    /// Hand every subsequent companion log event to `bridge`.
    fn install_log_listener(&mut self, bridge: LogBridge);
}

/// Makes sure the companion framework is installed and running.
pub struct Bootstrapper<'a> {
    ctx: &'a InitContext,
    fetcher: &'a dyn Fetcher,
    archive_url: String,
}

impl<'a> Bootstrapper<'a> {
    pub fn new(ctx: &'a InitContext, fetcher: &'a dyn Fetcher) -> Self {
        Bootstrapper {
            ctx,
            fetcher,
            archive_url: COMPANION_ARCHIVE_URL.to_string(),
        }
    }

    /// Download from a different archive URL.
    pub fn with_archive_url(mut self, url: impl Into<String>) -> Self {
        self.archive_url = url.into();
        self
    }

    /// Where the companion binary lives once installed.
    pub fn binary_path(&self) -> PathBuf {
        self.ctx.paths().companion_dir().join(COMPANION_BINARY)
    }

    /// Install, load and bridge the companion framework.
    ///
    /// A failed download or extraction is only logged. Loading is not
    /// optional: if the binary is still missing or the host cannot start
    /// it, this returns [`CompanionError::Load`].
    pub fn ensure_ready(&self, runtime: &mut dyn CompanionRuntime) -> Result<(), CompanionError> {
        if !self.ctx.config().companion.enabled {
            tracing::info!("Companion framework disabled by configuration");
            return Ok(());
        }

        if let Err(e) = self.ensure_installed() {
            tracing::error!("Failed to install companion framework: {}", e);
        }

        let binary = self.binary_path();
        if !binary.exists() {
            return Err(CompanionError::Load {
                path: binary.display().to_string(),
                message: "binary is missing".to_string(),
            });
        }

        runtime
            .load(&binary)
            .map_err(|e| CompanionError::Load {
                path: binary.display().to_string(),
                message: format!("{:#}", e),
            })?;

        runtime.install_log_listener(LogBridge::new(self.ctx.sink().clone()));
        tracing::info!("Companion framework loaded from {}", binary.display());
        Ok(())
    }

    /// Download and unpack the companion archive if the binary is absent.
    ///
    /// Returns `true` if it was installed by this call.
    pub fn ensure_installed(&self) -> Result<bool, CompanionError> {
        if self.binary_path().exists() {
            tracing::debug!("Companion framework already present");
            return Ok(false);
        }

        let target = self.ctx.paths().companion_dir();
        let extract_err = |message: String| CompanionError::Extract {
            path: target.display().to_string(),
            message,
        };

        let url = Url::parse(&self.archive_url).map_err(|e| CompanionError::Download {
            url: self.archive_url.clone(),
            source: FetchError::Transport {
                url: self.archive_url.clone(),
                message: e.to_string(),
            },
        })?;
        let kind = ArchiveKind::from_name(url.path())
            .ok_or_else(|| extract_err(format!("unsupported archive type: {}", url)))?;

        tracing::info!("Downloading companion framework from {}", url);
        let scratch = tempfile::tempdir().map_err(|source| CompanionError::Download {
            url: url.to_string(),
            source: FetchError::Io {
                path: std::env::temp_dir().display().to_string(),
                source,
            },
        })?;
        let download = scratch.path().join(archive_file_name(&url));
        self.fetcher
            .fetch(&url, &download)
            .map_err(|source| CompanionError::Download {
                url: url.to_string(),
                source,
            })?;

        let data = std::fs::read(&download)
            .map_err(|e| extract_err(format!("cannot read {}: {}", download.display(), e)))?;
        archive::extract(&data, kind, &target).map_err(|e| extract_err(format!("{:#}", e)))?;
        crate::util::fs::flatten_one_level(&target, COMPANION_DIR_NAME)
            .map_err(|e| extract_err(format!("{:#}", e)))?;

        tracing::info!("Installed companion framework into {}", target.display());
        Ok(true)
    }
}

fn archive_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("companion.zip")
        .to_string()
}
