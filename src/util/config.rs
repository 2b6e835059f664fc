//! Configuration file support for the initializer.
//!
//! Configuration lives beside the host's own config files:
//! - `<game root>/BepInEx/config/abyss.toml`
//!
//! Every setting is optional. A missing file, or one that fails to parse,
//! yields the defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name of the initializer's config.
pub const CONFIG_FILE_NAME: &str = "abyss.toml";

/// Default bound on dependency recursion.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Initializer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dependency resolution settings
    pub resolver: ResolverConfig,

    /// Companion framework settings
    pub companion: CompanionConfig,

    /// Network settings
    pub net: NetConfig,

    /// Logging settings
    pub log: LogConfig,
}

/// Dependency resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Deepest chain of missing dependencies followed before giving up on a
    /// branch
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Companion framework settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// Install and load the companion framework at startup
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        CompanionConfig { enabled: true }
    }
}

/// Network-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Offline mode (don't fetch from network)
    #[serde(default)]
    pub offline: bool,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        NetConfig {
            offline: false,
            user_agent: format!("abyss-initializer/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Emit debug-level lines
    #[serde(default)]
    pub verbose: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration if the file exists.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        Self::or_default(path, Self::load_optional(path))
    }

    /// Take a loaded configuration, or the defaults with a warning if the
    /// file at `path` could not be used.
    pub fn or_default(path: &Path, loaded: Result<Option<Self>>) -> Self {
        match loaded {
            Ok(config) => config.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }
}
