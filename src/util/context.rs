//! Context for one host startup pass.
//!
//! Provides the paths, configuration and host log sink that every stage
//! needs. The context is constructed once by the host and passed down
//! explicitly; nothing here is process-global.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::util::config::{Config, CONFIG_FILE_NAME};
use crate::util::logging::LogSink;

/// Directory of the host framework under the game root.
pub const HOST_DIR_NAME: &str = "BepInEx";

/// Directory under the game root holding the companion framework.
pub const COMPANION_DIR_NAME: &str = "Winch";

/// Well-known locations under the game root.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Game installation root
    game_root: PathBuf,
}

impl Paths {
    pub fn new(game_root: impl Into<PathBuf>) -> Self {
        Paths {
            game_root: game_root.into(),
        }
    }

    /// Get the game installation root.
    pub fn game_root(&self) -> &Path {
        &self.game_root
    }

    /// Get the host framework directory (`<root>/BepInEx`).
    pub fn host_dir(&self) -> PathBuf {
        self.game_root.join(HOST_DIR_NAME)
    }

    /// Get the plugin directory that receives fetched modules.
    pub fn plugin_dir(&self) -> PathBuf {
        self.host_dir().join("plugins")
    }

    /// Get the host config directory.
    pub fn config_dir(&self) -> PathBuf {
        self.host_dir().join("config")
    }

    /// Get the initializer's config file path.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir().join(CONFIG_FILE_NAME)
    }

    /// Get the companion framework directory.
    pub fn companion_dir(&self) -> PathBuf {
        self.game_root.join(COMPANION_DIR_NAME)
    }

    /// Local destination for a module binary.
    pub fn module_path(&self, name: &str) -> PathBuf {
        self.plugin_dir().join(format!("{}.dll", name))
    }

    /// Local destination for a module's documentation sidecar.
    pub fn metadata_path(&self, name: &str) -> PathBuf {
        self.plugin_dir().join(format!("{}.xml", name))
    }
}

/// Context threaded through the resolver and bootstrapper.
#[derive(Clone)]
pub struct InitContext {
    paths: Paths,
    config: Config,
    sink: Arc<dyn LogSink>,
}

impl InitContext {
    /// Create a context for `game_root`, loading config from its usual place.
    pub fn new(game_root: impl Into<PathBuf>, sink: Arc<dyn LogSink>) -> Self {
        let paths = Paths::new(game_root);
        let config = Config::load_or_default(&paths.config_path());
        InitContext::from_parts(paths, config, sink)
    }

    /// Create a context from already loaded parts.
    pub fn from_parts(paths: Paths, config: Config, sink: Arc<dyn LogSink>) -> Self {
        InitContext {
            paths,
            config,
            sink,
        }
    }

    /// Replace the loaded configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the host's log sink.
    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }
}

impl fmt::Debug for InitContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitContext")
            .field("paths", &self.paths)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
