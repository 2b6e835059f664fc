//! The initializer: what the host calls into.
//!
//! Startup runs in this order:
//!
//! 1. [`Initializer::bootstrap_companion`] makes the companion framework
//!    available.
//! 2. [`Initializer::finish`] hooks the end of `Chainloader.Initialize`.
//! 3. That hook, [`Initializer::on_chainloader_initialized`], rewrites
//!    `Chainloader.Start` so that it calls back into
//!    [`Initializer::on_plugins_discovered`] with its discovery result and
//!    into [`Initializer::on_plugin_activated`] for every plugin it starts.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::companion::{Bootstrapper, CompanionError, CompanionRuntime};
use crate::core::{PluginEntry, ResultSet};
use crate::inspect::{BaseTypeClassifier, CliModuleReader, ModuleReader, PluginClassifier};
use crate::patch::{self, targets, MethodPatcher, PatchError, Transpiler};
use crate::resolver::Resolver;
use crate::sources::{Fetcher, HttpFetcher};
use crate::util::logging::{self, LogSink};
use crate::util::{Config, InitContext, Paths};

/// The initializer and the collaborators it runs with.
pub struct Initializer {
    ctx: InitContext,
    fetcher: Box<dyn Fetcher>,
    reader: Box<dyn ModuleReader>,
    classifier: Box<dyn PluginClassifier>,
    transpiler: Transpiler,
}

impl Initializer {
    pub fn new(
        ctx: InitContext,
        fetcher: Box<dyn Fetcher>,
        reader: Box<dyn ModuleReader>,
        classifier: Box<dyn PluginClassifier>,
    ) -> Self {
        Initializer {
            ctx,
            fetcher,
            reader,
            classifier,
            transpiler: Transpiler::new(),
        }
    }

    /// Create an initializer for `game_root` with the stock collaborators:
    /// HTTP downloads, the on-disk metadata reader and base-type plugin
    /// classification. Also routes this crate's logging into `sink`.
    pub fn start(game_root: impl Into<PathBuf>, sink: Arc<dyn LogSink>) -> Result<Self> {
        let paths = Paths::new(game_root);
        let config_path = paths.config_path();

        // Logging comes up before a config failure is reported
        let loaded = Config::load_optional(&config_path);
        let verbose = matches!(&loaded, Ok(Some(config)) if config.log.verbose);
        if !logging::init(sink.clone(), verbose) {
            tracing::debug!("A log subscriber was already installed");
        }
        let config = Config::or_default(&config_path, loaded);
        let ctx = InitContext::from_parts(paths, config, sink);

        let fetcher = HttpFetcher::new(&ctx.config().net)?;
        tracing::info!("Initializer starting in {}", ctx.paths().game_root().display());

        Ok(Initializer::new(
            ctx,
            Box::new(fetcher),
            Box::new(CliModuleReader::new()),
            Box::new(BaseTypeClassifier::new(targets::plugin_base())),
        ))
    }

    /// Use a different rewriter.
    pub fn with_transpiler(mut self, transpiler: Transpiler) -> Self {
        self.transpiler = transpiler;
        self
    }

    pub fn context(&self) -> &InitContext {
        &self.ctx
    }

    pub fn transpiler(&self) -> &Transpiler {
        &self.transpiler
    }

    /// Install, load and bridge the companion framework.
    pub fn bootstrap_companion(&self, runtime: &mut dyn CompanionRuntime) -> Result<(), CompanionError> {
        Bootstrapper::new(&self.ctx, self.fetcher.as_ref()).ensure_ready(runtime)
    }

    /// Hook the end of the chain loader's initialization.
    pub fn finish(&self, patcher: &mut dyn MethodPatcher) -> Result<(), PatchError> {
        let target = targets::chainloader_initialize();
        patcher.install_postfix(&target, &targets::initialized_hook())?;
        tracing::debug!("Hooked {}", target);
        Ok(())
    }

    /// Rewrite the chain loader's start routine. Runs once initialization
    /// has finished.
    pub fn on_chainloader_initialized(&self, patcher: &mut dyn MethodPatcher) -> Result<(), PatchError> {
        let target = targets::chainloader_start();
        patcher.install_transpiler(&target, &self.transpiler)?;
        tracing::debug!("Rewrote {}", target);
        Ok(())
    }

    /// Complete the host's discovery result with missing dependencies.
    pub fn on_plugins_discovered(&self, discovered: ResultSet) -> ResultSet {
        Resolver::new(
            &self.ctx,
            self.fetcher.as_ref(),
            self.reader.as_ref(),
            self.classifier.as_ref(),
        )
        .resolve(discovered)
    }

    /// Run late initialization for a plugin the host just activated.
    pub fn on_plugin_activated(&self, entry: &mut PluginEntry) {
        patch::on_activated(entry);
    }
}
