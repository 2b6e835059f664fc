//! Transitive fetch-and-merge of missing modules.

use std::path::{Path, PathBuf};

use crate::core::{short_name, ReferenceName, ResultSet, REFERENCE_PREFIX};
use crate::inspect::{Inspector, ModuleReader, PluginClassifier};
use crate::sources::{Fetcher, ReleaseLayout};
use crate::util::InitContext;

use super::errors::ResolveError;
use super::pending::{PendingReferences, VisitedSet};

/// State owned by a single resolution pass.
struct Pass {
    visited: VisitedSet,
    pending: PendingReferences,
    output: ResultSet,
}

/// Completes a discovery result with the modules it is missing.
pub struct Resolver<'a> {
    ctx: &'a InitContext,
    fetcher: &'a dyn Fetcher,
    inspector: Inspector<'a>,
    layout: ReleaseLayout,
}

impl<'a> Resolver<'a> {
    pub fn new(
        ctx: &'a InitContext,
        fetcher: &'a dyn Fetcher,
        reader: &'a dyn ModuleReader,
        classifier: &'a dyn PluginClassifier,
    ) -> Self {
        Resolver {
            ctx,
            fetcher,
            inspector: Inspector::new(reader, classifier),
            layout: ReleaseLayout::default(),
        }
    }

    /// Download release assets from a different location.
    pub fn with_layout(mut self, layout: ReleaseLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Resolve the modules `initial` references but does not contain.
    ///
    /// Every missing module is downloaded at most once, then recorded with
    /// its plugin entries (possibly none) and searched for further missing
    /// references. A module that cannot be downloaded, read or classified is
    /// left out and logged; this never fails as a whole, and the result is
    /// always a superset of `initial`.
    pub fn resolve(&self, initial: ResultSet) -> ResultSet {
        let mut pass = Pass {
            visited: VisitedSet::new(),
            pending: PendingReferences::new(),
            output: initial,
        };
        let initial_len = pass.output.len();

        let present: Vec<PathBuf> = pass.output.paths().map(Path::to_path_buf).collect();
        for path in &present {
            pass.visited.insert(short_name(path));
        }
        for path in &present {
            self.scan_present(&mut pass, path);
        }

        let missing: Vec<ReferenceName> = pass
            .pending
            .iter()
            .map(|d| d.name.clone())
            .filter(|name| !pass.visited.contains(name.as_str()))
            .collect();

        if missing.is_empty() {
            tracing::debug!("All referenced modules are present");
            return pass.output;
        }

        if self.ctx.config().net.offline {
            let names: Vec<&str> = missing.iter().map(|n| n.as_str()).collect();
            tracing::warn!(
                "Offline mode: not downloading missing dependencies {}",
                names.join(", ")
            );
            return pass.output;
        }

        for name in &missing {
            // An earlier branch may have reached it already
            if pass.visited.contains(name.as_str()) {
                continue;
            }
            self.resolve_branch(&mut pass, name, 1);
        }

        tracing::info!(
            "Dependency resolution added {} module(s)",
            pass.output.len() - initial_len
        );
        pass.output
    }

    /// Record a present module and collect its references.
    fn scan_present(&self, pass: &mut Pass, path: &Path) {
        let name = short_name(path);
        tracing::info!("Scanning {} for dependencies to download", name);

        let record = match self.inspector.inspect(path) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Cannot scan {}: {}", path.display(), e);
                return;
            }
        };

        for descriptor in record
            .references()
            .iter()
            .filter(|r| r.name.has_prefix(REFERENCE_PREFIX))
        {
            if pass.pending.add(descriptor.clone()) {
                tracing::debug!(
                    "{} references {} {}",
                    name,
                    descriptor.name,
                    descriptor.version
                );
            }
        }
    }

    /// Resolve one missing module, containing any failure to its branch.
    fn resolve_branch(&self, pass: &mut Pass, name: &ReferenceName, depth: usize) {
        if let Err(e) = self.fetch_and_merge(pass, name, depth) {
            match e {
                ResolveError::Fetch { .. } => tracing::warn!("{}", e.detail()),
                _ => tracing::error!("{}", e.detail()),
            }
        }
    }

    fn fetch_and_merge(
        &self,
        pass: &mut Pass,
        name: &ReferenceName,
        depth: usize,
    ) -> Result<(), ResolveError> {
        if !name.is_file_safe() {
            pass.visited.insert(name.as_str());
            return Err(ResolveError::InvalidName { name: name.clone() });
        }

        // Left unvisited: a shorter chain may still reach it
        let limit = self.ctx.config().resolver.max_depth;
        if depth > limit {
            return Err(ResolveError::DepthExceeded {
                name: name.clone(),
                limit,
            });
        }

        pass.visited.insert(name.as_str());
        tracing::info!("{} is a required dependency and will be downloaded", name);

        let sidecar = self.fetch_metadata(name);

        let dest = self.ctx.paths().module_path(name.as_str());
        let fetched = self
            .layout
            .module_url(name)
            .and_then(|url| self.fetcher.fetch(&url, &dest));
        if let Err(source) = fetched {
            if let Some(sidecar) = sidecar {
                discard_sidecar(&sidecar);
            }
            return Err(ResolveError::Fetch {
                name: name.clone(),
                source,
            });
        }
        tracing::info!("Downloaded {} to {}", name, dest.display());

        let read_err = |source| ResolveError::Read {
            name: name.clone(),
            source,
        };
        let classify_err = |source| ResolveError::Classification {
            name: name.clone(),
            source,
        };

        let has_plugins = {
            let record = self.inspector.inspect(&dest).map_err(read_err)?;
            self.inspector
                .has_any_plugin_entries(&record)
                .map_err(classify_err)?
        };

        let (references, entries) = {
            let record = self.inspector.inspect(&dest).map_err(read_err)?;
            let entries = if has_plugins {
                self.inspector
                    .list_plugin_entries(&record)
                    .map_err(classify_err)?
            } else {
                Vec::new()
            };
            let references = self
                .inspector
                .list_declared_references(&record, REFERENCE_PREFIX);
            (references, entries)
        };

        for reference in &references {
            if pass.visited.contains(reference.as_str()) || pass.pending.contains(reference) {
                continue;
            }
            self.resolve_branch(pass, reference, depth + 1);
        }

        if entries.is_empty() {
            tracing::info!("{} contains no plugins", name);
        } else {
            tracing::debug!("{} contains {} plugin(s)", name, entries.len());
        }

        if !pass.output.insert(dest.clone(), entries) {
            tracing::debug!("{} was already recorded", dest.display());
        }
        Ok(())
    }

    /// Download the module's documentation file. Failure is only a warning.
    fn fetch_metadata(&self, name: &ReferenceName) -> Option<PathBuf> {
        let dest = self.ctx.paths().metadata_path(name.as_str());
        let result = self
            .layout
            .metadata_url(name)
            .and_then(|url| self.fetcher.fetch(&url, &dest));

        match result {
            Ok(()) => Some(dest),
            Err(e) => {
                tracing::warn!("Could not download documentation for {}: {}", name, e.detail());
                None
            }
        }
    }
}

/// Remove the documentation file of a module whose binary never arrived.
fn discard_sidecar(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed orphaned {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
    }
}
