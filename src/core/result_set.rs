//! ResultSet - the host's discovery result (module path -> plugin entries).
//!
//! The resolver only ever adds modules. An existing key is never replaced
//! and its entries are never touched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::module::short_name;
use crate::core::plugin::PluginEntry;

/// Mapping from module path to the plugin entries found in that module.
///
/// An empty entry list means the module is present but contributes no
/// loadable units.
#[derive(Debug, Default)]
pub struct ResultSet {
    modules: BTreeMap<PathBuf, Vec<PluginEntry>>,
}

impl ResultSet {
    /// Create an empty result set.
    pub fn new() -> Self {
        ResultSet {
            modules: BTreeMap::new(),
        }
    }

    /// Record a module and its entries.
    ///
    /// Returns `false` and leaves the set unchanged if the path is already
    /// present.
    pub fn insert(&mut self, path: impl Into<PathBuf>, entries: Vec<PluginEntry>) -> bool {
        let path = path.into();
        if self.modules.contains_key(&path) {
            return false;
        }
        self.modules.insert(path, entries);
        true
    }

    /// Check whether a module path is present.
    pub fn contains(&self, path: &Path) -> bool {
        self.modules.contains_key(path)
    }

    /// Get the entries recorded for a module path.
    pub fn get(&self, path: &Path) -> Option<&[PluginEntry]> {
        self.modules.get(path).map(Vec::as_slice)
    }

    /// Get mutable entries for a module path (host activation).
    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Vec<PluginEntry>> {
        self.modules.get_mut(path)
    }

    /// Iterate over module paths.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.modules.keys().map(PathBuf::as_path)
    }

    /// Iterate over modules and their entries.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[PluginEntry])> {
        self.modules
            .iter()
            .map(|(path, entries)| (path.as_path(), entries.as_slice()))
    }

    /// Iterate mutably over every entry of every module.
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut PluginEntry> {
        self.modules.values_mut().flat_map(|entries| entries.iter_mut())
    }

    /// Short names of every module present.
    pub fn short_names(&self) -> Vec<String> {
        self.modules.keys().map(|path| short_name(path)).collect()
    }

    /// Entry identities per module path, for comparison and logging.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<String>> {
        self.modules
            .iter()
            .map(|(path, entries)| (path.clone(), entries.iter().map(PluginEntry::id).collect()))
            .collect()
    }

    /// Number of modules present.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Total number of plugin entries across all modules.
    pub fn entry_count(&self) -> usize {
        self.modules.values().map(Vec::len).sum()
    }
}

impl FromIterator<(PathBuf, Vec<PluginEntry>)> for ResultSet {
    fn from_iter<I: IntoIterator<Item = (PathBuf, Vec<PluginEntry>)>>(iter: I) -> Self {
        let mut set = ResultSet::new();
        for (path, entries) in iter {
            set.insert(path, entries);
        }
        set
    }
}

impl IntoIterator for ResultSet {
    type Item = (PathBuf, Vec<PluginEntry>);
    type IntoIter = std::collections::btree_map::IntoIter<PathBuf, Vec<PluginEntry>>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.into_iter()
    }
}
