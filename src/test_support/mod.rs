//! Test utilities and mocks for unit tests.
//!
//! This module provides mock implementations of the host capabilities the
//! initializer consumes: fetching, module reading, method patching, the
//! companion runtime and the log sink.
//!
//! # Example
//!
//! ```rust,ignore
//! use abyss::test_support::{MockFetcher, ModuleImage};
//!
//! #[test]
//! fn test_example() {
//!     let mut fetcher = MockFetcher::new();
//!     fetcher.serve_module("Abyss.Core", ModuleImage::plugin("Abyss.Core").build());
//!
//!     // Hand the fetcher to a Resolver...
//! }
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use url::Url;

use crate::companion::{CompanionRuntime, LogBridge};
use crate::core::{
    LateInitializable, ModuleRecord, PluginInstance, ReferenceDescriptor, ReferenceName,
    TypeCandidate, TypeName,
};
use crate::inspect::{InspectError, ModuleReader};
use crate::patch::{Instruction, MethodPatcher, MethodRef, PatchError, Transpiler};
use crate::sources::{FetchError, Fetcher, ReleaseLayout};
use crate::util::logging::{LogLevel, LogSink};

// Re-export fixtures for convenience
pub use fixtures::*;

/// A canned response for [`MockFetcher`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Successful download with this body
    Body(Vec<u8>),
    /// HTTP error status
    Status(u16),
    /// The remote could not be reached
    Transport(String),
}

impl MockResponse {
    pub fn body(body: impl Into<Vec<u8>>) -> Self {
        MockResponse::Body(body.into())
    }
}

/// Mock fetcher serving canned responses by URL.
///
/// Unknown URLs answer with HTTP 404. Every request is recorded.
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: HashMap<String, MockResponse>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    /// Create a fetcher with no responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response for a URL.
    pub fn mock_url(&mut self, url: &str, response: MockResponse) -> &mut Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    /// Serve `bytes` as the module `name` at its release URL.
    pub fn serve_module(&mut self, name: &str, bytes: Vec<u8>) -> &mut Self {
        let url = ReleaseLayout::default()
            .module_url(&ReferenceName::new(name))
            .unwrap();
        self.mock_url(url.as_str(), MockResponse::Body(bytes))
    }

    /// Serve `contents` as the documentation file of module `name`.
    pub fn serve_metadata(&mut self, name: &str, contents: &str) -> &mut Self {
        let url = ReleaseLayout::default()
            .metadata_url(&ReferenceName::new(name))
            .unwrap();
        self.mock_url(url.as_str(), MockResponse::body(contents))
    }

    /// Get all requested URLs, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Count requests for a file name (e.g. `Abyss.Core.dll`).
    pub fn count(&self, file_name: &str) -> usize {
        let suffix = format!("/{}", file_name);
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.ends_with(&suffix))
            .count()
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<(), FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        match self.responses.get(url.as_str()) {
            Some(MockResponse::Body(body)) => {
                let io_err = |source| FetchError::Io {
                    path: dest.display().to_string(),
                    source,
                };
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent).map_err(io_err)?;
                }
                std::fs::write(dest, body).map_err(io_err)
            }
            Some(MockResponse::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            Some(MockResponse::Transport(message)) => Err(FetchError::Transport {
                url: url.to_string(),
                message: message.clone(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Mock module reader returning canned records by short name.
///
/// The file must exist on disk; its contents are ignored. Opens are counted
/// per short name.
#[derive(Debug, Default)]
pub struct MockModuleReader {
    modules: HashMap<String, (Vec<ReferenceDescriptor>, Vec<TypeCandidate>)>,
    opens: Mutex<HashMap<String, usize>>,
}

impl MockModuleReader {
    /// Create a reader that knows no modules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module with the given references and plugin types. Each plugin
    /// type is a concrete subclass of `BepInEx.BaseUnityPlugin` in namespace
    /// `name`.
    pub fn with_module(mut self, name: &str, references: &[&str], plugins: &[&str]) -> Self {
        let references = references
            .iter()
            .map(|r| ReferenceDescriptor::new(*r))
            .collect();
        let types = plugins
            .iter()
            .map(|ty| {
                TypeCandidate::new(TypeName::new(name, *ty))
                    .with_base(TypeName::new("BepInEx", "BaseUnityPlugin"))
            })
            .collect();
        self.modules.insert(name.to_string(), (references, types));
        self
    }

    /// Number of times the module `name` was opened.
    pub fn opens(&self, name: &str) -> usize {
        self.opens.lock().unwrap().get(name).copied().unwrap_or(0)
    }
}

impl ModuleReader for MockModuleReader {
    fn read(&self, path: &Path) -> Result<ModuleRecord, InspectError> {
        let name = crate::core::short_name(path);
        *self.opens.lock().unwrap().entry(name.clone()).or_insert(0) += 1;

        if let Err(source) = std::fs::metadata(path) {
            return Err(InspectError::Io {
                path: path.display().to_string(),
                source,
            });
        }

        match self.modules.get(&name) {
            Some((references, types)) => Ok(ModuleRecord::new(path, references.clone(), types.clone())),
            None => Err(InspectError::Malformed {
                path: path.display().to_string(),
                reason: "no CLI metadata".to_string(),
            }),
        }
    }
}

/// Log sink recording every line.
#[derive(Debug, Default)]
pub struct MockSink {
    lines: Mutex<Vec<(LogLevel, String, String)>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded `(level, source, message)` lines.
    pub fn lines(&self) -> Vec<(LogLevel, String, String)> {
        self.lines.lock().unwrap().clone()
    }

    /// Check whether a line at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .any(|(l, _, message)| *l == level && message.contains(needle))
    }
}

impl LogSink for MockSink {
    fn log(&self, level: LogLevel, source: &str, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((level, source.to_string(), message.to_string()));
    }
}

/// Mock method patcher.
///
/// Records installed hooks. Method bodies registered with
/// [`with_body`](Self::with_body) are rewritten in place when a transpiler
/// is installed on them.
#[derive(Debug, Default)]
pub struct MockPatcher {
    bodies: HashMap<MethodRef, Vec<Instruction>>,
    postfixes: Vec<(MethodRef, MethodRef)>,
    transpiled: Vec<MethodRef>,
    missing: Vec<MethodRef>,
}

impl MockPatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `method` a body.
    pub fn with_body(mut self, method: MethodRef, body: Vec<Instruction>) -> Self {
        self.bodies.insert(method, body);
        self
    }

    /// Make `method` unresolvable.
    pub fn without_method(mut self, method: MethodRef) -> Self {
        self.missing.push(method);
        self
    }

    /// Get the current body of `method`.
    pub fn body(&self, method: &MethodRef) -> Option<&[Instruction]> {
        self.bodies.get(method).map(Vec::as_slice)
    }

    /// Get installed `(target, hook)` postfixes.
    pub fn postfixes(&self) -> &[(MethodRef, MethodRef)] {
        &self.postfixes
    }

    /// Get methods a transpiler was installed on.
    pub fn transpiled(&self) -> &[MethodRef] {
        &self.transpiled
    }

    fn check(&self, target: &MethodRef) -> Result<(), PatchError> {
        if self.missing.contains(target) {
            return Err(PatchError::MethodNotFound {
                method: target.to_string(),
            });
        }
        Ok(())
    }
}

impl MethodPatcher for MockPatcher {
    fn install_postfix(&mut self, target: &MethodRef, hook: &MethodRef) -> Result<(), PatchError> {
        self.check(target)?;
        self.postfixes.push((target.clone(), hook.clone()));
        Ok(())
    }

    fn install_transpiler(&mut self, target: &MethodRef, transpiler: &Transpiler) -> Result<(), PatchError> {
        self.check(target)?;
        if let Some(body) = self.bodies.remove(target) {
            self.bodies
                .insert(target.clone(), transpiler.rewrite(body).instructions);
        }
        self.transpiled.push(target.clone());
        Ok(())
    }
}

/// Mock companion runtime.
#[derive(Debug, Default)]
pub struct MockCompanion {
    loaded: Vec<PathBuf>,
    bridge: Option<LogBridge>,
    failure: Option<String>,
}

impl MockCompanion {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runtime whose `load` always fails with `message`.
    pub fn failing(message: &str) -> Self {
        MockCompanion {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Get every binary loaded so far.
    pub fn loaded(&self) -> Vec<PathBuf> {
        self.loaded.clone()
    }

    /// Emit a companion log event through the installed bridge.
    pub fn emit(&self, level: &str, source: &str, message: &str) {
        if let Some(bridge) = &self.bridge {
            bridge.forward(level, source, message);
        }
    }
}

impl CompanionRuntime for MockCompanion {
    fn load(&mut self, binary: &Path) -> Result<()> {
        if let Some(message) = &self.failure {
            bail!("{}", message);
        }
        self.loaded.push(binary.to_path_buf());
        Ok(())
    }

    fn install_log_listener(&mut self, bridge: LogBridge) {
        self.bridge = Some(bridge);
    }
}

/// Plugin instance stub, optionally counting late-initialization calls.
#[derive(Debug)]
pub struct MockPlugin {
    type_name: String,
    late_init: Option<Arc<AtomicUsize>>,
}

impl MockPlugin {
    /// A plugin without late initialization.
    pub fn plain(type_name: &str) -> Self {
        MockPlugin {
            type_name: type_name.to_string(),
            late_init: None,
        }
    }

    /// A plugin that counts late-initialization calls in `calls`.
    pub fn late(type_name: &str, calls: Arc<AtomicUsize>) -> Self {
        MockPlugin {
            type_name: type_name.to_string(),
            late_init: Some(calls),
        }
    }
}

impl PluginInstance for MockPlugin {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn as_late_initializable(&mut self) -> Option<&mut dyn LateInitializable> {
        if self.late_init.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl LateInitializable for MockPlugin {
    fn init_dredge_mod(&mut self) {
        if let Some(calls) = &self.late_init {
            calls.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mock_fetcher_writes_and_records() {
        let tmp = TempDir::new().unwrap();
        let mut fetcher = MockFetcher::new();
        fetcher.mock_url("https://example.com/a.dll", MockResponse::body("hello"));

        let dest = tmp.path().join("plugins/a.dll");
        fetcher
            .fetch(&Url::parse("https://example.com/a.dll").unwrap(), &dest)
            .unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "hello");

        let err = fetcher
            .fetch(&Url::parse("https://example.com/b.dll").unwrap(), &dest)
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(fetcher.count("a.dll"), 1);
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[test]
    fn test_mock_reader_requires_file() {
        let tmp = TempDir::new().unwrap();
        let reader = MockModuleReader::new().with_module("Mod", &["Abyss.Core"], &["Plugin"]);
        let path = tmp.path().join("Mod.dll");

        assert!(matches!(reader.read(&path), Err(InspectError::Io { .. })));

        std::fs::write(&path, "").unwrap();
        let record = reader.read(&path).unwrap();
        assert_eq!(record.references().len(), 1);
        assert_eq!(record.types().len(), 1);
        assert_eq!(reader.opens("Mod"), 2);
    }
}
