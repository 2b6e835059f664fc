//! Module inspection.
//!
//! Opening a module yields a [`ModuleRecord`]: the references it declares
//! and the types it defines. Whether a type is a loadable plugin is decided
//! by the host through a [`PluginClassifier`]; the inspector only applies it.

pub mod metadata;

use std::path::Path;

use thiserror::Error;

use crate::core::{ModuleRecord, PluginEntry, ReferenceName, TypeCandidate};

pub use metadata::CliModuleReader;

/// Error opening a module file.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("failed to read module {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a PE image: {reason}")]
    NotPe { path: String, reason: String },

    #[error("malformed metadata in {path}: {reason}")]
    Malformed { path: String, reason: String },
}

/// Error raised by the host while classifying a type.
#[derive(Debug, Error)]
#[error("cannot classify `{type_name}`: {message}")]
pub struct ClassifyError {
    pub type_name: String,
    pub message: String,
}

impl ClassifyError {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        ClassifyError {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

/// Reads module files into records.
pub trait ModuleReader {
    /// Open the module at `path`.
    fn read(&self, path: &Path) -> Result<ModuleRecord, InspectError>;
}

/// Host-supplied test for "is this type a loadable plugin".
pub trait PluginClassifier {
    /// Classify a single type. Errors mean the host could not answer at all.
    fn is_plugin(&self, ty: &TypeCandidate) -> Result<bool, ClassifyError>;
}

impl<F> PluginClassifier for F
where
    F: Fn(&TypeCandidate) -> Result<bool, ClassifyError>,
{
    fn is_plugin(&self, ty: &TypeCandidate) -> Result<bool, ClassifyError> {
        self(ty)
    }
}

/// Applies a [`ModuleReader`] and a [`PluginClassifier`] to module files.
pub struct Inspector<'a> {
    reader: &'a dyn ModuleReader,
    classifier: &'a dyn PluginClassifier,
}

impl<'a> Inspector<'a> {
    pub fn new(reader: &'a dyn ModuleReader, classifier: &'a dyn PluginClassifier) -> Self {
        Inspector { reader, classifier }
    }

    /// Open a module file.
    pub fn inspect(&self, path: &Path) -> Result<ModuleRecord, InspectError> {
        self.reader.read(path)
    }

    /// List the record's references that fall under `prefix`, in declaration
    /// order.
    pub fn list_declared_references(&self, record: &ModuleRecord, prefix: &str) -> Vec<ReferenceName> {
        declared_references(record, prefix)
    }

    /// List the plugin entries of a module. Types the classifier rejects are
    /// skipped.
    pub fn list_plugin_entries(&self, record: &ModuleRecord) -> Result<Vec<PluginEntry>, ClassifyError> {
        let mut entries = Vec::new();
        for ty in record.types() {
            if self.classifier.is_plugin(ty)? {
                entries.push(PluginEntry::new(ty.name.clone(), record.path()));
            } else {
                tracing::trace!("{} is not a plugin type", ty.name);
            }
        }
        Ok(entries)
    }

    /// Check whether a module contains at least one plugin entry.
    pub fn has_any_plugin_entries(&self, record: &ModuleRecord) -> Result<bool, ClassifyError> {
        for ty in record.types() {
            if self.classifier.is_plugin(ty)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Filter a record's references by case-sensitive name prefix.
pub fn declared_references(record: &ModuleRecord, prefix: &str) -> Vec<ReferenceName> {
    record
        .references()
        .iter()
        .filter(|r| r.name.has_prefix(prefix))
        .map(|r| r.name.clone())
        .collect()
}

/// Classifier that accepts concrete types deriving directly from `base`.
///
/// This mirrors how the host recognises plugins (a concrete subclass of its
/// plugin base type) and is what the initializer uses when the host does not
/// supply its own test.
#[derive(Debug, Clone)]
pub struct BaseTypeClassifier {
    base: crate::core::TypeName,
}

impl BaseTypeClassifier {
    pub fn new(base: crate::core::TypeName) -> Self {
        BaseTypeClassifier { base }
    }
}

impl PluginClassifier for BaseTypeClassifier {
    fn is_plugin(&self, ty: &TypeCandidate) -> Result<bool, ClassifyError> {
        Ok(ty.is_concrete() && ty.base.as_ref() == Some(&self.base))
    }
}
