//! Module identity - WHAT a module declares (references and types).
//!
//! A ModuleRecord is produced by opening a module file at resolution time.
//! It is read-only and is dropped as soon as its references and type
//! candidates have been extracted.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Namespace prefix that marks a reference as resolvable by the initializer.
pub const REFERENCE_PREFIX: &str = "Abyss";

/// The name of a module as another module refers to it.
///
/// Uniqueness is by name only. Two references to `Abyss.Core` with
/// different versions are the same ReferenceName.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceName(String);

impl ReferenceName {
    /// Create a reference name from the referenced module's name.
    pub fn new(name: impl Into<String>) -> Self {
        ReferenceName(name.into())
    }

    /// Get the full module name (e.g. `Abyss.Foo`).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this name falls under `prefix` (case-sensitive).
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Check whether the name can stand in a release URL and a file name.
    ///
    /// Names come from downloaded metadata, so anything other than a single
    /// path component of ASCII letters, digits, `.`, `_` and `-` (and no
    /// `..`) is refused.
    pub fn is_file_safe(&self) -> bool {
        let name = self.0.as_str();
        !name.is_empty()
            && !name.contains("..")
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            && matches!(
                Path::new(name).components().collect::<Vec<_>>().as_slice(),
                [Component::Normal(_)]
            )
    }

    /// Get the name relative to the reference namespace.
    ///
    /// `Abyss.Foo` yields `Foo`. Names outside the namespace are returned
    /// unchanged.
    pub fn local_name(&self) -> &str {
        match self.0.strip_prefix(REFERENCE_PREFIX) {
            Some(rest) if !rest.is_empty() => rest.trim_start_matches('.'),
            _ => &self.0,
        }
    }
}

impl fmt::Display for ReferenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReferenceName {
    fn from(s: &str) -> Self {
        ReferenceName::new(s)
    }
}

impl AsRef<str> for ReferenceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Four-part module version as declared in a reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleVersion {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// A declared reference from one module to another.
///
/// The version is carried for logging only; resolution always fetches the
/// latest published module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDescriptor {
    pub name: ReferenceName,
    pub version: ModuleVersion,
}

impl ReferenceDescriptor {
    /// Create a descriptor with an unknown (zero) version.
    pub fn new(name: impl Into<String>) -> Self {
        ReferenceDescriptor {
            name: ReferenceName::new(name),
            version: ModuleVersion::default(),
        }
    }

    /// Set the declared version.
    pub fn with_version(mut self, version: ModuleVersion) -> Self {
        self.version = version;
        self
    }
}

/// A namespace-qualified type name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TypeName {
    pub namespace: String,
    pub name: String,
}

impl TypeName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeName {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Get the full name (`Namespace.Name`, or just `Name` at global scope).
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.namespace, self.name)
        }
    }
}

/// A type defined in a module, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCandidate {
    /// The type's own name
    pub name: TypeName,

    /// Direct base type, if the type extends anything
    pub base: Option<TypeName>,

    /// Raw type attribute flags
    pub flags: u32,
}

impl TypeCandidate {
    /// Type attribute flag: the type is abstract.
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Type attribute flag: the type is an interface.
    pub const INTERFACE: u32 = 0x0000_0020;

    pub fn new(name: TypeName) -> Self {
        TypeCandidate {
            name,
            base: None,
            flags: 0,
        }
    }

    pub fn with_base(mut self, base: TypeName) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Check whether the type can be instantiated.
    pub fn is_concrete(&self) -> bool {
        self.flags & (Self::ABSTRACT | Self::INTERFACE) == 0
    }
}

/// An opened module: its identity plus everything extracted from it.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    /// File the module was read from
    path: PathBuf,

    /// Declared references to other modules, in declaration order
    references: Vec<ReferenceDescriptor>,

    /// Types defined by the module, in definition order
    types: Vec<TypeCandidate>,
}

impl ModuleRecord {
    /// Create a record for the module at `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        references: Vec<ReferenceDescriptor>,
        types: Vec<TypeCandidate>,
    ) -> Self {
        ModuleRecord {
            path: path.into(),
            references,
            types,
        }
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the short name (file name without extension).
    pub fn short_name(&self) -> String {
        short_name(&self.path)
    }

    /// Get all declared references, unfiltered.
    pub fn references(&self) -> &[ReferenceDescriptor] {
        &self.references
    }

    /// Get the defined types.
    pub fn types(&self) -> &[TypeCandidate] {
        &self.types
    }
}

/// Derive a module's short name from its file path.
pub fn short_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
