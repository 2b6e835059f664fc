//! CLI metadata reader.
//!
//! Loads an ECMA-335 image with `dotscope` and keeps what resolution needs:
//! the assembly references, in table order, and every type the module
//! defines together with its direct base type.

use std::path::Path;

use dotscope::CilObject;

use crate::core::{ModuleRecord, ModuleVersion, ReferenceDescriptor, TypeCandidate, TypeName};
use crate::inspect::{InspectError, ModuleReader};

/// Metadata table id of TypeDef rows (high byte of their tokens).
const TYPE_DEF_TABLE: u8 = 0x02;

/// Name of the pseudo type holding module-level members.
const MODULE_TYPE: &str = "<Module>";

/// Reads modules from disk as CLI (ECMA-335) images.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliModuleReader;

impl CliModuleReader {
    pub fn new() -> Self {
        CliModuleReader
    }
}

impl ModuleReader for CliModuleReader {
    fn read(&self, path: &Path) -> Result<ModuleRecord, InspectError> {
        let data = std::fs::read(path).map_err(|source| InspectError::Io {
            path: path.display().to_string(),
            source,
        })?;
        parse_module(path, data)
    }
}

/// Parse an in-memory image into a record for `path`.
pub fn parse_module(path: &Path, data: Vec<u8>) -> Result<ModuleRecord, InspectError> {
    if !data.starts_with(b"MZ") {
        return Err(InspectError::NotPe {
            path: path.display().to_string(),
            reason: "missing MZ signature".to_string(),
        });
    }

    let assembly = CilObject::from_mem(data).map_err(|err| InspectError::Malformed {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;

    let references: Vec<ReferenceDescriptor> = assembly
        .refs_assembly()
        .iter()
        .map(|entry| {
            let reference = entry.value();
            ReferenceDescriptor::new(reference.name.as_str()).with_version(ModuleVersion {
                major: reference.major_version as u16,
                minor: reference.minor_version as u16,
                build: reference.build_number as u16,
                revision: reference.revision_number as u16,
            })
        })
        .collect();

    let types: Vec<TypeCandidate> = assembly
        .types()
        .iter()
        .filter(|entry| entry.key().table() == TYPE_DEF_TABLE)
        .map(|entry| entry.value().clone())
        .filter(|ty| ty.name != MODULE_TYPE)
        .map(|ty| TypeCandidate {
            name: TypeName::new(ty.namespace.as_str(), ty.name.as_str()),
            base: ty
                .base()
                .map(|base| TypeName::new(base.namespace.as_str(), base.name.as_str())),
            flags: ty.flags,
        })
        .collect();

    tracing::trace!(
        "Read {}: {} references, {} types",
        path.display(),
        references.len(),
        types.len()
    );

    Ok(ModuleRecord::new(path, references, types))
}
