//! Archive extraction.
//!
//! Release archives come as `.zip` or as gzip-compressed tarballs. Both are
//! unpacked into a destination directory; entries that would land outside
//! it are rejected.

use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// Guess the format from a file name or URL path.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else {
            None
        }
    }
}

/// Extract an archive of the given kind into `dest`.
pub fn extract(data: &[u8], kind: ArchiveKind, dest: &Path) -> Result<()> {
    crate::util::fs::ensure_dir(dest)?;

    match kind {
        ArchiveKind::Zip => extract_zip(data, dest),
        ArchiveKind::TarGz => extract_tarball(data, dest),
    }
}

/// Join an archive entry path onto `dest`, refusing absolute paths and `..`.
fn contained_path(dest: &Path, entry: &Path) -> Result<PathBuf> {
    let mut out = dest.to_path_buf();
    for component in entry.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => bail!(
                "archive entry escapes destination directory: {}",
                entry.display()
            ),
        }
    }
    Ok(out)
}

/// Extract a zip archive into `dest`.
pub fn extract_zip(data: &[u8], dest: &Path) -> Result<()> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(data)).context("failed to read zip archive")?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .with_context(|| format!("failed to read zip entry {}", i))?;

        // Zip entries always use forward slashes
        let name = file.name().replace('\\', "/");
        let output_path = contained_path(dest, Path::new(&name))?;

        if file.is_dir() {
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!("failed to create directory: {}", output_path.display())
            })?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let mut out = std::fs::File::create(&output_path)
            .with_context(|| format!("failed to create file: {}", output_path.display()))?;
        std::io::copy(&mut file, &mut out)
            .with_context(|| format!("failed to extract file: {}", output_path.display()))?;
    }

    Ok(())
}

/// Extract a gzip-compressed tarball into `dest`.
pub fn extract_tarball(data: &[u8], dest: &Path) -> Result<()> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let mut archive = Archive::new(GzDecoder::new(Cursor::new(data)));

    for entry in archive
        .entries()
        .context("failed to read tarball entries")?
    {
        let mut entry = entry.context("failed to read tarball entry")?;
        let entry_path = entry.path().context("failed to get entry path")?.into_owned();
        let output_path = contained_path(dest, &entry_path)?;

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let entry_type = entry.header().entry_type();
        match entry_type {
            tar::EntryType::Directory => {
                std::fs::create_dir_all(&output_path).with_context(|| {
                    format!("failed to create directory: {}", output_path.display())
                })?;
            }
            tar::EntryType::Regular | tar::EntryType::Continuous => {
                entry.unpack(&output_path).with_context(|| {
                    format!("failed to extract file: {}", output_path.display())
                })?;
            }
            _ => {
                // Links and special files have no place in a release archive
                tracing::debug!(
                    "Skipping unsupported entry type {:?}: {}",
                    entry_type,
                    entry_path.display()
                );
            }
        }
    }

    Ok(())
}
