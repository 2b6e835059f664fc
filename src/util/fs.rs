//! Filesystem utilities.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Move everything in `dir/nested` up into `dir`, then remove `dir/nested`.
///
/// Existing entries in `dir` with the same name are replaced. Does nothing
/// if `dir/nested` does not exist.
pub fn flatten_one_level(dir: &Path, nested: &str) -> Result<()> {
    let inner = dir.join(nested);
    if !inner.is_dir() {
        return Ok(());
    }

    for entry in fs::read_dir(&inner)
        .with_context(|| format!("failed to read directory: {}", inner.display()))?
    {
        let entry = entry?;
        let src = entry.path();
        let dst = dir.join(entry.file_name());

        // A same-named child of the nested directory is about to be moved
        // over its own parent; park it first.
        if dst == inner {
            let parked = dir.join(format!(".{}.flatten", nested));
            fs::rename(&src, &parked).with_context(|| {
                format!("failed to move {} to {}", src.display(), parked.display())
            })?;
            continue;
        }

        if dst.is_dir() {
            fs::remove_dir_all(&dst)
                .with_context(|| format!("failed to replace directory: {}", dst.display()))?;
        } else if dst.exists() {
            fs::remove_file(&dst)
                .with_context(|| format!("failed to replace file: {}", dst.display()))?;
        }

        fs::rename(&src, &dst)
            .with_context(|| format!("failed to move {} to {}", src.display(), dst.display()))?;
    }

    fs::remove_dir(&inner)
        .with_context(|| format!("failed to remove directory: {}", inner.display()))?;

    let parked = dir.join(format!(".{}.flatten", nested));
    if parked.exists() {
        fs::rename(&parked, &inner).with_context(|| {
            format!("failed to move {} to {}", parked.display(), inner.display())
        })?;
    }

    Ok(())
}
