//! Atomic artifact writes.

use grounded_core::{AppError, AppResult};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Write a file by filling a temporary sibling and renaming it into place.
///
/// Readers of `path` see either the previous content or the complete new
/// content, never a partial write.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> AppResult<()>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> AppResult<()>,
{
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    fs::create_dir_all(parent).map_err(|e| {
        AppError::Knowledge(format!("Failed to create directory {:?}: {}", parent, e))
    })?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(&mut tmp);
        write(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist(path).map_err(|e| {
        AppError::Knowledge(format!("Failed to replace {:?}: {}", path, e.error))
    })?;

    Ok(())
}
