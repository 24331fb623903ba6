//! Atomic file replacement: temp file in the target directory, then rename.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::warn;

/// Replace `path` with `bytes`, creating parent directories as needed.
///
/// Readers see either the old file or the new one, never a partial write.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    let Err(err) = tmp.persist(path) else {
        return Ok(());
    };
    if !path.exists() {
        return Err(err.error);
    }

    // Rename over an existing file fails on Windows: move the old file aside
    // and retry.
    let backup = path.with_extension("bak");
    let _ = std::fs::remove_file(&backup);
    std::fs::rename(path, &backup)?;
    if let Err(retry) = err.file.persist(path) {
        let _ = std::fs::rename(&backup, path);
        return Err(retry.error);
    }
    if let Err(e) = std::fs::remove_file(&backup) {
        warn!(path = %backup.display(), "failed to remove backup after atomic write: {e}");
    }
    Ok(())
}
