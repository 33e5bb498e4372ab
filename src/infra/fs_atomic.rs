//! Usage: Replace a file via temp file + rename, keeping a backup until the swap succeeds.

use std::path::{Path, PathBuf};

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|v| v.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// The target path always resolves to either the previous or the new content;
/// concurrent readers never observe it missing.
pub(crate) fn replace_file(path: &Path, content: &[u8]) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
    }

    let tmp_path = sibling_with_suffix(path, ".tmp");
    let backup_path = sibling_with_suffix(path, ".bak");

    std::fs::write(&tmp_path, content).map_err(|e| format!("failed to write temp file: {e}"))?;

    if path.exists() {
        if let Err(e) = std::fs::copy(path, &backup_path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(format!("failed to create backup: {e}"));
        }
    }

    // rename replaces an existing destination in one step.
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(format!("failed to finalize {}: {e}", path.display()));
    }

    if backup_path.exists() {
        let _ = std::fs::remove_file(&backup_path);
    }
    Ok(())
}
