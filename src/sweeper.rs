//! Removal of empty subdirectories after an organize pass.

use crate::error::{OrganizeError, OrganizeResult};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Name of the directory holding the organizer's own logs and reports.
pub const LOG_DIR_NAME: &str = "ORGANIZER_LOGS";

/// The default protected set: just the log directory.
pub fn default_protected() -> HashSet<String> {
    HashSet::from([LOG_DIR_NAME.to_string()])
}

/// Removes empty direct subdirectories of `source_dir` not in `protected`.
///
/// Non-empty directories, and any directory that cannot be removed, are left
/// alone without being treated as an error.
///
/// # Errors
///
/// Only if `source_dir` itself cannot be listed.
pub fn sweep(source_dir: &Path, protected: &HashSet<String>) -> OrganizeResult<usize> {
    sweep_with(source_dir, protected, false)
}

/// Like [`sweep`]; with `dry_run` set, counts the directories that are
/// currently empty instead of removing them.
pub fn sweep_with(
    source_dir: &Path,
    protected: &HashSet<String>,
    dry_run: bool,
) -> OrganizeResult<usize> {
    let entries = fs::read_dir(source_dir).map_err(|source| OrganizeError::ReadDir {
        path: source_dir.to_path_buf(),
        source,
    })?;

    let mut dirs: Vec<_> = entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .collect();
    dirs.sort_by_key(|e| e.file_name());

    let mut removed = 0;
    for entry in dirs {
        let name = entry.file_name().to_string_lossy().to_string();
        if protected.contains(&name) {
            debug!(dir = %name, "Protected directory, not sweeping");
            continue;
        }

        let path = entry.path();
        if dry_run {
            if is_empty_dir(&path) {
                info!(dir = %name, "[DRY RUN] Would remove empty folder");
                removed += 1;
            }
            continue;
        }

        match fs::remove_dir(&path) {
            Ok(()) => {
                info!(dir = %name, "Removed empty folder");
                removed += 1;
            }
            Err(e) => debug!(dir = %name, reason = %e, "Left folder in place"),
        }
    }
    Ok(removed)
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
