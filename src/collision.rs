//! Collision-free destination paths and no-clobber moves.
//!
//! [`resolve`] picks a free name in the form `stem (N).ext`; [`move_no_clobber`]
//! re-checks that name at move time and fails instead of overwriting. A gap
//! between that check and the rename remains when another process creates the
//! same path concurrently; it is left as a known limitation.

use crate::error::{OrganizeError, OrganizeResult};
use filetime::FileTime;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Returns a path that does not exist at call time.
///
/// If `desired` is free it is returned unchanged; otherwise a counter is
/// inserted before the extension, probing `name (1).ext`, `name (2).ext`, ...
/// until a free slot is found.
pub fn resolve(desired: &Path) -> PathBuf {
    resolve_avoiding(desired, &HashSet::new())
}

/// Like [`resolve`], but also treats every path in `reserved` as taken.
///
/// The organizer reserves each destination it hands out, so a dry run
/// predicts the same names a real run would produce.
pub fn resolve_avoiding(desired: &Path, reserved: &HashSet<PathBuf>) -> PathBuf {
    let taken = |path: &Path| occupied(path) || reserved.contains(path);

    if !taken(desired) {
        return desired.to_path_buf();
    }

    let parent = desired.parent().unwrap_or_else(|| Path::new(""));
    let mut counter: u64 = 1;
    loop {
        let candidate = parent.join(candidate_name(desired, counter));
        if !taken(candidate.as_path()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Builds the `stem (counter).ext` file name for `path`.
///
/// ```
/// use downsort::collision::candidate_name;
/// use std::path::Path;
///
/// assert_eq!(candidate_name(Path::new("report.pdf"), 2), "report (2).pdf");
/// assert_eq!(candidate_name(Path::new("README"), 1), "README (1)");
/// ```
///
/// The name is assembled from the raw OS strings, so non-UTF-8 stems and
/// extensions survive unchanged.
pub fn candidate_name(path: &Path, counter: u64) -> OsString {
    let mut name = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(format!(" ({})", counter));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    name
}

/// True if anything, including a dangling symlink, sits at `path`.
fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Moves `from` to `to`, refusing to replace anything already at `to`.
///
/// A plain rename is attempted first. When source and destination live on
/// different filesystems the file is copied into a freshly created
/// destination (never truncating an existing one), its modification time is
/// carried over, and the source is removed.
///
/// # Errors
///
/// Returns [`OrganizeError::DestinationExists`] if `to` is occupied, or
/// [`OrganizeError::FileMoveFailure`] for any IO failure. In both cases
/// nothing at `to` has been overwritten.
pub fn move_no_clobber(from: &Path, to: &Path) -> OrganizeResult<()> {
    if occupied(to) {
        return Err(OrganizeError::DestinationExists(to.to_path_buf()));
    }

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            copy_then_remove(from, to).map_err(|source| match source.kind() {
                ErrorKind::AlreadyExists => OrganizeError::DestinationExists(to.to_path_buf()),
                _ => OrganizeError::FileMoveFailure {
                    from: from.to_path_buf(),
                    to: to.to_path_buf(),
                    source,
                },
            })
        }
        Err(source) => Err(OrganizeError::FileMoveFailure {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }),
    }
}

/// Cross-device fallback. On failure the partially written destination is
/// removed so only the source remains.
pub(crate) fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    let mut src = File::open(from)?;
    let metadata = src.metadata()?;
    let mut dst = OpenOptions::new().write(true).create_new(true).open(to)?;

    let copied = io::copy(&mut src, &mut dst).and_then(|_| dst.sync_all());
    drop(dst);
    if let Err(e) = copied {
        let _ = fs::remove_file(to);
        return Err(e);
    }

    let _ = fs::set_permissions(to, metadata.permissions());
    let _ = filetime::set_file_mtime(to, FileTime::from_last_modification_time(&metadata));

    if let Err(e) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_free_path_is_unchanged() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let desired = temp_dir.path().join("report.pdf");
        assert_eq!(resolve(&desired), desired);
    }

    #[test]
    fn test_resolve_skips_taken_slots() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("report.pdf"), "v0").unwrap();
        fs::write(dir.join("report (1).pdf"), "v1").unwrap();

        assert_eq!(resolve(&dir.join("report.pdf")), dir.join("report (2).pdf"));
    }

    #[test]
    fn test_resolve_without_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("notes"), "n").unwrap();

        assert_eq!(resolve(&dir.join("notes")), dir.join("notes (1)"));
    }

    #[test]
    fn test_resolve_uses_last_extension_only() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::write(dir.join("backup.tar.gz"), "gz").unwrap();

        assert_eq!(
            resolve(&dir.join("backup.tar.gz")),
            dir.join("backup.tar (1).gz")
        );
    }

    #[test]
    fn test_reserved_paths_count_as_taken() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        let reserved: HashSet<PathBuf> = [dir.join("a.pdf"), dir.join("a (1).pdf")]
            .into_iter()
            .collect();

        assert_eq!(
            resolve_avoiding(&dir.join("a.pdf"), &reserved),
            dir.join("a (2).pdf")
        );
        assert_eq!(
            resolve_avoiding(&dir.join("b.pdf"), &reserved),
            dir.join("b.pdf")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_keep_their_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        let taken = dir.join(std::ffi::OsStr::from_bytes(b"caf\xe9.pdf"));
        fs::write(&taken, "old").unwrap();

        let resolved = resolve(&taken);

        assert_eq!(
            resolved.file_name().unwrap().as_bytes(),
            b"caf\xe9 (1).pdf"
        );
    }

    #[test]
    fn test_directory_counts_as_taken() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        fs::create_dir(dir.join("photo.jpg")).unwrap();

        assert_eq!(resolve(&dir.join("photo.jpg")), dir.join("photo (1).jpg"));
    }

    #[test]
    fn test_move_no_clobber_moves() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        let from = dir.join("a.txt");
        let to = dir.join("b.txt");
        fs::write(&from, "content").unwrap();

        move_no_clobber(&from, &to).expect("move should succeed");

        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "content");
    }

    #[test]
    fn test_move_no_clobber_refuses_existing_target() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        let from = dir.join("a.txt");
        let to = dir.join("b.txt");
        fs::write(&from, "new").unwrap();
        fs::write(&to, "original").unwrap();

        let result = move_no_clobber(&from, &to);

        assert!(matches!(result, Err(OrganizeError::DestinationExists(_))));
        assert_eq!(fs::read_to_string(&to).unwrap(), "original");
        assert_eq!(fs::read_to_string(&from).unwrap(), "new");
    }

    #[test]
    fn test_move_missing_source_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();

        let result = move_no_clobber(&dir.join("gone.txt"), &dir.join("dest.txt"));

        assert!(matches!(result, Err(OrganizeError::FileMoveFailure { .. })));
        assert!(!dir.join("dest.txt").exists());
    }

    #[test]
    fn test_copy_then_remove_preserves_content_and_mtime() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        let from = dir.join("clip.mp4");
        let to = dir.join("moved.mp4");
        fs::write(&from, b"frames").unwrap();
        let mtime = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&from, mtime).unwrap();

        copy_then_remove(&from, &to).expect("copy fallback should succeed");

        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"frames");
        let moved_meta = fs::metadata(&to).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&moved_meta), mtime);
    }

    #[test]
    fn test_copy_then_remove_never_truncates_target() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        let from = dir.join("a.bin");
        let to = dir.join("b.bin");
        fs::write(&from, b"new").unwrap();
        fs::write(&to, b"keep me").unwrap();

        let err = copy_then_remove(&from, &to).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&to).unwrap(), b"keep me");
        assert!(from.exists());
    }
}
