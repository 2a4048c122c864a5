//! Per-file classification.
//!
//! Classification is purely extension-based: a file renamed from `.pdf` to
//! `.jpg` is filed under the image category. No file content is read.

use crate::rules::RuleSet;
use std::ffi::OsString;
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};

/// A filesystem object discovered in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// The file name for display, logs and the report. Lossy for non-UTF-8 names.
    pub name: String,
    /// The file name exactly as it appears on disk.
    pub file_name: OsString,
    /// The full path to the entry.
    pub path: PathBuf,
    /// Lower-cased extension including the leading dot, or empty if none.
    pub extension: String,
    /// Whether the entry is a regular file. Symlinks are never regular files.
    pub is_regular_file: bool,
}

impl FileEntry {
    /// Builds an entry from a directory listing item without following symlinks.
    pub fn from_dir_entry(entry: &DirEntry) -> Self {
        let is_regular_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        Self::with_kind(entry.path(), is_regular_file)
    }

    /// Builds an entry for an arbitrary path without following symlinks.
    pub fn from_path(path: &Path) -> Self {
        let is_regular_file = fs::symlink_metadata(path)
            .map(|m| m.file_type().is_file())
            .unwrap_or(false);
        Self::with_kind(path.to_path_buf(), is_regular_file)
    }

    fn with_kind(path: PathBuf, is_regular_file: bool) -> Self {
        let file_name = path.file_name().map(OsString::from).unwrap_or_default();
        let name = file_name.to_string_lossy().to_string();
        let extension = extension_token(&path);
        Self {
            name,
            file_name,
            path,
            extension,
            is_regular_file,
        }
    }
}

/// Returns the lower-cased `.ext` token for a path, or an empty string.
///
/// ```
/// use downsort::classifier::extension_token;
/// use std::path::Path;
///
/// assert_eq!(extension_token(Path::new("Report.PDF")), ".pdf");
/// assert_eq!(extension_token(Path::new("archive.tar.gz")), ".gz");
/// assert_eq!(extension_token(Path::new(".bashrc")), "");
/// assert_eq!(extension_token(Path::new("README")), "");
/// ```
pub fn extension_token(path: &Path) -> String {
    match path.extension() {
        Some(ext) if !ext.is_empty() => format!(".{}", ext.to_string_lossy().to_lowercase()),
        _ => String::new(),
    }
}

/// The classification result for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The file belongs in the named category.
    Classified { category: String },
    /// No rule matched, or the entry is not a regular file.
    Unclassified,
}

impl Decision {
    pub fn category(&self) -> Option<&str> {
        match self {
            Decision::Classified { category } => Some(category),
            Decision::Unclassified => None,
        }
    }
}

/// Applies a [`RuleSet`] to discovered entries.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    rules: &'a RuleSet,
}

impl<'a> Classifier<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    /// Classifies a single entry.
    ///
    /// Only regular files are eligible; anything else is `Unclassified`.
    pub fn classify(&self, entry: &FileEntry) -> Decision {
        if !entry.is_regular_file {
            return Decision::Unclassified;
        }
        match self.rules.classify(&entry.extension) {
            Some(category) => Decision::Classified {
                category: category.to_string(),
            },
            None => Decision::Unclassified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use tempfile::TempDir;

    fn regular(name: &str) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            file_name: OsString::from(name),
            path: PathBuf::from(name),
            extension: extension_token(Path::new(name)),
            is_regular_file: true,
        }
    }

    #[test]
    fn test_classifies_by_extension() {
        let rules = RuleSet::default();
        let classifier = Classifier::new(&rules);

        assert_eq!(
            classifier.classify(&regular("a.pdf")),
            Decision::Classified {
                category: "Documents".to_string()
            }
        );
        assert_eq!(
            classifier.classify(&regular("b.jpg")).category(),
            Some("Images")
        );
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let rules = RuleSet::default();
        let classifier = Classifier::new(&rules);
        assert_eq!(
            classifier.classify(&regular("SETUP.EXE")).category(),
            Some("Installers")
        );
    }

    #[test]
    fn test_unknown_extension_is_unclassified() {
        let rules = RuleSet::default();
        let classifier = Classifier::new(&rules);
        assert_eq!(classifier.classify(&regular("c.xyz")), Decision::Unclassified);
        assert_eq!(classifier.classify(&regular("Makefile")), Decision::Unclassified);
    }

    #[test]
    fn test_non_regular_file_is_unclassified() {
        let rules = RuleSet::default();
        let classifier = Classifier::new(&rules);
        let mut entry = regular("folder.zip");
        entry.is_regular_file = false;
        assert_eq!(classifier.classify(&entry), Decision::Unclassified);
    }

    #[test]
    fn test_uses_custom_rules() {
        let rules = RuleSet::from_rules(vec![Rule::new("Ebooks", &[".epub", ".pdf"])]).unwrap();
        let classifier = Classifier::new(&rules);
        assert_eq!(
            classifier.classify(&regular("book.pdf")).category(),
            Some("Ebooks")
        );
        assert_eq!(classifier.classify(&regular("photo.jpg")), Decision::Unclassified);
    }

    #[test]
    fn test_entry_from_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("Photo.JPG");
        fs::write(&file, b"jpg").expect("Failed to write test file");
        fs::create_dir(temp_dir.path().join("Images.d")).expect("Failed to create dir");

        let entry = FileEntry::from_path(&file);
        assert_eq!(entry.name, "Photo.JPG");
        assert_eq!(entry.extension, ".jpg");
        assert!(entry.is_regular_file);

        let dir_entry = FileEntry::from_path(&temp_dir.path().join("Images.d"));
        assert!(!dir_entry.is_regular_file);
        assert_eq!(dir_entry.extension, ".d");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_is_kept_verbatim() {
        use std::os::unix::ffi::OsStrExt;

        let raw = std::ffi::OsStr::from_bytes(b"caf\xe9.PDF");
        let entry = FileEntry::from_path(&Path::new("/downloads").join(raw));

        assert_eq!(entry.file_name.as_os_str(), raw);
        assert_eq!(entry.name, "caf\u{FFFD}.PDF");
        assert_eq!(entry.extension, ".pdf");
    }

    #[test]
    fn test_trailing_dot_has_no_extension() {
        assert_eq!(extension_token(Path::new("weird.")), "");
    }
}
