//! One organize pass over a source directory.
//!
//! The pass snapshots the direct children of the source directory, then for
//! every regular file: applies the entry filter, classifies it, makes sure the
//! category directory exists, picks a collision-free destination and moves the
//! file (or, in a dry run, records where it would go). Every regular file in
//! the snapshot produces exactly one [`ReportEntry`]; a failure on one file
//! never stops the pass.

use crate::classifier::{Classifier, Decision, FileEntry};
use crate::collision::{move_no_clobber, resolve_avoiding};
use crate::config::EntryFilter;
use crate::error::{OrganizeError, OrganizeResult};
use crate::rules::RuleSet;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options for a single organize pass.
#[derive(Debug, Clone, Default)]
pub struct OrganizeOptions {
    /// If true, compute and report moves without touching the filesystem.
    pub dry_run: bool,
    /// Entries rejected by this filter are skipped.
    pub filters: EntryFilter,
}

/// Why a file was left in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoMatchingRule,
    Excluded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoMatchingRule => f.write_str("no matching rule"),
            SkipReason::Excluded => f.write_str("excluded by filter"),
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveOutcome {
    Moved {
        #[serde(serialize_with = "lossy_path")]
        from: PathBuf,
        #[serde(serialize_with = "lossy_path")]
        to: PathBuf,
    },
    WouldMove {
        #[serde(serialize_with = "lossy_path")]
        from: PathBuf,
        #[serde(serialize_with = "lossy_path")]
        to: PathBuf,
    },
    Skipped { reason: SkipReason },
    Failed { reason: String },
}

impl MoveOutcome {
    /// Destination path for moved or would-move outcomes.
    pub fn destination(&self) -> Option<&Path> {
        match self {
            MoveOutcome::Moved { to, .. } | MoveOutcome::WouldMove { to, .. } => Some(to.as_path()),
            _ => None,
        }
    }
}

// Paths with non-UTF-8 bytes are still written, with U+FFFD in their place.
fn lossy_path<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

/// One line of the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// File name relative to the source directory.
    pub name: String,
    /// Category chosen by the classifier, if any.
    pub category: Option<String>,
    pub outcome: MoveOutcome,
}

/// Count of outcomes per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub moved: usize,
    pub would_move: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Summary {
    fn record(&mut self, outcome: &MoveOutcome) {
        match outcome {
            MoveOutcome::Moved { .. } => self.moved += 1,
            MoveOutcome::WouldMove { .. } => self.would_move += 1,
            MoveOutcome::Skipped { .. } => self.skipped += 1,
            MoveOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.moved + self.would_move + self.skipped + self.failed
    }
}

/// The ordered result of one organize pass.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub source_dir: PathBuf,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub entries: Vec<ReportEntry>,
    pub summary: Summary,
}

impl Report {
    fn new(source_dir: &Path, dry_run: bool) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            dry_run,
            started_at: Utc::now(),
            entries: Vec::new(),
            summary: Summary::default(),
        }
    }

    fn push(&mut self, entry: ReportEntry) {
        self.summary.record(&entry.outcome);
        self.entries.push(entry);
    }

    /// Number of moved (or would-move) files per category, sorted by name.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            if let (Some(category), Some(_)) = (&entry.category, entry.outcome.destination()) {
                *counts.entry(category.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, MoveOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}

/// Organizes the direct children of `source_dir` according to `rules`.
///
/// # Errors
///
/// Fails only if `source_dir` is missing, not a directory, or cannot be
/// listed. Per-file problems are reported as [`MoveOutcome::Failed`].
///
/// # Examples
///
/// ```no_run
/// use downsort::organizer::{organize, OrganizeOptions};
/// use downsort::rules::RuleSet;
/// use std::path::Path;
///
/// let options = OrganizeOptions { dry_run: true, ..Default::default() };
/// let report = organize(Path::new("/home/me/Downloads"), &RuleSet::default(), &options)?;
/// println!("{} files would move", report.summary.would_move);
/// # Ok::<(), downsort::OrganizeError>(())
/// ```
pub fn organize(
    source_dir: &Path,
    rules: &RuleSet,
    options: &OrganizeOptions,
) -> OrganizeResult<Report> {
    organize_with_progress(source_dir, rules, options, |_| {})
}

/// Same as [`organize`], calling `on_entry` after each file is processed.
pub fn organize_with_progress<F>(
    source_dir: &Path,
    rules: &RuleSet,
    options: &OrganizeOptions,
    mut on_entry: F,
) -> OrganizeResult<Report>
where
    F: FnMut(&ReportEntry),
{
    let candidates = scan(source_dir)?;
    info!(
        source = %source_dir.display(),
        files = candidates.len(),
        dry_run = options.dry_run,
        "Starting organizer"
    );

    let classifier = Classifier::new(rules);
    let mut reserved = HashSet::new();
    let mut report = Report::new(source_dir, options.dry_run);

    for entry in &candidates {
        let (category, outcome) =
            process_entry(source_dir, &classifier, options, entry, &mut reserved);
        log_outcome(&entry.name, &outcome);

        let record = ReportEntry {
            name: entry.name.clone(),
            category,
            outcome,
        };
        on_entry(&record);
        report.push(record);
    }

    info!(
        moved = report.summary.moved,
        would_move = report.summary.would_move,
        skipped = report.summary.skipped,
        failed = report.summary.failed,
        "Organizer finished"
    );
    Ok(report)
}

/// Lists the regular files directly inside `source_dir`, sorted by name.
///
/// Directories, symlinks and other special entries are left out.
pub fn scan(source_dir: &Path) -> OrganizeResult<Vec<FileEntry>> {
    let metadata = fs::metadata(source_dir).map_err(|e| OrganizeError::InvalidSourceDir {
        path: source_dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !metadata.is_dir() {
        return Err(OrganizeError::InvalidSourceDir {
            path: source_dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let read_dir = fs::read_dir(source_dir).map_err(|source| OrganizeError::ReadDir {
        path: source_dir.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    for item in read_dir {
        match item {
            Ok(dir_entry) => {
                let entry = FileEntry::from_dir_entry(&dir_entry);
                if entry.is_regular_file {
                    entries.push(entry);
                } else {
                    debug!(entry = %entry.name, "Ignoring non-regular entry");
                }
            }
            Err(e) => warn!(error = %e, "Could not read directory entry"),
        }
    }
    entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(entries)
}

fn process_entry(
    source_dir: &Path,
    classifier: &Classifier<'_>,
    options: &OrganizeOptions,
    entry: &FileEntry,
    reserved: &mut HashSet<PathBuf>,
) -> (Option<String>, MoveOutcome) {
    if !options.filters.should_include(&entry.name) {
        return (
            None,
            MoveOutcome::Skipped {
                reason: SkipReason::Excluded,
            },
        );
    }

    let category = match classifier.classify(entry) {
        Decision::Classified { category } => category,
        Decision::Unclassified => {
            return (
                None,
                MoveOutcome::Skipped {
                    reason: SkipReason::NoMatchingRule,
                },
            );
        }
    };

    let outcome = match relocate(source_dir, &category, entry, options.dry_run, reserved) {
        Ok(outcome) => outcome,
        Err(e) => MoveOutcome::Failed {
            reason: e.to_string(),
        },
    };
    (Some(category), outcome)
}

fn relocate(
    source_dir: &Path,
    category: &str,
    entry: &FileEntry,
    dry_run: bool,
    reserved: &mut HashSet<PathBuf>,
) -> OrganizeResult<MoveOutcome> {
    let category_dir = source_dir.join(category);
    ensure_category_dir(&category_dir, dry_run)?;

    let target = resolve_avoiding(&category_dir.join(&entry.file_name), reserved);

    if dry_run {
        reserved.insert(target.clone());
        return Ok(MoveOutcome::WouldMove {
            from: entry.path.clone(),
            to: target,
        });
    }

    move_no_clobber(&entry.path, &target)?;
    reserved.insert(target.clone());
    Ok(MoveOutcome::Moved {
        from: entry.path.clone(),
        to: target,
    })
}

/// Creates the category directory if absent. In a dry run nothing is created,
/// but a non-directory squatting on the path is still reported.
fn ensure_category_dir(path: &Path, dry_run: bool) -> OrganizeResult<()> {
    let creation_failed = |source| OrganizeError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source,
    };

    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => {
            return Err(creation_failed(std::io::Error::new(
                ErrorKind::AlreadyExists,
                "a non-directory entry already exists at this path",
            )));
        }
        Err(e) if e.kind() != ErrorKind::NotFound => return Err(creation_failed(e)),
        Err(_) => {}
    }

    if dry_run {
        return Ok(());
    }

    match fs::create_dir(path) {
        Ok(()) => {
            debug!(dir = %path.display(), "Created category directory");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(creation_failed(e)),
    }
}

fn log_outcome(name: &str, outcome: &MoveOutcome) {
    match outcome {
        MoveOutcome::Moved { to, .. } => info!(file = %name, to = %to.display(), "Moved"),
        MoveOutcome::WouldMove { to, .. } => {
            info!(file = %name, to = %to.display(), "[DRY RUN] Would move")
        }
        MoveOutcome::Skipped {
            reason: SkipReason::Excluded,
        } => debug!(file = %name, "Excluded by filter"),
        MoveOutcome::Skipped { reason } => info!(file = %name, %reason, "Skipped"),
        MoveOutcome::Failed { reason } => warn!(file = %name, error = %reason, "Failed to move"),
    }
}
