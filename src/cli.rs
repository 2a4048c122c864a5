//! Command-line interface module for downsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Locating the default source directory
//! - Loading configuration before any file or log is written
//! - Running the organize pass and the optional empty-folder sweep
//! - Printing and saving the run report

use crate::config::{LoadedConfig, OrganizerConfig};
use crate::error::{OrganizeError, Result};
use crate::organizer::{self, OrganizeOptions, Report};
use crate::output::OutputFormatter;
use crate::sweeper::{self, LOG_DIR_NAME};
use chrono::Local;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// downsort - sort a downloads folder into category subdirectories
///
/// Files directly inside SOURCE are moved into subfolders named after the
/// category their extension belongs to. Existing files are never overwritten;
/// name clashes get a " (N)" suffix instead.
#[derive(Parser, Debug, Clone)]
#[command(name = "downsort")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to organize (defaults to your Downloads folder)
    pub source: Option<PathBuf>,

    /// Path to a rules file (JSON or TOML)
    ///
    /// Without this, organizer_config.json or organizer_config.toml inside
    /// SOURCE is used if present, otherwise the built-in rules.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Preview actions without moving files
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Remove empty folders in SOURCE after organizing
    #[arg(long)]
    pub clean_empty: bool,

    /// More detailed logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Write the log file as JSON
    #[arg(long)]
    pub json_log: bool,

    /// Do not show a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Save the run report as JSON in the log directory
    #[arg(long)]
    pub save_report: bool,
}

impl Cli {
    /// The directory to organize, falling back to the platform default.
    pub fn source_dir(&self) -> PathBuf {
        self.source.clone().unwrap_or_else(default_source_dir)
    }

    /// Directory for logs and saved reports.
    pub fn log_dir(&self) -> PathBuf {
        self.source_dir().join(LOG_DIR_NAME)
    }

    /// Checks the source directory and loads its configuration.
    ///
    /// Nothing is written, so the binary calls this before it opens the log
    /// file under the source directory.
    pub fn load_config(&self) -> Result<LoadedConfig> {
        let source_dir = self.source_dir();
        if !source_dir.is_dir() {
            return Err(OrganizeError::InvalidSourceDir {
                path: source_dir,
                reason: "not an existing directory".to_string(),
            }
            .into());
        }
        Ok(OrganizerConfig::load_for(&source_dir, self.config.as_deref())?)
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            clean_empty: self.clean_empty,
            show_progress: !self.no_progress,
            save_report: self.save_report,
        }
    }
}

/// Returns the platform download folder if it exists, otherwise the home
/// directory, otherwise the current directory.
pub fn default_source_dir() -> PathBuf {
    dirs::download_dir()
        .filter(|dir| dir.is_dir())
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Behaviour switches for one CLI invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// If true, simulate the operation without making changes.
    pub dry_run: bool,
    /// Sweep empty subdirectories after organizing.
    pub clean_empty: bool,
    /// Show a progress bar during real runs.
    pub show_progress: bool,
    /// Write the report as JSON into the log directory.
    pub save_report: bool,
}

/// What a CLI invocation did.
#[derive(Debug)]
pub struct RunSummary {
    pub report: Report,
    /// Directories removed (or that would be removed) by the sweep, if it ran.
    pub swept: Option<usize>,
    /// Where the JSON report was written, if requested.
    pub report_file: Option<PathBuf>,
}

/// Runs the CLI application against `source_dir`.
///
/// Configuration is loaded and validated first; a configuration error aborts
/// before any file is touched.
///
/// # Examples
///
/// ```no_run
/// use downsort::cli::{run_cli, RunOptions};
/// use std::path::Path;
///
/// let options = RunOptions { dry_run: true, ..Default::default() };
/// match run_cli(Path::new("/path/to/Downloads"), None, &options) {
///     Ok(summary) => println!("{} files would move", summary.report.summary.would_move),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(
    source_dir: &Path,
    config_path: Option<&Path>,
    options: &RunOptions,
) -> Result<RunSummary> {
    let loaded = OrganizerConfig::load_for(source_dir, config_path)?;
    run_cli_with_config(source_dir, loaded, options)
}

/// Runs against `source_dir` with a configuration that is already loaded.
pub fn run_cli_with_config(
    source_dir: &Path,
    loaded: LoadedConfig,
    options: &RunOptions,
) -> Result<RunSummary> {
    match &loaded.config_file {
        Some(path) => info!(config_file = %path.display(), "Loaded rules from configuration"),
        None => info!("Using built-in rules"),
    }

    let organize_options = OrganizeOptions {
        dry_run: options.dry_run,
        filters: loaded.filter,
    };

    if options.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing contents of: {}",
            source_dir.display()
        ));
    } else {
        OutputFormatter::info(&format!("Organizing contents of: {}", source_dir.display()));
    }

    let report = if options.show_progress && !options.dry_run {
        let total = organizer::scan(source_dir)?.len() as u64;
        let pb = OutputFormatter::create_progress_bar(total);
        let report =
            organizer::organize_with_progress(source_dir, &loaded.rules, &organize_options, |entry| {
                pb.set_message(entry.name.clone());
                pb.inc(1);
            })?;
        pb.finish_and_clear();
        report
    } else {
        organizer::organize(source_dir, &loaded.rules, &organize_options)?
    };

    OutputFormatter::report(&report);

    let swept = if options.clean_empty {
        let count = sweeper::sweep_with(source_dir, &sweeper::default_protected(), options.dry_run)?;
        if options.dry_run {
            OutputFormatter::dry_run_notice(&format!("Would remove {} empty folder(s)", count));
        } else {
            OutputFormatter::success(&format!("Removed {} empty folder(s)", count));
        }
        info!(removed = count, "Cleanup finished");
        Some(count)
    } else {
        None
    };

    let report_file = if options.save_report {
        let path = save_report(&report, &source_dir.join(LOG_DIR_NAME))?;
        OutputFormatter::info(&format!("Report saved to {}", path.display()));
        Some(path)
    } else {
        None
    };

    if options.dry_run {
        OutputFormatter::success("Dry run complete. No files were modified.");
    } else if report.has_failures() {
        OutputFormatter::warning("Some files could not be organized. Please review errors above.");
    } else {
        OutputFormatter::success("Organization complete!");
    }

    Ok(RunSummary {
        report,
        swept,
        report_file,
    })
}

/// Writes `report` as pretty JSON to `report-<timestamp>.json` in `log_dir`.
pub fn save_report(report: &Report, log_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let path = crate::collision::resolve(&log_dir.join(format!("report-{}.json", stamp)));
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json)?;
    Ok(path)
}
