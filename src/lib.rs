//! downsort - rule-driven file sorting for a downloads folder
//!
//! This library classifies the files directly inside a directory by extension,
//! moves them into per-category subdirectories without ever overwriting
//! anything, and reports one outcome per file. Runs can be simulated with a
//! dry run, and empty subdirectories can be swept afterwards.

pub mod classifier;
pub mod cli;
pub mod collision;
pub mod config;
pub mod error;
pub mod organizer;
pub mod output;
pub mod rules;
pub mod sweeper;

pub use classifier::{Classifier, Decision, FileEntry};
pub use config::{EntryFilter, LoadedConfig, OrganizerConfig};
pub use error::{ConfigError, Error, OrganizeError, Result};
pub use organizer::{MoveOutcome, OrganizeOptions, Report, ReportEntry, SkipReason, Summary, organize};
pub use rules::{Rule, RuleSet};
pub use sweeper::sweep;

pub use cli::{Cli, RunOptions, run_cli, run_cli_with_config};
