//! Error types for downsort.
//!
//! Configuration problems are fatal and surface before any file is touched.
//! Organization errors are either fatal to the whole run (the source directory
//! cannot be read) or scoped to a single file, in which case the organizer
//! records them as a `Failed` outcome and keeps going.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for crate-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading or validating the rule configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid TOML configuration {}: {source}", .path.display())]
    InvalidToml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid JSON configuration {}: {source}", .path.display())]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid category name '{name}': {reason}")]
    InvalidCategory { name: String, reason: &'static str },

    #[error("Invalid extension '{token}' in category '{category}'")]
    InvalidExtension { category: String, token: String },

    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidRegexPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Errors that can occur while organizing or sweeping a directory.
#[derive(Error, Debug)]
pub enum OrganizeError {
    #[error("Invalid source directory {}: {reason}", .path.display())]
    InvalidSourceDir { path: PathBuf, reason: String },

    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Refusing to overwrite existing file {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for organizer operations.
pub type OrganizeResult<T> = std::result::Result<T, OrganizeError>;

/// Top-level error for the command-line front end.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Organize(#[from] OrganizeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
