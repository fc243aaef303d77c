//! Error types for tidywatch.
//!
//! Failures are split by how far they are allowed to travel:
//! - [`OrganizeError`] is local to a single file and never stops the watch loop.
//! - [`StartupError`] aborts initialization; nothing is moved when it occurs.
//! - [`ConfigError`] covers loading and compiling the TOML settings.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while organizing a single file.
#[derive(Error, Debug)]
pub enum OrganizeError {
    /// The file could not be inspected (permission denied, vanished mid-operation).
    #[error("failed to inspect {}: {source}", path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path has no file name component.
    #[error("{} has no file name", path.display())]
    NoFileName { path: PathBuf },

    /// A category folder was missing and could not be recreated.
    #[error("failed to create folder {}: {source}", path.display())]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The move itself failed.
    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Structural failures that prevent the organizer or watcher from starting.
#[derive(Error, Debug)]
pub enum StartupError {
    /// No watched root was given and no desktop directory could be found.
    #[error("could not determine a desktop directory; pass a path to watch explicitly")]
    NoDesktop,

    /// The watched root does not exist.
    #[error("watched directory does not exist: {}", .0.display())]
    RootMissing(PathBuf),

    /// The watched root could not be inspected (permission denied, invalid path).
    #[error("failed to inspect watched directory {}: {source}", path.display())]
    InspectRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The watched root exists but is not a directory.
    #[error("watched path is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),

    /// A category folder could not be created under the watched root.
    #[error("failed to create category folder {}: {source}", path.display())]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem notifications could not be set up for the watched root.
    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The dispatcher was started while it was already watching.
    #[error("dispatcher is already watching")]
    AlreadyWatching,
}

/// Errors that can occur during configuration loading and filter compilation.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Invalid TOML syntax or structure.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Invalid glob pattern provided.
    #[error("invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    /// Invalid regex pattern provided with the actual error reason.
    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    /// IO error while reading configuration.
    #[error("I/O error reading configuration: {0}")]
    IoError(String),
}
