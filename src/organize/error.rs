//! Error types for the organize pipeline.
//!
//! Fatal errors ([`ConfigurationError`], [`PlanError`]) abort a run before anything is written.
//! Per-file problems ([`ScanWarning`], [`UnresolvedError`], [`TransferError`]) are collected
//! and reported without stopping the run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid or unreadable show configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Failed to read show config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse show config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Show name must not be empty")]
    EmptyShowName,

    #[error("Show config must define at least one season")]
    NoSeasons,

    #[error("Season {season}: season number must be positive")]
    InvalidSeasonNumber { season: i64 },

    #[error("Season {season}: season number is defined more than once")]
    DuplicateSeason { season: u32 },

    #[error("Season {season}: folder name must not be empty")]
    EmptyFolder { season: u32 },

    #[error("Season {season}: range start {min} is greater than range end {max}")]
    InvertedRange { season: u32, min: u32, max: u32 },

    #[error("Season {season}: range [{min}, {max}] overlaps season {other} [{other_min}, {other_max}]")]
    OverlappingRange {
        season: u32,
        min: u32,
        max: u32,
        other: u32,
        other_min: u32,
        other_max: u32,
    },

    #[error("Title key '{key}' is not an episode number")]
    InvalidTitleKey { key: String },
}

/// A file that was found but could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {reason}", path.display())]
pub struct ScanWarning {
    pub path: PathBuf,
    pub reason: String,
}

/// Episode number not covered by any configured season range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Episode {episode_number:03} is outside all season ranges: {}", source_path.display())]
pub struct UnresolvedError {
    pub episode_number: u32,
    pub source_path: PathBuf,
}

/// Conflict found while building the plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error(
        "Destination collision: {} and {} both map to {}",
        first.display(),
        second.display(),
        destination.display()
    )]
    Collision {
        destination: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Failure applying a single planned action.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Source file does not exist: {}", path.display())]
    MissingSource { path: PathBuf },

    #[error("Cannot hardlink across volumes: {} -> {}", source_path.display(), destination.display())]
    CrossDevice { source_path: PathBuf, destination: PathBuf },

    #[error("Filesystem does not support reflink for {}: {reason}", destination.display())]
    UnsupportedFilesystem { destination: PathBuf, reason: String },

    #[error("{operation} failed for {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fatal errors that stop a run before any transfer.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl TransferError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
