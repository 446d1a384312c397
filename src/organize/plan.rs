//! Build the complete list of file transfers for one run.
//!
//! The plan is computed and checked for conflicts before anything touches the filesystem.
//! Dry-run and real runs execute the same plan.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;

use crate::organize::{
    EpisodeFile, FileKind, PlanError, ScanWarning, ShowConfig, UnresolvedError, name, season,
};

/// How files are transferred to their destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Rename, or copy and delete across volumes
    #[default]
    Move,
    /// Copy file contents
    Copy,
    /// Create a hard link
    Link,
    /// Create a copy-on-write clone
    Reflink,
}

/// Why an action was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another file already exists at the destination.
    DestinationExists,
    /// The source already has its canonical name and location.
    AlreadyInPlace,
}

/// What was at the destination path when the plan was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationState {
    Free,
    Exists,
    IsSource,
}

/// Status of a planned action.
///
/// Every action starts as `Pending` and moves to exactly one terminal status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    Pending,
    WouldApply,
    Applied,
    Skipped(SkipReason),
    Failed(String),
}

/// A single source to destination transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub mode: TransferMode,
    pub kind: FileKind,
    pub episode_number: u32,
    pub season_number: u32,
    pub destination_state: DestinationState,
    status: ActionStatus,
}

/// Options for building a plan.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Root directory containing the season folders.
    pub show_root: PathBuf,
    pub mode: TransferMode,
    /// Replace files that already exist at the destination.
    pub overwrite: bool,
    /// Overrides the technical tag from the show config.
    pub technical_tag: Option<String>,
}

/// Validated list of planned actions with everything that was left out.
#[derive(Debug, Default)]
pub struct Plan {
    pub actions: Vec<PlannedAction>,
    pub unresolved: Vec<UnresolvedError>,
    pub warnings: Vec<ScanWarning>,
    pub overwrite: bool,
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Move => "move",
            Self::Copy => "copy",
            Self::Link => "link",
            Self::Reflink => "reflink",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DestinationExists => write!(f, "destination exists"),
            Self::AlreadyInPlace => write!(f, "already in place"),
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::WouldApply => write!(f, "would apply"),
            Self::Applied => write!(f, "applied"),
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

impl ActionStatus {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl PlannedAction {
    #[must_use]
    pub const fn status(&self) -> &ActionStatus {
        &self.status
    }

    /// Set the terminal status. Terminal statuses are never changed afterwards.
    pub(crate) fn complete(&mut self, status: ActionStatus) {
        debug_assert!(!self.status.is_terminal(), "action already completed: {self:?}");
        if !self.status.is_terminal() {
            self.status = status;
        }
    }
}

impl Plan {
    /// Attach the scan warnings so they end up in the final report.
    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<ScanWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// All destination paths in plan order.
    pub fn destinations(&self) -> impl Iterator<Item = &Path> {
        self.actions.iter().map(|action| action.destination_path.as_path())
    }

    /// Actions whose destination was already taken when the plan was built.
    pub fn existing_destinations(&self) -> impl Iterator<Item = &PlannedAction> {
        self.actions
            .iter()
            .filter(|action| action.destination_state == DestinationState::Exists)
    }
}

/// Compute the destination for every file and check for conflicts.
///
/// Files outside all season ranges are left out and listed in [`Plan::unresolved`].
///
/// # Errors
/// Returns a [`PlanError`] if two different source files map to the same destination.
pub fn build_plan(files: &[EpisodeFile], config: &ShowConfig, options: &PlanOptions) -> Result<Plan, PlanError> {
    let configured_tag = options.technical_tag.as_deref().or_else(|| config.technical_tag());

    let mut plan = Plan {
        overwrite: options.overwrite,
        ..Plan::default()
    };
    // Keys are lowercase to catch collisions on case-insensitive file systems.
    let mut destinations: HashMap<String, PathBuf> = HashMap::with_capacity(files.len());

    for file in files {
        let season = match season::resolve(file.episode_number, &file.source_path, config) {
            Ok(season) => season,
            Err(error) => {
                plan.unresolved.push(error);
                continue;
            }
        };

        // A configured tag wins over the block read from the source name.
        let technical_tag = configured_tag
            .or(file.technical_tag.as_deref())
            .unwrap_or_default();
        let file_name = name::synthesize(file, season, config.show_name(), Some(config.titles()), technical_tag);
        let destination_path = options.show_root.join(season.folder_name()).join(file_name);

        let key = crate::path_to_string(&destination_path).to_lowercase();
        if let Some(first) = destinations.get(&key) {
            return Err(PlanError::Collision {
                destination: destination_path,
                first: first.clone(),
                second: file.source_path.clone(),
            });
        }
        destinations.insert(key, file.source_path.clone());

        let destination_state = destination_state(&file.source_path, &destination_path);
        plan.actions.push(PlannedAction {
            source_path: file.source_path.clone(),
            destination_path,
            mode: options.mode,
            kind: file.kind,
            episode_number: file.episode_number,
            season_number: season.season_number(),
            destination_state,
            status: ActionStatus::Pending,
        });
    }

    Ok(plan)
}

fn destination_state(source: &Path, destination: &Path) -> DestinationState {
    if source == destination {
        return DestinationState::IsSource;
    }
    if !destination.exists() {
        return DestinationState::Free;
    }
    match (dunce::canonicalize(source), dunce::canonicalize(destination)) {
        (Ok(source), Ok(destination)) if source == destination => DestinationState::IsSource,
        _ => DestinationState::Exists,
    }
}
