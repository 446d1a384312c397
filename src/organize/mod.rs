//! Organize episode files into season folders.
//!
//! The pipeline runs in one direction:
//! load the [`ShowConfig`], [`scan`] the source directories, resolve each episode to its season,
//! synthesize the canonical name, [`build_plan`] and check it for conflicts,
//! then run the plan with a [`PlanExecutor`].
//! Nothing is written before the whole plan has been validated.

mod error;
mod name;
mod plan;
mod scan;
mod season;
mod show;
mod transfer;

pub use error::{ConfigurationError, Error, PlanError, ScanWarning, TransferError, UnresolvedError};
pub use name::{canonical_stem, synthesize};
pub use plan::{
    ActionStatus, DestinationState, Plan, PlanOptions, PlannedAction, SkipReason, TransferMode, build_plan,
};
pub use scan::{
    DEFAULT_VIDEO_EXTENSIONS, EpisodeFile, EpisodeRule, FileKind, SIDECAR_EXTENSIONS, ScanResult,
    parse_episode_number, parse_extension_list, parse_technical_tag, scan,
};
pub use season::{find_season, resolve};
pub use show::{SeasonSpec, ShowConfig};
pub use transfer::{
    CopyStrategy, DryRunExecutor, ExecutionReport, FailedAction, FsExecutor, LinkStrategy, MoveStrategy,
    PlanExecutor, ReflinkStrategy, TransferStrategy, strategy_for,
};

use std::path::{Path, PathBuf};

/// Everything needed for one organize run apart from the show config.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub roots: Vec<PathBuf>,
    pub video_extensions: Vec<String>,
    pub plan: PlanOptions,
    pub dryrun: bool,
}

/// Scan, plan and execute in one go.
///
/// # Errors
/// Returns a fatal [`Error`] if the plan has conflicts. No files are touched in that case.
pub fn run(config: &ShowConfig, options: &RunOptions) -> Result<ExecutionReport, Error> {
    run_with(config, options, &mut |_, _| {})
}

/// Same as [`run`] but calls `observer` after each action completes.
///
/// # Errors
/// Returns a fatal [`Error`] if the plan has conflicts. No files are touched in that case.
pub fn run_with(
    config: &ShowConfig,
    options: &RunOptions,
    observer: &mut dyn FnMut(usize, &PlannedAction),
) -> Result<ExecutionReport, Error> {
    let plan = prepare(config, &options.roots, &options.video_extensions, &options.plan)?;
    let report = if options.dryrun {
        DryRunExecutor.execute_with(plan, observer)
    } else {
        FsExecutor::new(options.plan.mode).execute_with(plan, observer)
    };
    Ok(report)
}

/// Scan the roots and build a validated plan.
///
/// # Errors
/// Returns a [`PlanError`] if two source files map to the same destination.
pub fn prepare<P: AsRef<Path>, S: AsRef<str>>(
    config: &ShowConfig,
    roots: &[P],
    video_extensions: &[S],
    options: &PlanOptions,
) -> Result<Plan, PlanError> {
    let scanned = scan(roots, video_extensions);
    Ok(build_plan(&scanned.files, config, options)?.with_warnings(scanned.warnings))
}
