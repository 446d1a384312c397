//! Apply a plan to the filesystem.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use filetime::FileTime;

use crate::organize::{
    ActionStatus, DestinationState, Plan, PlannedAction, ScanWarning, SkipReason, TransferError, TransferMode,
    UnresolvedError,
};

const STAGING_SUFFIX: &str = ".season-sort.tmp";

/// One way of putting a source file at its destination.
pub trait TransferStrategy {
    fn mode(&self) -> TransferMode;

    /// Transfer a single file. The destination directory already exists.
    ///
    /// # Errors
    /// Returns the reason the transfer failed.
    fn apply(&self, source: &Path, destination: &Path) -> Result<(), TransferError>;
}

/// Rename the file, falling back to copy and delete across volumes.
#[derive(Debug, Default, Clone, Copy)]
pub struct MoveStrategy;

/// Copy file contents and timestamps.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyStrategy;

/// Create a hard link. Fails across volumes.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkStrategy;

/// Create a copy-on-write clone. Fails if the filesystem cannot clone.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReflinkStrategy;

/// A planned action that failed, with the underlying error.
#[derive(Debug)]
pub struct FailedAction {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub error: TransferError,
}

/// Outcome of executing a plan.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// All actions with their terminal status, in plan order.
    pub actions: Vec<PlannedAction>,
    pub failures: Vec<FailedAction>,
    pub unresolved: Vec<UnresolvedError>,
    pub warnings: Vec<ScanWarning>,
    pub dryrun: bool,
}

/// Runs every action of a plan and reports the outcome.
pub trait PlanExecutor {
    /// Execute the plan, calling `observer` after each action reaches its terminal status.
    fn execute_with(&self, plan: Plan, observer: &mut dyn FnMut(usize, &PlannedAction)) -> ExecutionReport;

    fn execute(&self, plan: Plan) -> ExecutionReport {
        self.execute_with(plan, &mut |_, _| {})
    }
}

/// Reports what would be done without touching the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunExecutor;

/// Applies the plan with the given transfer strategy.
pub struct FsExecutor {
    strategy: Box<dyn TransferStrategy>,
}

/// Get the strategy for a transfer mode.
#[must_use]
pub fn strategy_for(mode: TransferMode) -> Box<dyn TransferStrategy> {
    match mode {
        TransferMode::Move => Box::new(MoveStrategy),
        TransferMode::Copy => Box::new(CopyStrategy),
        TransferMode::Link => Box::new(LinkStrategy),
        TransferMode::Reflink => Box::new(ReflinkStrategy),
    }
}

impl TransferStrategy for MoveStrategy {
    fn mode(&self) -> TransferMode {
        TransferMode::Move
    }

    fn apply(&self, source: &Path, destination: &Path) -> Result<(), TransferError> {
        finish_move(fs::rename(source, destination), source, destination)
    }
}

/// Complete a move after the rename attempt. Across volumes the file is copied and the source removed.
fn finish_move(rename_result: io::Result<()>, source: &Path, destination: &Path) -> Result<(), TransferError> {
    match rename_result {
        Ok(()) => Ok(()),
        Err(error) if is_cross_device(&error) => {
            copy_with_timestamps(source, destination)?;
            fs::remove_file(source).map_err(|e| TransferError::io("remove source", source, e))
        }
        Err(error) => Err(TransferError::io("move", source, error)),
    }
}

/// Map a failed hard link to a transfer error.
fn link_error(error: io::Error, source: &Path, destination: &Path) -> TransferError {
    if is_cross_device(&error) {
        TransferError::CrossDevice {
            source_path: source.to_path_buf(),
            destination: destination.to_path_buf(),
        }
    } else {
        TransferError::io("hardlink", source, error)
    }
}

fn is_cross_device(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::CrossesDevices
}

impl TransferStrategy for CopyStrategy {
    fn mode(&self) -> TransferMode {
        TransferMode::Copy
    }

    fn apply(&self, source: &Path, destination: &Path) -> Result<(), TransferError> {
        copy_with_timestamps(source, destination)
    }
}

impl TransferStrategy for LinkStrategy {
    fn mode(&self) -> TransferMode {
        TransferMode::Link
    }

    fn apply(&self, source: &Path, destination: &Path) -> Result<(), TransferError> {
        fs::hard_link(source, destination).map_err(|error| link_error(error, source, destination))
    }
}

impl TransferStrategy for ReflinkStrategy {
    fn mode(&self) -> TransferMode {
        TransferMode::Reflink
    }

    fn apply(&self, source: &Path, destination: &Path) -> Result<(), TransferError> {
        let Some(args) = reflink_args() else {
            return Err(TransferError::UnsupportedFilesystem {
                destination: destination.to_path_buf(),
                reason: "reflink is not available on this platform".to_string(),
            });
        };

        let output = Command::new("cp")
            .args(args)
            .arg(source)
            .arg(destination)
            .output()
            .map_err(|e| TransferError::io("reflink", source, e))?;

        if output.status.success() {
            return Ok(());
        }

        // cp may leave an empty file behind when the clone fails.
        let _ = fs::remove_file(destination);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let reason = if stderr.is_empty() {
            format!("cp exited with {}", output.status)
        } else {
            stderr
        };
        Err(reflink_error(reason, destination))
    }
}

/// Messages `cp` prints when the filesystem cannot clone the file.
const CLONE_UNSUPPORTED_MESSAGES: &[&str] = &[
    "operation not supported",
    "not supported",
    "inappropriate ioctl",
    "invalid cross-device link",
];

/// Classify a failed clone. Anything other than missing clone support is an I/O error.
fn reflink_error(reason: String, destination: &Path) -> TransferError {
    let lowercase = reason.to_lowercase();
    if CLONE_UNSUPPORTED_MESSAGES
        .iter()
        .any(|message| lowercase.contains(message))
    {
        TransferError::UnsupportedFilesystem {
            destination: destination.to_path_buf(),
            reason,
        }
    } else {
        TransferError::io("reflink", destination, io::Error::other(reason))
    }
}

#[cfg(target_os = "linux")]
const fn reflink_args() -> Option<&'static [&'static str]> {
    Some(&["--reflink=always", "--preserve=timestamps"])
}

#[cfg(target_os = "macos")]
const fn reflink_args() -> Option<&'static [&'static str]> {
    Some(&["-c", "-p"])
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const fn reflink_args() -> Option<&'static [&'static str]> {
    None
}

/// Copy file contents and keep the access and modification times where the filesystem allows.
/// A failed copy removes the partial destination file.
fn copy_with_timestamps(source: &Path, destination: &Path) -> Result<(), TransferError> {
    if let Err(error) = fs::copy(source, destination) {
        let _ = fs::remove_file(destination);
        return Err(TransferError::io("copy", source, error));
    }
    if let Ok(metadata) = fs::metadata(source) {
        let _ = filetime::set_file_times(
            destination,
            FileTime::from_last_access_time(&metadata),
            FileTime::from_last_modification_time(&metadata),
        );
    }
    Ok(())
}

impl ExecutionReport {
    fn new(plan: Plan, dryrun: bool) -> Self {
        Self {
            actions: Vec::with_capacity(plan.actions.len()),
            failures: Vec::new(),
            unresolved: plan.unresolved,
            warnings: plan.warnings,
            dryrun,
        }
    }

    fn count(&self, predicate: impl Fn(&ActionStatus) -> bool) -> usize {
        self.actions.iter().filter(|action| predicate(action.status())).count()
    }

    #[must_use]
    pub fn applied(&self) -> usize {
        self.count(|status| *status == ActionStatus::Applied)
    }

    #[must_use]
    pub fn would_apply(&self) -> usize {
        self.count(|status| *status == ActionStatus::WouldApply)
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, ActionStatus::Skipped(_)))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, ActionStatus::Failed(_)))
    }

    /// All destination paths in plan order.
    pub fn destinations(&self) -> impl Iterator<Item = &Path> {
        self.actions.iter().map(|action| action.destination_path.as_path())
    }
}

impl PlanExecutor for DryRunExecutor {
    fn execute_with(&self, mut plan: Plan, observer: &mut dyn FnMut(usize, &PlannedAction)) -> ExecutionReport {
        let actions = std::mem::take(&mut plan.actions);
        let mut report = ExecutionReport::new(plan, true);
        for (index, mut action) in actions.into_iter().enumerate() {
            action.complete(ActionStatus::WouldApply);
            observer(index, &action);
            report.actions.push(action);
        }
        report
    }
}

impl FsExecutor {
    #[must_use]
    pub fn new(mode: TransferMode) -> Self {
        Self {
            strategy: strategy_for(mode),
        }
    }

    #[must_use]
    pub fn with_strategy(strategy: Box<dyn TransferStrategy>) -> Self {
        Self { strategy }
    }

    #[must_use]
    pub fn mode(&self) -> TransferMode {
        self.strategy.mode()
    }

    /// Transfer into a staging file next to the destination, then rename it into place.
    /// An existing destination is only replaced once the new file is complete.
    fn transfer(&self, action: &PlannedAction, overwrite: bool) -> Result<(), TransferError> {
        let source = &action.source_path;
        let destination = &action.destination_path;

        if fs::symlink_metadata(source).is_err() {
            return Err(TransferError::MissingSource { path: source.clone() });
        }
        if !overwrite && fs::symlink_metadata(destination).is_ok() {
            return Err(TransferError::io(
                "transfer",
                destination,
                io::Error::from(io::ErrorKind::AlreadyExists),
            ));
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| TransferError::io("create directory", parent, e))?;
        }

        let staging = staging_path(destination);
        if fs::symlink_metadata(&staging).is_ok() {
            fs::remove_file(&staging).map_err(|e| TransferError::io("remove stale staging file", &staging, e))?;
        }

        if let Err(error) = self.strategy.apply(source, &staging) {
            let _ = fs::remove_file(&staging);
            return Err(error);
        }

        if let Err(error) = fs::rename(&staging, destination) {
            if fs::symlink_metadata(source).is_err() {
                // Moved: put the file back where it was.
                let _ = fs::rename(&staging, source);
            } else {
                let _ = fs::remove_file(&staging);
            }
            return Err(TransferError::io("rename into place", destination, error));
        }
        Ok(())
    }
}

/// Sibling path used while a transfer is in progress: `<destination file name>.season-sort.tmp`.
fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().map(OsStr::to_os_string).unwrap_or_default();
    name.push(STAGING_SUFFIX);
    destination.with_file_name(name)
}

impl std::fmt::Debug for FsExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsExecutor").field("mode", &self.strategy.mode()).finish()
    }
}

impl PlanExecutor for FsExecutor {
    fn execute_with(&self, mut plan: Plan, observer: &mut dyn FnMut(usize, &PlannedAction)) -> ExecutionReport {
        let overwrite = plan.overwrite;
        let actions = std::mem::take(&mut plan.actions);
        let mut report = ExecutionReport::new(plan, false);

        for (index, mut action) in actions.into_iter().enumerate() {
            let status = match action.destination_state {
                DestinationState::IsSource => ActionStatus::Skipped(SkipReason::AlreadyInPlace),
                DestinationState::Exists if !overwrite => ActionStatus::Skipped(SkipReason::DestinationExists),
                DestinationState::Exists | DestinationState::Free => match self.transfer(&action, overwrite) {
                    Ok(()) => ActionStatus::Applied,
                    Err(error) => {
                        let reason = error.to_string();
                        report.failures.push(FailedAction {
                            source_path: action.source_path.clone(),
                            destination_path: action.destination_path.clone(),
                            error,
                        });
                        ActionStatus::Failed(reason)
                    }
                },
            };
            action.complete(status);
            observer(index, &action);
            report.actions.push(action);
        }

        report
    }
}
