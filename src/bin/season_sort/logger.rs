use std::fs;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use season_sort::organize::{ActionStatus, PlannedAction, ScanWarning, UnresolvedError};

use crate::config::Config;
use crate::stats::RunStats;

/// Simple file logger for transfer operations with buffered writes
pub struct FileLogger {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl FileLogger {
    /// Create a new file logger, writing to ~/logs/season-sort/season_sort_<timestamp>.log
    pub(crate) fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Failed to get home directory")?;
        Self::in_dir(&home_dir.join("logs").join("season-sort"))
    }

    /// Create a new file logger in the given directory.
    pub(crate) fn in_dir(log_dir: &Path) -> Result<Self> {
        if !log_dir.exists() {
            fs::create_dir_all(log_dir).context("Failed to create log directory")?;
        }

        let log_path = log_dir.join(format!("season_sort_{}.log", Local::now().format("%Y-%m-%d_%H-%M-%S")));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: log_path,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn timestamp() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Log when starting the program
    pub(crate) fn log_init(&mut self, config: &Config, show_name: &str) {
        let _ = writeln!(
            self.writer,
            "[{}] INIT \"{}\" | {}",
            Self::timestamp(),
            config.base.display(),
            show_name
        );
        let _ = writeln!(self.writer, "  show_config: {}", config.show_config.display());
        let _ = writeln!(self.writer, "  mode: {}", config.mode);
        let _ = writeln!(self.writer, "  extensions: {:?}", config.extensions);
        if let Some(ref tag) = config.technical_tag {
            let _ = writeln!(self.writer, "  technical_tag: {tag}");
        }
        let _ = writeln!(self.writer, "  overwrite: {}", config.overwrite);
        let _ = writeln!(self.writer, "  dryrun: {}", config.dryrun);
        let _ = self.writer.flush();
    }

    /// Log the source roots that will be scanned
    pub(crate) fn log_roots(&mut self, roots: &[PathBuf], show_root: &Path) {
        for root in roots {
            let _ = writeln!(self.writer, "  source: {}", root.display());
        }
        let _ = writeln!(self.writer, "  show_root: {}", show_root.display());
        let _ = self.writer.flush();
    }

    /// Log a file that was left out of the plan
    pub(crate) fn log_warning(&mut self, warning: &ScanWarning) {
        let _ = writeln!(self.writer, "[{}] WARN    {warning}", Self::timestamp());
    }

    /// Log an episode outside all season ranges
    pub(crate) fn log_unresolved(&mut self, unresolved: &UnresolvedError) {
        let _ = writeln!(self.writer, "[{}] UNRESOLVED {unresolved}", Self::timestamp());
    }

    /// Log the outcome of a single action
    pub(crate) fn log_action(&mut self, action: &PlannedAction, file_index: &str) {
        let label = match action.status() {
            ActionStatus::Pending => "PENDING",
            ActionStatus::WouldApply => "DRYRUN ",
            ActionStatus::Applied => "APPLIED",
            ActionStatus::Skipped(_) => "SKIPPED",
            ActionStatus::Failed(_) => "ERROR  ",
        };
        let detail = match action.status() {
            ActionStatus::Skipped(reason) => format!(" | {reason}"),
            ActionStatus::Failed(error) => format!(" | {error}"),
            _ => String::new(),
        };
        let _ = writeln!(
            self.writer,
            "[{}] {label} {} {file_index} - \"{}\" -> \"{}\"{detail}",
            Self::timestamp(),
            action.mode.to_string().to_uppercase(),
            action.source_path.display(),
            action.destination_path.display(),
        );
        let _ = self.writer.flush();
    }

    /// Log final statistics
    pub(crate) fn log_stats(&mut self, stats: &RunStats) {
        let _ = writeln!(self.writer, "[{}] STATISTICS", Self::timestamp());
        let _ = writeln!(self.writer, "  Files planned:    {}", stats.files_planned);
        let _ = writeln!(self.writer, "  Files applied:    {}", stats.files_applied);
        let _ = writeln!(self.writer, "  Files dry run:    {}", stats.files_would_apply);
        let _ = writeln!(self.writer, "  Files skipped:    {}", stats.total_skipped());
        if stats.total_skipped() > 0 {
            let _ = writeln!(self.writer, "    - Destination exists: {}", stats.files_skipped_exists);
            let _ = writeln!(self.writer, "    - Already in place:   {}", stats.files_skipped_in_place);
        }
        let _ = writeln!(self.writer, "  Files failed:     {}", stats.files_failed);
        let _ = writeln!(self.writer, "  Unresolved:       {}", stats.unresolved);
        let _ = writeln!(self.writer, "  Warnings:         {}", stats.warnings);
        let _ = writeln!(
            self.writer,
            "  Total time: {}",
            season_sort::format_duration(stats.total_duration)
        );
        let _ = writeln!(self.writer, "[{}] END", Self::timestamp());
        let _ = self.writer.flush();
    }
}
