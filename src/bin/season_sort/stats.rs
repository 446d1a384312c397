use std::time::Duration;

use colored::Colorize;

use season_sort::organize::{ActionStatus, ExecutionReport, SkipReason};

/// Statistics for one sort run
#[derive(Debug, Default)]
pub struct RunStats {
    pub(crate) files_planned: usize,
    pub(crate) files_applied: usize,
    pub(crate) files_would_apply: usize,
    pub(crate) files_skipped_exists: usize,
    pub(crate) files_skipped_in_place: usize,
    pub(crate) files_failed: usize,
    pub(crate) unresolved: usize,
    pub(crate) warnings: usize,
    pub(crate) total_duration: Duration,
}

impl RunStats {
    pub(crate) fn from_report(report: &ExecutionReport, duration: Duration) -> Self {
        let mut stats = Self {
            files_planned: report.actions.len(),
            unresolved: report.unresolved.len(),
            warnings: report.warnings.len(),
            total_duration: duration,
            ..Self::default()
        };
        for action in &report.actions {
            match action.status() {
                ActionStatus::Applied => stats.files_applied += 1,
                ActionStatus::WouldApply => stats.files_would_apply += 1,
                ActionStatus::Skipped(SkipReason::DestinationExists) => stats.files_skipped_exists += 1,
                ActionStatus::Skipped(SkipReason::AlreadyInPlace) => stats.files_skipped_in_place += 1,
                ActionStatus::Failed(_) => stats.files_failed += 1,
                ActionStatus::Pending => {}
            }
        }
        stats
    }

    pub(crate) const fn total_skipped(&self) -> usize {
        self.files_skipped_exists + self.files_skipped_in_place
    }

    pub(crate) fn print_summary(&self, dryrun: bool) {
        println!("{}", "\n--- Season Sort Summary ---".bold().magenta());
        println!("Files planned:          {}", self.files_planned);
        if dryrun {
            println!("Files to transfer:      {}", self.files_would_apply);
        } else {
            println!("Files transferred:      {}", self.files_applied);
        }
        println!("Files skipped:          {}", self.total_skipped());
        if self.total_skipped() > 0 {
            println!("  - Destination exists: {}", self.files_skipped_exists);
            println!("  - Already in place:   {}", self.files_skipped_in_place);
        }
        println!(
            "Files failed:           {}",
            if self.files_failed > 0 {
                self.files_failed.to_string().red()
            } else {
                "0".normal()
            }
        );
        println!(
            "Unresolved episodes:    {}",
            if self.unresolved > 0 {
                self.unresolved.to_string().yellow()
            } else {
                "0".normal()
            }
        );
        println!("Warnings:               {}", self.warnings);
        println!(
            "Total time:             {}",
            season_sort::format_duration(self.total_duration)
        );
    }
}
