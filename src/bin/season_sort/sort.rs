use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use itertools::Itertools;

use season_sort::organize::{
    ActionStatus, DestinationState, DryRunExecutor, ExecutionReport, FsExecutor, Plan, PlanExecutor, PlanOptions,
    PlannedAction, ShowConfig,
};
use season_sort::{print_bold, print_error, print_warning};

use crate::Args;
use crate::config::Config;
use crate::logger::FileLogger;
use crate::stats::RunStats;

/// Directories directly under the base whose name starts with this prefix are scanned.
const SAGA_PREFIX: &str = "Saga";

#[derive(Debug)]
pub struct SeasonSort {
    config: Config,
}

impl SeasonSort {
    /// Create from CLI args and the user config file.
    pub fn new(args: Args) -> Result<Self> {
        Ok(Self {
            config: Config::from_args(args)?,
        })
    }

    /// Load the show config, build the plan and execute it.
    ///
    /// Individual skipped or failed files do not make the run fail.
    pub fn run(&self) -> Result<()> {
        let start = Instant::now();
        if self.config.debug {
            println!("{}", self.config);
        }

        let show = ShowConfig::load(&self.config.show_config)
            .with_context(|| format!("Invalid show config: {}", self.config.show_config.display()))?;

        let mut logger = if self.config.log {
            let logger = FileLogger::new()?;
            if self.config.verbose {
                println!("Logging to {}", logger.path().display());
            }
            Some(logger)
        } else {
            None
        };
        if let Some(ref mut logger) = logger {
            logger.log_init(&self.config, show.show_name());
        }

        let roots = self.source_roots(show.show_name());
        let show_root = self.config.show_root_for(show.show_name());
        if let Some(ref mut logger) = logger {
            logger.log_roots(&roots, &show_root);
        }
        if roots.is_empty() {
            print_warning!(
                "No source directories found in {}",
                self.config.base.display()
            );
            return Ok(());
        }

        print_bold!(
            "{} {} season(s) -> {}",
            show.show_name(),
            show.seasons().len(),
            self.config.display_path(&show_root)
        );
        if self.config.verbose {
            for season in show.seasons() {
                println!(
                    "  S{:02} {:>4}-{:<4} {}",
                    season.season_number(),
                    season.first_episode(),
                    season.last_episode(),
                    season.folder_name()
                );
            }
            for root in &roots {
                println!("  {} {}", "source:".cyan(), self.config.display_path(root));
            }
        }

        let options = PlanOptions {
            show_root,
            mode: self.config.mode,
            overwrite: self.config.overwrite,
            technical_tag: self.config.technical_tag.clone(),
        };
        let plan = season_sort::organize::prepare(&show, &roots, &self.config.extensions, &options)
            .context("Plan has conflicting destinations, nothing was transferred")?;

        self.print_plan_notes(&plan, logger.as_mut());

        if plan.is_empty() {
            println!("No episode files to transfer");
        }

        let total = plan.len();
        let max_chars = total.checked_ilog10().map_or(1, |d| d as usize + 1);
        let executor: Box<dyn PlanExecutor> = if self.config.dryrun {
            Box::new(DryRunExecutor)
        } else {
            Box::new(FsExecutor::new(self.config.mode))
        };

        let report = executor.execute_with(plan, &mut |index, action| {
            let number = format!("{:>max_chars$} / {total}", index + 1);
            self.print_action(&number, action);
            if let Some(ref mut logger) = logger {
                logger.log_action(action, &number);
            }
        });

        self.print_failures(&report);

        let stats = RunStats::from_report(&report, start.elapsed());
        stats.print_summary(report.dryrun);
        if let Some(ref mut logger) = logger {
            logger.log_stats(&stats);
        }

        Ok(())
    }

    /// Directories to scan: the episodes directory, extra sources, and `Saga*` folders under the base.
    fn source_roots(&self, show_name: &str) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        match self.config.episodes_dir {
            Some(ref dir) => roots.push(dir.clone()),
            None => {
                let dir = self.config.episodes_dir_for(show_name);
                if dir.is_dir() {
                    roots.push(dir);
                }
            }
        }
        roots.extend(self.config.sources.iter().cloned());
        roots.extend(saga_directories(&self.config.base));
        roots.into_iter().unique().collect()
    }

    fn print_plan_notes(&self, plan: &Plan, mut logger: Option<&mut FileLogger>) {
        for warning in &plan.warnings {
            if self.config.verbose {
                print_warning!("Skipping {warning}");
            }
            if let Some(ref mut logger) = logger {
                logger.log_warning(warning);
            }
        }
        if !plan.warnings.is_empty() && !self.config.verbose {
            print_warning!("Skipped {} unrecognized file(s), use --verbose to list them", plan.warnings.len());
        }

        for unresolved in &plan.unresolved {
            print_warning!(
                "Episode {:03} has no season: {}",
                unresolved.episode_number,
                self.config.display_path(&unresolved.source_path)
            );
            if let Some(ref mut logger) = logger {
                logger.log_unresolved(unresolved);
            }
        }

        let existing = plan.existing_destinations().count();
        if existing > 0 && !plan.overwrite {
            print_warning!("{existing} destination file(s) already exist and will be skipped, use --force to overwrite");
        }
    }

    fn print_action(&self, number: &str, action: &PlannedAction) {
        let old_str = self.config.display_path(&action.source_path);
        let new_str = self.config.display_path(&action.destination_path);
        match action.status() {
            ActionStatus::WouldApply => {
                println!("{}", format!("Dryrun {number}:").bold().cyan());
                season_sort::show_diff(&old_str, &new_str);
                match action.destination_state {
                    DestinationState::Exists if !self.config.overwrite => {
                        println!("{}", "Destination exists, would skip".yellow());
                    }
                    DestinationState::Exists => println!("{}", "Destination exists, would overwrite".yellow()),
                    DestinationState::IsSource => println!("{}", "Already in place".yellow()),
                    DestinationState::Free => {}
                }
            }
            ActionStatus::Applied => {
                println!("{}", format!("{} {number}:", capitalize(&action.mode.to_string())).bold().magenta());
                season_sort::show_diff(&old_str, &new_str);
            }
            ActionStatus::Skipped(reason) => {
                if self.config.verbose {
                    println!("{}", format!("Skip {number}: {reason}").yellow());
                    println!("{new_str}");
                }
            }
            ActionStatus::Failed(error) => {
                print_error!("{number}: {error}");
                println!("{old_str}");
            }
            ActionStatus::Pending => {}
        }
    }

    fn print_failures(&self, report: &ExecutionReport) {
        if report.failures.is_empty() {
            return;
        }
        print_bold!("\nFailed transfers:");
        for failure in &report.failures {
            eprintln!(
                "  {} -> {}\n    {}",
                self.config.display_path(&failure.source_path),
                self.config.display_path(&failure.destination_path),
                failure.error.to_string().red()
            );
        }
    }
}

/// Directories directly under `base` named `Saga*`, sorted by name.
fn saga_directories(base: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(base) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|file_type| file_type.is_dir()))
        .filter(|entry| season_sort::os_str_to_string(&entry.file_name()).starts_with(SAGA_PREFIX))
        .map(|entry| entry.path())
        .sorted()
        .collect()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars
        .next()
        .map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
}
