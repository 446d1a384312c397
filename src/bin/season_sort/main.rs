mod config;
mod logger;
mod sort;
mod stats;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use season_sort::organize::TransferMode;

use crate::sort::SeasonSort;

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Sort a media pack into per-season folders with canonical episode names"
)]
pub struct Args {
    /// Optional base directory of the media pack
    #[arg(value_hint = clap::ValueHint::DirPath)]
    path: Option<PathBuf>,

    /// Show configuration file (JSON or TOML)
    #[arg(short = 'c', long, value_name = "CONFIG", value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Central directory containing the episode files
    #[arg(short = 'e', long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    episodes_dir: Option<PathBuf>,

    /// Additional source directories to scan
    #[arg(short = 's', long, num_args = 1, action = clap::ArgAction::Append, value_name = "SOURCE", value_hint = clap::ValueHint::DirPath)]
    source: Vec<PathBuf>,

    /// Output directory containing the season folders
    #[arg(short = 'o', long, value_name = "SHOW_ROOT", value_hint = clap::ValueHint::DirPath)]
    show_root: Option<PathBuf>,

    /// Transfer mode
    #[arg(short = 'm', long, value_enum)]
    mode: Option<TransferMode>,

    /// Comma-separated video file extensions
    #[arg(short = 'x', long, value_name = "EXTENSIONS")]
    ext: Option<String>,

    /// Technical tag appended to every file name
    #[arg(short = 't', long, value_name = "TAG")]
    tag: Option<String>,

    /// Overwrite existing destination files
    #[arg(short = 'f', long)]
    force: bool,

    /// Only print changes without transferring files
    #[arg(short = 'p', long)]
    print: bool,

    /// Write a log file to ~/logs/season-sort
    #[arg(short = 'L', long)]
    log: bool,

    /// Print verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Print debug information
    #[arg(short = 'D', long)]
    debug: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, value_name = "SHELL")]
    completion: Option<Shell>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(ref shell) = args.completion {
        season_sort::generate_shell_completion(*shell, Args::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        SeasonSort::new(args)?.run()
    }
}

#[cfg(test)]
mod args_tests {
    use super::*;

    #[test]
    fn parses_all_flags() {
        let args = Args::try_parse_from([
            "seasonsort",
            "/media/pack",
            "-c",
            "show.toml",
            "-e",
            "Episodes",
            "-s",
            "Saga 1",
            "-s",
            "Saga 2",
            "-o",
            "Show",
            "-m",
            "reflink",
            "-x",
            ".mkv,avi",
            "-t",
            "1080p",
            "-f",
            "-p",
            "-L",
            "-v",
            "-D",
        ])
        .unwrap();

        assert_eq!(args.path, Some(PathBuf::from("/media/pack")));
        assert_eq!(args.config, Some(PathBuf::from("show.toml")));
        assert_eq!(args.episodes_dir, Some(PathBuf::from("Episodes")));
        assert_eq!(args.source, vec![PathBuf::from("Saga 1"), PathBuf::from("Saga 2")]);
        assert_eq!(args.show_root, Some(PathBuf::from("Show")));
        assert_eq!(args.mode, Some(TransferMode::Reflink));
        assert_eq!(args.ext.as_deref(), Some(".mkv,avi"));
        assert_eq!(args.tag.as_deref(), Some("1080p"));
        assert!(args.force && args.print && args.log && args.verbose && args.debug);
    }

    #[test]
    fn defaults_are_empty() {
        let args = Args::try_parse_from(["seasonsort"]).unwrap();
        assert!(args.path.is_none());
        assert!(args.mode.is_none());
        assert!(args.source.is_empty());
        assert!(!args.print);
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Args::try_parse_from(["seasonsort", "-m", "symlink"]).is_err());
    }

    #[test]
    fn command_is_valid() {
        Args::command().debug_assert();
    }
}
