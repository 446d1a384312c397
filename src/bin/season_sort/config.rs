use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use itertools::Itertools;
use serde::Deserialize;

use season_sort::organize::{DEFAULT_VIDEO_EXTENSIONS, TransferMode, parse_extension_list};

use crate::Args;

/// Show configuration file name looked up in the base directory.
pub const DEFAULT_SHOW_CONFIG: &str = "seasons_config.json";

/// Final config created from CLI arguments and user config file.
#[derive(Debug)]
pub struct Config {
    pub(crate) base: PathBuf,
    pub(crate) debug: bool,
    pub(crate) dryrun: bool,
    pub(crate) episodes_dir: Option<PathBuf>,
    pub(crate) extensions: Vec<String>,
    pub(crate) log: bool,
    pub(crate) mode: TransferMode,
    pub(crate) overwrite: bool,
    pub(crate) show_config: PathBuf,
    pub(crate) show_root: Option<PathBuf>,
    pub(crate) sources: Vec<PathBuf>,
    pub(crate) technical_tag: Option<String>,
    pub(crate) verbose: bool,
}

/// Config from the user config file
#[derive(Debug, Default, Deserialize)]
struct SeasonSortConfig {
    #[serde(default)]
    config: Option<PathBuf>,
    #[serde(default)]
    dryrun: bool,
    #[serde(default)]
    extensions: Vec<String>,
    #[serde(default)]
    log: bool,
    #[serde(default)]
    mode: Option<TransferMode>,
    #[serde(default)]
    overwrite: bool,
    #[serde(default)]
    technical_tag: Option<String>,
    #[serde(default)]
    verbose: bool,
}

/// Wrapper needed for parsing the config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    seasonsort: SeasonSortConfig,
}

impl SeasonSortConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    fn get_user_config() -> anyhow::Result<Self> {
        let Some(path) = season_sort::config::config_path() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {}:\n{e}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {error}",
                path.display()
            )),
        }
    }

    /// Parse config from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.seasonsort)
            .context("Failed to parse seasonsort config TOML")
    }
}

impl Config {
    /// Create config from given command line args and user config file.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read or parsed,
    /// or if the base directory does not exist.
    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        let user_config = SeasonSortConfig::get_user_config()?;
        Self::from_parts(args, user_config)
    }

    fn from_parts(args: Args, user_config: SeasonSortConfig) -> anyhow::Result<Self> {
        let base = season_sort::resolve_input_path(args.path.as_deref())?;
        if !base.is_dir() {
            anyhow::bail!("Base path is not a directory: {}", base.display());
        }

        // args > config > default
        let show_config = args
            .config
            .or(user_config.config)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SHOW_CONFIG));
        let show_config = season_sort::resolve_against(&base, &show_config);

        let extensions = Self::video_extensions(args.ext.as_deref(), &user_config.extensions);

        let technical_tag = args
            .tag
            .or(user_config.technical_tag)
            .map(|tag| tag.trim().to_string());

        let episodes_dir = args
            .episodes_dir
            .map(|dir| season_sort::resolve_against(&base, &dir));

        let show_root = args.show_root.map(|dir| season_sort::resolve_against(&base, &dir));

        let sources = args
            .source
            .iter()
            .map(|dir| season_sort::resolve_against(&base, dir))
            .unique()
            .collect();

        Ok(Self {
            debug: args.debug,
            dryrun: args.print || user_config.dryrun,
            episodes_dir,
            extensions,
            log: args.log || user_config.log,
            mode: args.mode.or(user_config.mode).unwrap_or_default(),
            overwrite: args.force || user_config.overwrite,
            show_config,
            show_root,
            sources,
            technical_tag,
            verbose: args.verbose || args.debug || user_config.verbose,
            base,
        })
    }

    /// Normalized video extensions: CLI list, then user config list, then the defaults.
    fn video_extensions(cli_list: Option<&str>, user_list: &[String]) -> Vec<String> {
        let cli_extensions = cli_list.map(parse_extension_list).unwrap_or_default();
        if !cli_extensions.is_empty() {
            return cli_extensions;
        }

        let user_extensions: Vec<String> = user_list
            .iter()
            .flat_map(|extension| parse_extension_list(extension))
            .unique()
            .collect();
        if !user_extensions.is_empty() {
            return user_extensions;
        }

        DEFAULT_VIDEO_EXTENSIONS
            .iter()
            .map(std::string::ToString::to_string)
            .collect()
    }

    /// Central episode directory, defaulting to `<show name> - Episodes` under the base.
    pub(crate) fn episodes_dir_for(&self, show_name: &str) -> PathBuf {
        self.episodes_dir
            .clone()
            .unwrap_or_else(|| self.base.join(format!("{show_name} - Episodes")))
    }

    /// Show root, defaulting to a folder named after the show under the base.
    pub(crate) fn show_root_for(&self, show_name: &str) -> PathBuf {
        self.show_root.clone().unwrap_or_else(|| self.base.join(show_name))
    }

    /// Relative path for printing.
    pub(crate) fn display_path(&self, path: &Path) -> String {
        season_sort::get_relative_path_or_filename(path, &self.base)
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Config:")?;
        writeln!(f, "  base: {}", self.base.display())?;
        writeln!(f, "  show_config: {}", self.show_config.display())?;
        if let Some(ref dir) = self.episodes_dir {
            writeln!(f, "  episodes_dir: {}", dir.display())?;
        }
        if !self.sources.is_empty() {
            writeln!(f, "  sources: [{}]", self.sources.iter().map(|s| s.display()).join(", "))?;
        }
        if let Some(ref dir) = self.show_root {
            writeln!(f, "  show_root: {}", dir.display())?;
        }
        writeln!(f, "  mode: {}", self.mode)?;
        writeln!(f, "  extensions: {:?}", self.extensions)?;
        if let Some(ref tag) = self.technical_tag {
            writeln!(f, "  technical_tag: {tag}")?;
        }
        writeln!(f, "  dryrun: {}", season_sort::colorize_bool(self.dryrun))?;
        writeln!(f, "  overwrite: {}", season_sort::colorize_bool(self.overwrite))?;
        writeln!(f, "  log: {}", season_sort::colorize_bool(self.log))?;
        write!(f, "  verbose: {}", season_sort::colorize_bool(self.verbose))
    }
}

#[cfg(test)]
mod seasonsort_config_tests {
    use super::*;

    #[test]
    fn from_toml_str_parses_empty_config() {
        let config = SeasonSortConfig::from_toml_str("").unwrap();
        assert!(!config.dryrun);
        assert!(!config.overwrite);
        assert!(config.mode.is_none());
        assert!(config.extensions.is_empty());
    }

    #[test]
    fn from_toml_str_parses_seasonsort_section() {
        let toml = r#"
[seasonsort]
config = "show.toml"
dryrun = true
extensions = ["mkv", ".avi"]
log = true
mode = "reflink"
overwrite = true
technical_tag = "VOSTFR 1080p"
verbose = true
"#;
        let config = SeasonSortConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.config, Some(PathBuf::from("show.toml")));
        assert!(config.dryrun);
        assert_eq!(config.extensions, vec!["mkv", ".avi"]);
        assert!(config.log);
        assert_eq!(config.mode, Some(TransferMode::Reflink));
        assert!(config.overwrite);
        assert_eq!(config.technical_tag.as_deref(), Some("VOSTFR 1080p"));
        assert!(config.verbose);
    }

    #[test]
    fn from_toml_str_rejects_unknown_mode() {
        let toml = r#"
[seasonsort]
mode = "symlink"
"#;
        assert!(SeasonSortConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn from_toml_str_invalid_toml_returns_error() {
        assert!(SeasonSortConfig::from_toml_str("this is not valid toml {{{").is_err());
    }

    #[test]
    fn from_toml_str_ignores_other_sections() {
        let toml = r"
[other_section]
some_value = true

[seasonsort]
verbose = true
";
        let config = SeasonSortConfig::from_toml_str(toml).unwrap();
        assert!(config.verbose);
        assert!(!config.dryrun);
    }
}
