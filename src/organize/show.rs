//! Show configuration: show name, season ranges and optional episode titles.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::Deserialize;

use crate::organize::ConfigurationError;

/// One configured season and the inclusive range of episode numbers it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonSpec {
    season_number: u32,
    folder_name: String,
    episode_range: RangeInclusive<u32>,
}

/// Validated show configuration.
///
/// Seasons are kept sorted by the start of their episode range,
/// which lets the resolver use a binary search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowConfig {
    show_name: String,
    seasons: Vec<SeasonSpec>,
    titles: BTreeMap<u32, String>,
    technical_tag: Option<String>,
}

/// Show config as read from the file, before validation.
#[derive(Debug, Deserialize)]
struct RawShowConfig {
    #[serde(default)]
    show_name: String,
    #[serde(default)]
    seasons: Vec<RawSeason>,
    #[serde(default)]
    titles: BTreeMap<String, String>,
    #[serde(default)]
    technical_tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSeason {
    season: i64,
    #[serde(default)]
    folder: String,
    range: (u32, u32),
}

/// Supported show config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl SeasonSpec {
    #[must_use]
    pub fn new(season_number: u32, folder_name: impl Into<String>, first: u32, last: u32) -> Self {
        Self {
            season_number,
            folder_name: folder_name.into(),
            episode_range: first..=last,
        }
    }

    #[must_use]
    pub const fn season_number(&self) -> u32 {
        self.season_number
    }

    #[must_use]
    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }

    #[must_use]
    pub const fn episode_range(&self) -> &RangeInclusive<u32> {
        &self.episode_range
    }

    #[must_use]
    pub const fn first_episode(&self) -> u32 {
        *self.episode_range.start()
    }

    #[must_use]
    pub const fn last_episode(&self) -> u32 {
        *self.episode_range.end()
    }

    /// Check if the episode number falls inside this season's range.
    #[must_use]
    pub fn contains(&self, episode_number: u32) -> bool {
        self.episode_range.contains(&episode_number)
    }

    const fn overlaps(&self, other: &Self) -> bool {
        self.first_episode() <= other.last_episode() && other.first_episode() <= self.last_episode()
    }
}

impl ShowConfig {
    /// Create a validated config from a show name and seasons.
    ///
    /// # Errors
    /// Returns the first problem found, checking seasons in the given order.
    pub fn new(show_name: impl Into<String>, seasons: Vec<SeasonSpec>) -> Result<Self, ConfigurationError> {
        let show_name = show_name.into().trim().to_string();
        if show_name.is_empty() {
            return Err(ConfigurationError::EmptyShowName);
        }
        if seasons.is_empty() {
            return Err(ConfigurationError::NoSeasons);
        }

        let mut seen: HashSet<u32> = HashSet::with_capacity(seasons.len());
        for (index, season) in seasons.iter().enumerate() {
            let number = season.season_number;
            if number == 0 {
                return Err(ConfigurationError::InvalidSeasonNumber { season: 0 });
            }
            if !seen.insert(number) {
                return Err(ConfigurationError::DuplicateSeason { season: number });
            }
            if season.folder_name.trim().is_empty() {
                return Err(ConfigurationError::EmptyFolder { season: number });
            }
            if season.first_episode() > season.last_episode() {
                return Err(ConfigurationError::InvertedRange {
                    season: number,
                    min: season.first_episode(),
                    max: season.last_episode(),
                });
            }
            if let Some(other) = seasons[..index].iter().find(|other| other.overlaps(season)) {
                return Err(ConfigurationError::OverlappingRange {
                    season: number,
                    min: season.first_episode(),
                    max: season.last_episode(),
                    other: other.season_number,
                    other_min: other.first_episode(),
                    other_max: other.last_episode(),
                });
            }
        }

        let mut seasons = seasons;
        seasons.sort_by_key(SeasonSpec::first_episode);

        Ok(Self {
            show_name,
            seasons,
            titles: BTreeMap::new(),
            technical_tag: None,
        })
    }

    /// Add episode titles used when naming files.
    #[must_use]
    pub fn with_titles(mut self, titles: BTreeMap<u32, String>) -> Self {
        self.titles = titles
            .into_iter()
            .map(|(episode, title)| (episode, title.trim().to_string()))
            .filter(|(_, title)| !title.is_empty())
            .collect();
        self
    }

    /// Set the technical tag appended to every file name.
    #[must_use]
    pub fn with_technical_tag(mut self, tag: Option<String>) -> Self {
        self.technical_tag = tag.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        self
    }

    /// Load show config from a JSON or TOML file.
    /// Files with a `.toml` extension are read as TOML, everything else as JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let format = if crate::path_to_file_extension_string(path) == "toml" {
            Format::Toml
        } else {
            Format::Json
        };
        Self::parse(&content, format, path)
    }

    /// Parse show config from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the JSON is invalid or fails validation.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Self::parse(json, Format::Json, Path::new("<json>"))
    }

    /// Parse show config from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigurationError> {
        Self::parse(toml_str, Format::Toml, Path::new("<toml>"))
    }

    fn parse(content: &str, format: Format, path: &Path) -> Result<Self, ConfigurationError> {
        let parse_error = |message: String| ConfigurationError::Parse {
            path: path.to_path_buf(),
            message,
        };
        let raw: RawShowConfig = match format {
            Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?,
            Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        };
        raw.into_config()
    }

    #[must_use]
    pub fn show_name(&self) -> &str {
        &self.show_name
    }

    /// Seasons sorted by episode range start.
    #[must_use]
    pub fn seasons(&self) -> &[SeasonSpec] {
        &self.seasons
    }

    #[must_use]
    pub const fn titles(&self) -> &BTreeMap<u32, String> {
        &self.titles
    }

    #[must_use]
    pub fn technical_tag(&self) -> Option<&str> {
        self.technical_tag.as_deref()
    }

    /// Get the configured title for an episode.
    #[must_use]
    pub fn title(&self, episode_number: u32) -> Option<&str> {
        self.titles.get(&episode_number).map(String::as_str)
    }
}

impl RawShowConfig {
    fn into_config(self) -> Result<ShowConfig, ConfigurationError> {
        // Check the show name first so that an empty config reports the missing name.
        if self.show_name.trim().is_empty() {
            return Err(ConfigurationError::EmptyShowName);
        }

        let mut seasons = Vec::with_capacity(self.seasons.len());
        for raw in self.seasons {
            let season_number = u32::try_from(raw.season)
                .ok()
                .filter(|&number| number > 0)
                .ok_or(ConfigurationError::InvalidSeasonNumber { season: raw.season })?;
            let (first, last) = raw.range;
            seasons.push(SeasonSpec::new(season_number, raw.folder.trim(), first, last));
        }

        let mut titles = BTreeMap::new();
        for (key, title) in self.titles {
            let episode = key
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigurationError::InvalidTitleKey { key: key.clone() })?;
            titles.insert(episode, title);
        }

        Ok(ShowConfig::new(self.show_name, seasons)?
            .with_titles(titles)
            .with_technical_tag(self.technical_tag))
    }
}

#[cfg(test)]
mod show_config_tests {
    use super::*;

    use std::io::Write;

    use tempfile::NamedTempFile;

    const SAMPLE_JSON: &str = r#"{
        "show_name": "One Piece Yabai",
        "seasons": [
            {"season": 1, "folder": "Saison 1", "range": [1, 8]},
            {"season": 6, "folder": "Saison 6", "range": [43, 55]},
            {"season": 2, "folder": "Saison 2", "range": [9, 30]}
        ],
        "titles": {"45": "  Un titre  ", "46": ""},
        "technical_tag": "1080p VOSTFR"
    }"#;

    #[test]
    fn parses_json_config() {
        let config = ShowConfig::from_json_str(SAMPLE_JSON).expect("should parse config");
        assert_eq!(config.show_name(), "One Piece Yabai");
        assert_eq!(config.seasons().len(), 3);
        assert_eq!(config.technical_tag(), Some("1080p VOSTFR"));
        assert_eq!(config.title(45), Some("Un titre"));
        assert_eq!(config.title(46), None);
    }

    #[test]
    fn seasons_are_sorted_by_range_start() {
        let config = ShowConfig::from_json_str(SAMPLE_JSON).expect("should parse config");
        let numbers: Vec<u32> = config.seasons().iter().map(SeasonSpec::season_number).collect();
        assert_eq!(numbers, vec![1, 2, 6]);
    }

    #[test]
    fn parses_toml_config() {
        let toml = r#"
show_name = "Show"
technical_tag = "720p"

[[seasons]]
season = 1
folder = "Season 01"
range = [1, 12]

[titles]
3 = "Third"
"#;
        let config = ShowConfig::from_toml_str(toml).expect("should parse config");
        assert_eq!(config.seasons()[0].episode_range(), &(1..=12));
        assert_eq!(config.title(3), Some("Third"));
    }

    #[test]
    fn overlapping_ranges_fail() {
        let seasons = vec![SeasonSpec::new(1, "S1", 1, 10), SeasonSpec::new(2, "S2", 10, 20)];
        let error = ShowConfig::new("Show", seasons).expect_err("overlap should fail");
        assert!(matches!(
            error,
            ConfigurationError::OverlappingRange {
                season: 2,
                other: 1,
                ..
            }
        ));
    }

    #[test]
    fn gaps_between_ranges_are_allowed() {
        let seasons = vec![SeasonSpec::new(1, "S1", 1, 10), SeasonSpec::new(2, "S2", 20, 30)];
        assert!(ShowConfig::new("Show", seasons).is_ok());
    }

    #[test]
    fn single_episode_range_is_allowed() {
        let seasons = vec![SeasonSpec::new(1, "Special", 7, 7)];
        let config = ShowConfig::new("Show", seasons).expect("should be valid");
        assert!(config.seasons()[0].contains(7));
    }

    #[test]
    fn inverted_range_fails() {
        let seasons = vec![SeasonSpec::new(3, "S3", 20, 10)];
        let error = ShowConfig::new("Show", seasons).expect_err("inverted range should fail");
        assert!(matches!(
            error,
            ConfigurationError::InvertedRange {
                season: 3,
                min: 20,
                max: 10
            }
        ));
    }

    #[test]
    fn duplicate_season_fails() {
        let seasons = vec![SeasonSpec::new(1, "S1", 1, 10), SeasonSpec::new(1, "S1b", 11, 20)];
        let error = ShowConfig::new("Show", seasons).expect_err("duplicate should fail");
        assert!(matches!(error, ConfigurationError::DuplicateSeason { season: 1 }));
    }

    #[test]
    fn empty_folder_fails() {
        let seasons = vec![SeasonSpec::new(4, "  ", 1, 10)];
        let error = ShowConfig::new("Show", seasons).expect_err("empty folder should fail");
        assert!(matches!(error, ConfigurationError::EmptyFolder { season: 4 }));
    }

    #[test]
    fn non_positive_season_number_fails() {
        let json = r#"{"show_name": "Show", "seasons": [{"season": -1, "folder": "S", "range": [1, 2]}]}"#;
        let error = ShowConfig::from_json_str(json).expect_err("negative season should fail");
        assert!(matches!(error, ConfigurationError::InvalidSeasonNumber { season: -1 }));

        let json = r#"{"show_name": "Show", "seasons": [{"season": 0, "folder": "S", "range": [1, 2]}]}"#;
        let error = ShowConfig::from_json_str(json).expect_err("zero season should fail");
        assert!(matches!(error, ConfigurationError::InvalidSeasonNumber { season: 0 }));
    }

    #[test]
    fn empty_show_name_fails() {
        let json = r#"{"show_name": " ", "seasons": [{"season": 1, "folder": "S", "range": [1, 2]}]}"#;
        let error = ShowConfig::from_json_str(json).expect_err("empty name should fail");
        assert!(matches!(error, ConfigurationError::EmptyShowName));
    }

    #[test]
    fn missing_seasons_fails() {
        let error = ShowConfig::from_json_str(r#"{"show_name": "Show"}"#).expect_err("should fail");
        assert!(matches!(error, ConfigurationError::NoSeasons));
    }

    #[test]
    fn invalid_title_key_fails() {
        let json = r#"{
            "show_name": "Show",
            "seasons": [{"season": 1, "folder": "S", "range": [1, 2]}],
            "titles": {"one": "First"}
        }"#;
        let error = ShowConfig::from_json_str(json).expect_err("should fail");
        assert!(matches!(error, ConfigurationError::InvalidTitleKey { key } if key == "one"));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let error = ShowConfig::from_json_str("{ not json").expect_err("should fail");
        assert!(matches!(error, ConfigurationError::Parse { .. }));
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let error = ShowConfig::load(Path::new("does/not/exist.json")).expect_err("should fail");
        assert!(matches!(error, ConfigurationError::Read { .. }));
    }

    #[test]
    fn load_reads_toml_by_extension() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("Failed to create temp file");
        writeln!(
            file,
            "show_name = \"Show\"\n[[seasons]]\nseason = 2\nfolder = \"Season 2\"\nrange = [5, 9]"
        )
        .expect("Failed to write config");

        let config = ShowConfig::load(file.path()).expect("should load config");
        assert_eq!(config.seasons()[0].season_number(), 2);
    }

    #[test]
    fn load_reads_json_by_default() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        write!(file, "{SAMPLE_JSON}").expect("Failed to write config");

        let config = ShowConfig::load(file.path()).expect("should load config");
        assert_eq!(config.show_name(), "One Piece Yabai");
    }
}
