//! Find episode files under source directories and read their episode numbers.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::organize::ScanWarning;

/// Sidecar files that are moved together with the episode video.
pub const SIDECAR_EXTENSIONS: &[&str] = &["nfo", "srt", "ass", "vtt", "sub", "idx", "jpg", "jpeg", "png", "webp"];

/// Subtitle extensions that may carry a language tag, like `.fr.srt`.
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "ass", "vtt", "sub", "idx"];

/// Default video extensions.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4"];

const THUMB_SUFFIX: &str = "-thumb";

static RE_SEASON_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[\s._\-\[(])S\d{1,2}E(\d{2,4})(?:\D|$)").expect("Failed to compile season episode regex")
});

static RE_DASH_DELIMITED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)-\s*(\d{2,4})\s*(?:-|$)").expect("Failed to compile dash delimited number regex")
});

static RE_STANDALONE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s._\-\[(#])(\d{2,4})(?:[\s._\-\])]|$)").expect("Failed to compile standalone number regex")
});

static RE_LANGUAGE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.([A-Za-z]{2,3}(?:-[A-Za-z]{2,4})?)$").expect("Failed to compile language tag regex")
});

/// Rules for reading an episode number from a file name, in order of precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeRule {
    /// Canonical `S06E045` code.
    SeasonEpisodeCode,
    /// Number between dashes: `Show - 045 - Title`.
    DashDelimited,
    /// First 2-4 digit number bounded by separators.
    StandaloneNumber,
}

/// Whether a file is the episode video or one of its sidecars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileKind {
    Video,
    Sidecar,
}

/// A discovered file with its episode number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeFile {
    pub source_path: PathBuf,
    pub episode_number: u32,
    pub kind: FileKind,
    /// Marker kept between the name and the extension, like `-thumb` or `.fr`.
    pub sidecar_suffix: Option<String>,
    /// Lowercase extension without the dot.
    pub extension: String,
    /// Technical block at the end of the source name, like `1080p VOSTFR` in `Show - 045 - Title - 1080p VOSTFR`.
    pub technical_tag: Option<String>,
}

/// Files found by a scan together with the files that had to be left out.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub files: Vec<EpisodeFile>,
    pub warnings: Vec<ScanWarning>,
}

impl EpisodeRule {
    /// All rules in order of precedence.
    pub const ALL: [Self; 3] = [Self::SeasonEpisodeCode, Self::DashDelimited, Self::StandaloneNumber];

    fn regex(self) -> &'static Regex {
        match self {
            Self::SeasonEpisodeCode => &RE_SEASON_EPISODE,
            Self::DashDelimited => &RE_DASH_DELIMITED,
            Self::StandaloneNumber => &RE_STANDALONE_NUMBER,
        }
    }

    /// Try to read an episode number with this rule.
    #[must_use]
    pub fn extract(self, name: &str) -> Option<u32> {
        self.locate(name).map(|(number, _)| number)
    }

    /// Episode number and the byte offset just past its digits.
    fn locate(self, name: &str) -> Option<(u32, usize)> {
        let number = self.regex().captures(name)?.get(1)?;
        number.as_str().parse().ok().map(|value| (value, number.end()))
    }
}

impl fmt::Display for EpisodeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SeasonEpisodeCode => "season episode code",
            Self::DashDelimited => "dash delimited",
            Self::StandaloneNumber => "standalone number",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Sidecar => write!(f, "sidecar"),
        }
    }
}

/// Read the episode number from a file stem using the first matching rule.
#[must_use]
pub fn parse_episode_number(stem: &str) -> Option<(u32, EpisodeRule)> {
    EpisodeRule::ALL
        .iter()
        .find_map(|&rule| rule.extract(stem).map(|number| (number, rule)))
}

/// Read the technical block that follows the episode number and title.
///
/// The name must continue as `<number> - <title> - <block>`; anything else has no block.
///
/// ```rust
/// use season_sort::organize::parse_technical_tag;
///
/// assert_eq!(parse_technical_tag("One Piece - 045 - Titre - 1080p VOSTFR").as_deref(), Some("1080p VOSTFR"));
/// assert_eq!(parse_technical_tag("One Piece - 045 - xxx"), None);
/// ```
#[must_use]
pub fn parse_technical_tag(stem: &str) -> Option<String> {
    let end = EpisodeRule::ALL.iter().find_map(|&rule| rule.locate(stem).map(|(_, end)| end))?;
    let after_number = stem[end..].trim_start().strip_prefix('-')?;
    let (_title, block) = after_number.split_once(" - ")?;
    let block = block.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '_' | '.'));
    (!block.is_empty()).then(|| block.to_string())
}

/// Split a comma-separated extension list into lowercase extensions without the leading dot.
///
/// ```rust
/// use season_sort::organize::parse_extension_list;
///
/// assert_eq!(parse_extension_list(".MKV, mp4,,"), vec!["mkv", "mp4"]);
/// ```
#[must_use]
pub fn parse_extension_list(list: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    list.split(',')
        .map(normalize_extension)
        .filter(|ext| !ext.is_empty() && seen.insert(ext.clone()))
        .collect()
}

fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

impl EpisodeFile {
    /// Classify a path and read its episode number.
    ///
    /// Returns `Ok(None)` for files that are neither videos nor known sidecars,
    /// and a warning for media files without a recognizable episode number.
    pub fn from_path(path: &Path, video_extensions: &HashSet<String>) -> Result<Option<Self>, ScanWarning> {
        let extension = crate::path_to_file_extension_string(path);
        let stem = crate::path_to_file_stem_string(path);

        let (kind, sidecar_suffix, base_stem) = if video_extensions.contains(&extension) {
            (FileKind::Video, None, stem.as_str())
        } else if SIDECAR_EXTENSIONS.contains(&extension.as_str()) {
            let (suffix, base) = split_sidecar_suffix(&stem, &extension);
            (FileKind::Sidecar, suffix, base)
        } else {
            return Ok(None);
        };

        let Some((episode_number, _)) = parse_episode_number(base_stem) else {
            return Err(ScanWarning {
                path: path.to_path_buf(),
                reason: "no episode number found in file name".to_string(),
            });
        };

        Ok(Some(Self {
            source_path: path.to_path_buf(),
            episode_number,
            kind,
            sidecar_suffix,
            extension,
            technical_tag: parse_technical_tag(base_stem),
        }))
    }
}

/// Separate a `-thumb` marker or subtitle language tag from the end of a sidecar stem.
fn split_sidecar_suffix<'a>(stem: &'a str, extension: &str) -> (Option<String>, &'a str) {
    let split_at = stem.len().saturating_sub(THUMB_SUFFIX.len());
    if let (Some(base), Some(marker)) = (stem.get(..split_at), stem.get(split_at..))
        && marker.eq_ignore_ascii_case(THUMB_SUFFIX)
    {
        return (Some(THUMB_SUFFIX.to_string()), base);
    }
    if SUBTITLE_EXTENSIONS.contains(&extension)
        && let Some(tag) = RE_LANGUAGE_TAG.find(stem)
    {
        return (Some(tag.as_str().to_string()), &stem[..tag.start()]);
    }
    (None, stem)
}

/// Walk all roots and collect episode files.
///
/// Files are ordered by episode number and then by path.
/// Roots that do not exist, unreadable entries, and media files without an episode number
/// are reported as warnings.
pub fn scan<P: AsRef<Path>, S: AsRef<str>>(roots: &[P], recognized_extensions: &[S]) -> ScanResult {
    let video_extensions: HashSet<String> = recognized_extensions
        .iter()
        .map(|ext| normalize_extension(ext.as_ref()))
        .filter(|ext| !ext.is_empty())
        .collect();

    let mut result = ScanResult::default();
    for root in roots {
        let root = root.as_ref();
        if !root.is_dir() {
            result.warnings.push(ScanWarning {
                path: root.to_path_buf(),
                reason: "source directory does not exist".to_string(),
            });
            continue;
        }

        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !crate::is_hidden(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    result.warnings.push(ScanWarning {
                        path: error.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
                        reason: error.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match EpisodeFile::from_path(entry.path(), &video_extensions) {
                Ok(Some(file)) => result.files.push(file),
                Ok(None) => {}
                Err(warning) => result.warnings.push(warning),
            }
        }
    }

    result
        .files
        .sort_by(|a, b| a.episode_number.cmp(&b.episode_number).then_with(|| a.source_path.cmp(&b.source_path)));
    // Nested roots would list the same file twice.
    result.files.dedup_by(|a, b| a.source_path == b.source_path);
    result.warnings.sort_by(|a, b| a.path.cmp(&b.path));
    result.warnings.dedup();
    result
}
