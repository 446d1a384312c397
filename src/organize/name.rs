//! Canonical episode file names.
//!
//! Every file belonging to one episode shares the same stem so that media servers
//! pick up the sidecars next to the video:
//!
//! ```text
//! One Piece Yabai - S06E045 - Title - 1080p.mkv
//! One Piece Yabai - S06E045 - Title - 1080p-thumb.png
//! One Piece Yabai - S06E045 - Title - 1080p.fr.srt
//! ```

use std::collections::BTreeMap;

use sanitize_filename::sanitize;

use crate::organize::{EpisodeFile, SeasonSpec};

/// Build the name shared by all files of one episode, without suffix or extension.
///
/// A missing title leaves an empty segment when a technical tag follows it
/// (`Show - S06E045 -  - 1080p`). Without title and tag the name ends at the episode code.
#[must_use]
pub fn canonical_stem(
    show_name: &str,
    season_number: u32,
    episode_number: u32,
    title: Option<&str>,
    technical_tag: &str,
) -> String {
    let show_name = sanitize(show_name.trim());
    let title = title.map(|t| sanitize(t.trim())).unwrap_or_default();
    let technical_tag = sanitize(technical_tag.trim());

    let mut stem = format!("{show_name} - S{season_number:02}E{episode_number:03}");
    if !title.is_empty() || !technical_tag.is_empty() {
        stem.push_str(" - ");
        stem.push_str(&title);
    }
    if !technical_tag.is_empty() {
        stem.push_str(" - ");
        stem.push_str(&technical_tag);
    }
    stem
}

/// Build the canonical destination file name for an episode file.
#[must_use]
pub fn synthesize(
    file: &EpisodeFile,
    season: &SeasonSpec,
    show_name: &str,
    title_lookup: Option<&BTreeMap<u32, String>>,
    technical_tag: &str,
) -> String {
    let title = title_lookup
        .and_then(|titles| titles.get(&file.episode_number))
        .map(String::as_str);
    let stem = canonical_stem(
        show_name,
        season.season_number(),
        file.episode_number,
        title,
        technical_tag,
    );
    let suffix = file.sidecar_suffix.as_deref().unwrap_or_default();
    if file.extension.is_empty() {
        format!("{stem}{suffix}")
    } else {
        format!("{stem}{suffix}.{}", file.extension)
    }
}
