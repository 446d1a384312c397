//! Map episode numbers to configured seasons.

use std::cmp::Ordering;
use std::path::Path;

use crate::organize::{SeasonSpec, ShowConfig, UnresolvedError};

/// Find the season whose episode range contains the given episode number.
///
/// Seasons are sorted by range start and never overlap, so a binary search finds at most one match.
#[must_use]
pub fn find_season(episode_number: u32, config: &ShowConfig) -> Option<&SeasonSpec> {
    config
        .seasons()
        .binary_search_by(|season| {
            if season.last_episode() < episode_number {
                Ordering::Less
            } else if season.first_episode() > episode_number {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
        .ok()
        .map(|index| &config.seasons()[index])
}

/// Resolve the season for an episode file.
///
/// # Errors
/// Returns an [`UnresolvedError`] if no configured range covers the episode number.
pub fn resolve<'a>(
    episode_number: u32,
    source_path: &Path,
    config: &'a ShowConfig,
) -> Result<&'a SeasonSpec, UnresolvedError> {
    find_season(episode_number, config).ok_or_else(|| UnresolvedError {
        episode_number,
        source_path: source_path.to_path_buf(),
    })
}

#[cfg(test)]
mod season_tests {
    use super::*;

    fn make_config() -> ShowConfig {
        ShowConfig::new(
            "One Piece Yabai",
            vec![
                SeasonSpec::new(6, "Saison 6", 43, 55),
                SeasonSpec::new(1, "Saison 1", 1, 8),
                SeasonSpec::new(2, "Saison 2", 9, 30),
                SeasonSpec::new(7, "Saison 7", 56, 131),
            ],
        )
        .expect("valid config")
    }

    #[test]
    fn resolves_episode_inside_range() {
        let config = make_config();
        let season = resolve(45, Path::new("a.mkv"), &config).expect("should resolve");
        assert_eq!(season.season_number(), 6);
        assert_eq!(season.folder_name(), "Saison 6");
    }

    #[test]
    fn resolves_range_boundaries() {
        let config = make_config();
        assert_eq!(find_season(1, &config).map(SeasonSpec::season_number), Some(1));
        assert_eq!(find_season(8, &config).map(SeasonSpec::season_number), Some(1));
        assert_eq!(find_season(9, &config).map(SeasonSpec::season_number), Some(2));
        assert_eq!(find_season(131, &config).map(SeasonSpec::season_number), Some(7));
    }

    #[test]
    fn gap_between_ranges_is_unresolved() {
        let config = make_config();
        assert!(find_season(31, &config).is_none());
        assert!(find_season(42, &config).is_none());
        assert!(find_season(0, &config).is_none());
    }

    #[test]
    fn episode_after_last_range_is_unresolved() {
        let config = make_config();
        let error = resolve(132, Path::new("One Piece - 132.mkv"), &config).expect_err("should be unresolved");
        assert_eq!(error.episode_number, 132);
        assert_eq!(error.source_path, Path::new("One Piece - 132.mkv"));
    }

    #[test]
    fn resolve_is_repeatable() {
        let config = make_config();
        for episode in 1..=131 {
            let first = find_season(episode, &config);
            let second = find_season(episode, &config);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn binary_search_matches_linear_search() {
        let config = make_config();
        for episode in 0..=140 {
            let linear = config.seasons().iter().find(|season| season.contains(episode));
            assert_eq!(find_season(episode, &config), linear, "episode {episode}");
        }
    }
}
