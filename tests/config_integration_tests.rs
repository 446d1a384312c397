//! Integration tests for config loading from fixture files.
//!
//! These tests verify that the sample user config and the show configs parse correctly.

use std::fs;
use std::path::Path;

use season_sort::organize::{ConfigurationError, ShowConfig};

/// Read the sample config file content.
fn read_sample_config() -> String {
    let config_path = Path::new("tests/fixtures/sample_config.toml");
    fs::read_to_string(config_path).expect("Failed to read sample config file")
}

#[test]
fn sample_config_file_exists() {
    let config_path = Path::new("tests/fixtures/sample_config.toml");
    assert!(config_path.exists(), "Sample config file should exist");
}

#[test]
fn sample_config_is_valid_toml() {
    let config_content = read_sample_config();
    let result: Result<toml::Value, _> = toml::from_str(&config_content);
    assert!(result.is_ok(), "Sample config should be valid TOML: {:?}", result.err());
}

#[test]
fn seasonsort_section_has_expected_structure() {
    let config_content = read_sample_config();
    let value: toml::Value = toml::from_str(&config_content).expect("should parse");

    let section = value.get("seasonsort").expect("should have seasonsort section");

    for key in [
        "config",
        "dryrun",
        "extensions",
        "log",
        "mode",
        "overwrite",
        "technical_tag",
        "verbose",
    ] {
        assert!(section.get(key).is_some(), "seasonsort section should have '{key}'");
    }

    let mode = section.get("mode").and_then(toml::Value::as_str).expect("mode is a string");
    assert!(["move", "copy", "link", "reflink"].contains(&mode));
}

#[test]
fn json_show_config_fixture_loads() {
    let config = ShowConfig::load(Path::new("tests/fixtures/seasons_config.json")).expect("should load");
    assert_eq!(config.show_name(), "One Piece Yabai");
    assert_eq!(config.seasons().len(), 6);
    assert_eq!(config.technical_tag(), Some("1080p"));
    assert_eq!(config.title(45), Some("Le duel"));
    assert_eq!(config.title(46), None);

    let numbers: Vec<u32> = config.seasons().iter().map(|s| s.season_number()).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn toml_show_config_fixture_loads() {
    let config = ShowConfig::load(Path::new("tests/fixtures/seasons_config.toml")).expect("should load");
    assert_eq!(config.show_name(), "One Piece Yabai");
    assert_eq!(config.seasons().len(), 2);
    assert_eq!(config.seasons()[1].folder_name(), "Saison 2 - Alabasta");
    assert_eq!(config.title(1), Some("Je suis Luffy"));
}

#[test]
fn missing_show_config_is_read_error() {
    let result = ShowConfig::load(Path::new("tests/fixtures/does_not_exist.json"));
    assert!(matches!(result, Err(ConfigurationError::Read { .. })));
}

#[test]
fn overlapping_ranges_in_file_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("seasons_config.json");
    fs::write(
        &path,
        r#"{"show_name": "Show", "seasons": [
            {"season": 1, "folder": "S1", "range": [1, 10]},
            {"season": 2, "folder": "S2", "range": [10, 20]}
        ]}"#,
    )
    .expect("write config");

    let error = ShowConfig::load(&path).expect_err("ranges overlap");
    assert!(matches!(error, ConfigurationError::OverlappingRange { .. }));
    assert!(error.to_string().contains("10"));
}
