use std::hint::black_box;
use std::path::PathBuf;

use criterion::{Criterion, criterion_group, criterion_main};

use season_sort::organize::{
    EpisodeFile, FileKind, PlanOptions, SeasonSpec, ShowConfig, TransferMode, build_plan, find_season,
};

fn show_config() -> ShowConfig {
    let seasons = (0..20)
        .map(|index| SeasonSpec::new(index + 1, format!("Season {}", index + 1), index * 50 + 1, index * 50 + 50))
        .collect();
    ShowConfig::new("Benchmark Show", seasons).expect("valid config")
}

fn episode_files(count: u32) -> Vec<EpisodeFile> {
    (1..=count)
        .flat_map(|episode| {
            [
                EpisodeFile {
                    source_path: PathBuf::from(format!("/pack/Episodes/Show - {episode:03}.mkv")),
                    episode_number: episode,
                    kind: FileKind::Video,
                    sidecar_suffix: None,
                    extension: "mkv".to_string(),
                    technical_tag: None,
                },
                EpisodeFile {
                    source_path: PathBuf::from(format!("/pack/Episodes/Show - {episode:03}.fr.srt")),
                    episode_number: episode,
                    kind: FileKind::Sidecar,
                    sidecar_suffix: Some(".fr".to_string()),
                    extension: "srt".to_string(),
                    technical_tag: None,
                },
            ]
        })
        .collect()
}

fn bench_find_season(c: &mut Criterion) {
    let config = show_config();
    c.bench_function("find_season", |b| {
        b.iter(|| {
            for episode in (1..1000).step_by(7) {
                black_box(find_season(black_box(episode), &config));
            }
        });
    });
}

fn bench_build_plan(c: &mut Criterion) {
    let config = show_config();
    let files = episode_files(1000);
    let options = PlanOptions {
        show_root: PathBuf::from("/nonexistent/show"),
        mode: TransferMode::Move,
        overwrite: false,
        technical_tag: Some("1080p".to_string()),
    };
    c.bench_function("build_plan_2000_files", |b| {
        b.iter(|| build_plan(black_box(&files), &config, &options));
    });
}

criterion_group!(benches, bench_find_season, bench_build_plan);
criterion_main!(benches);
