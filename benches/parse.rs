use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use season_sort::organize::{parse_episode_number, parse_extension_list};

const FILE_STEMS: &[&str] = &[
    "One Piece - 045 - xxx",
    "One Piece Yabai - S06E045 -  - 1080p",
    "[Team] One Piece Kai 045 [1080p]",
    "One.Piece.Kai.E045.VOSTFR",
    "One Piece Kai #132",
    "Bonus features",
];

fn bench_parse_episode_number(c: &mut Criterion) {
    c.bench_function("parse_episode_number", |b| {
        b.iter(|| {
            for stem in FILE_STEMS {
                black_box(parse_episode_number(black_box(stem)));
            }
        });
    });
}

fn bench_parse_extension_list(c: &mut Criterion) {
    c.bench_function("parse_extension_list", |b| {
        b.iter(|| parse_extension_list(black_box(".mkv, MP4,avi,,.webm")));
    });
}

criterion_group!(benches, bench_parse_episode_number, bench_parse_extension_list);
criterion_main!(benches);
