use bugboard_core::cache::ReportCache;
use bugboard_core::filter::{self, FilterQuery, StatusSelector};
use bugboard_core::model::{Note, Report, Status};
use chrono::{Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIZES: [usize; 3] = [100, 1_000, 10_000];
const WORDS: [&str; 8] = [
    "login", "crash", "export", "printer", "timeout", "layout", "upload", "search",
];

fn synthetic_board(size: usize, seed: u64) -> Vec<Report> {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    (0..size)
        .map(|i| {
            let at = base - Duration::minutes(i as i64);
            let word = WORDS[rng.gen_range(0..WORDS.len())];
            let status = Status::ALL[rng.gen_range(0..Status::ALL.len())];
            Report {
                id: format!("r{i:05}"),
                title: format!("{word} issue #{i}"),
                description: rng
                    .gen_bool(0.6)
                    .then(|| format!("Steps: open the {word} page and wait")),
                reporter: rng.gen_bool(0.5).then(|| format!("user{}", i % 37)),
                created_at: at,
                status,
                notes: vec![Note::new("Request received.", at, None)],
            }
        })
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter.apply");

    for size in SIZES {
        let reports = synthetic_board(size, 0xB0A2D_u64 + size as u64);
        group.throughput(Throughput::Elements(size as u64));

        let queries = [
            ("all", FilterQuery::default()),
            ("search", FilterQuery::new("Crash", StatusSelector::All)),
            (
                "search+status",
                FilterQuery::new("printer", StatusSelector::Only(Status::InProgress)),
            ),
        ];
        for (name, query) in &queries {
            group.bench_with_input(BenchmarkId::new(*name, size), &reports, |b, reports| {
                b.iter(|| black_box(filter::apply(reports, query).matched));
            });
        }
    }

    group.finish();
}

fn bench_replace_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache.replace_all");

    for size in SIZES {
        let reports = synthetic_board(size, 0x5EED_u64 + size as u64);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &reports, |b, reports| {
            let mut cache = ReportCache::new();
            b.iter(|| {
                cache.replace_all(reports.clone());
                black_box(cache.stats())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_filter, bench_replace_all);
criterion_main!(benches);
