use std::hint::black_box;

use chromaseek::{
    BruteForceIndex, ColorInput, ColorQueryEngine, DominantColorExtractor, ExtractConfig,
    MatchConfig,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// `side x side` pixels scattered around a handful of base colors.
fn clustered_image(side: usize, seed: u64) -> Vec<[u8; 3]> {
    const BASES: [[u8; 3]; 6] = [
        [220, 40, 30],
        [30, 90, 200],
        [240, 230, 210],
        [40, 140, 60],
        [20, 20, 25],
        [250, 180, 40],
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..side * side)
        .map(|_| {
            let base = BASES[rng.gen_range(0..BASES.len())];
            base.map(|c| c.saturating_add(rng.gen_range(0..12)))
        })
        .collect()
}

fn random_signatures(count: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            (0..dim)
                .map(|i| match i % 3 {
                    0 => rng.gen_range(0.0f32..100.0),
                    _ => rng.gen_range(-128.0f32..127.0),
                })
                .collect()
        })
        .collect()
}

fn extraction_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_palette");
    group.sample_size(20);
    for side in [32usize, 64, 128] {
        let pixels = clustered_image(side, 7);
        for use_parallel in [false, true] {
            let extractor =
                DominantColorExtractor::new(ExtractConfig::default().with_parallel(use_parallel))
                    .expect("valid extract config");
            let label = if use_parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(label, side), &pixels, |b, pixels| {
                b.iter(|| extractor.signature(black_box(pixels)).unwrap());
            });
        }
    }
    group.finish();
}

fn color_query_bench(c: &mut Criterion) {
    let engine = ColorQueryEngine::new(MatchConfig::default().with_threshold(0.0), ExtractConfig::default())
        .expect("valid engine config");
    let query = ColorInput::hex("#FF5733");
    let mut group = c.benchmark_group("recommend_by_color");
    for size in [1_000usize, 10_000] {
        let index = BruteForceIndex::from_signatures(&random_signatures(size, 15, 42))
            .expect("valid signatures");
        group.bench_with_input(BenchmarkId::new("top10", size), &index, |b, index| {
            b.iter(|| engine.query_color(index, black_box(&query), 10).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, extraction_bench, color_query_bench);
criterion_main!(benches);
