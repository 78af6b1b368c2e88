//! Builds are reproducible: same images and seed, same signatures and
//! rankings, whatever the worker count.

mod common;

use chromaseek::{ColorInput, ExtractConfig, Recommender, RecommenderConfig};
use common::{banded, gradient, MemoryLoader};

fn loader() -> MemoryLoader {
    MemoryLoader::new()
        .with_image("sunset", gradient(40, 30, [200, 60, 10]))
        .with_image("ocean", gradient(40, 30, [0, 60, 140]))
        .with_image("forest", gradient(40, 30, [20, 120, 30]))
        .with_image(
            "flag",
            banded(30, 10, &[([255, 0, 0], 1), ([255, 255, 255], 1), ([0, 0, 255], 1)]),
        )
        .with_image("dusk", gradient(40, 30, [90, 40, 120]))
        .with_solid("ember", [230, 80, 20])
}

const NAMES: [&str; 6] = ["sunset", "ocean", "forest", "flag", "dusk", "ember"];

fn build(cfg: RecommenderConfig) -> Recommender {
    let recommender = common::recommender_with(loader(), cfg);
    let stats = recommender.build(&common::paths(&NAMES)).unwrap();
    assert_eq!(stats.indexed, NAMES.len());
    recommender
}

fn signatures(recommender: &Recommender) -> Vec<Vec<f32>> {
    (0..recommender.len())
        .map(|id| recommender.signature(id).unwrap().unwrap())
        .collect()
}

fn queries() -> Vec<ColorInput> {
    ["#FF0000", "#0044AA", "#20A030", "#F0F0F0", "(0.5, 0.2, 0.6)"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect()
}

#[test]
fn repeated_builds_are_identical() {
    let cfg = RecommenderConfig::default().with_workers(3);
    let first = build(cfg.clone());
    let second = build(cfg);

    assert_eq!(signatures(&first), signatures(&second));
    assert_eq!(first.records().unwrap(), second.records().unwrap());
    for query in queries() {
        assert_eq!(
            first.recommend_by_color(&query, Some(6)).unwrap(),
            second.recommend_by_color(&query, Some(6)).unwrap()
        );
    }
}

#[test]
fn worker_count_does_not_change_results() {
    let single = build(RecommenderConfig::default().with_workers(1));
    let many = build(RecommenderConfig::default().with_workers(8));
    assert_eq!(signatures(&single), signatures(&many));
    assert_eq!(single.records().unwrap(), many.records().unwrap());
}

#[test]
fn parallel_restarts_match_sequential() {
    let sequential = build(RecommenderConfig::default());
    let parallel = build(
        RecommenderConfig::default().with_extract(ExtractConfig::default().with_parallel(true)),
    );
    assert_eq!(signatures(&sequential), signatures(&parallel));
}

#[test]
fn rebuilding_in_place_is_stable() {
    let recommender = build(RecommenderConfig::default());
    let before = signatures(&recommender);
    recommender.build(&common::paths(&NAMES)).unwrap();
    assert_eq!(signatures(&recommender), before);
}

#[test]
fn image_queries_are_reproducible() {
    let a = build(RecommenderConfig::default());
    let b = build(RecommenderConfig::default());
    for name in NAMES {
        assert_eq!(
            a.recommend_by_image(name, Some(4), true).unwrap(),
            b.recommend_by_image(name, Some(4), true).unwrap()
        );
    }
}

#[test]
fn signature_length_is_fixed_for_every_image() {
    for n_colors in [1, 3, 5, 8] {
        let cfg = RecommenderConfig::default()
            .with_extract(ExtractConfig::default().with_n_colors(n_colors));
        let recommender = build(cfg);
        for signature in signatures(&recommender) {
            assert_eq!(signature.len(), n_colors * 3);
        }
    }
}
