use super::*;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use colorspace::rgb_to_lab;
use index::BruteForceIndex;

use crate::metrics::{set_match_metrics, MatchMetrics};

fn engine() -> ColorQueryEngine {
    ColorQueryEngine::new(MatchConfig::default(), ExtractConfig::default()).unwrap()
}

fn solid(rgb: [u8; 3]) -> Vec<[u8; 3]> {
    vec![rgb; 64]
}

/// Index of solid red, green, blue and a dark red, in that id order.
fn catalog(engine: &ColorQueryEngine) -> BruteForceIndex {
    let mut index = BruteForceIndex::with_dimension(engine.extractor().dimension());
    for rgb in [[255, 0, 0], [0, 255, 0], [0, 0, 255], [200, 0, 0]] {
        let sig = engine.image_query_vector(&solid(rgb)).unwrap();
        index.insert(&sig).unwrap();
    }
    index
}

// ==================== parse_color ====================

#[test]
fn hex_with_and_without_marker() {
    let a = parse_color(&ColorInput::hex("#FF5733")).unwrap();
    let b = parse_color(&ColorInput::hex("ff5733")).unwrap();
    assert_eq!(a.rgb, [255, 87, 51]);
    assert_eq!(a, b);
    assert_eq!(a.weight, 1.0);
}

#[test]
fn bad_hex_names_the_value() {
    for raw in ["#FFF", "#GG0000", "FF00000", "", "#FF 000"] {
        match parse_color(&ColorInput::hex(raw)) {
            Err(MatchError::InvalidColorFormat { value, .. }) => assert_eq!(value, raw),
            other => panic!("expected InvalidColorFormat for {raw:?}, got {other:?}"),
        }
    }
}

#[test]
fn integer_and_normalized_triples() {
    let int = parse_color(&ColorInput::IntegerRgb(255, 87, 51)).unwrap();
    let norm = parse_color(&ColorInput::NormalizedRgb(1.0, 0.34, 0.20)).unwrap();
    assert_eq!(int.rgb, norm.rgb);
    assert_eq!(int.lab, rgb_to_lab([255, 87, 51]));
}

#[test]
fn normalized_out_of_range_rejected() {
    for input in [
        ColorInput::NormalizedRgb(1.2, 0.0, 0.0),
        ColorInput::NormalizedRgb(0.0, -0.1, 0.0),
        ColorInput::NormalizedRgb(0.0, 0.0, f32::NAN),
    ] {
        assert!(matches!(
            parse_color(&input),
            Err(MatchError::InvalidColorFormat { .. })
        ));
    }
}

// ==================== query vectors and scoring ====================

#[test]
fn color_vector_replicates_lab() {
    let engine = engine();
    let color = parse_color(&ColorInput::hex("#336699")).unwrap();
    let sig = engine.color_query_vector(&color);
    assert_eq!(sig.len(), 15);
    for chunk in sig.chunks_exact(3) {
        assert_eq!(chunk, &color.lab.to_array());
    }
}

#[test]
fn score_is_bounded_and_monotone() {
    let engine = engine();
    assert_eq!(engine.scale(), 50_000.0);
    assert_eq!(engine.score(0.0), 1.0);
    assert_eq!(engine.score(engine.scale()), 0.0);
    assert_eq!(engine.score(engine.scale() * 3.0), 0.0);
    let mut last = 1.0;
    for step in 0..100 {
        let s = engine.score(step as f32 * 750.0);
        assert!(s <= last);
        assert!((0.0..=1.0).contains(&s));
        last = s;
    }
}

#[test]
fn rank_filters_sorts_and_never_pads() {
    let engine = engine();
    let neighbors = vec![
        Neighbor { id: 4, distance: 40_000.0 },
        Neighbor { id: 1, distance: 500.0 },
        Neighbor { id: 3, distance: 500.0 },
        Neighbor { id: 0, distance: 0.0 },
    ];
    let ranked = engine.rank(&neighbors, 0.70, 10);
    let ids: Vec<usize> = ranked.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![0, 1, 3]);
    assert!(ranked.iter().all(|r| r.score >= 0.70));
    assert_eq!(ranked[0].score, 1.0);

    let top = engine.rank(&neighbors, 0.0, 2);
    assert_eq!(top.len(), 2);
    assert!(engine.rank(&neighbors, 1.0, 10).len() == 1);
}

// ==================== end-to-end queries ====================

#[test]
fn red_query_finds_red_first() {
    let engine = engine();
    let index = catalog(&engine);
    let results = engine
        .query_color(&index, &ColorInput::hex("#FF0000"), 5)
        .unwrap();
    assert_eq!(results[0].id, 0);
    assert!(results[0].score >= 0.99);
    assert!(results.len() <= 5);
    assert!(results.iter().all(|r| r.score >= 0.70));
    assert!(results.iter().all(|r| r.id != 1 && r.id != 2));
}

#[test]
fn empty_index_gives_empty_results() {
    let engine = engine();
    let index = BruteForceIndex::with_dimension(15);
    assert!(engine
        .query_color(&index, &ColorInput::IntegerRgb(1, 2, 3), 10)
        .unwrap()
        .is_empty());
}

#[test]
fn invalid_color_fails_before_search() {
    let engine = engine();
    let index = catalog(&engine);
    assert!(matches!(
        engine.query_color(&index, &ColorInput::hex("nope"), 5),
        Err(MatchError::InvalidColorFormat { .. })
    ));
}

#[test]
fn image_query_excludes_self() {
    let engine = engine();
    let index = catalog(&engine);
    let with_self = engine
        .query_image(&index, &solid([255, 0, 0]), 3, None)
        .unwrap();
    assert_eq!(with_self[0].id, 0);
    assert_eq!(with_self[0].distance, 0.0);

    let without_self = engine
        .query_image(&index, &solid([255, 0, 0]), 3, Some(0))
        .unwrap();
    assert!(without_self.iter().all(|r| r.id != 0));
}

#[test]
fn dimension_mismatch_surfaces() {
    let engine = engine();
    let index = catalog(&engine);
    assert!(matches!(
        engine.query_signature(&index, &[0.0; 3], 5, None, QueryKind::Color),
        Err(MatchError::Index(index::IndexError::DimensionMismatch {
            expected: 15,
            actual: 3
        }))
    ));
}

#[test]
fn invalid_config_rejected_at_construction() {
    let cfg = MatchConfig::default().with_threshold(-0.1);
    assert!(ColorQueryEngine::new(cfg, ExtractConfig::default()).is_err());
    let extract_cfg = ExtractConfig::default().with_n_colors(0);
    assert!(matches!(
        ColorQueryEngine::new(MatchConfig::default(), extract_cfg),
        Err(MatchError::Extract(_))
    ));
}

// ==================== metrics ====================

struct RecordingMetrics {
    events: RwLock<Vec<(QueryKind, usize)>>,
}

impl RecordingMetrics {
    fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }
}

impl MatchMetrics for RecordingMetrics {
    fn record_query(&self, kind: QueryKind, _latency: Duration, hit_count: usize) {
        self.events.write().unwrap().push((kind, hit_count));
    }
}

#[test]
fn metrics_recorder_observes_queries() {
    let engine = engine();
    let index = catalog(&engine);
    let metrics = Arc::new(RecordingMetrics::new());
    set_match_metrics(Some(metrics.clone()));

    let hits = engine
        .query_image(&index, &solid([0, 0, 255]), 2, None)
        .unwrap();
    set_match_metrics(None);

    let events = metrics.events.read().unwrap();
    assert!(events.contains(&(QueryKind::Image, hits.len())));
}
