//! # Chromaseek Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` is the query side of chromaseek. It sits between callers and
//! the `index` crate: it turns a color or an image into a signature in the
//! same space as the catalog, asks the index for nearest neighbours, and
//! converts raw distances into bounded similarity scores that can be
//! thresholded and ranked.
//!
//! ## Core Types
//!
//! - [`ColorInput`]: what a caller may pass as a color: hex text, an 8-bit
//!   triple, or a normalized float triple. Also parses from text.
//! - [`parse_color`]: the single validation point for every [`ColorInput`].
//! - [`MatchConfig`]: threshold (default 0.70), score scale and default `k`.
//! - [`ColorQueryEngine`]: builds query signatures, scores and ranks.
//! - [`QueryResult`]: id, distance and score of one match.
//!
//! ## Example Usage
//!
//! ```
//! use extract::ExtractConfig;
//! use index::{BruteForceIndex, SimilarityIndex};
//! use matcher::{ColorInput, ColorQueryEngine, MatchConfig};
//!
//! let engine = ColorQueryEngine::new(MatchConfig::default(), ExtractConfig::default()).unwrap();
//!
//! let mut catalog = BruteForceIndex::new();
//! let red_image = vec![[255u8, 0, 0]; 16];
//! catalog.insert(&engine.image_query_vector(&red_image).unwrap()).unwrap();
//!
//! let input: ColorInput = "#FF0000".parse().unwrap();
//! let hits = engine.query_color(&catalog, &input, 5).unwrap();
//! assert_eq!(hits[0].id, 0);
//! assert!(hits[0].score >= 0.99);
//! ```
//!
//! ## Observability
//!
//! Install a [`MatchMetrics`] implementation via [`set_match_metrics`] to record
//! per-query latency and hit counts. Every query also emits a
//! `query_complete` debug event through `tracing`.

pub mod engine;
pub mod metrics;
pub mod types;

pub use crate::engine::{parse_color, ColorQueryEngine};
pub use crate::metrics::{set_match_metrics, MatchMetrics};
pub use crate::types::{
    ColorInput, MatchConfig, MatchError, QueryKind, QueryResult, SCALE_PER_COLOR,
};
