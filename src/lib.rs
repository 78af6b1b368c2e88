//! # Chromaseek
//!
//! Color-based image recommendation. Chromaseek summarises every image in a
//! collection by its dominant colors, stores those summaries in an exact
//! nearest-neighbour index, and answers two questions: which images look
//! like this color, and which images look like this image.
//!
//! This crate is the umbrella over the pipeline stages:
//!
//! | Stage | Crate | Job |
//! |---|---|---|
//! | color space | [`colorspace`] | sRGB <-> CIELAB, hex formatting |
//! | loading | [`ingest`] | file discovery, decoding, downscaling |
//! | extraction | [`extract`] | seeded k-means palettes, LAB signatures |
//! | search | [`index`] | brute-force index, snapshot codec |
//! | querying | [`matcher`] | color parsing, scoring, ranking |
//!
//! [`Recommender`] ties them together with a build lifecycle, a bounded
//! extraction worker pool and catalog persistence.
//!
//! ## Example
//!
//! ```no_run
//! use chromaseek::{ColorInput, Recommender, RecommenderConfig};
//!
//! let recommender = Recommender::new(RecommenderConfig::default())?;
//! let stats = recommender.build_from_directory("photos", true)?;
//! println!("indexed {} images, {} failed", stats.indexed, stats.failed);
//!
//! let color: ColorInput = "#FF5733".parse()?;
//! for hit in recommender.recommend_by_color(&color, Some(5))? {
//!     let record = recommender.record(hit.id)?;
//!     println!("{:?} scored {:.3}", record.map(|r| r.path), hit.score);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration
//!
//! [`RecommenderConfig`] carries every knob with its default. The
//! [`config`] module loads the same settings from a versioned YAML file.

pub mod config;

mod catalog;
mod recommender;
mod types;

pub use crate::catalog::{CatalogSnapshot, ExtractionSettings, CATALOG_SCHEMA_VERSION};
pub use crate::config::{ChromaConfig, ConfigLoadError};
pub use crate::recommender::Recommender;
pub use crate::types::{
    BuildFailure, BuildStats, CancellationToken, ImageRecord, RecommenderConfig,
    RecommenderError, RecommenderState,
};

pub use colorspace::{lab_to_rgb, rgb_to_lab, Color, ColorError, LabColor};
pub use extract::{
    ColorPalette, DominantColorExtractor, ExtractConfig, ExtractError, FeatureVectorBuilder,
    ImageColors, Signature,
};
pub use index::{
    decode_snapshot, encode_snapshot, BruteForceIndex, CompressionCodec, CompressionConfig,
    IndexError, Neighbor, SimilarityIndex,
};
pub use ingest::{
    discover_images, DecodedImage, ImageFileLoader, ImageKind, ImageLoader, ImageSource,
    IngestError, LoaderConfig, PixelBuffer,
};
pub use matcher::{
    parse_color, set_match_metrics, ColorInput, ColorQueryEngine, MatchConfig, MatchError,
    MatchMetrics, QueryKind, QueryResult,
};
