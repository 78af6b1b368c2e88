//! # Chromaseek Color Extraction
//!
//! Turns an image's pixels into a ranked palette of dominant colors and then
//! into a fixed-length numeric signature that the index can compare.
//!
//! ## Contract
//!
//! - Input is decoded RGB pixels. This crate never touches files or codecs.
//! - Output is a pure function of `(pixels, config)`. All clustering
//!   randomness comes from [`ExtractConfig::seed`]; the same pixels and
//!   config always give a bit-identical palette and signature.
//! - Every palette has exactly `n_colors` entries and every signature
//!   exactly `n_colors * 3` floats, whatever the image looks like.
//!
//! ## Pipeline
//!
//! 1.  **Histogram**: pixels are collapsed into distinct colors with counts.
//! 2.  **Clustering**: weighted k-means with k-means++ seeding, repeated
//!     `n_init` times with derived seeds; the lowest-inertia run wins.
//!     Restarts can run on the rayon pool (`use_parallel`).
//! 3.  **Ranking**: clusters become [`Color`](colorspace::Color)s ordered by
//!     pixel share, merged when they round to the same RGB value, and padded
//!     with copies of the top color when the image has too few colors.
//! 4.  **Signature**: [`FeatureVectorBuilder`] concatenates the LAB triples.
//!
//! ## Example Usage
//!
//! ```
//! use extract::{extract_signature, ExtractConfig};
//!
//! let pixels = vec![[255u8, 0, 0]; 64];
//! let config = ExtractConfig::default().with_n_colors(3);
//!
//! let (palette, signature) = extract_signature(&pixels, &config).unwrap();
//!
//! assert_eq!(palette.len(), 3);
//! assert_eq!(palette.colors[0].rgb, [255, 0, 0]);
//! assert_eq!(signature.len(), 9);
//! ```
use std::time::Instant;

use tracing::debug;

pub mod config;
mod kmeans;
pub mod palette;
mod signature;

pub use crate::config::{ExtractConfig, ExtractError};
pub use crate::palette::{ColorPalette, ImageColors, PaletteMeta};
pub use crate::signature::{FeatureVectorBuilder, Signature};

/// Current extraction algorithm version.
pub const EXTRACT_VERSION: u16 = 1;

/// Human-readable algorithm identifier.
pub const EXTRACT_ALGORITHM: &str = "histogram+kmeanspp+lloyd_v1";

/// Extract the dominant-color palette of `pixels`.
pub fn extract_palette(
    pixels: &[[u8; 3]],
    cfg: &ExtractConfig,
) -> Result<ColorPalette, ExtractError> {
    cfg.validate()?;
    if pixels.is_empty() {
        return Err(ExtractError::EmptyImage);
    }

    let start = Instant::now();
    let points = kmeans::histogram(pixels);
    let clustering = kmeans::cluster(&points, cfg);
    let (colors, clusters) =
        palette::rank_clusters(&clustering, pixels.len() as u64, cfg.n_colors)?;

    debug!(
        pixels = pixels.len(),
        distinct = points.len(),
        clusters,
        iterations = clustering.iterations,
        inertia = clustering.inertia,
        elapsed_micros = start.elapsed().as_micros(),
        "palette_extracted"
    );

    Ok(ColorPalette {
        colors,
        meta: PaletteMeta {
            extract_version: EXTRACT_VERSION,
            algorithm_name: EXTRACT_ALGORITHM.to_string(),
            n_colors: cfg.n_colors,
            distinct_colors: points.len(),
            clusters,
            seed: cfg.seed,
            inertia: clustering.inertia,
            iterations: clustering.iterations,
            config_version: cfg.version,
        },
    })
}

/// Extract the palette and build its signature in one step.
pub fn extract_signature(
    pixels: &[[u8; 3]],
    cfg: &ExtractConfig,
) -> Result<(ColorPalette, Signature), ExtractError> {
    let palette = extract_palette(pixels, cfg)?;
    let signature = FeatureVectorBuilder::from_config(cfg).build(&palette)?;
    Ok((palette, signature))
}

/// A validated extraction configuration, ready to run.
#[derive(Debug, Clone)]
pub struct DominantColorExtractor {
    cfg: ExtractConfig,
    builder: FeatureVectorBuilder,
}

impl DominantColorExtractor {
    pub fn new(cfg: ExtractConfig) -> Result<Self, ExtractError> {
        cfg.validate()?;
        let builder = FeatureVectorBuilder::from_config(&cfg);
        Ok(Self { cfg, builder })
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.cfg
    }

    pub fn builder(&self) -> &FeatureVectorBuilder {
        &self.builder
    }

    pub fn dimension(&self) -> usize {
        self.builder.dimension()
    }

    pub fn extract(&self, pixels: &[[u8; 3]]) -> Result<ColorPalette, ExtractError> {
        extract_palette(pixels, &self.cfg)
    }

    /// Extract with an explicit seed instead of the configured one.
    pub fn extract_with_seed(
        &self,
        pixels: &[[u8; 3]],
        seed: u64,
    ) -> Result<ColorPalette, ExtractError> {
        let cfg = self.cfg.clone().with_seed(seed);
        extract_palette(pixels, &cfg)
    }

    pub fn signature(&self, pixels: &[[u8; 3]]) -> Result<(ColorPalette, Signature), ExtractError> {
        let palette = self.extract(pixels)?;
        let signature = self.builder.build(&palette)?;
        Ok((palette, signature))
    }
}
