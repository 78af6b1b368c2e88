//! Palette types produced by the extractor.
//!
//! A [`ColorPalette`] always holds exactly `n_colors` entries, ordered by
//! weight (largest first). Palettes and their metadata are part of the
//! stored catalog, so any change to how they are formed must bump
//! [`crate::EXTRACT_VERSION`].

use colorspace::{to_hex, Color};
use serde::{Deserialize, Serialize};

use crate::config::ExtractError;
use crate::kmeans::Clustering;

/// Ranked dominant colors of one image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColorPalette {
    /// Exactly `meta.n_colors` entries, non-increasing by weight.
    pub colors: Vec<Color>,
    pub meta: PaletteMeta,
}

/// How a palette was produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaletteMeta {
    pub extract_version: u16,
    pub algorithm_name: String,
    pub n_colors: usize,
    /// Distinct RGB values in the input pixels.
    pub distinct_colors: usize,
    /// Distinct palette colors before padding.
    pub clusters: usize,
    pub seed: u64,
    /// Inertia of the winning clustering run, in squared RGB units.
    pub inertia: f64,
    pub iterations: usize,
    pub config_version: u32,
}

impl ColorPalette {
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The most prevalent color.
    pub fn dominant(&self) -> Option<&Color> {
        self.colors.first()
    }

    /// Column-wise view for display and export.
    pub fn to_image_colors(&self) -> ImageColors {
        ImageColors {
            rgb_colors: self.colors.iter().map(|c| c.rgb).collect(),
            lab_colors: self.colors.iter().map(|c| c.lab.to_array()).collect(),
            hex_colors: self.colors.iter().map(|c| to_hex(c.rgb)).collect(),
            weights: self.colors.iter().map(|c| c.weight).collect(),
        }
    }
}

/// A palette split into parallel columns, one row per palette slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageColors {
    pub rgb_colors: Vec<[u8; 3]>,
    pub lab_colors: Vec<[f32; 3]>,
    pub hex_colors: Vec<String>,
    pub weights: Vec<f32>,
}

/// Turn raw clusters into ranked palette colors.
///
/// Empty clusters are dropped and clusters that round to the same RGB value
/// are merged. The survivors are sorted by pixel count, largest first, with
/// ties kept in cluster-index order. When fewer than `n_colors` remain,
/// copies of the top color are inserted right after it; they carry its
/// weight so the ordering stays non-increasing.
pub(crate) fn rank_clusters(
    clustering: &Clustering,
    total_pixels: u64,
    n_colors: usize,
) -> Result<(Vec<Color>, usize), ExtractError> {
    let mut merged: Vec<Merged> = Vec::with_capacity(clustering.centroids.len());
    for (centroid, &count) in clustering.centroids.iter().zip(&clustering.counts) {
        if count == 0 {
            continue;
        }
        let rgb = centroid.map(|c| colorspace::unit_to_byte(c / 255.0));
        match merged.iter_mut().find(|m| m.rgb == rgb) {
            Some(existing) => existing.absorb(centroid, count),
            None => merged.push(Merged::new(rgb, centroid, count)),
        }
    }

    // Stable sort: equal counts keep cluster-index order.
    merged.sort_by(|a, b| b.count.cmp(&a.count));

    let mut colors = Vec::with_capacity(n_colors);
    for m in merged.iter().take(n_colors) {
        let weight = (m.count as f64 / total_pixels as f64) as f32;
        colors.push(Color::from_unit_rgb(m.unit(), weight)?);
    }
    let clusters = colors.len();

    if let Some(top) = colors.first().copied() {
        while colors.len() < n_colors {
            colors.insert(1, top);
        }
    }

    Ok((colors, clusters))
}

struct Merged {
    rgb: [u8; 3],
    sum: [f64; 3],
    count: u64,
}

impl Merged {
    fn new(rgb: [u8; 3], centroid: &[f32; 3], count: u64) -> Self {
        let w = count as f64;
        Self {
            rgb,
            sum: centroid.map(|c| c as f64 * w),
            count,
        }
    }

    fn absorb(&mut self, centroid: &[f32; 3], count: u64) {
        let w = count as f64;
        for (s, c) in self.sum.iter_mut().zip(centroid) {
            *s += *c as f64 * w;
        }
        self.count += count;
    }

    /// Pixel-weighted mean centroid on the 0-1 scale.
    fn unit(&self) -> [f32; 3] {
        let w = self.count as f64 * 255.0;
        self.sum.map(|s| (s / w) as f32)
    }
}
