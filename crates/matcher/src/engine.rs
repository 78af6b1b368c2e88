use std::cmp::Ordering;
use std::time::Instant;

use colorspace::Color;
use extract::{DominantColorExtractor, ExtractConfig, Signature};
use index::{Neighbor, SimilarityIndex};
use tracing::debug;

use crate::metrics::metrics_recorder;
use crate::types::{ColorInput, MatchConfig, MatchError, QueryKind, QueryResult};

#[cfg(test)]
mod tests;

/// Validate a caller-supplied color and convert it to a canonical [`Color`]
/// with weight 1.0.
pub fn parse_color(input: &ColorInput) -> Result<Color, MatchError> {
    let color = match input {
        ColorInput::Hex(raw) => Color::from_rgb(parse_hex(raw)?, 1.0),
        ColorInput::IntegerRgb(r, g, b) => Color::from_rgb([*r, *g, *b], 1.0),
        ColorInput::NormalizedRgb(r, g, b) => {
            for value in [r, g, b] {
                if !value.is_finite() || !(0.0..=1.0).contains(value) {
                    return Err(MatchError::invalid_color(
                        input,
                        format!("component {value} is outside 0.0-1.0"),
                    ));
                }
            }
            Color::from_unit_rgb([*r, *g, *b], 1.0)
        }
    };
    color.map_err(|err| MatchError::invalid_color(input, err.to_string()))
}

fn parse_hex(raw: &str) -> Result<[u8; 3], MatchError> {
    let digits = raw.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(MatchError::invalid_color(
            raw,
            "expected exactly 6 hex digits after an optional '#'",
        ));
    }
    let channel = |at: usize| {
        u8::from_str_radix(&digits[at..at + 2], 16)
            .map_err(|err| MatchError::invalid_color(raw, err.to_string()))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// Turns colors and images into query signatures, and index distances into
/// ranked, scored results.
///
/// Image queries run the same extractor as the build path, so query and
/// catalog signatures are always produced identically.
#[derive(Debug, Clone)]
pub struct ColorQueryEngine {
    cfg: MatchConfig,
    extractor: DominantColorExtractor,
    scale: f32,
}

impl ColorQueryEngine {
    pub fn new(cfg: MatchConfig, extract_cfg: ExtractConfig) -> Result<Self, MatchError> {
        cfg.validate()?;
        let extractor = DominantColorExtractor::new(extract_cfg)?;
        let scale = cfg.resolved_scale(extractor.config().n_colors);
        Ok(Self {
            cfg,
            extractor,
            scale,
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    pub fn extractor(&self) -> &DominantColorExtractor {
        &self.extractor
    }

    /// Distance that maps to score 0.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn parse_color(&self, input: &ColorInput) -> Result<Color, MatchError> {
        parse_color(input)
    }

    /// The color's LAB triple in every palette slot, so a single color sits
    /// in the same space as catalog signatures.
    pub fn color_query_vector(&self, color: &Color) -> Signature {
        self.extractor.builder().uniform(color.lab)
    }

    pub fn image_query_vector(&self, pixels: &[[u8; 3]]) -> Result<Signature, MatchError> {
        let (_, signature) = self.extractor.signature(pixels)?;
        Ok(signature)
    }

    /// `max(0, 1 - distance / scale)`, clamped to `[0, 1]`.
    pub fn score(&self, distance: f32) -> f32 {
        (1.0 - distance / self.scale).clamp(0.0, 1.0)
    }

    /// Score `neighbors`, drop those under `threshold`, order by score
    /// (then id) and keep at most `k`. Never pads.
    pub fn rank(&self, neighbors: &[Neighbor], threshold: f32, k: usize) -> Vec<QueryResult> {
        let mut results: Vec<QueryResult> = neighbors
            .iter()
            .map(|n| QueryResult {
                id: n.id,
                distance: n.distance,
                score: self.score(n.distance),
            })
            .filter(|r| r.score >= threshold)
            .collect();

        results.sort_unstable_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    a.distance
                        .partial_cmp(&b.distance)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(k);
        results
    }

    /// Top `k` catalog entries closest to a single color.
    pub fn query_color(
        &self,
        index: &dyn SimilarityIndex,
        input: &ColorInput,
        k: usize,
    ) -> Result<Vec<QueryResult>, MatchError> {
        let color = parse_color(input)?;
        let signature = self.color_query_vector(&color);
        self.run(index, &signature, k, None, QueryKind::Color)
    }

    /// Top `k` catalog entries closest to an image. `exclude` removes one id
    /// (typically the query image itself) before truncation.
    pub fn query_image(
        &self,
        index: &dyn SimilarityIndex,
        pixels: &[[u8; 3]],
        k: usize,
        exclude: Option<usize>,
    ) -> Result<Vec<QueryResult>, MatchError> {
        let signature = self.image_query_vector(pixels)?;
        self.run(index, &signature, k, exclude, QueryKind::Image)
    }

    /// Search with a ready-made signature.
    pub fn query_signature(
        &self,
        index: &dyn SimilarityIndex,
        signature: &[f32],
        k: usize,
        exclude: Option<usize>,
        kind: QueryKind,
    ) -> Result<Vec<QueryResult>, MatchError> {
        self.run(index, signature, k, exclude, kind)
    }

    fn run(
        &self,
        index: &dyn SimilarityIndex,
        signature: &[f32],
        k: usize,
        exclude: Option<usize>,
        kind: QueryKind,
    ) -> Result<Vec<QueryResult>, MatchError> {
        let start = Instant::now();
        // Score is monotone in distance, so the k nearest (plus one slot for
        // an excluded id) hold every result that can survive the threshold.
        let fetch = if exclude.is_some() {
            k.saturating_add(1)
        } else {
            k
        };
        let mut neighbors = index.search(signature, fetch)?;
        if let Some(excluded) = exclude {
            neighbors.retain(|n| n.id != excluded);
        }
        let results = self.rank(&neighbors, self.cfg.threshold, k);

        let latency = start.elapsed();
        debug!(
            kind = kind.as_str(),
            k,
            candidates = neighbors.len(),
            hits = results.len(),
            elapsed_micros = latency.as_micros(),
            "query_complete"
        );
        if let Some(recorder) = metrics_recorder() {
            recorder.record_query(kind, latency, results.len());
        }
        Ok(results)
    }
}
