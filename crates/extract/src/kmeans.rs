//! Seeded k-means over an image's distinct colors.
//!
//! Pixels are first collapsed into a histogram of distinct RGB values, and
//! clustering runs over those weighted points. The result is identical to
//! clustering every pixel, at a fraction of the cost for typical photos.
//!
//! Each restart draws from its own `ChaCha8Rng`, seeded from the configured
//! seed and the restart number, so restarts can run in any order (or in
//! parallel) and still produce the same winner.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::ExtractConfig;

/// A distinct input color and the number of pixels that carry it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WeightedPoint {
    /// Channels on the 0-255 scale.
    pub rgb: [f32; 3],
    pub count: u64,
}

/// Outcome of clustering: one centroid per cluster, in cluster-index order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Clustering {
    /// Centroids on the 0-255 scale.
    pub centroids: Vec<[f32; 3]>,
    /// Pixels assigned to each centroid. May contain zeros.
    pub counts: Vec<u64>,
    /// Pixel-weighted sum of squared distances to the assigned centroid.
    pub inertia: f64,
    /// Update rounds the winning run needed.
    pub iterations: usize,
}

/// Collapse pixels into distinct colors, ordered by RGB value.
pub(crate) fn histogram(pixels: &[[u8; 3]]) -> Vec<WeightedPoint> {
    let mut counts: HashMap<[u8; 3], u64> = HashMap::new();
    for px in pixels {
        *counts.entry(*px).or_insert(0) += 1;
    }
    let mut distinct: Vec<([u8; 3], u64)> = counts.into_iter().collect();
    distinct.sort_unstable_by_key(|(rgb, _)| *rgb);
    distinct
        .into_iter()
        .map(|(rgb, count)| WeightedPoint {
            rgb: [rgb[0] as f32, rgb[1] as f32, rgb[2] as f32],
            count,
        })
        .collect()
}

/// Cluster `points` into at most `cfg.n_colors` groups.
///
/// With no more distinct colors than clusters, every color is its own
/// cluster and no randomness is involved.
pub(crate) fn cluster(points: &[WeightedPoint], cfg: &ExtractConfig) -> Clustering {
    let k = cfg.n_colors;
    if points.len() <= k {
        return Clustering {
            centroids: points.iter().map(|p| p.rgb).collect(),
            counts: points.iter().map(|p| p.count).collect(),
            inertia: 0.0,
            iterations: 0,
        };
    }

    let tol = convergence_threshold(points, cfg.tolerance);
    let first = run_once(points, k, cfg.max_iter, tol, run_seed(cfg.seed, 0));

    let rest: Vec<Clustering> = if cfg.use_parallel {
        (1..cfg.n_init)
            .into_par_iter()
            .map(|run| run_once(points, k, cfg.max_iter, tol, run_seed(cfg.seed, run)))
            .collect()
    } else {
        (1..cfg.n_init)
            .map(|run| run_once(points, k, cfg.max_iter, tol, run_seed(cfg.seed, run)))
            .collect()
    };

    // Strict `<` keeps the earliest run on ties.
    rest.into_iter().fold(first, |best, next| {
        if next.inertia < best.inertia {
            next
        } else {
            best
        }
    })
}

/// One k-means++ initialised Lloyd run.
pub(crate) fn run_once(
    points: &[WeightedPoint],
    k: usize,
    max_iter: usize,
    tol: f64,
    seed: u64,
) -> Clustering {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut centroids = init_plus_plus(points, k, &mut rng);
    let mut labels = vec![usize::MAX; points.len()];
    let mut iterations = 0;

    for round in 0..max_iter {
        let changed = assign(points, &centroids, &mut labels);
        let updated = update(points, &labels, &centroids);
        let shift: f64 = centroids
            .iter()
            .zip(&updated)
            .map(|(old, new)| squared_distance(old, new) as f64)
            .sum();
        centroids = updated;
        iterations = round + 1;
        if changed == 0 || shift <= tol {
            break;
        }
    }

    // Final labels must agree with the final centroids.
    assign(points, &centroids, &mut labels);
    let mut counts = vec![0u64; k];
    let mut inertia = 0.0f64;
    for (point, &label) in points.iter().zip(&labels) {
        counts[label] += point.count;
        inertia += point.count as f64 * squared_distance(&point.rgb, &centroids[label]) as f64;
    }

    Clustering {
        centroids,
        counts,
        inertia,
        iterations,
    }
}

/// k-means++ seeding: each new centroid is drawn with probability
/// proportional to `count * D(x)^2`.
fn init_plus_plus(points: &[WeightedPoint], k: usize, rng: &mut ChaCha8Rng) -> Vec<[f32; 3]> {
    let mut centroids = Vec::with_capacity(k);
    let mut weights: Vec<f64> = points.iter().map(|p| p.count as f64).collect();
    let first = sample_weighted(&weights, rng).unwrap_or(0);
    centroids.push(points[first].rgb);

    let mut closest: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(&p.rgb, &points[first].rgb) as f64)
        .collect();

    while centroids.len() < k {
        for ((w, p), d) in weights.iter_mut().zip(points).zip(&closest) {
            *w = p.count as f64 * d;
        }
        let next = sample_weighted(&weights, rng)
            .or_else(|| closest.iter().position(|d| *d > 0.0))
            .unwrap_or(0);
        let chosen = points[next].rgb;
        centroids.push(chosen);
        for (d, p) in closest.iter_mut().zip(points) {
            let candidate = squared_distance(&p.rgb, &chosen) as f64;
            if candidate < *d {
                *d = candidate;
            }
        }
    }
    centroids
}

/// Draw an index with probability proportional to its weight. `None` when
/// every weight is zero.
pub(crate) fn sample_weighted(weights: &[f64], rng: &mut ChaCha8Rng) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if total.is_nan() || total <= 0.0 {
        return None;
    }
    let target = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (idx, w) in weights.iter().enumerate() {
        cumulative += w;
        if *w > 0.0 && cumulative > target {
            return Some(idx);
        }
    }
    // Rounding can leave `target` a hair above the final sum.
    weights.iter().rposition(|w| *w > 0.0)
}

/// Label each point with its nearest centroid (lowest index on ties).
/// Returns how many labels changed.
fn assign(points: &[WeightedPoint], centroids: &[[f32; 3]], labels: &mut [usize]) -> usize {
    let mut changed = 0;
    for (point, label) in points.iter().zip(labels.iter_mut()) {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (idx, centroid) in centroids.iter().enumerate() {
            let dist = squared_distance(&point.rgb, centroid);
            if dist < best_dist {
                best = idx;
                best_dist = dist;
            }
        }
        if *label != best {
            *label = best;
            changed += 1;
        }
    }
    changed
}

/// Recompute centroids as pixel-weighted means. A cluster left empty is
/// moved onto the point farthest from its current centroid.
fn update(points: &[WeightedPoint], labels: &[usize], previous: &[[f32; 3]]) -> Vec<[f32; 3]> {
    let k = previous.len();
    let mut sums = vec![[0.0f64; 3]; k];
    let mut mass = vec![0.0f64; k];
    for (point, &label) in points.iter().zip(labels) {
        let w = point.count as f64;
        for c in 0..3 {
            sums[label][c] += point.rgb[c] as f64 * w;
        }
        mass[label] += w;
    }

    let mut next = previous.to_vec();
    let mut empty = Vec::new();
    for idx in 0..k {
        if mass[idx] > 0.0 {
            next[idx] = [
                (sums[idx][0] / mass[idx]) as f32,
                (sums[idx][1] / mass[idx]) as f32,
                (sums[idx][2] / mass[idx]) as f32,
            ];
        } else {
            empty.push(idx);
        }
    }

    if !empty.is_empty() {
        let mut far: Vec<(usize, f32)> = points
            .iter()
            .zip(labels)
            .enumerate()
            .map(|(i, (p, &label))| (i, squared_distance(&p.rgb, &previous[label])))
            .collect();
        far.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        for (idx, (point_idx, _)) in empty.into_iter().zip(far) {
            next[idx] = points[point_idx].rgb;
        }
    }
    next
}

/// Absolute centroid-shift threshold: `tolerance` times the mean
/// per-channel variance of the input.
fn convergence_threshold(points: &[WeightedPoint], tolerance: f32) -> f64 {
    let total: f64 = points.iter().map(|p| p.count as f64).sum();
    if total == 0.0 {
        return 0.0;
    }
    let mut mean = [0.0f64; 3];
    for p in points {
        for c in 0..3 {
            mean[c] += p.rgb[c] as f64 * p.count as f64;
        }
    }
    for m in mean.iter_mut() {
        *m /= total;
    }
    let mut var = 0.0f64;
    for p in points {
        for c in 0..3 {
            let d = p.rgb[c] as f64 - mean[c];
            var += d * d * p.count as f64;
        }
    }
    tolerance as f64 * var / (3.0 * total)
}

/// Per-restart seed derived from the base seed.
#[inline]
pub(crate) fn run_seed(seed: u64, run: usize) -> u64 {
    let step = (run as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    splitmix64(seed.wrapping_add(step))
}

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[inline]
fn squared_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let d0 = a[0] - b[0];
    let d1 = a[1] - b[1];
    let d2 = a[2] - b[2];
    d0 * d0 + d1 * d1 + d2 * d2
}
