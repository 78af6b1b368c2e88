//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chromaseek::{
    DecodedImage, ImageKind, ImageLoader, ImageSource, IngestError, PixelBuffer, Recommender,
    RecommenderConfig,
};

/// In-memory [`ImageLoader`]: paths map to pixel buffers or to errors.
#[derive(Default)]
pub struct MemoryLoader {
    images: HashMap<PathBuf, Result<PixelBuffer, IngestError>>,
    decodes: AtomicUsize,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, path: &str, pixels: PixelBuffer) -> Self {
        self.images.insert(PathBuf::from(path), Ok(pixels));
        self
    }

    pub fn with_solid(self, path: &str, rgb: [u8; 3]) -> Self {
        self.with_image(path, PixelBuffer::solid(16, 16, rgb))
    }

    pub fn with_corrupt(mut self, path: &str) -> Self {
        self.images.insert(
            PathBuf::from(path),
            Err(IngestError::CorruptImage {
                path: path.to_string(),
                reason: "truncated stream".into(),
            }),
        );
        self
    }

    pub fn decode_count(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }
}

impl ImageLoader for MemoryLoader {
    fn decode(&self, path: &Path) -> Result<DecodedImage, IngestError> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        let entry = self.images.get(path).ok_or_else(|| IngestError::Io {
            path: path.display().to_string(),
            message: "no such file".into(),
        })?;
        let pixels = entry.clone()?;
        Ok(DecodedImage {
            source: ImageSource {
                path: path.to_path_buf(),
                width: pixels.width(),
                height: pixels.height(),
                format: ImageKind::Png,
            },
            pixels,
        })
    }
}

/// A `w x h` image split into vertical bands, one per color, widths in
/// proportion to `shares`.
pub fn banded(w: u32, h: u32, bands: &[([u8; 3], u32)]) -> PixelBuffer {
    let total: u32 = bands.iter().map(|(_, share)| share).sum();
    let mut row = Vec::with_capacity(w as usize);
    for (rgb, share) in bands {
        let width = (w * share / total) as usize;
        row.extend(std::iter::repeat(*rgb).take(width));
    }
    while row.len() < w as usize {
        row.push(bands[bands.len() - 1].0);
    }
    let pixels = (0..h).flat_map(|_| row.iter().copied()).collect();
    PixelBuffer::new(w, h, pixels).expect("band dimensions are consistent")
}

/// A smooth two-axis gradient with many distinct colors.
pub fn gradient(w: u32, h: u32, base: [u8; 3]) -> PixelBuffer {
    let mut pixels = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        for x in 0..w {
            pixels.push([
                base[0].wrapping_add((x * 4) as u8),
                base[1].wrapping_add((y * 4) as u8),
                base[2].wrapping_add(((x + y) * 2) as u8),
            ]);
        }
    }
    PixelBuffer::new(w, h, pixels).expect("gradient dimensions are consistent")
}

/// Ten distinct, valid images: `img-0` .. `img-9`.
pub fn ten_images() -> MemoryLoader {
    let colors: [[u8; 3]; 10] = [
        [255, 0, 0],
        [0, 255, 0],
        [0, 0, 255],
        [255, 255, 0],
        [0, 255, 255],
        [255, 0, 255],
        [128, 64, 32],
        [20, 20, 20],
        [240, 240, 240],
        [90, 140, 200],
    ];
    colors
        .iter()
        .enumerate()
        .fold(MemoryLoader::new(), |loader, (i, rgb)| {
            let accent = [rgb[2], rgb[0], rgb[1]];
            loader.with_image(
                &format!("img-{i}"),
                banded(20, 10, &[(*rgb, 3), (accent, 1)]),
            )
        })
}

pub fn paths(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

pub fn numbered(prefix: &str, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| PathBuf::from(format!("{prefix}-{i}")))
        .collect()
}

pub fn recommender_with(loader: impl ImageLoader + 'static, cfg: RecommenderConfig) -> Recommender {
    Recommender::with_loader(cfg, Arc::new(loader)).expect("valid recommender config")
}

pub fn recommender(loader: impl ImageLoader + 'static) -> Recommender {
    recommender_with(loader, RecommenderConfig::default().with_workers(4))
}
