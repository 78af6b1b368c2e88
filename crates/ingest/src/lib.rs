//! Chromaseek Ingest Layer
//!
//! This is where images enter the pipeline. Everything that touches the
//! filesystem or an image codec lives here, behind the narrow [`ImageLoader`]
//! trait, so the color and index stages only ever see in-memory pixels.
//!
//! ## What we do here
//!
//! - **Discover files** - [`discover_images`] walks a directory (optionally
//!   recursively) and returns supported files in a stable order.
//! - **Decode** - [`ImageFileLoader`] sniffs the real encoding from the file
//!   contents, decodes it with the `image` crate and flattens to RGB.
//!   Fully transparent pixels are left out.
//! - **Downscale** - Large images are shrunk to `max_size` on the longest edge
//!   before extraction.
//! - **Classify failures** - Unknown encodings come back as
//!   [`IngestError::UnsupportedImageFormat`], undecodable bytes as
//!   [`IngestError::CorruptImage`], so a batch build can record and skip them.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use ingest::{ImageFileLoader, ImageLoader, LoaderConfig};
//!
//! let loader = ImageFileLoader::new(LoaderConfig::default()).unwrap();
//! let decoded = loader.decode(Path::new("photos/sunset.jpg")).unwrap();
//! println!("{} pixels", decoded.pixels.len());
//! ```
use std::path::Path;
use std::time::Instant;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

mod config;
mod discover;
mod error;
mod types;

pub use crate::config::{ConfigError, LoaderConfig, DEFAULT_MAX_SIZE};
pub use crate::discover::discover_images;
pub use crate::error::IngestError;
pub use crate::types::{DecodedImage, ImageKind, ImageSource, PixelBuffer};

/// Decodes an image file into pixels.
///
/// Implementations must be shareable across the build worker pool.
pub trait ImageLoader: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DecodedImage, IngestError>;
}

/// [`ImageLoader`] backed by the `image` crate.
#[derive(Debug, Clone, Default)]
pub struct ImageFileLoader {
    cfg: LoaderConfig,
}

impl ImageFileLoader {
    pub fn new(cfg: LoaderConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.cfg
    }

    /// Decode an in-memory encoded image. `path` is used for error reporting
    /// and as a fallback hint when content sniffing fails.
    pub fn decode_bytes(&self, path: &Path, bytes: &[u8]) -> Result<DecodedImage, IngestError> {
        let display = path.display().to_string();
        let kind = detect_kind(path, bytes)?;

        let image = image::load_from_memory_with_format(bytes, to_image_format(kind)).map_err(
            |err| IngestError::CorruptImage {
                path: display.clone(),
                reason: err.to_string(),
            },
        )?;

        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(IngestError::EmptyImage { path: display });
        }

        let resized = self.downscale(image);
        let pixels = if resized.color().has_alpha() {
            let rgba = resized.to_rgba8();
            PixelBuffer::from_rgba_bytes(rgba.width(), rgba.height(), rgba.as_raw())?
        } else {
            let rgb = resized.to_rgb8();
            PixelBuffer::from_rgb_bytes(rgb.width(), rgb.height(), rgb.as_raw())?
        };

        Ok(DecodedImage {
            source: ImageSource {
                path: path.to_path_buf(),
                width,
                height,
                format: kind,
            },
            pixels,
        })
    }

    fn downscale(&self, image: DynamicImage) -> DynamicImage {
        match self.cfg.max_size {
            Some(max) if image.width().max(image.height()) > max => {
                image.resize(max, max, FilterType::Triangle)
            }
            _ => image,
        }
    }
}

impl ImageLoader for ImageFileLoader {
    fn decode(&self, path: &Path) -> Result<DecodedImage, IngestError> {
        let start = Instant::now();
        let result = std::fs::read(path)
            .map_err(|err| IngestError::io(path, &err))
            .and_then(|bytes| self.decode_bytes(path, &bytes));

        let elapsed_micros = start.elapsed().as_micros();
        match &result {
            Ok(decoded) => debug!(
                path = %path.display(),
                format = %decoded.source.format,
                width = decoded.source.width,
                height = decoded.source.height,
                sampled = decoded.pixels.len(),
                elapsed_micros,
                "image_decoded"
            ),
            Err(err) => warn!(path = %path.display(), error = %err, elapsed_micros, "image_decode_failed"),
        }
        result
    }
}

/// Work out the real encoding: content first, extension as a fallback so
/// that a `.png` full of garbage reads as corrupt rather than unsupported.
fn detect_kind(path: &Path, bytes: &[u8]) -> Result<ImageKind, IngestError> {
    let display = path.display().to_string();
    match image::guess_format(bytes) {
        Ok(format) => from_image_format(format).ok_or_else(|| IngestError::UnsupportedImageFormat {
            path: display,
            format: format!("{format:?}").to_ascii_lowercase(),
        }),
        Err(err) => match ImageKind::from_path(path) {
            Some(_) => Err(IngestError::CorruptImage {
                path: display,
                reason: err.to_string(),
            }),
            None => Err(IngestError::UnsupportedImageFormat {
                path: display,
                format: path
                    .extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "unknown".into()),
            }),
        },
    }
}

fn from_image_format(format: ImageFormat) -> Option<ImageKind> {
    match format {
        ImageFormat::Jpeg => Some(ImageKind::Jpeg),
        ImageFormat::Png => Some(ImageKind::Png),
        ImageFormat::Bmp => Some(ImageKind::Bmp),
        ImageFormat::Gif => Some(ImageKind::Gif),
        ImageFormat::WebP => Some(ImageKind::WebP),
        _ => None,
    }
}

fn to_image_format(kind: ImageKind) -> ImageFormat {
    match kind {
        ImageKind::Jpeg => ImageFormat::Jpeg,
        ImageKind::Png => ImageFormat::Png,
        ImageKind::Bmp => ImageFormat::Bmp,
        ImageKind::Gif => ImageFormat::Gif,
        ImageKind::WebP => ImageFormat::WebP,
    }
}
