//! Core data types for decoded images.
//!
//! - [`ImageKind`]: the encodings the loader accepts.
//! - [`PixelBuffer`]: a flat RGB pixel array, the only thing downstream
//!   stages ever see of an image.
//! - [`ImageSource`]: what was loaded and from where.
//! - [`DecodedImage`]: the loader's output, pixels plus source info.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Image encodings accepted at the loader boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
    Bmp,
    Gif,
    WebP,
}

impl ImageKind {
    pub const ALL: [ImageKind; 5] = [
        ImageKind::Jpeg,
        ImageKind::Png,
        ImageKind::Bmp,
        ImageKind::Gif,
        ImageKind::WebP,
    ];

    /// Match a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "bmp" => Some(ImageKind::Bmp),
            "gif" => Some(ImageKind::Gif),
            "webp" => Some(ImageKind::WebP),
            _ => None,
        }
    }

    /// Match the extension of `path`, if it has one.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpeg",
            ImageKind::Png => "png",
            ImageKind::Bmp => "bmp",
            ImageKind::Gif => "gif",
            ImageKind::WebP => "webp",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row-major RGB pixels.
///
/// `width` and `height` describe the raster. Buffers built with
/// [`from_rgba_bytes`](Self::from_rgba_bytes) hold only the visible pixels,
/// so `len()` can be smaller than `width * height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
}

impl PixelBuffer {
    /// Wrap an existing pixel vector, checking it matches `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 3]>) -> Result<Self, IngestError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(IngestError::InvalidPixelData {
                expected: expected * 3,
                actual: pixels.len() * 3,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build from interleaved `RGBRGB...` bytes.
    pub fn from_rgb_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self, IngestError> {
        let expected = width as usize * height as usize * 3;
        if bytes.len() != expected {
            return Err(IngestError::InvalidPixelData {
                expected,
                actual: bytes.len(),
            });
        }
        let pixels = bytes
            .chunks_exact(3)
            .map(|px| [px[0], px[1], px[2]])
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build from interleaved `RGBARGBA...` bytes, keeping only pixels with
    /// non-zero alpha. A fully transparent image keeps every pixel so it still
    /// has colors to extract.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self, IngestError> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(IngestError::InvalidPixelData {
                expected,
                actual: bytes.len(),
            });
        }
        let visible: Vec<[u8; 3]> = bytes
            .chunks_exact(4)
            .filter(|px| px[3] != 0)
            .map(|px| [px[0], px[1], px[2]])
            .collect();
        let pixels = if visible.is_empty() {
            bytes
                .chunks_exact(4)
                .map(|px| [px[0], px[1], px[2]])
                .collect()
        } else {
            visible
        };
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A single-color image; handy for tests and color swatches.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self {
            width,
            height,
            pixels: vec![rgb; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Where an image came from and what it looked like before any resizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    pub path: PathBuf,
    /// Width of the stored image, before resize-for-extraction.
    pub width: u32,
    /// Height of the stored image, before resize-for-extraction.
    pub height: u32,
    pub format: ImageKind,
}

/// Loader output: pixels ready for extraction plus source information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub source: ImageSource,
    pub pixels: PixelBuffer,
}
