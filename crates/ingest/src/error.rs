//! Error types produced by the ingest crate.
//!
//! Every variant carries the path it concerns so that a batch build can
//! record exactly which file failed and why, then move on.
//!
//! | Error | Category | Description |
//! |-------|----------|-------------|
//! | [`UnsupportedImageFormat`](IngestError::UnsupportedImageFormat) | Format | File is not one of the accepted encodings |
//! | [`CorruptImage`](IngestError::CorruptImage) | Decode | Accepted encoding, but the bytes do not decode |
//! | [`EmptyImage`](IngestError::EmptyImage) | Decode | Decoded to zero pixels |
//! | [`InvalidPixelData`](IngestError::InvalidPixelData) | Validation | Raw buffer length disagrees with dimensions |
//! | [`Io`](IngestError::Io) | I/O | Reading the file or directory failed |
//!
//! # Example
//!
//! ```rust
//! use ingest::IngestError;
//!
//! fn is_retryable(error: &IngestError) -> bool {
//!     matches!(error, IngestError::Io { .. })
//! }
//!
//! let err = IngestError::CorruptImage {
//!     path: "broken.png".into(),
//!     reason: "unexpected end of file".into(),
//! };
//! assert!(!is_retryable(&err));
//! assert!(err.to_string().contains("broken.png"));
//! ```
use thiserror::Error;

/// Errors that can occur while discovering or decoding images.
///
/// The enum is `#[non_exhaustive]`; match with a catch-all arm.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// The file is not in a format the decoder accepts.
    #[error("unsupported image format for {path}: {format}")]
    UnsupportedImageFormat { path: String, format: String },

    /// The file claims a supported format but could not be decoded.
    #[error("corrupt image {path}: {reason}")]
    CorruptImage { path: String, reason: String },

    /// The image decoded successfully but holds no pixels.
    #[error("image {path} has no pixels")]
    EmptyImage { path: String },

    /// A raw RGB buffer does not match its declared dimensions.
    #[error("invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Filesystem access failed.
    #[error("i/o error on {path}: {message}")]
    Io { path: String, message: String },
}

impl IngestError {
    pub(crate) fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        IngestError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// The path the error refers to, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            IngestError::UnsupportedImageFormat { path, .. }
            | IngestError::CorruptImage { path, .. }
            | IngestError::EmptyImage { path }
            | IngestError::Io { path, .. } => Some(path),
            IngestError::InvalidPixelData { .. } => None,
        }
    }
}
