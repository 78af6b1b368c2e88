//! Configuration for the image loader.
//!
//! ```rust
//! use ingest::LoaderConfig;
//!
//! let config = LoaderConfig::default().with_max_size(Some(128));
//! config.validate().expect("valid loader config");
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default longest-edge bound applied before extraction.
pub const DEFAULT_MAX_SIZE: u32 = 256;

/// Runtime configuration for [`ImageFileLoader`](crate::ImageFileLoader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Downscale so the longest edge is at most this many pixels, keeping the
    /// aspect ratio. `None` keeps full resolution.
    ///
    /// Dominant colors are stable under downscaling, and clustering cost is
    /// linear in pixel count.
    pub max_size: Option<u32>,
}

impl LoaderConfig {
    pub fn with_max_size(mut self, max_size: Option<u32>) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == Some(0) {
            return Err(ConfigError::InvalidMaxSize);
        }
        Ok(())
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_size: Some(DEFAULT_MAX_SIZE),
        }
    }
}

/// Loader configuration validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_size must be greater than zero")]
    InvalidMaxSize,
}
