//! Configuration and error types for dominant color extraction.
//!
//! Extraction is a pure function of `(pixels, config)`: there is no I/O and
//! no ambient randomness. Every random choice the clustering makes is drawn
//! from a generator seeded with [`ExtractConfig::seed`].

use colorspace::ColorError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractConfig {
    /// Configuration schema version.
    ///
    /// Bump whenever a change can alter extracted palettes, so stored
    /// signatures stay comparable only with their own version.
    pub version: u32,
    /// Number of dominant colors per palette. Signatures are
    /// `n_colors * 3` floats long.
    pub n_colors: usize,
    /// Upper bound on assignment/update rounds per clustering run.
    pub max_iter: usize,
    /// Number of independently seeded clustering runs; the lowest-inertia
    /// run wins.
    pub n_init: usize,
    /// Convergence threshold, relative to the mean per-channel variance of
    /// the input colors.
    pub tolerance: f32,
    /// Seed for centroid initialisation. Same seed and same pixels give
    /// bit-identical palettes.
    pub seed: u64,
    /// Run the `n_init` restarts on the rayon pool instead of sequentially.
    /// Output is identical either way.
    pub use_parallel: bool,
}

impl ExtractConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_colors(mut self, n_colors: usize) -> Self {
        self.n_colors = n_colors;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Length of every signature produced under this configuration.
    pub fn dimension(&self) -> usize {
        self.n_colors * 3
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.version < 1 {
            return Err(ExtractError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.n_colors < 1 {
            return Err(ExtractError::InvalidConfigNColors {
                n_colors: self.n_colors,
            });
        }
        if self.max_iter < 1 {
            return Err(ExtractError::InvalidConfigMaxIter {
                max_iter: self.max_iter,
            });
        }
        if self.n_init < 1 {
            return Err(ExtractError::InvalidConfigNInit {
                n_init: self.n_init,
            });
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ExtractError::InvalidConfigTolerance {
                tolerance: self.tolerance,
            });
        }
        Ok(())
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            version: 1,
            n_colors: 5,
            max_iter: 500,
            n_init: 10,
            tolerance: 1e-4,
            seed: 42,
            use_parallel: false,
        }
    }
}

/// Errors returned by the extraction pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractError {
    #[error("cannot extract colors from an image with no pixels")]
    EmptyImage,

    #[error("invalid palette size: expected {expected} colors, got {actual}")]
    InvalidPaletteSize { expected: usize, actual: usize },

    #[error("invalid config: n_colors must be >= 1 (got {n_colors})")]
    InvalidConfigNColors { n_colors: usize },

    #[error("invalid config: max_iter must be >= 1 (got {max_iter})")]
    InvalidConfigMaxIter { max_iter: usize },

    #[error("invalid config: n_init must be >= 1 (got {n_init})")]
    InvalidConfigNInit { n_init: usize },

    #[error("invalid config: tolerance must be finite and >= 0 (got {tolerance})")]
    InvalidConfigTolerance { tolerance: f32 },

    #[error("invalid config version {version}; expected >= 1")]
    InvalidConfigVersion { version: u32 },

    #[error(transparent)]
    Color(#[from] ColorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let cfg = ExtractConfig::default();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.n_colors, 5);
        assert_eq!(cfg.max_iter, 500);
        assert_eq!(cfg.n_init, 10);
        assert_eq!(cfg.tolerance, 1e-4);
        assert!(!cfg.use_parallel);
        assert_eq!(cfg.dimension(), 15);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builder_chain() {
        let cfg = ExtractConfig::new()
            .with_n_colors(3)
            .with_max_iter(50)
            .with_n_init(2)
            .with_tolerance(0.0)
            .with_seed(7)
            .with_parallel(true);
        assert_eq!(cfg.n_colors, 3);
        assert_eq!(cfg.max_iter, 50);
        assert_eq!(cfg.n_init, 2);
        assert_eq!(cfg.tolerance, 0.0);
        assert_eq!(cfg.seed, 7);
        assert!(cfg.use_parallel);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zeroes() {
        assert_eq!(
            ExtractConfig::default().with_n_colors(0).validate(),
            Err(ExtractError::InvalidConfigNColors { n_colors: 0 })
        );
        assert_eq!(
            ExtractConfig::default().with_max_iter(0).validate(),
            Err(ExtractError::InvalidConfigMaxIter { max_iter: 0 })
        );
        assert_eq!(
            ExtractConfig::default().with_n_init(0).validate(),
            Err(ExtractError::InvalidConfigNInit { n_init: 0 })
        );
        let cfg = ExtractConfig {
            version: 0,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ExtractError::InvalidConfigVersion { version: 0 })
        );
    }

    #[test]
    fn validate_rejects_bad_tolerance() {
        assert!(ExtractConfig::default()
            .with_tolerance(-1.0)
            .validate()
            .is_err());
        assert!(ExtractConfig::default()
            .with_tolerance(f32::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = ExtractConfig::default().with_seed(99);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ExtractConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn error_messages_name_the_value() {
        let err = ExtractError::InvalidPaletteSize {
            expected: 5,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "invalid palette size: expected 5 colors, got 4"
        );
    }
}
