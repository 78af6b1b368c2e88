//! Fixed-length signatures built from palettes.

use colorspace::{Color, LabColor};

use crate::config::{ExtractConfig, ExtractError};
use crate::palette::ColorPalette;

/// LAB triples concatenated in palette order; `n_colors * 3` floats.
pub type Signature = Vec<f32>;

/// Builds signatures of one fixed dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureVectorBuilder {
    n_colors: usize,
}

impl FeatureVectorBuilder {
    pub fn new(n_colors: usize) -> Self {
        Self { n_colors }
    }

    pub fn from_config(cfg: &ExtractConfig) -> Self {
        Self::new(cfg.n_colors)
    }

    pub fn n_colors(&self) -> usize {
        self.n_colors
    }

    pub fn dimension(&self) -> usize {
        self.n_colors * 3
    }

    pub fn build(&self, palette: &ColorPalette) -> Result<Signature, ExtractError> {
        self.build_from_colors(palette.colors())
    }

    /// Concatenate the LAB values of `colors`, which must number exactly
    /// `n_colors`.
    pub fn build_from_colors(&self, colors: &[Color]) -> Result<Signature, ExtractError> {
        if colors.len() != self.n_colors {
            return Err(ExtractError::InvalidPaletteSize {
                expected: self.n_colors,
                actual: colors.len(),
            });
        }
        let mut signature = Vec::with_capacity(self.dimension());
        for color in colors {
            signature.extend_from_slice(&color.lab.to_array());
        }
        Ok(signature)
    }

    /// A signature made of one LAB value repeated in every slot.
    pub fn uniform(&self, lab: LabColor) -> Signature {
        let triple = lab.to_array();
        let mut signature = Vec::with_capacity(self.dimension());
        for _ in 0..self.n_colors {
            signature.extend_from_slice(&triple);
        }
        signature
    }
}
