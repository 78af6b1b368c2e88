//! Color value types shared by every stage of the pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::convert::{rgb_to_lab, srgb_to_lab, unit_to_byte};

/// A CIELAB (D65) triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabColor {
    /// Lightness, `0.0..=100.0`.
    pub l: f32,
    /// Green (negative) to red (positive) axis.
    pub a: f32,
    /// Blue (negative) to yellow (positive) axis.
    pub b: f32,
}

impl LabColor {
    pub const fn new(l: f32, a: f32, b: f32) -> Self {
        Self { l, a, b }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.l, self.a, self.b]
    }

    pub fn is_finite(&self) -> bool {
        self.l.is_finite() && self.a.is_finite() && self.b.is_finite()
    }

    /// Squared CIE76 difference (squared Euclidean distance in LAB).
    #[inline]
    pub fn squared_distance(&self, other: &LabColor) -> f32 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        dl * dl + da * da + db * db
    }
}

/// Errors raised when constructing color values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ColorError {
    #[error("color weight must be in (0, 1] (got {weight})")]
    InvalidWeight { weight: f32 },
}

/// A representative color: display RGB, its LAB equivalent, and the fraction
/// of pixels it stands for.
///
/// `rgb` and `lab` are always derived from the same source value, so
/// converting one into the other agrees within the converter's round-trip
/// tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub rgb: [u8; 3],
    pub lab: LabColor,
    pub weight: f32,
}

impl Color {
    /// Build a color from 8-bit channels.
    pub fn from_rgb(rgb: [u8; 3], weight: f32) -> Result<Self, ColorError> {
        let weight = check_weight(weight)?;
        Ok(Self {
            rgb,
            lab: rgb_to_lab(rgb),
            weight,
        })
    }

    /// Build a color from fractional sRGB channels in `0.0..=1.0`.
    ///
    /// LAB is computed from the unrounded channels, which keeps cluster
    /// centroids precise; `rgb` is the nearest displayable byte triple.
    pub fn from_unit_rgb(unit: [f32; 3], weight: f32) -> Result<Self, ColorError> {
        let weight = check_weight(weight)?;
        Ok(Self {
            rgb: [
                unit_to_byte(unit[0]),
                unit_to_byte(unit[1]),
                unit_to_byte(unit[2]),
            ],
            lab: srgb_to_lab(unit),
            weight,
        })
    }

    /// Same color with a different weight.
    pub fn with_weight(self, weight: f32) -> Result<Self, ColorError> {
        let weight = check_weight(weight)?;
        Ok(Self { weight, ..self })
    }

    /// Uppercase `#RRGGBB` form.
    pub fn hex(&self) -> String {
        to_hex(self.rgb)
    }
}

/// Format an RGB triple as uppercase `#RRGGBB`.
pub fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

fn check_weight(weight: f32) -> Result<f32, ColorError> {
    if weight.is_finite() && weight > 0.0 && weight <= 1.0 {
        Ok(weight)
    } else {
        Err(ColorError::InvalidWeight { weight })
    }
}
