//! # Chromaseek Color Space
//!
//! Pure numeric conversion between device sRGB and perceptually uniform
//! CIELAB, plus the [`Color`] and [`LabColor`] value types the rest of the
//! pipeline passes around.
//!
//! Euclidean distance in LAB approximates perceived color difference, which
//! is why every signature downstream is built from LAB triples rather than
//! raw RGB.
//!
//! The module has no state and performs no I/O.
//!
//! ## Example
//!
//! ```
//! use colorspace::{lab_to_rgb, rgb_to_lab};
//!
//! let lab = rgb_to_lab([255, 87, 51]);
//! let rgb = lab_to_rgb(lab);
//!
//! assert!(rgb[0] >= 254);
//! assert!(rgb[1].abs_diff(87) <= 1);
//! assert!(rgb[2].abs_diff(51) <= 1);
//! ```

mod color;
mod convert;

pub use crate::color::{to_hex, Color, ColorError, LabColor};
pub use crate::convert::{lab_to_rgb, rgb_to_lab, srgb_to_lab, unit_to_byte, ROUND_TRIP_TOLERANCE};
