//! sRGB <-> CIELAB conversion.
//!
//! All functions here are pure and total over their input domain. LAB values
//! use the D65 white point, matching the sRGB reference illuminant, so that a
//! round trip through LAB never needs chromatic adaptation.
//!
//! Going back from LAB to sRGB clips to the displayable gamut and rounds to
//! the nearest byte; `lab_to_rgb(rgb_to_lab(x))` therefore reproduces `x`
//! within [`ROUND_TRIP_TOLERANCE`] per channel.

use palette::{FromColor, Lab, Srgb};

use crate::color::LabColor;

/// Maximum per-channel difference allowed after an RGB -> LAB -> RGB round trip.
pub const ROUND_TRIP_TOLERANCE: u8 = 1;

/// Convert an 8-bit sRGB triple into CIELAB (D65).
#[inline]
pub fn rgb_to_lab(rgb: [u8; 3]) -> LabColor {
    srgb_to_lab([
        f32::from(rgb[0]) / 255.0,
        f32::from(rgb[1]) / 255.0,
        f32::from(rgb[2]) / 255.0,
    ])
}

/// Convert a normalized sRGB triple (each channel in `0.0..=1.0`) into CIELAB.
///
/// Channels outside the unit range are clamped first so the function stays
/// total; callers that need to reject such input validate before calling.
pub fn srgb_to_lab(unit: [f32; 3]) -> LabColor {
    let srgb = Srgb::new(
        clamp_unit(unit[0]),
        clamp_unit(unit[1]),
        clamp_unit(unit[2]),
    );
    let lab: Lab = Lab::from_color(srgb);
    LabColor::new(lab.l, lab.a, lab.b)
}

/// Convert CIELAB back to an 8-bit sRGB triple, clipping to the sRGB gamut.
pub fn lab_to_rgb(lab: LabColor) -> [u8; 3] {
    let lab: Lab = Lab::new(lab.l, lab.a, lab.b);
    let srgb: Srgb = Srgb::from_color(lab);
    [
        unit_to_byte(srgb.red),
        unit_to_byte(srgb.green),
        unit_to_byte(srgb.blue),
    ]
}

/// Map a unit-range channel onto `0..=255` with round-half-away-from-zero.
#[inline]
pub fn unit_to_byte(value: f32) -> u8 {
    (clamp_unit(value) * 255.0).round() as u8
}

#[inline]
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
