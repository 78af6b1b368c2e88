use std::fmt;
use std::str::FromStr;

use extract::ExtractError;
use index::IndexError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Squared LAB distance between black and white, per palette slot.
pub const SCALE_PER_COLOR: f32 = 10_000.0;

/// A color as supplied by a caller, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ColorInput {
    /// Six hex digits, optionally prefixed with `#`.
    Hex(String),
    /// 8-bit channels.
    IntegerRgb(u8, u8, u8),
    /// Channels in `0.0..=1.0`.
    NormalizedRgb(f32, f32, f32),
}

impl ColorInput {
    pub fn hex(value: impl Into<String>) -> Self {
        ColorInput::Hex(value.into())
    }
}

impl fmt::Display for ColorInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorInput::Hex(s) => f.write_str(s),
            ColorInput::IntegerRgb(r, g, b) => write!(f, "({r}, {g}, {b})"),
            ColorInput::NormalizedRgb(r, g, b) => write!(f, "({r:?}, {g:?}, {b:?})"),
        }
    }
}

/// Text forms: `#RRGGBB`, `RRGGBB`, `(r, g, b)` with integers, or
/// `(r, g, b)` with decimals (any component containing `.` makes the whole
/// triple normalized). Parentheses are optional.
///
/// Hex strings are passed through as [`ColorInput::Hex`] and checked by
/// [`parse_color`](crate::parse_color); triples are checked here because
/// their variants cannot hold out-of-range values.
impl FromStr for ColorInput {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !trimmed.contains(',') && !trimmed.starts_with('(') {
            return Ok(ColorInput::Hex(trimmed.to_string()));
        }

        let inner = trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed);
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(MatchError::invalid_color(
                s,
                format!("expected 3 components, got {}", parts.len()),
            ));
        }

        if parts.iter().any(|p| p.contains('.')) {
            let mut channels = [0.0f32; 3];
            for (slot, part) in channels.iter_mut().zip(&parts) {
                *slot = part.parse::<f32>().map_err(|_| {
                    MatchError::invalid_color(s, format!("'{part}' is not a number"))
                })?;
            }
            Ok(ColorInput::NormalizedRgb(channels[0], channels[1], channels[2]))
        } else {
            let mut channels = [0u8; 3];
            for (slot, part) in channels.iter_mut().zip(&parts) {
                let value = part.parse::<i64>().map_err(|_| {
                    MatchError::invalid_color(s, format!("'{part}' is not an integer"))
                })?;
                *slot = u8::try_from(value).map_err(|_| {
                    MatchError::invalid_color(s, format!("component {value} is outside 0-255"))
                })?;
            }
            Ok(ColorInput::IntegerRgb(channels[0], channels[1], channels[2]))
        }
    }
}

/// Which kind of query produced a result set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Color,
    Image,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Color => "color",
            QueryKind::Image => "image",
        }
    }
}

/// Scoring and ranking knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    /// Minimum score a result needs to be returned.
    #[serde(default = "MatchConfig::default_threshold")]
    pub threshold: f32,
    /// Distance that maps to score 0. `None` derives it from the signature
    /// dimension as `n_colors * SCALE_PER_COLOR`.
    #[serde(default)]
    pub score_scale: Option<f32>,
    /// Result count used when a caller does not pass `k`.
    #[serde(default = "MatchConfig::default_k")]
    pub default_k: usize,
}

impl MatchConfig {
    pub(crate) fn default_threshold() -> f32 {
        0.70
    }

    pub(crate) fn default_k() -> usize {
        10
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_score_scale(mut self, scale: f32) -> Self {
        self.score_scale = Some(scale);
        self
    }

    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    /// The scale in force for signatures of `n_colors` colors.
    pub fn resolved_scale(&self, n_colors: usize) -> f32 {
        self.score_scale
            .unwrap_or(n_colors as f32 * SCALE_PER_COLOR)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MatchError::InvalidConfig(format!(
                "threshold must be between 0.0 and 1.0 (got {})",
                self.threshold
            )));
        }
        if let Some(scale) = self.score_scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(MatchError::InvalidConfig(format!(
                    "score_scale must be a positive number (got {scale})"
                )));
            }
        }
        if self.default_k == 0 {
            return Err(MatchError::InvalidConfig(
                "default_k must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: Self::default_threshold(),
            score_scale: None,
            default_k: Self::default_k(),
        }
    }
}

/// One ranked match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    pub id: usize,
    /// Squared Euclidean distance between signatures.
    pub distance: f32,
    /// `max(0, 1 - distance / scale)`.
    pub score: f32,
}

/// Errors produced by the query layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("invalid color format '{value}': {reason}")]
    InvalidColorFormat { value: String, reason: String },
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    #[error("extract error: {0}")]
    Extract(#[from] ExtractError),
    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

impl MatchError {
    pub(crate) fn invalid_color(value: impl fmt::Display, reason: impl Into<String>) -> Self {
        MatchError::InvalidColorFormat {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
