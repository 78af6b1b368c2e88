//! YAML configuration files for chromaseek.
//!
//! One document covers every stage. Every section and every field is
//! optional; anything left out takes the library default.
//!
//! ## Example
//!
//! ```yaml
//! version: "1.0"
//! name: "gallery"
//!
//! extract:
//!   version: 1
//!   n_colors: 5
//!   max_iter: 500
//!   n_init: 10
//!   tolerance: 0.0001
//!   seed: 42
//!   use_parallel: false
//!
//! matcher:
//!   threshold: 0.70
//!   score_scale: 50000.0   # omit to derive n_colors * 10000
//!   default_k: 10
//!
//! ingest:
//!   max_size: 256          # null keeps full resolution
//!   recursive: true
//!
//! build:
//!   workers: 4             # omit for one per core
//!
//! snapshot:
//!   codec: "zstd"          # or "none"
//!   level: 3
//! ```

use std::fs;
use std::path::Path;

use extract::ExtractConfig;
use index::{CompressionCodec, CompressionConfig};
use ingest::DEFAULT_MAX_SIZE;
use matcher::MatchConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RecommenderConfig;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromaConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub extract: ExtractYamlConfig,

    #[serde(default)]
    pub matcher: MatchYamlConfig,

    #[serde(default)]
    pub ingest: IngestYamlConfig,

    #[serde(default)]
    pub build: BuildYamlConfig,

    #[serde(default)]
    pub snapshot: SnapshotYamlConfig,
}

impl ChromaConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: ChromaConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }

        self.extract.validate()?;
        self.matcher.validate()?;
        self.ingest.validate()?;
        self.build.validate()?;
        self.snapshot.validate()?;
        Ok(())
    }

    /// The runtime configuration this document describes.
    pub fn to_recommender_config(&self) -> RecommenderConfig {
        RecommenderConfig {
            extract: self.extract.to_runtime(),
            matcher: self.matcher.to_runtime(),
            max_size: self.ingest.max_size,
            workers: self.build.workers,
            recursive: self.ingest.recursive,
            compression: self.snapshot.to_runtime(),
        }
    }
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            extract: ExtractYamlConfig::default(),
            matcher: MatchYamlConfig::default(),
            ingest: IngestYamlConfig::default(),
            build: BuildYamlConfig::default(),
            snapshot: SnapshotYamlConfig::default(),
        }
    }
}

impl From<&ChromaConfig> for RecommenderConfig {
    fn from(config: &ChromaConfig) -> Self {
        config.to_recommender_config()
    }
}

/// Palette extraction YAML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_n_colors")]
    pub n_colors: usize,

    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    #[serde(default = "default_n_init")]
    pub n_init: usize,

    #[serde(default = "default_tolerance")]
    pub tolerance: f32,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default)]
    pub use_parallel: bool,
}

impl ExtractYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.version == 0 {
            return Err(ConfigLoadError::Validation(
                "extract.version must be >= 1".to_string(),
            ));
        }
        if self.n_colors == 0 {
            return Err(ConfigLoadError::Validation(
                "extract.n_colors must be >= 1".to_string(),
            ));
        }
        if self.max_iter == 0 {
            return Err(ConfigLoadError::Validation(
                "extract.max_iter must be >= 1".to_string(),
            ));
        }
        if self.n_init == 0 {
            return Err(ConfigLoadError::Validation(
                "extract.n_init must be >= 1".to_string(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigLoadError::Validation(format!(
                "extract.tolerance must be finite and >= 0 (got {})",
                self.tolerance
            )));
        }
        Ok(())
    }

    fn to_runtime(&self) -> ExtractConfig {
        ExtractConfig {
            version: self.version,
            n_colors: self.n_colors,
            max_iter: self.max_iter,
            n_init: self.n_init,
            tolerance: self.tolerance,
            seed: self.seed,
            use_parallel: self.use_parallel,
        }
    }
}

impl Default for ExtractYamlConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            n_colors: default_n_colors(),
            max_iter: default_max_iter(),
            n_init: default_n_init(),
            tolerance: default_tolerance(),
            seed: default_seed(),
            use_parallel: false,
        }
    }
}

/// Scoring and ranking YAML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchYamlConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    #[serde(default)]
    pub score_scale: Option<f32>,

    #[serde(default = "default_k")]
    pub default_k: usize,
}

impl MatchYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        self.to_runtime()
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("matcher: {err}")))
    }

    fn to_runtime(&self) -> MatchConfig {
        let cfg = MatchConfig::default()
            .with_threshold(self.threshold)
            .with_default_k(self.default_k);
        match self.score_scale {
            Some(scale) => cfg.with_score_scale(scale),
            None => cfg,
        }
    }
}

impl Default for MatchYamlConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            score_scale: None,
            default_k: default_k(),
        }
    }
}

/// Image loading YAML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestYamlConfig {
    #[serde(default = "default_max_size")]
    pub max_size: Option<u32>,

    #[serde(default = "true_value")]
    pub recursive: bool,
}

impl IngestYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.max_size == Some(0) {
            return Err(ConfigLoadError::Validation(
                "ingest.max_size must be >= 1 or null".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for IngestYamlConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            recursive: true,
        }
    }
}

/// Build worker YAML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildYamlConfig {
    #[serde(default)]
    pub workers: Option<usize>,
}

impl BuildYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.workers == Some(0) {
            return Err(ConfigLoadError::Validation(
                "build.workers must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Catalog snapshot YAML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotYamlConfig {
    #[serde(default)]
    pub codec: CompressionCodec,

    #[serde(default = "default_level")]
    pub level: i32,
}

impl SnapshotYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if !(1..=22).contains(&self.level) {
            return Err(ConfigLoadError::Validation(format!(
                "snapshot.level must be between 1 and 22 (got {})",
                self.level
            )));
        }
        Ok(())
    }

    fn to_runtime(&self) -> CompressionConfig {
        CompressionConfig::new(self.codec, self.level)
    }
}

impl Default for SnapshotYamlConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: default_level(),
        }
    }
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_n_colors() -> usize {
    5
}
fn default_max_iter() -> usize {
    500
}
fn default_n_init() -> usize {
    10
}
fn default_tolerance() -> f32 {
    1e-4
}
fn default_seed() -> u64 {
    42
}
fn default_threshold() -> f32 {
    0.70
}
fn default_k() -> usize {
    10
}
fn default_max_size() -> Option<u32> {
    Some(DEFAULT_MAX_SIZE)
}
fn default_level() -> i32 {
    3
}
fn true_value() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "gallery"
extract:
  n_colors: 3
  seed: 7
matcher:
  threshold: 0.5
"#;

        let config = ChromaConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name.as_deref(), Some("gallery"));
        assert_eq!(config.extract.n_colors, 3);
        assert_eq!(config.extract.seed, 7);
        assert_eq!(config.extract.max_iter, 500);
        assert_eq!(config.matcher.threshold, 0.5);
        assert_eq!(config.matcher.default_k, 10);
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1"
build:
  workers: 2
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = ChromaConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.build.workers, Some(2));
    }

    #[test]
    fn test_missing_file() {
        let result = ChromaConfig::from_file("/definitely/not/here.yaml");
        assert!(matches!(result, Err(ConfigLoadError::FileRead(_))));
    }

    #[test]
    fn test_defaults_match_runtime_defaults() {
        let config = ChromaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.to_recommender_config(), RecommenderConfig::default());

        let parsed = ChromaConfig::from_yaml("version: \"1.0\"\n").unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unsupported_version() {
        let result = ChromaConfig::from_yaml("version: \"2.0\"\n");
        assert!(matches!(
            result,
            Err(ConfigLoadError::UnsupportedVersion(v)) if v == "2.0"
        ));
    }

    #[test]
    fn test_extract_validation() {
        let yaml = r#"
version: "1.0"
extract:
  n_colors: 0
"#;

        let result = ChromaConfig::from_yaml(yaml);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("n_colors must be >= 1"));
    }

    #[test]
    fn test_matcher_validation() {
        let yaml = r#"
version: "1.0"
matcher:
  threshold: 1.5
"#;

        let err = ChromaConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }

    #[test]
    fn test_null_max_size_keeps_full_resolution() {
        let yaml = r#"
version: "1.0"
ingest:
  max_size: null
  recursive: false
"#;

        let config = ChromaConfig::from_yaml(yaml).unwrap();
        let runtime = config.to_recommender_config();
        assert_eq!(runtime.max_size, None);
        assert!(!runtime.recursive);
    }

    #[test]
    fn test_zero_workers_and_bad_level_rejected() {
        assert!(ChromaConfig::from_yaml("version: \"1\"\nbuild:\n  workers: 0\n").is_err());
        assert!(ChromaConfig::from_yaml("version: \"1\"\nsnapshot:\n  level: 40\n").is_err());
    }

    #[test]
    fn test_full_yaml_roundtrip() {
        let yaml = r#"
version: "1.0"
name: "production"
extract:
  version: 1
  n_colors: 6
  max_iter: 300
  n_init: 4
  tolerance: 0.001
  seed: 1732584193
  use_parallel: true
matcher:
  threshold: 0.8
  score_scale: 60000.0
  default_k: 20
ingest:
  max_size: 128
  recursive: false
build:
  workers: 8
snapshot:
  codec: "none"
  level: 5
"#;

        let config = ChromaConfig::from_yaml(yaml).unwrap();
        let runtime = config.to_recommender_config();
        assert!(runtime.validate().is_ok());
        assert_eq!(runtime.extract.n_colors, 6);
        assert_eq!(runtime.extract.seed, 1732584193);
        assert!(runtime.extract.use_parallel);
        assert_eq!(runtime.matcher.resolved_scale(6), 60000.0);
        assert_eq!(runtime.matcher.default_k, 20);
        assert_eq!(runtime.max_size, Some(128));
        assert_eq!(runtime.workers, Some(8));
        assert_eq!(runtime.compression.codec, CompressionCodec::None);

        let reparsed = ChromaConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(reparsed, config);
    }
}
