use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use extract::{ExtractConfig, ExtractError};
use index::{CompressionConfig, IndexError};
use ingest::{ImageKind, IngestError, DEFAULT_MAX_SIZE};
use matcher::{MatchConfig, MatchError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything a [`Recommender`](crate::Recommender) needs to build and query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    pub extract: ExtractConfig,
    pub matcher: MatchConfig,
    /// Longest edge, in pixels, images are shrunk to before extraction.
    /// `None` extracts at full resolution.
    pub max_size: Option<u32>,
    /// Extraction worker threads. `None` lets rayon pick one per core.
    pub workers: Option<usize>,
    /// Default for directory builds driven by configuration.
    pub recursive: bool,
    pub compression: CompressionConfig,
}

impl RecommenderConfig {
    pub fn with_extract(mut self, extract: ExtractConfig) -> Self {
        self.extract = extract;
        self
    }

    pub fn with_matcher(mut self, matcher: MatchConfig) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_max_size(mut self, max_size: Option<u32>) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    pub fn validate(&self) -> Result<(), RecommenderError> {
        self.extract.validate()?;
        self.matcher.validate()?;
        if self.max_size == Some(0) {
            return Err(RecommenderError::InvalidConfig(
                "max_size must be greater than zero".into(),
            ));
        }
        if self.workers == Some(0) {
            return Err(RecommenderError::InvalidConfig(
                "workers must be greater than zero".into(),
            ));
        }
        if !(1..=22).contains(&self.compression.level) {
            return Err(RecommenderError::InvalidConfig(format!(
                "compression level must be between 1 and 22 (got {})",
                self.compression.level
            )));
        }
        Ok(())
    }
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            extract: ExtractConfig::default(),
            matcher: MatchConfig::default(),
            max_size: Some(DEFAULT_MAX_SIZE),
            workers: None,
            recursive: true,
            compression: CompressionConfig::default(),
        }
    }
}

/// Lifecycle of a [`Recommender`](crate::Recommender).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommenderState {
    Uninitialized,
    Building,
    Ready,
}

impl RecommenderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommenderState::Uninitialized => "uninitialized",
            RecommenderState::Building => "building",
            RecommenderState::Ready => "ready",
        }
    }
}

impl fmt::Display for RecommenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One indexed image. `id` is its position in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: usize,
    pub path: PathBuf,
    /// Dimensions of the stored file, before any resize.
    pub width: u32,
    pub height: u32,
    pub format: ImageKind,
}

/// An image the build skipped, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a successful build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildStats {
    pub indexed: usize,
    pub failed: usize,
    pub failures: Vec<BuildFailure>,
    pub duration: Duration,
}

/// Cooperative cancellation flag shared between a caller and a running build.
///
/// Clones observe the same flag. A build clears the flag when it starts, so
/// cancel only after the build is under way.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Errors surfaced by the [`Recommender`](crate::Recommender).
///
/// Per-image decode and extraction failures during a build never appear
/// here; they are collected in [`BuildStats::failures`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecommenderError {
    #[error("recommender is not ready (state: {state})")]
    NotReady { state: RecommenderState },

    #[error("a build is already in progress")]
    BuildInProgress,

    #[error("build was cancelled; previous catalog kept")]
    BuildCancelled,

    #[error("invalid recommender config: {0}")]
    InvalidConfig(String),

    #[error("snapshot does not match this recommender: {0}")]
    SnapshotMismatch(String),

    #[error("i/o error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to start extraction workers: {0}")]
    WorkerPool(String),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("extract error: {0}")]
    Extract(#[from] ExtractError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("match error: {0}")]
    Match(#[from] MatchError),
}

impl RecommenderError {
    pub(crate) fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        RecommenderError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
