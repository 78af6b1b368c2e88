//! The searchable state a ready recommender holds, and its on-disk form.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use index::{BruteForceIndex, IndexError, IndexSnapshot, SimilarityIndex, INDEX_SCHEMA_VERSION};
use serde::{Deserialize, Serialize};

use crate::types::{ImageRecord, RecommenderConfig, RecommenderError};

/// Bump whenever the [`CatalogSnapshot`] layout changes.
pub const CATALOG_SCHEMA_VERSION: u16 = 2;

/// Signatures plus the records that give their ids meaning.
#[derive(Debug, Clone)]
pub(crate) struct Catalog {
    pub(crate) index: BruteForceIndex,
    pub(crate) records: Vec<ImageRecord>,
    by_path: HashMap<PathBuf, usize>,
}

impl Catalog {
    /// `records[i]` must describe signature `i` of `index`.
    pub(crate) fn new(index: BruteForceIndex, records: Vec<ImageRecord>) -> Self {
        let by_path = records
            .iter()
            .map(|record| (path_key(&record.path), record.id))
            .collect();
        Self {
            index,
            records,
            by_path,
        }
    }

    /// Id of the record stored under `path`, however the path is spelled.
    pub(crate) fn id_of(&self, path: &Path) -> Option<usize> {
        self.by_path.get(&path_key(path)).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn to_snapshot(&self, settings: ExtractionSettings) -> CatalogSnapshot {
        CatalogSnapshot {
            schema_version: CATALOG_SCHEMA_VERSION,
            settings,
            index: self.index.to_snapshot(),
            records: self.records.clone(),
        }
    }

    /// Rebuild from a snapshot taken with `n_colors` colors per palette.
    pub(crate) fn from_snapshot(
        snapshot: CatalogSnapshot,
        n_colors: usize,
    ) -> Result<Self, RecommenderError> {
        if snapshot.schema_version != CATALOG_SCHEMA_VERSION {
            return Err(RecommenderError::SnapshotMismatch(format!(
                "schema version {} is not supported (expected {CATALOG_SCHEMA_VERSION})",
                snapshot.schema_version
            )));
        }
        if snapshot.settings.n_colors != n_colors {
            return Err(RecommenderError::SnapshotMismatch(format!(
                "snapshot has {} colors per palette, configured for {n_colors}",
                snapshot.settings.n_colors
            )));
        }
        let expected_dim = n_colors * 3;
        if let Some(dim) = snapshot.index.dimension {
            if dim != expected_dim {
                return Err(RecommenderError::SnapshotMismatch(format!(
                    "signature dimension {dim} does not match {expected_dim}"
                )));
            }
        }
        if snapshot.records.len() != snapshot.index.signatures.len() {
            return Err(RecommenderError::SnapshotMismatch(format!(
                "{} records for {} signatures",
                snapshot.records.len(),
                snapshot.index.signatures.len()
            )));
        }
        if let Some((position, record)) = snapshot
            .records
            .iter()
            .enumerate()
            .find(|(position, record)| record.id != *position)
        {
            return Err(RecommenderError::SnapshotMismatch(format!(
                "record at position {position} has id {}",
                record.id
            )));
        }

        if snapshot.index.schema_version != INDEX_SCHEMA_VERSION {
            return Err(IndexError::UnsupportedSchema {
                found: snapshot.index.schema_version,
                expected: INDEX_SCHEMA_VERSION,
            }
            .into());
        }

        let mut index = BruteForceIndex::with_dimension(expected_dim);
        index.build(&snapshot.index.signatures)?;
        Ok(Self::new(index, snapshot.records))
    }
}

/// Lookup key for a path: canonical when it resolves on disk, raw otherwise.
fn path_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Settings that shape a signature: how images were downscaled and how
/// their palettes were clustered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSettings {
    pub n_colors: usize,
    pub seed: u64,
    pub max_iter: usize,
    pub n_init: usize,
    pub tolerance: f32,
    pub max_size: Option<u32>,
}

impl ExtractionSettings {
    pub fn from_config(cfg: &RecommenderConfig) -> Self {
        Self {
            n_colors: cfg.extract.n_colors,
            seed: cfg.extract.seed,
            max_iter: cfg.extract.max_iter,
            n_init: cfg.extract.n_init,
            tolerance: cfg.extract.tolerance,
            max_size: cfg.max_size,
        }
    }

    /// Names of the fields where `self` and `other` disagree.
    pub fn differences(&self, other: &Self) -> Vec<&'static str> {
        let checks = [
            ("n_colors", self.n_colors != other.n_colors),
            ("seed", self.seed != other.seed),
            ("max_iter", self.max_iter != other.max_iter),
            ("n_init", self.n_init != other.n_init),
            ("tolerance", self.tolerance != other.tolerance),
            ("max_size", self.max_size != other.max_size),
        ];
        checks
            .into_iter()
            .filter_map(|(name, differs)| differs.then_some(name))
            .collect()
    }
}

/// Serializable form of a ready catalog.
///
/// Encoded with [`index::encode_snapshot`], so the blob carries the same
/// magic and codec header as a bare index snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub schema_version: u16,
    /// Settings the stored signatures were produced with.
    pub settings: ExtractionSettings,
    pub index: IndexSnapshot,
    pub records: Vec<ImageRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest::ImageKind;

    fn record(id: usize, path: &str) -> ImageRecord {
        ImageRecord {
            id,
            path: PathBuf::from(path),
            width: 4,
            height: 4,
            format: ImageKind::Png,
        }
    }

    fn settings() -> ExtractionSettings {
        ExtractionSettings::from_config(&RecommenderConfig::default().with_extract(
            extract::ExtractConfig::default().with_n_colors(1),
        ))
    }

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot {
            schema_version: CATALOG_SCHEMA_VERSION,
            settings: settings(),
            index: IndexSnapshot {
                schema_version: INDEX_SCHEMA_VERSION,
                dimension: Some(3),
                signatures: vec![vec![50.0, 0.0, 0.0], vec![10.0, 5.0, 5.0]],
            },
            records: vec![record(0, "a.png"), record(1, "b.png")],
        }
    }

    #[test]
    fn valid_snapshot_restores_lookup() {
        let catalog = Catalog::from_snapshot(snapshot(), 1).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.id_of(Path::new("b.png")), Some(1));
        assert_eq!(catalog.id_of(Path::new("missing.png")), None);
        assert_eq!(catalog.to_snapshot(settings()), snapshot());
    }

    #[test]
    fn lookup_resolves_other_spellings_of_a_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let file = dir.path().join("a.png");
        std::fs::write(&file, b"x").unwrap();

        let mut snap = snapshot();
        snap.records[0].path = file.clone();
        let catalog = Catalog::from_snapshot(snap, 1).unwrap();

        assert_eq!(catalog.id_of(&file), Some(0));
        assert_eq!(catalog.id_of(&dir.path().join("nested/../a.png")), Some(0));
        assert_eq!(catalog.id_of(&dir.path().join("nested/../b.png")), None);
    }

    #[test]
    fn settings_report_each_difference() {
        let base = settings();
        assert!(base.differences(&base).is_empty());

        let other = ExtractionSettings {
            seed: 7,
            tolerance: base.tolerance * 2.0,
            max_size: None,
            ..base.clone()
        };
        assert_eq!(base.differences(&other), vec!["seed", "tolerance", "max_size"]);
    }

    #[test]
    fn color_count_must_match() {
        let err = Catalog::from_snapshot(snapshot(), 5).unwrap_err();
        assert!(matches!(err, RecommenderError::SnapshotMismatch(msg) if msg.contains("colors")));
    }

    #[test]
    fn record_count_must_match() {
        let mut snap = snapshot();
        snap.records.pop();
        assert!(matches!(
            Catalog::from_snapshot(snap, 1),
            Err(RecommenderError::SnapshotMismatch(_))
        ));
    }

    #[test]
    fn ids_must_be_dense() {
        let mut snap = snapshot();
        snap.records[1].id = 7;
        assert!(matches!(
            Catalog::from_snapshot(snap, 1),
            Err(RecommenderError::SnapshotMismatch(msg)) if msg.contains("position 1")
        ));
    }

    #[test]
    fn dimension_and_schema_checked() {
        let mut snap = snapshot();
        snap.index.dimension = Some(6);
        assert!(Catalog::from_snapshot(snap, 1).is_err());

        let mut snap = snapshot();
        snap.schema_version = 99;
        assert!(Catalog::from_snapshot(snap, 1).is_err());
    }

    #[test]
    fn malformed_signatures_surface_as_index_errors() {
        let mut snap = snapshot();
        snap.index.signatures[1] = vec![1.0, 2.0];
        assert!(matches!(
            Catalog::from_snapshot(snap, 1),
            Err(RecommenderError::Index(_))
        ));
    }
}
