use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, TryLockError};
use std::time::Instant;

use extract::{ColorPalette, ImageColors, Signature};
use index::{decode_snapshot, encode_snapshot, BruteForceIndex, SimilarityIndex};
use ingest::{discover_images, DecodedImage, ImageFileLoader, ImageLoader, LoaderConfig};
use matcher::{ColorInput, ColorQueryEngine, QueryKind, QueryResult};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, info_span, warn};

use crate::catalog::{Catalog, CatalogSnapshot, ExtractionSettings};
use crate::types::{
    BuildFailure, BuildStats, CancellationToken, ImageRecord, RecommenderConfig,
    RecommenderError, RecommenderState,
};


/// Indexes a collection of images by dominant color and answers "what looks
/// like this color / this image" queries against it.
///
/// Lifecycle: `Uninitialized -> Building -> Ready`. Queries need `Ready` and
/// fail fast with [`RecommenderError::NotReady`] otherwise; they never wait
/// on a build. A build or snapshot load started while another is running
/// fails with [`RecommenderError::BuildInProgress`]. A build that fails or is
/// cancelled leaves the previous catalog and state untouched.
///
/// All methods take `&self`, so one recommender can be shared across
/// threads behind an `Arc`.
pub struct Recommender {
    cfg: RecommenderConfig,
    engine: ColorQueryEngine,
    loader: Arc<dyn ImageLoader>,
    pool: ThreadPool,
    state: Mutex<RecommenderState>,
    catalog: RwLock<Option<Catalog>>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Recommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recommender")
            .field("cfg", &self.cfg)
            .field("state", &self.state())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl Recommender {
    /// A recommender that decodes files from disk with the `image` crate.
    pub fn new(cfg: RecommenderConfig) -> Result<Self, RecommenderError> {
        let loader = ImageFileLoader::new(LoaderConfig::default().with_max_size(cfg.max_size))
            .map_err(|err| RecommenderError::InvalidConfig(err.to_string()))?;
        Self::with_loader(cfg, Arc::new(loader))
    }

    /// A recommender that decodes through `loader`. `max_size` is then the
    /// loader's concern.
    pub fn with_loader(
        cfg: RecommenderConfig,
        loader: Arc<dyn ImageLoader>,
    ) -> Result<Self, RecommenderError> {
        cfg.validate()?;
        let engine = ColorQueryEngine::new(cfg.matcher.clone(), cfg.extract.clone())?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(cfg.workers.unwrap_or(0))
            .thread_name(|i| format!("chromaseek-extract-{i}"))
            .build()
            .map_err(|err| RecommenderError::WorkerPool(err.to_string()))?;

        Ok(Self {
            cfg,
            engine,
            loader,
            pool,
            state: Mutex::new(RecommenderState::Uninitialized),
            catalog: RwLock::new(None),
            cancel: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.cfg
    }

    pub fn engine(&self) -> &ColorQueryEngine {
        &self.engine
    }

    pub fn state(&self) -> RecommenderState {
        *self.lock_state()
    }

    /// Token that cancels a build on this recommender.
    ///
    /// A cancel issued while idle applies to the next build. The token is
    /// cleared whenever a build or snapshot load finishes, however it ends.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Number of indexed images; 0 until the first build completes.
    pub fn len(&self) -> usize {
        self.read_catalog(|catalog| catalog.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All indexed images, in id order.
    pub fn records(&self) -> Result<Vec<ImageRecord>, RecommenderError> {
        self.ready_catalog(|catalog| Ok(catalog.records.clone()))
    }

    pub fn record(&self, id: usize) -> Result<Option<ImageRecord>, RecommenderError> {
        self.ready_catalog(|catalog| Ok(catalog.records.get(id).cloned()))
    }

    /// Stored signature for `id`.
    pub fn signature(&self, id: usize) -> Result<Option<Signature>, RecommenderError> {
        self.ready_catalog(|catalog| Ok(catalog.index.get(id).map(<[f32]>::to_vec)))
    }

    /// Index every image in `dir` (sorted by path) and return the build
    /// statistics.
    pub fn build_from_directory(
        &self,
        dir: impl AsRef<Path>,
        recursive: bool,
    ) -> Result<BuildStats, RecommenderError> {
        let paths = discover_images(dir.as_ref(), recursive)?;
        self.build(&paths)
    }

    /// Replace the catalog with one built from `paths`.
    ///
    /// Images that fail to decode or extract are skipped and reported in
    /// [`BuildStats::failures`]. Ids follow input order, after dropping
    /// repeated paths, whatever the worker scheduling.
    pub fn build(&self, paths: &[PathBuf]) -> Result<BuildStats, RecommenderError> {
        let guard = self.begin_build()?;
        let _span = info_span!("build", images = paths.len()).entered();
        let start = Instant::now();

        let mut seen = HashSet::with_capacity(paths.len());
        let unique: Vec<&PathBuf> = paths.iter().filter(|p| seen.insert(*p)).collect();
        if unique.len() != paths.len() {
            debug!(
                dropped = paths.len() - unique.len(),
                "build_duplicate_paths"
            );
        }

        let outcomes: Vec<Option<Result<Extracted, RecommenderError>>> = self.pool.install(|| {
            unique
                .par_iter()
                .map(|path| {
                    if self.cancel.is_cancelled() {
                        None
                    } else {
                        Some(self.extract_one(path))
                    }
                })
                .collect()
        });
        if self.cancel.is_cancelled() {
            warn!(elapsed_micros = start.elapsed().as_micros(), "build_cancelled");
            return Err(RecommenderError::BuildCancelled);
        }

        let mut records = Vec::with_capacity(outcomes.len());
        let mut signatures = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (path, outcome) in unique.into_iter().zip(outcomes) {
            match outcome {
                Some(Ok(extracted)) => {
                    let source = extracted.image.source;
                    records.push(ImageRecord {
                        id: records.len(),
                        path: path.clone(),
                        width: source.width,
                        height: source.height,
                        format: source.format,
                    });
                    signatures.push(extracted.signature);
                }
                Some(Err(err)) => {
                    warn!(path = %path.display(), error = %err, "build_image_failed");
                    failures.push(BuildFailure {
                        path: path.clone(),
                        reason: err.to_string(),
                    });
                }
                None => return Err(RecommenderError::BuildCancelled),
            }
        }

        let mut index = BruteForceIndex::with_dimension(self.engine.extractor().dimension());
        index.build(&signatures)?;
        self.install(Catalog::new(index, records), guard);

        let stats = BuildStats {
            indexed: signatures.len(),
            failed: failures.len(),
            failures,
            duration: start.elapsed(),
        };
        info!(
            indexed = stats.indexed,
            failed = stats.failed,
            elapsed_micros = stats.duration.as_micros(),
            "build_complete"
        );
        Ok(stats)
    }

    /// Images whose palettes sit closest to a single color. `k` defaults to
    /// the configured `default_k`.
    pub fn recommend_by_color(
        &self,
        color: &ColorInput,
        k: Option<usize>,
    ) -> Result<Vec<QueryResult>, RecommenderError> {
        let _span = info_span!("recommend_by_color", color = %color).entered();
        let k = k.unwrap_or(self.cfg.matcher.default_k);
        self.ready_catalog(|catalog| Ok(self.engine.query_color(&catalog.index, color, k)?))
    }

    /// Images whose palettes sit closest to the image at `path`.
    ///
    /// With `exclude_self`, an indexed copy of the same path never appears in
    /// the results.
    pub fn recommend_by_image(
        &self,
        path: impl AsRef<Path>,
        k: Option<usize>,
        exclude_self: bool,
    ) -> Result<Vec<QueryResult>, RecommenderError> {
        let path = path.as_ref();
        let _span = info_span!("recommend_by_image", path = %path.display()).entered();
        self.ensure_ready()?;
        let k = k.unwrap_or(self.cfg.matcher.default_k);

        let image = self.loader.decode(path)?;
        let signature = self.engine.image_query_vector(image.pixels.pixels())?;
        self.ready_catalog(|catalog| {
            let exclude = if exclude_self {
                catalog.id_of(path)
            } else {
                None
            };
            Ok(self.engine.query_signature(
                &catalog.index,
                &signature,
                k,
                exclude,
                QueryKind::Image,
            )?)
        })
    }

    /// Dominant colors of the image at `path`. Works in any state; the index
    /// is not consulted.
    pub fn image_palette(&self, path: impl AsRef<Path>) -> Result<ColorPalette, RecommenderError> {
        let image = self.loader.decode(path.as_ref())?;
        Ok(self.engine.extractor().extract(image.pixels.pixels())?)
    }

    /// [`image_palette`](Self::image_palette) as parallel display columns.
    pub fn get_image_colors(&self, path: impl AsRef<Path>) -> Result<ImageColors, RecommenderError> {
        Ok(self.image_palette(path)?.to_image_colors())
    }

    /// Write the ready catalog to `path`.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), RecommenderError> {
        let path = path.as_ref();
        let settings = ExtractionSettings::from_config(&self.cfg);
        let snapshot = self.ready_catalog(|catalog| Ok(catalog.to_snapshot(settings)))?;
        let bytes = encode_snapshot(&snapshot, &self.cfg.compression)?;
        std::fs::write(path, &bytes).map_err(|err| RecommenderError::io(path, &err))?;
        info!(
            path = %path.display(),
            entries = snapshot.records.len(),
            bytes = bytes.len(),
            "snapshot_saved"
        );
        Ok(())
    }

    /// Replace the catalog with one read from `path`, skipping extraction.
    /// Returns the number of images loaded.
    pub fn load_snapshot(&self, path: impl AsRef<Path>) -> Result<usize, RecommenderError> {
        let path = path.as_ref();
        let guard = self.begin_build()?;
        let bytes = std::fs::read(path).map_err(|err| RecommenderError::io(path, &err))?;
        let snapshot: CatalogSnapshot = decode_snapshot(&bytes)?;
        let differs = snapshot
            .settings
            .differences(&ExtractionSettings::from_config(&self.cfg));
        if !differs.is_empty() {
            warn!(
                path = %path.display(),
                fields = ?differs,
                "snapshot_settings_differ"
            );
        }
        let catalog = Catalog::from_snapshot(snapshot, self.cfg.extract.n_colors)?;
        let loaded = catalog.len();
        self.install(catalog, guard);
        info!(path = %path.display(), entries = loaded, "snapshot_loaded");
        Ok(loaded)
    }

    fn extract_one(&self, path: &Path) -> Result<Extracted, RecommenderError> {
        let image = self.loader.decode(path)?;
        let (_, signature) = self.engine.extractor().signature(image.pixels.pixels())?;
        Ok(Extracted { image, signature })
    }

    fn lock_state(&self) -> MutexGuard<'_, RecommenderState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin_build(&self) -> Result<BuildGuard<'_>, RecommenderError> {
        let mut state = self.lock_state();
        if *state == RecommenderState::Building {
            return Err(RecommenderError::BuildInProgress);
        }
        let previous = *state;
        *state = RecommenderState::Building;
        Ok(BuildGuard {
            state: &self.state,
            cancel: &self.cancel,
            previous,
            committed: false,
        })
    }

    /// Swap in a new catalog and mark the recommender ready.
    fn install(&self, catalog: Catalog, mut guard: BuildGuard<'_>) {
        let mut slot = self
            .catalog
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(catalog);
        drop(slot);
        guard.commit();
    }

    fn ensure_ready(&self) -> Result<(), RecommenderError> {
        match self.state() {
            RecommenderState::Ready => Ok(()),
            state => Err(RecommenderError::NotReady { state }),
        }
    }

    /// Run `f` against the catalog if one is ready, without waiting for a
    /// writer.
    fn ready_catalog<T>(
        &self,
        f: impl FnOnce(&Catalog) -> Result<T, RecommenderError>,
    ) -> Result<T, RecommenderError> {
        self.ensure_ready()?;
        let guard = match self.catalog.try_read() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                return Err(RecommenderError::NotReady {
                    state: RecommenderState::Building,
                })
            }
        };
        match guard.as_ref() {
            Some(catalog) => f(catalog),
            None => Err(RecommenderError::NotReady {
                state: self.state(),
            }),
        }
    }

    fn read_catalog<T>(&self, f: impl FnOnce(&Catalog) -> T) -> Option<T> {
        let guard = self.catalog.try_read().ok()?;
        guard.as_ref().map(f)
    }
}

struct Extracted {
    image: DecodedImage,
    signature: Signature,
}

/// Holds the `Building` state. Dropped without [`commit`](Self::commit), it
/// puts back whatever state the build started from. Dropping it always
/// clears the cancellation flag.
struct BuildGuard<'a> {
    state: &'a Mutex<RecommenderState>,
    cancel: &'a CancellationToken,
    previous: RecommenderState,
    committed: bool,
}

impl BuildGuard<'_> {
    fn commit(&mut self) {
        self.set(RecommenderState::Ready);
        self.committed = true;
    }

    fn set(&self, value: RecommenderState) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *state = value;
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.set(self.previous);
        }
        self.cancel.reset();
    }
}
