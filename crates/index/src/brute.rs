//! Exact brute-force search.
//!
//! Signatures live back to back in one `Vec<f32>`; a query scans all of
//! them. O(N·D) per query and O(N·D) memory, which is fine for catalogs in
//! the tens of thousands.

use std::cmp::Ordering;

use tracing::debug;

use crate::similarity::{Neighbor, SimilarityIndex};
use crate::snapshot::IndexSnapshot;
use crate::{IndexError, INDEX_SCHEMA_VERSION};

/// Chunk size for the distance loop; lets the compiler vectorise.
const SIMD_CHUNK_SIZE: usize = 32;

/// Flat, exact [`SimilarityIndex`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BruteForceIndex {
    /// Dimension required up front, surviving `build`.
    fixed_dimension: Option<usize>,
    /// Dimension in force: fixed, or taken from the first insert.
    dimension: Option<usize>,
    data: Vec<f32>,
}

impl BruteForceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// An index that only ever accepts signatures of length `dimension`.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            fixed_dimension: Some(dimension),
            dimension: Some(dimension),
            data: Vec::new(),
        }
    }

    /// Build an index holding `signatures` with ids `0..N`.
    pub fn from_signatures(signatures: &[Vec<f32>]) -> Result<Self, IndexError> {
        let mut index = Self::new();
        index.build(signatures)?;
        Ok(index)
    }

    /// Stored signature for `id`.
    pub fn get(&self, id: usize) -> Option<&[f32]> {
        let dim = self.dimension?;
        let start = id.checked_mul(dim)?;
        self.data.get(start..start + dim)
    }

    /// `(id, signature)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[f32])> + '_ {
        let dim = self.dimension.unwrap_or(0).max(1);
        self.data.chunks_exact(dim).enumerate()
    }

    pub fn to_snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            schema_version: INDEX_SCHEMA_VERSION,
            dimension: self.dimension,
            signatures: self.iter().map(|(_, sig)| sig.to_vec()).collect(),
        }
    }

    /// Rebuild an index from a snapshot, re-validating every signature.
    pub fn from_snapshot(snapshot: IndexSnapshot) -> Result<Self, IndexError> {
        if snapshot.schema_version != INDEX_SCHEMA_VERSION {
            return Err(IndexError::UnsupportedSchema {
                found: snapshot.schema_version,
                expected: INDEX_SCHEMA_VERSION,
            });
        }
        let mut index = match snapshot.dimension {
            Some(dim) => Self::with_dimension(dim),
            None => Self::new(),
        };
        index.build(&snapshot.signatures)?;
        Ok(index)
    }

    fn check(&self, signature: &[f32], expected: Option<usize>) -> Result<(), IndexError> {
        if signature.is_empty() {
            return Err(IndexError::EmptySignature);
        }
        if let Some(expected) = expected {
            if signature.len() != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: signature.len(),
                });
            }
        }
        if let Some(position) = signature.iter().position(|v| !v.is_finite()) {
            return Err(IndexError::NonFiniteValue { position });
        }
        Ok(())
    }

    fn rank(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        let mut hits: Vec<Neighbor> = self
            .iter()
            .map(|(id, sig)| Neighbor {
                id,
                distance: squared_l2(query, sig),
            })
            .collect();

        if k < hits.len() {
            hits.select_nth_unstable_by(k, compare);
            hits.truncate(k);
        }
        hits.sort_unstable_by(compare);
        hits
    }
}

impl SimilarityIndex for BruteForceIndex {
    fn insert(&mut self, signature: &[f32]) -> Result<usize, IndexError> {
        self.check(signature, self.dimension)?;
        let id = self.len();
        self.dimension = Some(signature.len());
        self.data.extend_from_slice(signature);
        Ok(id)
    }

    fn build(&mut self, signatures: &[Vec<f32>]) -> Result<(), IndexError> {
        let mut dimension = self.fixed_dimension;
        for sig in signatures {
            self.check(sig, dimension)?;
            dimension = Some(sig.len());
        }

        let mut data = Vec::with_capacity(signatures.len() * dimension.unwrap_or(0));
        for sig in signatures {
            data.extend_from_slice(sig);
        }
        self.data = data;
        self.dimension = dimension;
        debug!(
            entries = signatures.len(),
            dimension = dimension.unwrap_or(0),
            "index_built"
        );
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        self.check(query, self.dimension)?;
        if k == 0 {
            return Ok(Vec::new());
        }
        Ok(self.rank(query, k))
    }

    fn len(&self) -> usize {
        match self.dimension {
            Some(dim) if dim > 0 => self.data.len() / dim,
            _ => 0,
        }
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

/// Closest first; equal distances fall back to id order.
fn compare(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .partial_cmp(&b.distance)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id.cmp(&b.id))
}

/// Squared Euclidean distance, processed in fixed-size chunks.
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    let mut total = 0.0f32;
    let mut a_chunks = a.chunks_exact(SIMD_CHUNK_SIZE);
    let mut b_chunks = b.chunks_exact(SIMD_CHUNK_SIZE);
    for (ca, cb) in a_chunks.by_ref().zip(b_chunks.by_ref()) {
        total += squared_l2_chunk(ca, cb);
    }
    total + squared_l2_chunk(a_chunks.remainder(), b_chunks.remainder())
}

#[inline(always)]
fn squared_l2_chunk(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
