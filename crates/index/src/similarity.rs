use serde::{Deserialize, Serialize};

use crate::IndexError;

/// One search hit: the stored id and its squared Euclidean distance to the
/// query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: usize,
    pub distance: f32,
}

/// Nearest-neighbour index over fixed-length `f32` signatures.
///
/// Implementations know nothing about what the numbers mean. Every stored
/// and queried signature must have the same length; a mismatch is an error,
/// never a silent reshape.
///
/// Mutation takes `&mut self`, so callers share an index behind a lock and
/// writers get exclusive access for free.
pub trait SimilarityIndex: Send + Sync {
    /// Append a signature and return its id. Ids are dense and start at 0.
    fn insert(&mut self, signature: &[f32]) -> Result<usize, IndexError>;

    /// Replace all contents with `signatures`, assigning ids `0..N` in input
    /// order. On error the previous contents are kept.
    fn build(&mut self, signatures: &[Vec<f32>]) -> Result<(), IndexError>;

    /// The `k` nearest stored signatures, closest first, ties broken by
    /// ascending id. An empty index yields an empty result.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError>;

    /// Number of stored signatures.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signature length, once known.
    fn dimension(&self) -> Option<usize>;
}
