//! # Chromaseek Index
//!
//! Exact nearest-neighbour search over fixed-length numeric signatures.
//! The crate knows nothing about color; it stores opaque `f32` vectors with
//! dense integer ids and answers "which stored vectors are closest to this
//! one" by squared Euclidean distance.
//!
//! ## Core Features
//!
//! - **Pluggable index**: callers program against the [`SimilarityIndex`]
//!   trait. [`BruteForceIndex`] is the exact implementation; a sub-linear
//!   index can slot in later without touching callers.
//! - **Dimension safety**: the first insert (or [`BruteForceIndex::with_dimension`])
//!   fixes the signature length; anything else is a
//!   [`IndexError::DimensionMismatch`].
//! - **Deterministic ranking**: ties on distance are broken by ascending id.
//! - **Snapshots**: [`encode_snapshot`] / [`decode_snapshot`] write any serde
//!   value as bincode, zstd-compressed by default, behind a small header.
//!
//! ## Example Usage
//!
//! ```
//! use index::{BruteForceIndex, SimilarityIndex};
//!
//! let mut index = BruteForceIndex::new();
//! index.insert(&[0.0, 0.0, 0.0]).unwrap();
//! index.insert(&[1.0, 1.0, 1.0]).unwrap();
//!
//! let hits = index.search(&[0.9, 0.9, 0.9], 1).unwrap();
//! assert_eq!(hits[0].id, 1);
//! ```

mod brute;
mod similarity;
mod snapshot;

pub use crate::brute::{squared_l2, BruteForceIndex};
pub use crate::similarity::{Neighbor, SimilarityIndex};
pub use crate::snapshot::{
    decode_snapshot, encode_snapshot, CompressionCodec, CompressionConfig, IndexSnapshot,
};

use bincode::error::{DecodeError, EncodeError};
use thiserror::Error;

/// Bump whenever the [`IndexSnapshot`] layout changes.
pub const INDEX_SCHEMA_VERSION: u16 = 1;

/// Errors raised by index operations and snapshot encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("signature must not be empty")]
    EmptySignature,
    #[error("signature contains a non-finite value at position {position}")]
    NonFiniteValue { position: usize },
    #[error("unsupported snapshot schema {found}; expected {expected}")]
    UnsupportedSchema { found: u16, expected: u16 },
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error("serialization encode error: {0}")]
    Encode(String),
    #[error("serialization decode error: {0}")]
    Decode(String),
    #[error("compression error: {0}")]
    Compression(String),
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Compression(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_object_works_through_box() {
        let mut index: Box<dyn SimilarityIndex> = Box::new(BruteForceIndex::with_dimension(2));
        index.insert(&[1.0, 0.0]).unwrap();
        index.insert(&[0.0, 1.0]).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.dimension(), Some(2));
        let hits = index.search(&[0.0, 0.9], 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn error_messages() {
        let err = IndexError::DimensionMismatch {
            expected: 15,
            actual: 3,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 15, got 3");
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad frame");
        assert_eq!(
            IndexError::from(io),
            IndexError::Compression("bad frame".into())
        );
    }
}
