//! Binary snapshots.
//!
//! A snapshot blob is a 4-byte magic, one codec byte, then the value encoded
//! with bincode (serde mode, standard config) and optionally zstd-compressed.
//! The codec byte makes a blob self-describing, so readers need no config.

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use zstd::{decode_all, encode_all};

use crate::IndexError;

const MAGIC: &[u8; 4] = b"CHSK";
const HEADER_LEN: usize = MAGIC.len() + 1;

/// Serializable contents of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub schema_version: u16,
    pub dimension: Option<usize>,
    /// Signatures in id order.
    pub signatures: Vec<Vec<f32>>,
}

/// Compression codec options for snapshots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    /// Raw bincode; handy when inspecting blobs.
    None,
    #[default]
    Zstd,
}

impl CompressionCodec {
    fn tag(self) -> u8 {
        match self {
            CompressionCodec::None => 0,
            CompressionCodec::Zstd => 1,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(CompressionCodec::None),
            1 => Some(CompressionCodec::Zstd),
            _ => None,
        }
    }
}

/// Compression behaviour for [`encode_snapshot`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Zstd level (1-22); ignored for [`CompressionCodec::None`].
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn new(codec: CompressionCodec, level: i32) -> Self {
        Self { codec, level }
    }

    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(encode_all(data, self.level)?),
        }
    }
}

/// Encode any serde value into a snapshot blob.
pub fn encode_snapshot<T: Serialize>(
    value: &T,
    compression: &CompressionConfig,
) -> Result<Vec<u8>, IndexError> {
    let encoded = encode_to_vec(value, standard())?;
    let body = compression.compress(&encoded)?;
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(MAGIC);
    out.push(compression.codec.tag());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a blob written by [`encode_snapshot`].
pub fn decode_snapshot<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, IndexError> {
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(IndexError::InvalidSnapshot("missing snapshot header".into()));
    }
    let tag = bytes[MAGIC.len()];
    let codec = CompressionCodec::from_tag(tag)
        .ok_or_else(|| IndexError::InvalidSnapshot(format!("unknown codec tag {tag}")))?;
    let body = &bytes[HEADER_LEN..];
    let decompressed = match codec {
        CompressionCodec::None => body.to_vec(),
        CompressionCodec::Zstd => decode_all(body)?,
    };
    let (value, _) = decode_from_slice(&decompressed, standard())?;
    Ok(value)
}

impl IndexSnapshot {
    pub fn encode(&self, compression: &CompressionConfig) -> Result<Vec<u8>, IndexError> {
        encode_snapshot(self, compression)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, IndexError> {
        decode_snapshot(bytes)
    }
}
