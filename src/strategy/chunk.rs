//! Self-describing compressed output record.
//!
//! The storage layer persists a [`CompressedChunk`] verbatim and hands it
//! back unmodified. Serde field names are camelCase and `data` travels as
//! base64 so any text store (JSON, TOML, KV) can hold it.

use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Compressed payload plus everything needed to decode it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedChunk {
    /// Name of the strategy that produced the payload
    pub algorithm: String,
    /// Uncompressed size in bytes
    pub original_size: usize,
    /// Compressed payload size in bytes (may exceed `original_size`)
    pub compressed_size: usize,
    /// Advisory dictionary tag; never required to decode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<String>,
    /// Opaque codec output
    #[serde(with = "base64_bytes")]
    pub data: Bytes,
    /// Codec parameters and timings
    pub metadata: ChunkMetadata,
}

impl CompressedChunk {
    /// Create a chunk, deriving `compressed_size` from the payload
    pub fn new(
        algorithm: impl Into<String>,
        original_size: usize,
        data: impl Into<Bytes>,
        metadata: ChunkMetadata,
    ) -> Self {
        let data = data.into();
        Self {
            algorithm: algorithm.into(),
            original_size,
            compressed_size: data.len(),
            dictionary: None,
            data,
            metadata,
        }
    }

    /// Attach a dictionary tag
    pub fn with_dictionary(mut self, dictionary: impl Into<String>) -> Self {
        self.dictionary = Some(dictionary.into());
        self
    }

    /// compressed / original (1.0 for empty input)
    pub fn ratio(&self) -> f64 {
        if self.original_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.original_size as f64
        }
    }

    /// Record how long a decode took
    pub fn record_decompression(&mut self, elapsed: Duration) {
        self.metadata.decompression_time = Some(elapsed);
    }
}

/// Codec parameters and timings attached to a chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// Wall-clock codec time
    pub compression_time: Duration,
    /// Codec level (lz4, zstd)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    /// Codec quality (brotli)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    /// Block size used by block-oriented codecs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_size: Option<usize>,
    /// MIME type of the original payload
    pub mime_type: String,
    /// Set after a timed decompress
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decompression_time: Option<Duration>,
}

impl ChunkMetadata {
    /// Metadata for a given MIME type
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            ..Default::default()
        }
    }

    /// Set level
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = Some(level);
        self
    }

    /// Set quality
    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Set block size
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = Some(block_size);
        self
    }

    /// Set compression time
    pub fn with_compression_time(mut self, elapsed: Duration) -> Self {
        self.compression_time = elapsed;
        self
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
