//! Balanced strategy backed by Zstandard.
//!
//! Compresses with the single-shot bulk API and decodes through a bounded
//! reader; no streaming decoder is offered.

use std::time::Instant;

use super::hints::{is_code_mime, is_structured_mime};
use super::stream::decode_all;
use super::{ChunkMetadata, CompressedChunk, CompressionHints, CompressionStrategy, Priority};
use crate::error::{AdaptiveError, Result};

/// Algorithm tag
pub const ZSTD_NAME: &str = "zstd";

/// Level for hot files
pub const FAST_LEVEL: i32 = 1;

/// Level for frequently accessed files
pub const MID_LEVEL: i32 = 6;

/// Level for everything else (clamped to the codec maximum)
pub const HIGH_LEVEL: i32 = 19;

const MIN_MEDIUM: usize = 10 * 1024;
const MAX_MEDIUM: usize = 1024 * 1024;

/// Balanced Zstandard strategy
#[derive(Debug, Clone, Default)]
pub struct ZstdStrategy {
    /// Upper bound applied on top of the codec maximum
    pub max_level: Option<i32>,
}

impl ZstdStrategy {
    /// Create new Zstd strategy
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the level below the codec maximum
    pub fn with_max_level(mut self, level: i32) -> Self {
        self.max_level = Some(level);
        self
    }

    /// Level for the given hints
    pub fn level_for(&self, hints: &CompressionHints) -> i32 {
        let wanted = if hints.is_hot {
            FAST_LEVEL
        } else if hints.access_frequency > 0.5 {
            MID_LEVEL
        } else {
            HIGH_LEVEL
        };

        let codec_max = *zstd::compression_level_range().end();
        let ceiling = self.max_level.map_or(codec_max, |cap| cap.min(codec_max));
        wanted.min(ceiling).max(1)
    }
}

impl CompressionStrategy for ZstdStrategy {
    fn name(&self) -> &str {
        ZSTD_NAME
    }

    fn priority(&self) -> Priority {
        Priority::Balanced
    }

    fn compress(&self, data: &[u8], hints: &CompressionHints) -> Result<CompressedChunk> {
        let start = Instant::now();
        let level = self.level_for(hints);
        let compressed = zstd::bulk::compress(data, level)
            .map_err(|e| AdaptiveError::Compression(format!("{ZSTD_NAME}: {e}")))?;

        let metadata = ChunkMetadata::new(hints.mime_type.clone())
            .with_level(level)
            .with_compression_time(start.elapsed());

        Ok(CompressedChunk::new(ZSTD_NAME, data.len(), compressed, metadata))
    }

    fn decompress(&self, chunk: &CompressedChunk) -> Result<Vec<u8>> {
        let decoder = zstd::stream::read::Decoder::with_buffer(&chunk.data[..])
            .map_err(|e| AdaptiveError::Decompression(format!("{ZSTD_NAME}: {e}")))?;
        decode_all(decoder, ZSTD_NAME, chunk.original_size)
    }

    fn estimate_ratio(&self, _data: &[u8], hints: &CompressionHints) -> f64 {
        if is_structured_mime(&hints.mime_type) {
            0.2
        } else if is_code_mime(&hints.mime_type) {
            0.3
        } else {
            0.5
        }
    }

    fn should_use(&self, _data: &[u8], hints: &CompressionHints) -> bool {
        is_structured_mime(&hints.mime_type)
            || (hints.access_frequency > 0.3 && hints.access_frequency < 0.8)
            || (hints.file_size >= MIN_MEDIUM && hints.file_size <= MAX_MEDIUM)
    }
}
