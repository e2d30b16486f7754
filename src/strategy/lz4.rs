//! Speed-first strategy backed by the LZ4 frame format.
//!
//! LZ4 has a single (fast) level in `lz4_flex`; the only tunable is the
//! frame block size, tiered by payload length. Frames carry a content
//! checksum so corruption surfaces as a decode error.

use std::io::{Cursor, Write};
use std::time::Instant;

use lz4_flex::frame::{BlockSize, FrameDecoder, FrameEncoder, FrameInfo};

use super::hints::{is_patterned, is_textual_mime, looks_textual};
use super::stream::{decode_all, DecoderStream, DecompressStream};
use super::{ChunkMetadata, CompressedChunk, CompressionHints, CompressionStrategy, Priority};
use crate::error::{AdaptiveError, Result};

/// Algorithm tag
pub const LZ4_NAME: &str = "lz4";

/// Level recorded in metadata (lz4_flex exposes no level knob)
const FAST_LEVEL: i32 = 1;

/// Payloads below this size are always eligible
const SIZE_LIMIT: usize = 500 * 1024;

const KIB: usize = 1024;
const MIB: usize = 1024 * 1024;

/// Speed-first LZ4 strategy
#[derive(Debug, Clone, Default)]
pub struct Lz4Strategy {
    /// Running in a latency-first environment (dev/speed profiles)
    pub fast_environment: bool,
}

/// Frame block size for a payload length
pub fn block_size_for(len: usize) -> (BlockSize, usize) {
    if len < 64 * KIB {
        (BlockSize::Max64KB, 64 * KIB)
    } else if len < 256 * KIB {
        (BlockSize::Max256KB, 256 * KIB)
    } else if len < MIB {
        (BlockSize::Max1MB, MIB)
    } else {
        (BlockSize::Max4MB, 4 * MIB)
    }
}

impl Lz4Strategy {
    /// Create new LZ4 strategy
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the execution environment as latency-first
    pub fn with_fast_environment(mut self, fast: bool) -> Self {
        self.fast_environment = fast;
        self
    }

    fn encode(&self, data: &[u8], block_size: BlockSize) -> Result<Vec<u8>> {
        let info = FrameInfo::new()
            .block_size(block_size)
            .content_checksum(true);
        let mut encoder = FrameEncoder::with_frame_info(info, Vec::new());
        encoder
            .write_all(data)
            .map_err(|e| AdaptiveError::Compression(format!("{LZ4_NAME}: {e}")))?;
        encoder
            .finish()
            .map_err(|e| AdaptiveError::Compression(format!("{LZ4_NAME}: {e}")))
    }
}

impl CompressionStrategy for Lz4Strategy {
    fn name(&self) -> &str {
        LZ4_NAME
    }

    fn priority(&self) -> Priority {
        Priority::Speed
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn compress(&self, data: &[u8], hints: &CompressionHints) -> Result<CompressedChunk> {
        let start = Instant::now();
        let (block_size, block_bytes) = block_size_for(data.len());
        let compressed = self.encode(data, block_size)?;

        let metadata = ChunkMetadata::new(hints.mime_type.clone())
            .with_level(FAST_LEVEL)
            .with_block_size(block_bytes)
            .with_compression_time(start.elapsed());

        Ok(CompressedChunk::new(LZ4_NAME, data.len(), compressed, metadata))
    }

    fn decompress(&self, chunk: &CompressedChunk) -> Result<Vec<u8>> {
        let decoder = FrameDecoder::new(Cursor::new(chunk.data.clone()));
        decode_all(decoder, LZ4_NAME, chunk.original_size)
    }

    fn create_decompressor(&self, chunk: &CompressedChunk) -> Option<DecompressStream> {
        let decoder = FrameDecoder::new(Cursor::new(chunk.data.clone()));
        Some(DecoderStream::new(decoder, LZ4_NAME, chunk.original_size).boxed())
    }

    fn estimate_ratio(&self, data: &[u8], hints: &CompressionHints) -> f64 {
        if is_patterned(data) {
            0.4
        } else if is_textual_mime(&hints.mime_type) || looks_textual(data) {
            0.5
        } else {
            0.7
        }
    }

    fn should_use(&self, _data: &[u8], hints: &CompressionHints) -> bool {
        hints.is_hot
            || hints.access_frequency > 0.8
            || hints.file_size < SIZE_LIMIT
            || self.fast_environment
    }
}
