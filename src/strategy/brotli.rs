//! Size-first strategy backed by Brotli.
//!
//! Quality adapts to access pattern: hot files get the fastest setting,
//! frequently read files a middle setting, everything else maximum
//! quality. An ecosystem tag may be attached as an advisory dictionary
//! name; decoding never needs it.

use std::io::{Cursor, Write};
use std::time::Instant;

use brotli::{CompressorWriter, Decompressor};

use super::hints::{is_textual_mime, looks_textual, Ecosystem};
use super::stream::{decode_all, DecoderStream, DecompressStream};
use super::{ChunkMetadata, CompressedChunk, CompressionHints, CompressionStrategy, Priority};
use crate::error::{AdaptiveError, Result};

/// Algorithm tag
pub const BROTLI_NAME: &str = "brotli";

/// Quality for hot files
pub const FAST_QUALITY: u32 = 1;

/// Quality for frequently accessed files
pub const BALANCED_QUALITY: u32 = 5;

/// Maximum Brotli quality
pub const MAX_QUALITY: u32 = 11;

/// Default window size (log2 of the sliding window in bytes)
pub const DEFAULT_WINDOW_SIZE: u32 = 22;

/// Window size under a tight memory ceiling
pub const LOW_MEMORY_WINDOW_SIZE: u32 = 20;

/// Internal buffer size for the encoder/decoder
const BUFFER_SIZE: usize = 4096;

/// Large cold payloads are eligible regardless of type
const LARGE_FILE: usize = 100 * 1024;

/// Size-first Brotli strategy
#[derive(Debug, Clone)]
pub struct BrotliStrategy {
    /// Attach ecosystem dictionary tags
    pub enable_dictionary: bool,
    /// Window size (10-24)
    pub window_size: u32,
}

impl Default for BrotliStrategy {
    fn default() -> Self {
        Self {
            enable_dictionary: false,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl BrotliStrategy {
    /// Create new Brotli strategy with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable ecosystem dictionary tags
    pub fn with_dictionary(mut self, enabled: bool) -> Self {
        self.enable_dictionary = enabled;
        self
    }

    /// Set window size (clamped to 10-24)
    pub fn with_window_size(mut self, window_size: u32) -> Self {
        self.window_size = window_size.clamp(10, 24);
        self
    }

    /// Quality for the given hints
    pub fn quality_for(&self, hints: &CompressionHints) -> u32 {
        if hints.is_hot {
            FAST_QUALITY
        } else if hints.access_frequency > 0.8 {
            BALANCED_QUALITY
        } else {
            MAX_QUALITY
        }
    }

    fn dictionary_for(&self, hints: &CompressionHints) -> Option<&'static str> {
        if self.enable_dictionary
            && hints.ecosystem != Ecosystem::Unknown
            && is_textual_mime(&hints.mime_type)
        {
            Some(hints.ecosystem.name())
        } else {
            None
        }
    }

    fn encode(&self, data: &[u8], quality: u32) -> Result<Vec<u8>> {
        let mut compressed = Vec::new();
        {
            let mut writer =
                CompressorWriter::new(&mut compressed, BUFFER_SIZE, quality, self.window_size);
            writer
                .write_all(data)
                .map_err(|e| AdaptiveError::Compression(format!("{BROTLI_NAME}: {e}")))?;
            writer
                .flush()
                .map_err(|e| AdaptiveError::Compression(format!("{BROTLI_NAME}: {e}")))?;
        }
        Ok(compressed)
    }
}

impl CompressionStrategy for BrotliStrategy {
    fn name(&self) -> &str {
        BROTLI_NAME
    }

    fn priority(&self) -> Priority {
        Priority::Size
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn compress(&self, data: &[u8], hints: &CompressionHints) -> Result<CompressedChunk> {
        let start = Instant::now();
        let quality = self.quality_for(hints);
        let compressed = self.encode(data, quality)?;

        let metadata = ChunkMetadata::new(hints.mime_type.clone())
            .with_quality(quality)
            .with_compression_time(start.elapsed());

        let chunk = CompressedChunk::new(BROTLI_NAME, data.len(), compressed, metadata);
        Ok(match self.dictionary_for(hints) {
            Some(dictionary) => chunk.with_dictionary(dictionary),
            None => chunk,
        })
    }

    fn decompress(&self, chunk: &CompressedChunk) -> Result<Vec<u8>> {
        let decoder = Decompressor::new(Cursor::new(chunk.data.clone()), BUFFER_SIZE);
        decode_all(decoder, BROTLI_NAME, chunk.original_size)
    }

    fn create_decompressor(&self, chunk: &CompressedChunk) -> Option<DecompressStream> {
        let decoder = Decompressor::new(Cursor::new(chunk.data.clone()), BUFFER_SIZE);
        Some(DecoderStream::new(decoder, BROTLI_NAME, chunk.original_size).boxed())
    }

    fn estimate_ratio(&self, data: &[u8], hints: &CompressionHints) -> f64 {
        if is_textual_mime(&hints.mime_type) || looks_textual(data) {
            if self.dictionary_for(hints).is_some() {
                0.15
            } else {
                0.25
            }
        } else {
            0.6
        }
    }

    fn should_use(&self, _data: &[u8], hints: &CompressionHints) -> bool {
        is_textual_mime(&hints.mime_type) || (hints.file_size > LARGE_FILE && !hints.is_hot)
    }
}
