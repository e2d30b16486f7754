//! Compression strategies.
//!
//! A strategy wraps one codec family behind a common capability contract:
//! compress, decompress, optional streaming decode, a cheap ratio estimate
//! and an eligibility predicate. The built-in set is closed and dispatched
//! statically through [`Strategy`]; runtime plug-ins ride in
//! [`Strategy::Custom`].
//!
//! # Built-in strategies
//!
//! | Strategy            | Name     | Priority   | Streaming | Best For                        |
//! |---------------------|----------|------------|-----------|---------------------------------|
//! | [`Lz4Strategy`]     | `lz4`    | speed      | yes       | Hot files, small/medium payloads|
//! | [`BrotliStrategy`]  | `brotli` | size       | yes       | Text, large cold files          |
//! | [`ZstdStrategy`]    | `zstd`   | balanced   | no        | Structured data, mid-frequency  |
//!
//! # Contract
//!
//! `decompress(compress(data, hints)) == data` for every `data`/`hints`
//! pair. Compressed output may be larger than the input.

mod brotli;
mod chunk;
mod hints;
mod lz4;
mod stream;
mod zstd;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use self::brotli::{BrotliStrategy, BROTLI_NAME, LOW_MEMORY_WINDOW_SIZE};
pub use self::lz4::{block_size_for, Lz4Strategy, LZ4_NAME};
pub use self::zstd::{ZstdStrategy, ZSTD_NAME};
pub use chunk::{ChunkMetadata, CompressedChunk};
pub use hints::{
    classify_path, clamp_frequency, is_code_mime, is_patterned, is_structured_mime,
    is_textual_mime, looks_textual, repetition_ratio, Classifier, CompressionHints, Ecosystem,
    FileClassification, FileMetadata, DEFAULT_ACCESS_FREQUENCY,
};
pub use stream::{DecoderStream, DecompressStream, STREAM_PIECE_SIZE};

/// Declared optimization objective of a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Minimize codec latency
    Speed,
    /// Trade-off between latency and ratio
    Balanced,
    /// Minimize output size
    Size,
}

impl Priority {
    /// Get lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Priority::Speed => "speed",
            Priority::Balanced => "balanced",
            Priority::Size => "size",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Capability contract every compression strategy implements
///
/// Implementations must be cheap to call concurrently: the engine invokes
/// `compress`/`decompress` from blocking worker threads.
pub trait CompressionStrategy: Send + Sync + fmt::Debug {
    /// Tag persisted in [`CompressedChunk::algorithm`]
    fn name(&self) -> &str;

    /// Declared optimization objective
    fn priority(&self) -> Priority;

    /// Whether [`create_decompressor`](Self::create_decompressor) yields a stream
    fn supports_streaming(&self) -> bool {
        false
    }

    /// Compress a payload, recording codec time in the chunk metadata
    fn compress(&self, data: &[u8], hints: &CompressionHints) -> Result<CompressedChunk>;

    /// Decode a chunk produced by this strategy
    fn decompress(&self, chunk: &CompressedChunk) -> Result<Vec<u8>>;

    /// Lazy decoder over a chunk; `None` without streaming support
    fn create_decompressor(&self, _chunk: &CompressedChunk) -> Option<DecompressStream> {
        None
    }

    /// Predicted compressed/original ratio, no real compression performed
    fn estimate_ratio(&self, data: &[u8], hints: &CompressionHints) -> f64;

    /// Eligibility predicate
    fn should_use(&self, data: &[u8], hints: &CompressionHints) -> bool;
}

/// Typed registry key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyId {
    /// `lz4`
    Lz4,
    /// `brotli`
    Brotli,
    /// `zstd`
    Zstd,
    /// Any other registered name
    Custom(String),
}

impl StrategyId {
    /// Map a persisted algorithm tag onto a key
    pub fn from_name(name: &str) -> Self {
        match name {
            LZ4_NAME => StrategyId::Lz4,
            BROTLI_NAME => StrategyId::Brotli,
            ZSTD_NAME => StrategyId::Zstd,
            other => StrategyId::Custom(other.to_string()),
        }
    }

    /// Get the algorithm tag
    pub fn as_str(&self) -> &str {
        match self {
            StrategyId::Lz4 => LZ4_NAME,
            StrategyId::Brotli => BROTLI_NAME,
            StrategyId::Zstd => ZSTD_NAME,
            StrategyId::Custom(name) => name,
        }
    }
}

impl From<&str> for StrategyId {
    fn from(name: &str) -> Self {
        StrategyId::from_name(name)
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of strategy variants
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Speed-first (LZ4)
    Speed(Lz4Strategy),
    /// Size-first (Brotli)
    Size(BrotliStrategy),
    /// Balanced (Zstandard)
    Balanced(ZstdStrategy),
    /// Runtime-supplied strategy
    Custom(Arc<dyn CompressionStrategy>),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $call:expr) => {
        match $self {
            Strategy::Speed($s) => $call,
            Strategy::Size($s) => $call,
            Strategy::Balanced($s) => $call,
            Strategy::Custom($s) => $call,
        }
    };
}

impl Strategy {
    /// Wrap a custom implementation
    pub fn custom(strategy: impl CompressionStrategy + 'static) -> Self {
        Strategy::Custom(Arc::new(strategy))
    }

    /// Registry key for this strategy
    pub fn id(&self) -> StrategyId {
        StrategyId::from_name(self.name())
    }
}

impl CompressionStrategy for Strategy {
    fn name(&self) -> &str {
        dispatch!(self, s => s.name())
    }

    fn priority(&self) -> Priority {
        dispatch!(self, s => s.priority())
    }

    fn supports_streaming(&self) -> bool {
        dispatch!(self, s => s.supports_streaming())
    }

    fn compress(&self, data: &[u8], hints: &CompressionHints) -> Result<CompressedChunk> {
        dispatch!(self, s => s.compress(data, hints))
    }

    fn decompress(&self, chunk: &CompressedChunk) -> Result<Vec<u8>> {
        dispatch!(self, s => s.decompress(chunk))
    }

    fn create_decompressor(&self, chunk: &CompressedChunk) -> Option<DecompressStream> {
        dispatch!(self, s => s.create_decompressor(chunk))
    }

    fn estimate_ratio(&self, data: &[u8], hints: &CompressionHints) -> f64 {
        dispatch!(self, s => s.estimate_ratio(data, hints))
    }

    fn should_use(&self, data: &[u8], hints: &CompressionHints) -> bool {
        dispatch!(self, s => s.should_use(data, hints))
    }
}

impl From<Lz4Strategy> for Strategy {
    fn from(s: Lz4Strategy) -> Self {
        Strategy::Speed(s)
    }
}

impl From<BrotliStrategy> for Strategy {
    fn from(s: BrotliStrategy) -> Self {
        Strategy::Size(s)
    }
}

impl From<ZstdStrategy> for Strategy {
    fn from(s: ZstdStrategy) -> Self {
        Strategy::Balanced(s)
    }
}
