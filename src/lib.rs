//! # Adaptive Compression
//!
//! Per-request codec selection for file payloads. Every call is matched to
//! the strategy whose heuristics fit the payload best, the codec runs on
//! the tokio blocking pool, and the engine keeps running statistics.
//!
//! ## Features
//!
//! - **Three built-in strategies**: LZ4 (speed), Brotli (size), Zstandard (balanced)
//! - **Adaptive parameters**: quality, level and block size follow access pattern and size
//! - **Deterministic selection**: ranked by estimated ratio, ties by registration order
//! - **Failure isolation**: `compress` never fails; decode errors are explicit
//! - **Streaming decode** for strategies that support it
//! - **Profiles**: `development`, `production`, `ci`, plus TOML/env overrides
//!
//! ### Data Flow
//!
//! ```text
//! caller ── compress(data, mime, meta) ──> build_hints ──> registry.get_optimal
//!                                                              │
//!            CompressionResult <── stats <── strategy.compress ┘
//!
//! caller ── decompress(chunk) ──> registry.get(chunk.algorithm) ──> strategy.decompress
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use adaptive::{CompressionEngine, CompressionProfile, FileMetadata};
//!
//! let engine = CompressionEngine::new(CompressionProfile::production());
//!
//! let meta = FileMetadata::new().with_path("src/app.tsx").with_access_frequency(0.9);
//! let result = engine.compress(source_bytes, "text/typescript", meta).await;
//! println!("{} saved {} bytes", result.algorithm, result.bytes_saved());
//!
//! let original = engine.decompress(&result.chunk.unwrap()).await?;
//! ```
//!
//! ## Modules
//!
//! - [`strategy`]: Capability contract, built-in strategies, chunk and hint types
//! - [`registry`]: Strategy registry and selection
//! - [`engine`]: Orchestrator, profiles and statistics
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod strategy;

// Re-exports for convenience
pub use config::Config;
pub use engine::{
    CompressionEngine, CompressionProfile, CompressionResult, EngineOptions, StatisticsSnapshot,
    StrategyAnalysis,
};
pub use error::{AdaptiveError, Result};
pub use registry::StrategyRegistry;
pub use strategy::{
    CompressedChunk, CompressionHints, CompressionStrategy, DecompressStream, FileMetadata,
    Priority, Strategy, StrategyId,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
