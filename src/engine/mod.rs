//! Compression engine.
//!
//! The engine turns caller metadata into hints, asks the registry for a
//! strategy, runs the codec on the tokio blocking pool and folds the
//! outcome into its statistics table.
//!
//! # Example
//!
//! ```ignore
//! use adaptive::engine::{CompressionEngine, CompressionProfile};
//! use adaptive::strategy::FileMetadata;
//!
//! let engine = CompressionEngine::new(CompressionProfile::production());
//! let meta = FileMetadata::new().with_access_frequency(0.9);
//! let result = engine.compress(b"hello world".to_vec(), "text/plain", meta).await;
//! assert_eq!(result.algorithm, "lz4");
//!
//! let chunk = result.chunk.unwrap();
//! let original = engine.decompress(&chunk).await?;
//! ```

mod profile;
mod stats;

use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::Serialize;

use crate::error::{AdaptiveError, Result};
use crate::registry::StrategyRegistry;
use crate::strategy::{
    classify_path, clamp_frequency, Classifier, CompressedChunk, CompressionHints,
    CompressionStrategy, DecompressStream, FileMetadata, Priority, Strategy,
    DEFAULT_ACCESS_FREQUENCY,
};

pub use profile::{CompressionProfile, TIGHT_MEMORY_LIMIT};
pub use stats::{AlgorithmStats, StatisticsSnapshot, StatsTracker};

/// Algorithm reported by failed compress calls
pub const NO_ALGORITHM: &str = "none";

/// Runtime knobs that are not part of a profile
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Upper bound on a single codec call
    pub codec_timeout: Option<Duration>,
    /// Path classifier feeding `is_hot` and `ecosystem`
    pub classifier: Classifier,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            codec_timeout: None,
            classifier: classify_path,
        }
    }
}

impl EngineOptions {
    /// Set codec timeout
    pub fn with_codec_timeout(mut self, timeout: Duration) -> Self {
        self.codec_timeout = Some(timeout);
        self
    }

    /// Replace the path classifier
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }
}

/// Outcome of a compress call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionResult {
    /// Codec succeeded
    pub success: bool,
    /// Strategy used, or `"none"` on failure
    pub algorithm: String,
    /// Input size
    pub original_size: usize,
    /// Output size (input size on failure)
    pub compressed_size: usize,
    /// compressed / original (1.0 on failure or empty input)
    pub compression_ratio: f64,
    /// Wall-clock time including scheduling on the blocking pool
    pub compression_time: Duration,
    /// Produced chunk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<CompressedChunk>,
    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompressionResult {
    fn succeeded(chunk: CompressedChunk, elapsed: Duration) -> Self {
        Self {
            success: true,
            algorithm: chunk.algorithm.clone(),
            original_size: chunk.original_size,
            compressed_size: chunk.compressed_size,
            compression_ratio: chunk.ratio(),
            compression_time: elapsed,
            chunk: Some(chunk),
            error: None,
        }
    }

    fn failed(original_size: usize, elapsed: Duration, error: &AdaptiveError) -> Self {
        Self {
            success: false,
            algorithm: NO_ALGORITHM.to_string(),
            original_size,
            compressed_size: original_size,
            compression_ratio: 1.0,
            compression_time: elapsed,
            chunk: None,
            error: Some(error.to_string()),
        }
    }

    /// Signed byte savings of this call
    pub fn bytes_saved(&self) -> i64 {
        self.original_size as i64 - self.compressed_size as i64
    }
}

/// One row of a strategy analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyEstimation {
    /// Strategy name
    pub name: String,
    /// Predicted compressed/original ratio
    pub estimated_ratio: f64,
    /// Declared objective
    pub priority: Priority,
    /// Offers a streaming decoder
    pub supports_streaming: bool,
}

/// Advisory ranking produced without compressing anything
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyAnalysis {
    /// What `compress` would pick right now
    pub recommended_strategy: String,
    /// Eligible strategies, best first
    pub estimations: Vec<StrategyEstimation>,
}

/// Adaptive compression orchestrator
///
/// Shareable across tasks behind an `Arc`; every operation takes `&self`.
#[derive(Debug)]
pub struct CompressionEngine {
    registry: StrategyRegistry,
    profile: CompressionProfile,
    options: EngineOptions,
    stats: StatsTracker,
}

impl Default for CompressionEngine {
    fn default() -> Self {
        Self::new(CompressionProfile::default())
    }
}

impl CompressionEngine {
    /// Build an engine for a profile
    pub fn new(profile: CompressionProfile) -> Self {
        Self::with_options(profile, EngineOptions::default())
    }

    /// Build an engine with explicit options
    pub fn with_options(profile: CompressionProfile, options: EngineOptions) -> Self {
        let registry = profile.build_registry();
        tracing::debug!(
            "Engine profile {} registered strategies: {:?}",
            profile.name,
            registry.names()
        );

        Self {
            registry,
            profile,
            options,
            stats: StatsTracker::new(),
        }
    }

    /// Registered strategies
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Profile this engine was built from
    pub fn profile(&self) -> &CompressionProfile {
        &self.profile
    }

    /// Runtime options
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Derive hints for one payload
    pub fn build_hints(
        &self,
        data_len: usize,
        mime_type: &str,
        metadata: &FileMetadata,
    ) -> CompressionHints {
        let classification = (self.options.classifier)(metadata.path.as_deref(), mime_type);
        let access_frequency = metadata
            .access_frequency
            .map_or(DEFAULT_ACCESS_FREQUENCY, clamp_frequency);

        CompressionHints {
            mime_type: mime_type.to_string(),
            access_frequency,
            file_size: data_len,
            is_hot: metadata.is_hot.unwrap_or(classification.is_hot),
            ecosystem: classification.ecosystem,
        }
    }

    /// Compress a payload with the best strategy for it
    ///
    /// Never fails: codec errors and timeouts come back as
    /// `success == false` with the input size echoed as output size.
    pub async fn compress(
        &self,
        data: impl Into<Bytes>,
        mime_type: &str,
        metadata: FileMetadata,
    ) -> CompressionResult {
        let data: Bytes = data.into();
        let original_size = data.len();
        let start = Instant::now();
        let hints = self.build_hints(original_size, mime_type, &metadata);

        let Some(strategy) = self.registry.get_optimal(&data, &hints).cloned() else {
            let err = AdaptiveError::NoStrategy;
            tracing::warn!("Compression skipped: {}", err);
            return CompressionResult::failed(original_size, start.elapsed(), &err);
        };
        let name = strategy.name().to_string();

        let outcome = self
            .run_blocking(move || strategy.compress(&data, &hints))
            .await;
        let elapsed = start.elapsed();

        match outcome {
            Ok(chunk) => {
                self.stats
                    .record_compression(&name, original_size, chunk.compressed_size, elapsed);
                CompressionResult::succeeded(chunk, elapsed)
            },
            Err(err) => {
                tracing::warn!("Compression with {} failed: {}", name, err);
                self.stats.record_failure(&name);
                CompressionResult::failed(original_size, elapsed, &err)
            },
        }
    }

    /// Decode a chunk with the strategy named in its `algorithm` tag
    ///
    /// Selection is bypassed; an unregistered tag is an error, never a
    /// substitution.
    pub async fn decompress(&self, chunk: &CompressedChunk) -> Result<Vec<u8>> {
        let strategy = self.resolve(chunk)?.clone();
        let start = Instant::now();
        let owned = chunk.clone();

        let outcome = self
            .run_blocking(move || strategy.decompress(&owned))
            .await
            .map_err(|err| match err {
                AdaptiveError::Timeout(limit) => AdaptiveError::Decompression(format!(
                    "{}: timed out after {limit:?}",
                    chunk.algorithm
                )),
                AdaptiveError::Compression(msg) => AdaptiveError::Decompression(msg),
                other => other,
            });

        match outcome {
            Ok(data) => {
                self.stats
                    .record_decompression(&chunk.algorithm, start.elapsed());
                Ok(data)
            },
            Err(err) => {
                tracing::warn!("Decompression with {} failed: {}", chunk.algorithm, err);
                self.stats.record_failure(&chunk.algorithm);
                Err(err)
            },
        }
    }

    /// [`decompress`](Self::decompress), also stamping `decompression_time` on the chunk
    pub async fn decompress_timed(&self, chunk: &mut CompressedChunk) -> Result<Vec<u8>> {
        let start = Instant::now();
        let data = self.decompress(chunk).await?;
        chunk.record_decompression(start.elapsed());
        Ok(data)
    }

    /// Lazy decoder for a chunk
    ///
    /// `None` when the algorithm is unknown or has no streaming decoder.
    /// Pieces are decoded inline on the polling task.
    pub fn create_decompressor(&self, chunk: &CompressedChunk) -> Option<DecompressStream> {
        let strategy = match self.resolve(chunk) {
            Ok(strategy) => strategy,
            Err(err) => {
                tracing::warn!("No stream decoder: {}", err);
                return None;
            },
        };

        if !strategy.supports_streaming() {
            tracing::warn!("Strategy {} does not support streaming", strategy.name());
            return None;
        }
        strategy.create_decompressor(chunk)
    }

    /// Rank eligible strategies for a payload without compressing it
    ///
    /// Leaves statistics untouched.
    pub fn analyze_optimal_strategy(
        &self,
        data: &[u8],
        mime_type: &str,
        metadata: &FileMetadata,
    ) -> StrategyAnalysis {
        let hints = self.build_hints(data.len(), mime_type, metadata);
        let ranked = self.registry.rank(data, &hints);

        let recommended_strategy = ranked
            .first()
            .map(|r| r.strategy)
            .or_else(|| self.registry.fallback())
            .map_or(NO_ALGORITHM, |s| s.name())
            .to_string();

        let estimations = ranked
            .iter()
            .map(|r| StrategyEstimation {
                name: r.strategy.name().to_string(),
                estimated_ratio: r.estimated_ratio,
                priority: r.strategy.priority(),
                supports_streaming: r.strategy.supports_streaming(),
            })
            .collect();

        StrategyAnalysis {
            recommended_strategy,
            estimations,
        }
    }

    /// Aggregate statistics snapshot
    pub fn get_statistics(&self) -> StatisticsSnapshot {
        self.stats.snapshot()
    }

    /// Clear accumulated statistics
    pub fn reset_statistics(&self) {
        self.stats.reset();
    }

    fn resolve(&self, chunk: &CompressedChunk) -> Result<&Strategy> {
        self.registry
            .get(chunk.algorithm.as_str())
            .ok_or_else(|| AdaptiveError::UnknownAlgorithm(chunk.algorithm.clone()))
    }

    /// Run codec work on the blocking pool, bounded by the codec timeout
    ///
    /// An expired timeout abandons the result; the blocking thread runs to
    /// completion in the background.
    async fn run_blocking<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let task = tokio::task::spawn_blocking(work);
        let joined = match self.options.codec_timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| AdaptiveError::Timeout(limit))?,
            None => task.await,
        };

        joined.map_err(|e| AdaptiveError::Compression(format!("codec task aborted: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{ChunkMetadata, Ecosystem, FileClassification};
    use futures::StreamExt;

    fn never_hot(_path: Option<&str>, _mime: &str) -> FileClassification {
        FileClassification {
            is_hot: false,
            ecosystem: Ecosystem::Vue,
        }
    }

    #[test]
    fn test_build_hints_defaults() {
        let engine = CompressionEngine::default();
        let hints = engine.build_hints(10, "text/plain", &FileMetadata::new());

        assert!((hints.access_frequency - DEFAULT_ACCESS_FREQUENCY).abs() < 1e-9);
        assert!(!hints.is_hot);
        assert_eq!(hints.ecosystem, Ecosystem::Unknown);
        assert_eq!(hints.file_size, 10);
    }

    #[test]
    fn test_build_hints_clamps_and_classifies() {
        let engine = CompressionEngine::default();
        let meta = FileMetadata::new()
            .with_path("node_modules/left-pad/index.js")
            .with_access_frequency(7.0);
        let hints = engine.build_hints(10, "application/javascript", &meta);

        assert!((hints.access_frequency - 1.0).abs() < 1e-9);
        assert!(hints.is_hot);
        assert_eq!(hints.ecosystem, Ecosystem::Node);

        let overridden = engine.build_hints(10, "application/javascript", &meta.with_hot(false));
        assert!(!overridden.is_hot);
    }

    #[test]
    fn test_custom_classifier() {
        let engine = CompressionEngine::with_options(
            CompressionProfile::production(),
            EngineOptions::default().with_classifier(never_hot),
        );
        let meta = FileMetadata::new().with_path(".env");
        let hints = engine.build_hints(10, "text/plain", &meta);

        assert!(!hints.is_hot);
        assert_eq!(hints.ecosystem, Ecosystem::Vue);
    }

    #[tokio::test]
    async fn test_compress_roundtrip_and_stats() {
        let engine = CompressionEngine::default();
        let data = b"The quick brown fox jumps over the lazy dog. ".repeat(100);

        let result = engine
            .compress(data.clone(), "text/plain", FileMetadata::new().with_access_frequency(0.9))
            .await;
        assert!(result.success);
        assert_eq!(result.algorithm, "lz4");
        assert!(result.bytes_saved() > 0);

        let mut chunk = result.chunk.unwrap();
        assert_eq!(engine.decompress_timed(&mut chunk).await.unwrap(), data);
        assert!(chunk.metadata.decompression_time.is_some());

        let stats = engine.get_statistics();
        assert_eq!(stats.total_compressions, 1);
        assert_eq!(stats.total_decompressions, 1);
        assert_eq!(stats.total_bytes_processed, data.len() as u64);

        engine.reset_statistics();
        assert_eq!(engine.get_statistics().total_compressions, 0);
    }

    #[tokio::test]
    async fn test_unknown_algorithm() {
        let engine = CompressionEngine::default();
        let chunk = CompressedChunk::new("snappy", 3, b"abc".to_vec(), ChunkMetadata::default());

        let err = engine.decompress(&chunk).await.unwrap_err();
        assert!(err.is_unknown_algorithm());
        assert!(engine.create_decompressor(&chunk).is_none());
    }

    #[derive(Debug)]
    struct Failing;

    impl CompressionStrategy for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn priority(&self) -> Priority {
            Priority::Size
        }
        fn compress(&self, _data: &[u8], _hints: &CompressionHints) -> Result<CompressedChunk> {
            Err(AdaptiveError::Compression("boom".to_string()))
        }
        fn decompress(&self, _chunk: &CompressedChunk) -> Result<Vec<u8>> {
            Err(AdaptiveError::Decompression("boom".to_string()))
        }
        fn estimate_ratio(&self, _data: &[u8], _hints: &CompressionHints) -> f64 {
            0.0
        }
        fn should_use(&self, _data: &[u8], _hints: &CompressionHints) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_failure_is_structured() {
        let profile = CompressionProfile::production().with_strategy(Strategy::custom(Failing));
        let engine = CompressionEngine::new(profile);

        let result = engine
            .compress(b"payload".to_vec(), "application/octet-stream", FileMetadata::new())
            .await;
        assert!(!result.success);
        assert_eq!(result.algorithm, NO_ALGORITHM);
        assert_eq!(result.compressed_size, 7);
        assert!((result.compression_ratio - 1.0).abs() < 1e-9);
        assert!(result.error.unwrap().contains("boom"));

        let stats = engine.get_statistics();
        assert_eq!(stats.total_failures, 1);
        assert_eq!(stats.total_bytes_processed, 0);
        assert_eq!(stats.strategy_usage["failing"].failures, 1);
    }

    #[tokio::test]
    async fn test_streaming_through_engine() {
        let engine = CompressionEngine::default();
        let data = b"stream me ".repeat(20_000);
        let meta = FileMetadata::new().with_hot(true);

        let chunk = engine
            .compress(data.clone(), "text/plain", meta)
            .await
            .chunk
            .unwrap();
        let stream = engine.create_decompressor(&chunk).unwrap();
        let pieces: Vec<_> = stream.collect().await;
        let joined: Vec<u8> = pieces.into_iter().flat_map(|p| p.unwrap().to_vec()).collect();
        assert_eq!(joined, data);
    }

    #[test]
    fn test_analysis_matches_selection() {
        let engine = CompressionEngine::default();
        let json = br#"{"k":[1,2,3]}"#.repeat(100);
        let meta = FileMetadata::new().with_access_frequency(0.2);

        let analysis = engine.analyze_optimal_strategy(&json, "application/json", &meta);
        assert_eq!(analysis.recommended_strategy, "zstd");
        assert_eq!(analysis.estimations[0].name, "zstd");
        assert!(analysis
            .estimations
            .windows(2)
            .all(|w| w[0].estimated_ratio <= w[1].estimated_ratio));
        assert_eq!(engine.get_statistics().total_compressions, 0);
    }
}
