//! Concurrency, timeout and streaming tests for the engine.

use std::sync::Arc;
use std::time::Duration;

use adaptive::engine::{CompressionEngine, CompressionProfile, EngineOptions};
use adaptive::error::{AdaptiveError, Result};
use adaptive::strategy::{
    ChunkMetadata, CompressedChunk, CompressionHints, CompressionStrategy, FileMetadata,
    Priority, Strategy,
};
use futures::StreamExt;

/// Strategy that blocks its worker thread before answering
#[derive(Debug)]
struct Sluggish {
    delay: Duration,
}

impl CompressionStrategy for Sluggish {
    fn name(&self) -> &str {
        "sluggish"
    }

    fn priority(&self) -> Priority {
        Priority::Size
    }

    fn compress(&self, data: &[u8], hints: &CompressionHints) -> Result<CompressedChunk> {
        std::thread::sleep(self.delay);
        Ok(CompressedChunk::new(
            "sluggish",
            data.len(),
            data.to_vec(),
            ChunkMetadata::new(hints.mime_type.clone()),
        ))
    }

    fn decompress(&self, chunk: &CompressedChunk) -> Result<Vec<u8>> {
        std::thread::sleep(self.delay);
        Ok(chunk.data.to_vec())
    }

    fn estimate_ratio(&self, _data: &[u8], _hints: &CompressionHints) -> f64 {
        0.01
    }

    fn should_use(&self, _data: &[u8], hints: &CompressionHints) -> bool {
        hints.mime_type == "application/x-sluggish"
    }
}

fn sluggish_engine(delay: Duration, timeout: Option<Duration>) -> CompressionEngine {
    let profile = CompressionProfile::production().with_strategy(Strategy::custom(Sluggish { delay }));
    let mut options = EngineOptions::default();
    if let Some(timeout) = timeout {
        options = options.with_codec_timeout(timeout);
    }
    CompressionEngine::with_options(profile, options)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_compress_loses_no_updates() {
    let engine = Arc::new(CompressionEngine::default());
    let mut handles = Vec::new();

    for i in 0..64usize {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let payload = format!("task {i}: ").repeat(50 + i);
            let (mime, meta) = match i % 3 {
                0 => ("text/plain", FileMetadata::new().with_hot(true)),
                1 => ("application/json", FileMetadata::new().with_access_frequency(0.2)),
                _ => ("application/octet-stream", FileMetadata::new()),
            };
            let result = engine.compress(payload.clone().into_bytes(), mime, meta).await;
            assert!(result.success, "{:?}", result.error);

            let chunk = result.chunk.unwrap();
            let back = engine.decompress(&chunk).await.unwrap();
            assert_eq!(back, payload.as_bytes());
            payload.len() as u64
        }));
    }

    let mut expected_bytes = 0;
    for handle in handles {
        expected_bytes += handle.await.unwrap();
    }

    let stats = engine.get_statistics();
    assert_eq!(stats.total_compressions, 64);
    assert_eq!(stats.total_decompressions, 64);
    assert_eq!(stats.total_failures, 0);
    assert_eq!(stats.total_bytes_processed, expected_bytes);

    let per_algorithm: u64 = stats.strategy_usage.values().map(|s| s.compressions).sum();
    assert_eq!(per_algorithm, 64);
}

#[tokio::test]
async fn test_compress_timeout_is_structured_failure() {
    let engine = sluggish_engine(Duration::from_millis(300), Some(Duration::from_millis(20)));

    let result = engine
        .compress(b"slow".to_vec(), "application/x-sluggish", FileMetadata::new())
        .await;

    assert!(!result.success);
    assert_eq!(result.algorithm, "none");
    assert_eq!(result.compressed_size, 4);
    assert!(result.error.unwrap().contains("timed out"));

    let stats = engine.get_statistics();
    assert_eq!(stats.strategy_usage["sluggish"].failures, 1);
    assert_eq!(stats.total_compressions, 0);
}

#[tokio::test]
async fn test_decompress_timeout_is_decompression_failure() {
    let engine = sluggish_engine(Duration::from_millis(300), Some(Duration::from_millis(20)));
    let chunk = CompressedChunk::new("sluggish", 4, b"slow".to_vec(), ChunkMetadata::default());

    let err = engine.decompress(&chunk).await.unwrap_err();
    assert!(matches!(err, AdaptiveError::Decompression(ref msg) if msg.contains("timed out")));
}

#[tokio::test]
async fn test_no_timeout_waits_for_codec() {
    let engine = sluggish_engine(Duration::from_millis(30), None);

    let result = engine
        .compress(b"slow but fine".to_vec(), "application/x-sluggish", FileMetadata::new())
        .await;
    assert!(result.success);
    assert_eq!(result.algorithm, "sluggish");
    assert!(result.compression_time >= Duration::from_millis(30));

    // Non-streaming custom strategy
    assert!(engine.create_decompressor(result.chunk.as_ref().unwrap()).is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_independent_streams_over_one_chunk() {
    let engine = CompressionEngine::default();
    let text = b"A cold text file, compressed for size and read rarely.\n".repeat(700);

    let chunk = engine
        .compress(text.clone(), "text/plain", FileMetadata::new().with_access_frequency(0.1))
        .await
        .chunk
        .unwrap();
    assert_eq!(chunk.algorithm, "brotli");

    let first = engine.create_decompressor(&chunk).unwrap();
    let second = engine.create_decompressor(&chunk).unwrap();

    let (a, b) = tokio::join!(
        tokio::spawn(async move {
            first
                .map(|piece| piece.unwrap().to_vec())
                .concat()
                .await
        }),
        tokio::spawn(async move {
            second
                .map(|piece| piece.unwrap().to_vec())
                .concat()
                .await
        }),
    );

    assert_eq!(a.unwrap(), text);
    assert_eq!(b.unwrap(), text);
}

#[tokio::test]
async fn test_reset_statistics() {
    let engine = CompressionEngine::default();
    engine
        .compress(b"count me".to_vec(), "text/plain", FileMetadata::new())
        .await;
    assert_eq!(engine.get_statistics().total_compressions, 1);

    engine.reset_statistics();
    let stats = engine.get_statistics();
    assert_eq!(stats.total_compressions, 0);
    assert!(stats.strategy_usage.is_empty());
}
