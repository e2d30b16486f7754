//! Per-algorithm statistics accumulator.
//!
//! Owned by one engine instance. All updates for a completion happen under
//! a single write lock, so concurrent calls never lose increments.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;

/// Counters for one algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmStats {
    /// Successful compressions
    pub compressions: u64,
    /// Successful decompressions
    pub decompressions: u64,
    /// Failed compress or decompress calls
    pub failures: u64,
    /// Input bytes of successful compressions
    pub original_bytes: u64,
    /// Output bytes of successful compressions
    pub compressed_bytes: u64,
    /// Cumulative compression wall-clock time
    pub compression_time: Duration,
    /// Cumulative decompression wall-clock time
    pub decompression_time: Duration,
}

impl AlgorithmStats {
    /// Signed savings; negative when this algorithm expanded its input overall
    pub fn bytes_saved(&self) -> i128 {
        i128::from(self.original_bytes) - i128::from(self.compressed_bytes)
    }

    /// compressed / original (1.0 when nothing was compressed)
    pub fn compression_ratio(&self) -> f64 {
        if self.original_bytes == 0 {
            1.0
        } else {
            self.compressed_bytes as f64 / self.original_bytes as f64
        }
    }
}

/// Thread-safe statistics table
#[derive(Debug, Default)]
pub struct StatsTracker {
    table: RwLock<BTreeMap<String, AlgorithmStats>>,
}

impl StatsTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, algorithm: &str, apply: impl FnOnce(&mut AlgorithmStats)) {
        // A panic while holding the lock cannot leave counters half-written
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        apply(table.entry(algorithm.to_string()).or_default());
    }

    /// Record a successful compression
    pub fn record_compression(
        &self,
        algorithm: &str,
        original_size: usize,
        compressed_size: usize,
        elapsed: Duration,
    ) {
        self.update(algorithm, |stats| {
            stats.compressions += 1;
            stats.original_bytes += original_size as u64;
            stats.compressed_bytes += compressed_size as u64;
            stats.compression_time += elapsed;
        });
    }

    /// Record a successful decompression
    pub fn record_decompression(&self, algorithm: &str, elapsed: Duration) {
        self.update(algorithm, |stats| {
            stats.decompressions += 1;
            stats.decompression_time += elapsed;
        });
    }

    /// Record a failed codec call
    pub fn record_failure(&self, algorithm: &str) {
        self.update(algorithm, |stats| stats.failures += 1);
    }

    /// Counters for one algorithm
    pub fn get(&self, algorithm: &str) -> Option<AlgorithmStats> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.get(algorithm).copied()
    }

    /// Consistent point-in-time snapshot
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        StatisticsSnapshot::from_table(table.clone())
    }

    /// Clear all counters
    pub fn reset(&self) {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Aggregate statistics for serialization
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    /// Successful compressions across all algorithms
    pub total_compressions: u64,
    /// Successful decompressions across all algorithms
    pub total_decompressions: u64,
    /// Failed codec calls across all algorithms
    pub total_failures: u64,
    /// Input bytes of successful compressions
    pub total_bytes_processed: u64,
    /// Bytes saved overall, never negative
    pub total_bytes_saved: u64,
    /// `1 - saved / processed`, or 0 when nothing was processed
    pub average_compression_ratio: f64,
    /// Per-algorithm counters, sorted by name
    pub strategy_usage: BTreeMap<String, AlgorithmStats>,
}

impl StatisticsSnapshot {
    fn from_table(strategy_usage: BTreeMap<String, AlgorithmStats>) -> Self {
        let mut total_compressions = 0;
        let mut total_decompressions = 0;
        let mut total_failures = 0;
        let mut total_bytes_processed = 0u64;
        let mut signed_saved = 0i128;

        for stats in strategy_usage.values() {
            total_compressions += stats.compressions;
            total_decompressions += stats.decompressions;
            total_failures += stats.failures;
            total_bytes_processed += stats.original_bytes;
            signed_saved += stats.bytes_saved();
        }

        let total_bytes_saved = u64::try_from(signed_saved.max(0)).unwrap_or(u64::MAX);
        let average_compression_ratio = if total_bytes_processed > 0 {
            1.0 - total_bytes_saved as f64 / total_bytes_processed as f64
        } else {
            0.0
        };

        Self {
            total_compressions,
            total_decompressions,
            total_failures,
            total_bytes_processed,
            total_bytes_saved,
            average_compression_ratio,
            strategy_usage,
        }
    }

    /// Percentage of processed bytes saved
    pub fn savings_percent(&self) -> f64 {
        if self.total_bytes_processed == 0 {
            0.0
        } else {
            self.total_bytes_saved as f64 / self.total_bytes_processed as f64 * 100.0
        }
    }
}
