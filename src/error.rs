//! Adaptive compression error types.
//!
//! # Propagation
//!
//! - `compress` never surfaces these: codec failures are folded into a
//!   structured [`CompressionResult`](crate::engine::CompressionResult).
//! - `decompress` surfaces [`AdaptiveError::UnknownAlgorithm`] and
//!   [`AdaptiveError::Decompression`] (timeouts included).
//! - Configuration loading surfaces [`AdaptiveError::Config`].

use thiserror::Error;

/// Adaptive compression errors.
#[derive(Error, Debug)]
pub enum AdaptiveError {
    /// Compression operation failed inside a codec.
    #[error("Compression error: {0}")]
    Compression(String),

    /// Decompression of a known algorithm failed (corrupt or truncated payload).
    #[error("Decompression error: {0}")]
    Decompression(String),

    /// Chunk names an algorithm no registered strategy provides.
    ///
    /// Never silently substituted: decoding with the wrong codec returns garbage.
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Registry holds no strategies at all.
    #[error("No compression strategy registered")]
    NoStrategy,

    /// Codec call exceeded the configured timeout.
    #[error("Codec timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for adaptive compression operations
pub type Result<T> = std::result::Result<T, AdaptiveError>;

impl AdaptiveError {
    /// Whether this error is an unknown-algorithm lookup failure
    pub fn is_unknown_algorithm(&self) -> bool {
        matches!(self, AdaptiveError::UnknownAlgorithm(_))
    }
}

impl From<toml::de::Error> for AdaptiveError {
    fn from(err: toml::de::Error) -> Self {
        AdaptiveError::Config(err.to_string())
    }
}

impl From<base64::DecodeError> for AdaptiveError {
    fn from(err: base64::DecodeError) -> Self {
        AdaptiveError::Decompression(format!("Base64 decode error: {err}"))
    }
}
