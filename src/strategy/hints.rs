//! Per-call compression hints and the content/path heuristics behind them.
//!
//! Hints are rebuilt for every call and never persisted. The path
//! classifier is a plain function so the engine can swap it without
//! touching selection logic.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Bytes inspected by the content sniffers
const SAMPLE_SIZE: usize = 4096;

/// Default access frequency when the caller supplies none
pub const DEFAULT_ACCESS_FREQUENCY: f64 = 0.5;

/// Frontend/runtime ecosystem a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// React (jsx/tsx)
    React,
    /// Vue single-file components
    Vue,
    /// Angular components/modules
    Angular,
    /// Plain Node.js / JavaScript / TypeScript
    Node,
    /// Anything else
    #[default]
    Unknown,
}

impl Ecosystem {
    /// Get the lowercase name (also used as dictionary tag)
    pub fn name(&self) -> &'static str {
        match self {
            Ecosystem::React => "react",
            Ecosystem::Vue => "vue",
            Ecosystem::Angular => "angular",
            Ecosystem::Node => "node",
            Ecosystem::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-call hints guiding strategy selection and parameterization
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionHints {
    /// MIME type of the payload
    pub mime_type: String,
    /// Access frequency (0.0 = cold, 1.0 = constantly read)
    pub access_frequency: f64,
    /// Payload size in bytes
    pub file_size: usize,
    /// Frequently accessed file
    pub is_hot: bool,
    /// Inferred ecosystem
    pub ecosystem: Ecosystem,
}

impl CompressionHints {
    /// Create hints for a payload with neutral defaults
    pub fn new(mime_type: impl Into<String>, file_size: usize) -> Self {
        Self {
            mime_type: mime_type.into(),
            access_frequency: DEFAULT_ACCESS_FREQUENCY,
            file_size,
            is_hot: false,
            ecosystem: Ecosystem::Unknown,
        }
    }

    /// Set access frequency (clamped into [0, 1])
    pub fn with_access_frequency(mut self, frequency: f64) -> Self {
        self.access_frequency = clamp_frequency(frequency);
        self
    }

    /// Mark as hot (or not)
    pub fn with_hot(mut self, hot: bool) -> Self {
        self.is_hot = hot;
        self
    }

    /// Set ecosystem
    pub fn with_ecosystem(mut self, ecosystem: Ecosystem) -> Self {
        self.ecosystem = ecosystem;
        self
    }

    /// Hot, or read often enough that decode latency dominates
    pub fn is_latency_sensitive(&self) -> bool {
        self.is_hot || self.access_frequency > 0.8
    }
}

/// Caller-supplied file metadata for a compress call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Logical file path (drives hot/ecosystem heuristics)
    pub path: Option<String>,
    /// Access frequency in [0, 1]
    pub access_frequency: Option<f64>,
    /// Explicit hotness override
    pub is_hot: Option<bool>,
}

impl FileMetadata {
    /// Empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Set path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set access frequency
    pub fn with_access_frequency(mut self, frequency: f64) -> Self {
        self.access_frequency = Some(frequency);
        self
    }

    /// Override hotness
    pub fn with_hot(mut self, hot: bool) -> Self {
        self.is_hot = Some(hot);
        self
    }
}

/// Result of classifying a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileClassification {
    /// Matches a hot-file pattern
    pub is_hot: bool,
    /// Inferred ecosystem
    pub ecosystem: Ecosystem,
}

/// Pure path classifier: `(path, mime_type) -> classification`
pub type Classifier = fn(Option<&str>, &str) -> FileClassification;

lazy_static::lazy_static! {
    static ref HOT_PATTERNS: Vec<Regex> = [
        // Dependency index files
        r"(^|/)node_modules/(@[^/]+/)?[^/]+/index\.(js|mjs|cjs|ts)$",
        // Manifests and lock files
        r"(^|/)(package\.json|package-lock\.json|yarn\.lock|pnpm-lock\.yaml|tsconfig\.json|Cargo\.toml|Cargo\.lock)$",
        // Dotfiles
        r"(^|/)\.[^/]+$",
        // Conventional source paths
        r"(^|/)(src|lib|app)/.+\.(js|jsx|ts|tsx|vue|rs|py|go)$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect();
}

/// Angular file naming conventions
const ANGULAR_SUFFIXES: [&str; 4] = [".component.ts", ".module.ts", ".service.ts", "angular.json"];

/// Default path heuristic used by the engine
pub fn classify_path(path: Option<&str>, mime_type: &str) -> FileClassification {
    let Some(path) = path else {
        return FileClassification {
            is_hot: false,
            ecosystem: ecosystem_from_mime(mime_type),
        };
    };
    let path = path.replace('\\', "/");

    FileClassification {
        is_hot: HOT_PATTERNS.iter().any(|re| re.is_match(&path)),
        ecosystem: detect_ecosystem(&path, mime_type),
    }
}

fn detect_ecosystem(path: &str, mime_type: &str) -> Ecosystem {
    let lower = path.to_ascii_lowercase();

    if lower.ends_with(".jsx") || lower.ends_with(".tsx") || lower.contains("react") {
        return Ecosystem::React;
    }
    if lower.ends_with(".vue") || lower.contains("/vue/") {
        return Ecosystem::Vue;
    }
    if ANGULAR_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix)) || lower.contains("@angular") {
        return Ecosystem::Angular;
    }
    if lower.ends_with("package.json")
        || lower.contains("node_modules")
        || [".js", ".mjs", ".cjs", ".ts"].iter().any(|ext| lower.ends_with(ext))
    {
        return Ecosystem::Node;
    }

    ecosystem_from_mime(mime_type)
}

fn ecosystem_from_mime(mime_type: &str) -> Ecosystem {
    let mime = mime_type.to_ascii_lowercase();
    if mime.contains("jsx") {
        Ecosystem::React
    } else if mime.contains("vue") {
        Ecosystem::Vue
    } else if mime.contains("javascript") || mime.contains("typescript") {
        Ecosystem::Node
    } else {
        Ecosystem::Unknown
    }
}

/// Clamp a frequency into [0, 1]; NaN becomes the default
pub fn clamp_frequency(frequency: f64) -> f64 {
    if frequency.is_nan() {
        DEFAULT_ACCESS_FREQUENCY
    } else {
        frequency.clamp(0.0, 1.0)
    }
}

/// Textual MIME type (text/*, markup, scripts, structured text)
pub fn is_textual_mime(mime_type: &str) -> bool {
    let mime = mime_type.to_ascii_lowercase();
    mime.starts_with("text/")
        || is_structured_mime(&mime)
        || is_code_mime(&mime)
        || mime.contains("svg")
        || mime.contains("html")
        || mime.contains("csv")
        || mime.contains("markdown")
}

/// Structured-data MIME type (json/yaml/toml/xml)
pub fn is_structured_mime(mime_type: &str) -> bool {
    let mime = mime_type.to_ascii_lowercase();
    ["json", "yaml", "yml", "toml", "xml"]
        .iter()
        .any(|kind| mime.contains(kind))
}

/// Source-code MIME type
pub fn is_code_mime(mime_type: &str) -> bool {
    let mime = mime_type.to_ascii_lowercase();
    ["javascript", "typescript", "ecmascript", "jsx", "x-rust", "x-python", "x-c", "css"]
        .iter()
        .any(|kind| mime.contains(kind))
}

/// Sampled payload looks like text (mostly printable ASCII/UTF-8)
pub fn looks_textual(data: &[u8]) -> bool {
    let sample = &data[..data.len().min(SAMPLE_SIZE)];
    if sample.is_empty() {
        return true;
    }
    let printable = sample
        .iter()
        .filter(|&&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..0x7f).contains(&b) || b >= 0x80)
        .count();
    printable as f64 / sample.len() as f64 > 0.95
}

/// Repetition ratio of a sample (0.0 = all unique 4-grams, 1.0 = constant)
pub fn repetition_ratio(data: &[u8]) -> f64 {
    let sample = &data[..data.len().min(SAMPLE_SIZE)];
    if sample.len() < 64 {
        return 0.0;
    }

    let total = sample.len() - 3;
    let unique: HashSet<&[u8]> = sample.windows(4).collect();
    1.0 - unique.len() as f64 / total as f64
}

/// Highly repetitive sample
pub fn is_patterned(data: &[u8]) -> bool {
    repetition_ratio(data) > 0.5
}
