//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`ADAPTIVE_*`)
//!
//! Both resolve into a [`CompressionProfile`] plus [`EngineOptions`].
//!
//! ```toml
//! [profile]
//! preset = "ci"
//! max_memory_usage = "128MiB"
//! enable_dictionary = true
//!
//! [engine]
//! codec_timeout_ms = 2000
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::{CompressionEngine, CompressionProfile, EngineOptions};
use crate::error::{AdaptiveError, Result};

/// Preset used when none is configured
pub const DEFAULT_PRESET: &str = "production";

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Profile selection and overrides
    #[serde(default)]
    pub profile: ProfileConfig,

    /// Engine runtime options
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Profile preset plus per-field overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// Preset name (`development`, `production`, `ci`)
    pub preset: Option<String>,

    /// Development-style profile
    pub development: Option<bool>,

    /// Memory ceiling, bytes or with a `KiB`/`MiB`/`GiB` suffix
    pub max_memory_usage: Option<MemorySize>,

    /// Favor codec latency over ratio
    pub prioritize_speed: Option<bool>,

    /// Attach ecosystem dictionary tags
    pub enable_dictionary: Option<bool>,
}

/// Engine runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Per codec call timeout in milliseconds
    pub codec_timeout_ms: Option<u64>,
}

/// Byte count accepted as integer or suffixed string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MemorySizeRepr", into = "u64")]
pub struct MemorySize(pub u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum MemorySizeRepr {
    Bytes(u64),
    Text(String),
}

impl TryFrom<MemorySizeRepr> for MemorySize {
    type Error = String;

    fn try_from(repr: MemorySizeRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            MemorySizeRepr::Bytes(bytes) => Ok(MemorySize(bytes)),
            MemorySizeRepr::Text(text) => parse_memory_size(&text).map(MemorySize),
        }
    }
}

impl From<MemorySize> for u64 {
    fn from(size: MemorySize) -> Self {
        size.0
    }
}

/// Parse `"512"`, `"64KiB"`, `"256MiB"`, `"1GiB"` (also `K`/`M`/`G`/`KB`/`MB`/`GB`)
pub fn parse_memory_size(text: &str) -> std::result::Result<u64, String> {
    let text = text.trim();
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, unit) = text.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid memory size: {text:?}"))?;
    let multiplier: u64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => 1024,
        "m" | "mb" | "mib" => 1024 * 1024,
        "g" | "gb" | "gib" => 1024 * 1024 * 1024,
        other => return Err(format!("unknown memory unit: {other:?}")),
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("memory size overflows: {text:?}"))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            AdaptiveError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| AdaptiveError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Unparsable values are skipped with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(preset) = lookup("ADAPTIVE_PROFILE") {
            config.profile.preset = Some(preset);
        }
        if let Some(raw) = lookup("ADAPTIVE_MAX_MEMORY") {
            match parse_memory_size(&raw) {
                Ok(bytes) => config.profile.max_memory_usage = Some(MemorySize(bytes)),
                Err(e) => tracing::warn!("Ignoring ADAPTIVE_MAX_MEMORY: {}", e),
            }
        }
        if let Some(raw) = lookup("ADAPTIVE_PRIORITIZE_SPEED") {
            config.profile.prioritize_speed = parse_flag(&raw);
            if config.profile.prioritize_speed.is_none() {
                tracing::warn!("Ignoring ADAPTIVE_PRIORITIZE_SPEED={:?}", raw);
            }
        }
        if let Some(raw) = lookup("ADAPTIVE_ENABLE_DICTIONARY") {
            config.profile.enable_dictionary = parse_flag(&raw);
            if config.profile.enable_dictionary.is_none() {
                tracing::warn!("Ignoring ADAPTIVE_ENABLE_DICTIONARY={:?}", raw);
            }
        }
        if let Some(raw) = lookup("ADAPTIVE_CODEC_TIMEOUT_MS") {
            match raw.trim().parse() {
                Ok(ms) => config.engine.codec_timeout_ms = Some(ms),
                Err(_) => tracing::warn!("Ignoring ADAPTIVE_CODEC_TIMEOUT_MS={:?}", raw),
            }
        }

        config
    }

    /// Merge with another config (other takes precedence where set)
    pub fn merge(self, other: Self) -> Self {
        Self {
            profile: ProfileConfig {
                preset: other.profile.preset.or(self.profile.preset),
                development: other.profile.development.or(self.profile.development),
                max_memory_usage: other
                    .profile
                    .max_memory_usage
                    .or(self.profile.max_memory_usage),
                prioritize_speed: other
                    .profile
                    .prioritize_speed
                    .or(self.profile.prioritize_speed),
                enable_dictionary: other
                    .profile
                    .enable_dictionary
                    .or(self.profile.enable_dictionary),
            },
            engine: EngineConfig {
                codec_timeout_ms: other.engine.codec_timeout_ms.or(self.engine.codec_timeout_ms),
            },
        }
    }

    /// Resolve the preset and apply overrides
    pub fn profile(&self) -> Result<CompressionProfile> {
        let preset = self.profile.preset.as_deref().unwrap_or(DEFAULT_PRESET);
        let mut profile = CompressionProfile::preset(preset).ok_or_else(|| {
            AdaptiveError::Config(format!(
                "Unknown profile {preset:?} (expected one of {})",
                CompressionProfile::preset_names().join(", ")
            ))
        })?;

        if let Some(development) = self.profile.development {
            profile.development = development;
        }
        if let Some(MemorySize(bytes)) = self.profile.max_memory_usage {
            profile.max_memory_usage = usize::try_from(bytes).unwrap_or(usize::MAX);
        }
        if let Some(prioritize_speed) = self.profile.prioritize_speed {
            profile.prioritize_speed = prioritize_speed;
        }
        if let Some(enable_dictionary) = self.profile.enable_dictionary {
            profile.enable_dictionary = enable_dictionary;
        }

        Ok(profile)
    }

    /// Engine runtime options
    pub fn engine_options(&self) -> EngineOptions {
        let options = EngineOptions::default();
        match self.engine.codec_timeout_ms {
            Some(ms) if ms > 0 => options.with_codec_timeout(Duration::from_millis(ms)),
            _ => options,
        }
    }

    /// Build an engine from this configuration
    pub fn build_engine(&self) -> Result<CompressionEngine> {
        Ok(CompressionEngine::with_options(
            self.profile()?,
            self.engine_options(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        let profile = config.profile().unwrap();
        assert_eq!(profile.name, "production");
        assert!(profile.enable_dictionary);
        assert!(config.engine_options().codec_timeout.is_none());
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [profile]
            preset = "ci"
            max_memory_usage = "128MiB"
            enable_dictionary = true

            [engine]
            codec_timeout_ms = 2000
        "#;

        let config = Config::from_toml(toml).unwrap();
        let profile = config.profile().unwrap();
        assert_eq!(profile.name, "ci");
        assert_eq!(profile.max_memory_usage, 128 * 1024 * 1024);
        assert!(profile.prioritize_speed);
        assert!(profile.enable_dictionary);
        assert!(!profile.registers_size_strategy());
        assert_eq!(
            config.engine_options().codec_timeout,
            Some(Duration::from_millis(2000))
        );
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[profile]\npreset = \"development\"\nmax_memory_usage = 1048576").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.profile.max_memory_usage, Some(MemorySize(1024 * 1024)));
        let engine = config.build_engine().unwrap();
        assert_eq!(engine.registry().names(), vec!["lz4"]);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, AdaptiveError::Config(_)));
    }

    #[test]
    fn test_unknown_preset() {
        let config = Config::from_toml("[profile]\npreset = \"staging\"").unwrap();
        assert!(matches!(config.profile(), Err(AdaptiveError::Config(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(Config::from_toml("[engine]\ncodec_timeout = 5").is_err());
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(Config::from_toml("[engin]\ncodec_timeout_ms = 5").is_err());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("ADAPTIVE_PROFILE", "development"),
            ("ADAPTIVE_MAX_MEMORY", "64MiB"),
            ("ADAPTIVE_PRIORITIZE_SPEED", "off"),
            ("ADAPTIVE_ENABLE_DICTIONARY", "maybe"),
            ("ADAPTIVE_CODEC_TIMEOUT_MS", "250"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.profile.preset.as_deref(), Some("development"));
        assert_eq!(config.profile.max_memory_usage, Some(MemorySize(64 * 1024 * 1024)));
        assert_eq!(config.profile.prioritize_speed, Some(false));
        assert_eq!(config.profile.enable_dictionary, None);
        assert_eq!(config.engine.codec_timeout_ms, Some(250));
    }

    #[test]
    fn test_merge_prefers_other() {
        let file = Config::from_toml(
            "[profile]\npreset = \"ci\"\nenable_dictionary = true\n[engine]\ncodec_timeout_ms = 10",
        )
        .unwrap();
        let env = Config::from_lookup(|key| {
            (key == "ADAPTIVE_PROFILE").then(|| "production".to_string())
        });

        let merged = file.merge(env);
        assert_eq!(merged.profile.preset.as_deref(), Some("production"));
        assert_eq!(merged.profile.enable_dictionary, Some(true));
        assert_eq!(merged.engine.codec_timeout_ms, Some(10));
    }

    #[test]
    fn test_parse_memory_size() {
        assert_eq!(parse_memory_size("512").unwrap(), 512);
        assert_eq!(parse_memory_size("2K").unwrap(), 2048);
        assert_eq!(parse_memory_size("256 MiB").unwrap(), 256 * 1024 * 1024);
        assert_eq!(parse_memory_size("1gb").unwrap(), 1024 * 1024 * 1024);
        assert!(parse_memory_size("lots").is_err());
        assert!(parse_memory_size("12PB").is_err());
    }
}
