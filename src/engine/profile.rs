//! Engine profiles.
//!
//! A profile is read once, when the engine is built, and decides which
//! strategies get registered and with which parameters.
//!
//! | Preset        | development | max memory | prioritize speed | dictionary | Strategies            |
//! |---------------|-------------|------------|------------------|------------|-----------------------|
//! | `development` | yes         | 128 MiB    | yes              | no         | lz4                   |
//! | `production`  | no          | 512 MiB    | no               | yes        | lz4, brotli, zstd     |
//! | `ci`          | no          | 256 MiB    | yes              | no         | lz4, brotli, zstd     |

use crate::registry::StrategyRegistry;
use crate::strategy::{
    BrotliStrategy, Lz4Strategy, Strategy, StrategyId, ZstdStrategy, LOW_MEMORY_WINDOW_SIZE,
};

const MIB: usize = 1024 * 1024;

/// Memory ceilings strictly below this count as tight
pub const TIGHT_MEMORY_LIMIT: usize = 256 * MIB;

/// Immutable engine configuration bundle
#[derive(Debug, Clone)]
pub struct CompressionProfile {
    /// Profile name
    pub name: String,
    /// Development-style profile (skips the balanced strategy)
    pub development: bool,
    /// Memory ceiling in bytes
    pub max_memory_usage: usize,
    /// Favor codec latency over ratio
    pub prioritize_speed: bool,
    /// Attach ecosystem dictionary tags
    pub enable_dictionary: bool,
    /// Strategies merged in last (may override built-ins by name)
    pub extra_strategies: Vec<Strategy>,
}

impl Default for CompressionProfile {
    fn default() -> Self {
        Self::production()
    }
}

impl CompressionProfile {
    /// Create a profile from scratch
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            development: false,
            max_memory_usage: 512 * MIB,
            prioritize_speed: false,
            enable_dictionary: false,
            extra_strategies: Vec::new(),
        }
    }

    /// Local development: speed only
    pub fn development() -> Self {
        Self {
            development: true,
            max_memory_usage: 128 * MIB,
            prioritize_speed: true,
            ..Self::new("development")
        }
    }

    /// Production: every built-in strategy, dictionaries on
    pub fn production() -> Self {
        Self {
            enable_dictionary: true,
            ..Self::new("production")
        }
    }

    /// CI: speed-leaning, moderate memory
    pub fn ci() -> Self {
        Self {
            max_memory_usage: 256 * MIB,
            prioritize_speed: true,
            ..Self::new("ci")
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::development()),
            "production" | "prod" => Some(Self::production()),
            "ci" => Some(Self::ci()),
            _ => None,
        }
    }

    /// Preset names
    pub fn preset_names() -> &'static [&'static str] {
        &["development", "production", "ci"]
    }

    /// Set memory ceiling
    pub fn with_max_memory(mut self, bytes: usize) -> Self {
        self.max_memory_usage = bytes;
        self
    }

    /// Set speed priority
    pub fn with_prioritize_speed(mut self, enabled: bool) -> Self {
        self.prioritize_speed = enabled;
        self
    }

    /// Enable or disable dictionary tags
    pub fn with_dictionary(mut self, enabled: bool) -> Self {
        self.enable_dictionary = enabled;
        self
    }

    /// Mark as development-style
    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    /// Add a strategy merged in after the built-ins
    pub fn with_strategy(mut self, strategy: impl Into<Strategy>) -> Self {
        self.extra_strategies.push(strategy.into());
        self
    }

    /// Memory ceiling counts as tight
    pub fn is_memory_constrained(&self) -> bool {
        self.max_memory_usage < TIGHT_MEMORY_LIMIT
    }

    /// Latency-first execution environment
    pub fn is_fast_environment(&self) -> bool {
        self.development || self.prioritize_speed
    }

    /// Size-first strategy is registered unless speed wins and memory is tight
    pub fn registers_size_strategy(&self) -> bool {
        !(self.prioritize_speed && self.is_memory_constrained())
    }

    /// Balanced strategy is registered outside development profiles
    pub fn registers_balanced_strategy(&self) -> bool {
        !self.development
    }

    /// Build the registry this profile describes
    pub fn build_registry(&self) -> StrategyRegistry {
        let mut registry = StrategyRegistry::new().with_default(StrategyId::Lz4);

        registry.register(Lz4Strategy::new().with_fast_environment(self.is_fast_environment()));

        if self.registers_size_strategy() {
            let mut brotli = BrotliStrategy::new().with_dictionary(self.enable_dictionary);
            if self.is_memory_constrained() {
                brotli = brotli.with_window_size(LOW_MEMORY_WINDOW_SIZE);
            }
            registry.register(brotli);
        }

        if self.registers_balanced_strategy() {
            registry.register(ZstdStrategy::new());
        }

        for strategy in &self.extra_strategies {
            registry.register(strategy.clone());
        }

        registry
    }
}
