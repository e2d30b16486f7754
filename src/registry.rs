//! Strategy registry and optimal-strategy selection.
//!
//! The registry provides:
//! - Typed lookup by [`StrategyId`] (or by algorithm tag)
//! - Replace-on-reregister with stable registration order
//! - Deterministic selection with a designated fallback
//!
//! # Selection
//!
//! 1. Keep strategies whose `should_use` accepts the payload.
//! 2. None qualify: return the default strategy (or the first registered).
//! 3. Otherwise sort by `(latency tier, estimate_ratio, registration index)`.
//!
//! The latency tier puts speed-priority strategies first when the hints
//! are latency-sensitive (hot, or access frequency above 0.8); for all
//! other hints every strategy shares one tier and the smallest estimated
//! output wins. Equal estimates resolve to the earlier registration.

use std::collections::HashMap;

use crate::strategy::{CompressionHints, CompressionStrategy, Priority, Strategy, StrategyId};

/// A strategy paired with its estimate for one payload
#[derive(Debug, Clone)]
pub struct RankedStrategy<'a> {
    /// The candidate
    pub strategy: &'a Strategy,
    /// Its predicted compressed/original ratio
    pub estimated_ratio: f64,
    /// Position in registration order
    pub index: usize,
}

/// Name-keyed collection of strategies
///
/// # Example
/// ```
/// use adaptive::registry::StrategyRegistry;
/// use adaptive::strategy::{CompressionHints, CompressionStrategy, Lz4Strategy, ZstdStrategy, StrategyId};
///
/// let mut registry = StrategyRegistry::new();
/// registry.register(Lz4Strategy::new());
/// registry.register(ZstdStrategy::new());
///
/// assert!(registry.get(StrategyId::Zstd).is_some());
/// assert!(registry.get("nonexistent").is_none());
///
/// let hints = CompressionHints::new("application/json", 64);
/// let chosen = registry.get_optimal(b"{}", &hints).unwrap();
/// assert_eq!(chosen.name(), "zstd");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    /// Strategies in registration order
    entries: Vec<Strategy>,

    /// Id -> position in `entries`
    index: HashMap<StrategyId, usize>,

    /// Fallback when nothing is eligible
    default: Option<StrategyId>,
}

impl StrategyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy, returning the one it replaced
    ///
    /// A replacement keeps the original registration slot.
    pub fn register(&mut self, strategy: impl Into<Strategy>) -> Option<Strategy> {
        let strategy = strategy.into();
        let id = strategy.id();

        if let Some(&slot) = self.index.get(&id) {
            tracing::debug!("Replacing strategy {}", id);
            return Some(std::mem::replace(&mut self.entries[slot], strategy));
        }

        self.index.insert(id, self.entries.len());
        self.entries.push(strategy);
        None
    }

    /// Designate the fallback strategy
    pub fn set_default(&mut self, id: impl Into<StrategyId>) {
        self.default = Some(id.into());
    }

    /// Builder form of [`set_default`](Self::set_default)
    pub fn with_default(mut self, id: impl Into<StrategyId>) -> Self {
        self.set_default(id);
        self
    }

    /// Look up a strategy by id or algorithm tag
    pub fn get(&self, id: impl Into<StrategyId>) -> Option<&Strategy> {
        let id = id.into();
        self.index.get(&id).map(|&slot| &self.entries[slot])
    }

    /// Check if a strategy is registered
    pub fn contains(&self, id: impl Into<StrategyId>) -> bool {
        self.index.contains_key(&id.into())
    }

    /// Number of registered strategies
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate strategies in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Strategy> {
        self.entries.iter()
    }

    /// Registered algorithm tags in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|s| s.name()).collect()
    }

    /// Strategy used when no candidate is eligible
    pub fn fallback(&self) -> Option<&Strategy> {
        self.default
            .as_ref()
            .and_then(|id| self.index.get(id))
            .map(|&slot| &self.entries[slot])
            .or_else(|| self.entries.first())
    }

    /// Eligible strategies, best first
    pub fn rank(&self, data: &[u8], hints: &CompressionHints) -> Vec<RankedStrategy<'_>> {
        let latency_sensitive = hints.is_latency_sensitive();
        let tier = |strategy: &Strategy| -> u8 {
            if latency_sensitive && strategy.priority() != Priority::Speed {
                1
            } else {
                0
            }
        };

        let mut ranked: Vec<RankedStrategy<'_>> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, strategy)| strategy.should_use(data, hints))
            .map(|(index, strategy)| RankedStrategy {
                strategy,
                estimated_ratio: strategy.estimate_ratio(data, hints),
                index,
            })
            .collect();

        ranked.sort_by(|a, b| {
            tier(a.strategy)
                .cmp(&tier(b.strategy))
                .then_with(|| a.estimated_ratio.total_cmp(&b.estimated_ratio))
                .then_with(|| a.index.cmp(&b.index))
        });
        ranked
    }

    /// Pick the best strategy for a payload
    ///
    /// Returns `None` only when the registry is empty.
    pub fn get_optimal(&self, data: &[u8], hints: &CompressionHints) -> Option<&Strategy> {
        let ranked = self.rank(data, hints);

        match ranked.first() {
            Some(best) => {
                tracing::debug!(
                    "Selected {} (ratio estimate {:.2}) from {} candidates",
                    best.strategy.name(),
                    best.estimated_ratio,
                    ranked.len()
                );
                Some(best.strategy)
            },
            None => {
                let fallback = self.fallback();
                if let Some(strategy) = fallback {
                    tracing::debug!("No eligible strategy, falling back to {}", strategy.name());
                }
                fallback
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::strategy::{BrotliStrategy, ChunkMetadata, CompressedChunk, Lz4Strategy, ZstdStrategy};

    /// Test double with fixed answers
    #[derive(Debug)]
    struct Fixed {
        name: &'static str,
        ratio: f64,
        eligible: bool,
        priority: Priority,
    }

    impl Fixed {
        fn new(name: &'static str, ratio: f64) -> Self {
            Self {
                name,
                ratio,
                eligible: true,
                priority: Priority::Balanced,
            }
        }
    }

    impl CompressionStrategy for Fixed {
        fn name(&self) -> &str {
            self.name
        }
        fn priority(&self) -> Priority {
            self.priority
        }
        fn compress(&self, data: &[u8], hints: &CompressionHints) -> Result<CompressedChunk> {
            Ok(CompressedChunk::new(
                self.name,
                data.len(),
                data.to_vec(),
                ChunkMetadata::new(hints.mime_type.clone()),
            ))
        }
        fn decompress(&self, chunk: &CompressedChunk) -> Result<Vec<u8>> {
            Ok(chunk.data.to_vec())
        }
        fn estimate_ratio(&self, _data: &[u8], _hints: &CompressionHints) -> f64 {
            self.ratio
        }
        fn should_use(&self, _data: &[u8], _hints: &CompressionHints) -> bool {
            self.eligible
        }
    }

    fn cold(mime: &str) -> CompressionHints {
        CompressionHints::new(mime, 100).with_access_frequency(0.1)
    }

    #[test]
    fn test_lowest_estimate_wins() {
        let mut registry = StrategyRegistry::new();
        registry.register(Strategy::custom(Fixed::new("a", 0.5)));
        registry.register(Strategy::custom(Fixed::new("b", 0.2)));
        registry.register(Strategy::custom(Fixed::new("c", 0.3)));

        let chosen = registry.get_optimal(b"x", &cold("text/plain")).unwrap();
        assert_eq!(chosen.name(), "b");
    }

    #[test]
    fn test_ties_resolve_by_registration_order() {
        let mut registry = StrategyRegistry::new();
        registry.register(Strategy::custom(Fixed::new("first", 0.3)));
        registry.register(Strategy::custom(Fixed::new("second", 0.3)));

        for _ in 0..10 {
            let chosen = registry.get_optimal(b"x", &cold("text/plain")).unwrap();
            assert_eq!(chosen.name(), "first");
        }
    }

    #[test]
    fn test_fallback_when_nothing_eligible() {
        let mut registry = StrategyRegistry::new();
        let mut never = Fixed::new("never", 0.1);
        never.eligible = false;
        let mut also_never = Fixed::new("also-never", 0.1);
        also_never.eligible = false;
        registry.register(Strategy::custom(never));
        registry.register(Strategy::custom(also_never));

        assert_eq!(
            registry.get_optimal(b"x", &cold("a/b")).unwrap().name(),
            "never"
        );

        registry.set_default("also-never");
        assert_eq!(
            registry.get_optimal(b"x", &cold("a/b")).unwrap().name(),
            "also-never"
        );
    }

    #[test]
    fn test_empty_registry() {
        let registry = StrategyRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get_optimal(b"x", &cold("a/b")).is_none());
    }

    #[test]
    fn test_reregister_replaces_in_place() {
        let mut registry = StrategyRegistry::new();
        registry.register(Strategy::custom(Fixed::new("a", 0.3)));
        registry.register(Strategy::custom(Fixed::new("b", 0.3)));
        let replaced = registry.register(Strategy::custom(Fixed::new("a", 0.9)));

        assert!(replaced.is_some());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(
            registry.get_optimal(b"x", &cold("text/plain")).unwrap().name(),
            "b"
        );
    }

    #[test]
    fn test_custom_overrides_builtin_tag() {
        let mut registry = StrategyRegistry::new();
        registry.register(Lz4Strategy::new());
        registry.register(Strategy::custom(Fixed::new("lz4", 0.01)));

        assert_eq!(registry.len(), 1);
        assert!(matches!(registry.get(StrategyId::Lz4), Some(Strategy::Custom(_))));
    }

    #[test]
    fn test_latency_sensitive_prefers_speed() {
        let mut registry = StrategyRegistry::new();
        registry.register(Lz4Strategy::new());
        registry.register(BrotliStrategy::new());
        registry.register(ZstdStrategy::new());

        let hot = CompressionHints::new("text/plain", 512).with_access_frequency(0.9);
        assert_eq!(registry.get_optimal(b"hello", &hot).unwrap().name(), "lz4");

        let cold_text = CompressionHints::new("text/plain", 512).with_access_frequency(0.1);
        assert_eq!(
            registry.get_optimal(b"hello", &cold_text).unwrap().name(),
            "brotli"
        );
    }

    #[test]
    fn test_rank_lists_only_eligible() {
        let mut registry = StrategyRegistry::new();
        let mut never = Fixed::new("never", 0.01);
        never.eligible = false;
        registry.register(Strategy::custom(never));
        registry.register(Strategy::custom(Fixed::new("x", 0.4)));
        registry.register(Strategy::custom(Fixed::new("y", 0.2)));

        let ranked = registry.rank(b"data", &cold("text/plain"));
        let names: Vec<_> = ranked.iter().map(|r| r.strategy.name()).collect();
        assert_eq!(names, vec!["y", "x"]);
    }
}
