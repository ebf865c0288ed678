//! Ambient configuration: the confidence multiplier, the deterministic-
//! reduction toggle, and cache policy of spec.md §5 and §8's idempotence
//! property. `EngineConfig` is constructed once, typically at
//! `FiaDatabase::open`, and threaded through without mutation thereafter
//! (spec.md §5's "no global mutable state beyond the initialization-time
//! caches").

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Engine-wide settings that are not part of any single estimator
/// request. Deserializable from TOML so a caller can ship a config file
/// alongside a database rather than hardcoding these at each call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The z-multiplier used for confidence intervals (spec.md §4.4 fixes
    /// this at 1.96 for a 95% interval; exposed here only so a caller can
    /// widen/narrow the reported interval without changing the variance
    /// math itself).
    pub confidence_z: f64,

    /// When `true`, L8's plot-to-stratum reduction is ordered by the
    /// stable `PLT_CN` key (the default, and the only mode `join`
    /// actually implements) to guarantee bit-identical output across
    /// runs, per spec.md §5 and §8's idempotence property. This flag
    /// documents the guarantee rather than switching behavior -- the
    /// engine has no non-deterministic reduction path to fall back to.
    pub deterministic_reduction: bool,

    /// Whether `cache` memoizes stratum/reference tables across
    /// requests that share an evaluation set (spec.md §2 L11, §5).
    /// Disabling is useful for a caller that reopens a `FiaDatabase`
    /// once per request and doesn't want the memory held.
    pub cache_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_z: 1.96,
            deterministic_reduction: true,
            cache_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Parses an `EngineConfig` from a TOML document.
    pub fn from_toml(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_fixed_multiplier() {
        assert_eq!(EngineConfig::default().confidence_z, 1.96);
    }

    #[test]
    fn parses_partial_toml_over_defaults() {
        let cfg = EngineConfig::from_toml("cache_enabled = false\n").unwrap();
        assert!(!cfg.cache_enabled);
        assert_eq!(cfg.confidence_z, 1.96);
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = EngineConfig::from_toml("this is not toml = [[[").unwrap_err();
        assert!(matches!(err, crate::error::EstimationError::ConfigParse(_)));
    }
}
