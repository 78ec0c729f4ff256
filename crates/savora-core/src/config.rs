//! Engine configuration.
//!
//! Uses Figment to merge `savora.toml` + `savora.<env>.toml` + `SAVORA_*`
//! env vars into a typed `EngineConfig`. Every knob has a documented default
//! so the engine runs with no config file present.

use std::env;
use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::query::QueryLimits;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Entries older than this are treated as absent on read.
    pub ttl_secs: u64,
    /// Past this entry count the least-recently-used entry is evicted.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Blend weight for the lexical signal; the semantic signal gets
    /// `1 - lexical_weight`. Product default favors the semantic side.
    pub lexical_weight: f32,
    /// Floor of the semantic candidate pool fetched from the ANN index.
    pub candidate_pool_min: usize,
    /// Pool size also scales with the requested result count:
    /// `max(candidate_pool_min, candidate_pool_factor * max_results)`.
    pub candidate_pool_factor: usize,
    pub max_ingredients: usize,
    pub default_results: usize,
    pub max_results_cap: usize,
    /// Timeout applied to every embedding-provider and index call.
    pub provider_timeout_ms: u64,
    pub cache: CacheConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lexical_weight: 0.4,
            candidate_pool_min: 50,
            candidate_pool_factor: 5,
            max_ingredients: 20,
            default_results: 10,
            max_results_cap: 50,
            provider_timeout_ms: 5000,
            cache: CacheConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the current directory's `savora.toml` plus
    /// environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("savora.toml"))
    }

    /// Load from an explicit base file, merging `savora.<env>.toml` (driven
    /// by `RUST_ENV`) and `SAVORA_*` env vars on top. Nested cache keys use
    /// double underscores, e.g. `SAVORA_CACHE__TTL_SECS=60`.
    pub fn load_from(base: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Self::default())).merge(Toml::file(base));
        let suffix = match env_name.as_str() {
            "dev" | "development" => Some("dev"),
            "prod" | "production" => Some("prod"),
            "test" | "testing" => Some("test"),
            _ => None,
        };
        if let (Some(suffix), Some(stem)) = (suffix, base.file_stem().and_then(|s| s.to_str())) {
            let sibling = base.with_file_name(format!("{stem}.{suffix}.toml"));
            figment = figment.merge(Toml::file(sibling));
        }
        figment = figment.merge(Env::prefixed("SAVORA_").split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load engine config: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.lexical_weight) {
            anyhow::bail!(
                "lexical_weight must be in [0, 1], got {}",
                self.lexical_weight
            );
        }
        if self.max_results_cap == 0 || self.default_results == 0 {
            anyhow::bail!("result bounds must be nonzero");
        }
        if self.default_results > self.max_results_cap {
            anyhow::bail!(
                "default_results {} exceeds max_results_cap {}",
                self.default_results,
                self.max_results_cap
            );
        }
        if self.max_ingredients == 0 {
            anyhow::bail!("max_ingredients must be nonzero");
        }
        if self.cache.capacity == 0 {
            anyhow::bail!("cache.capacity must be nonzero");
        }
        Ok(())
    }

    #[must_use]
    pub fn query_limits(&self) -> QueryLimits {
        QueryLimits {
            max_ingredients: self.max_ingredients,
            default_results: self.default_results,
            max_results_cap: self.max_results_cap,
        }
    }

    /// Semantic candidate pool size for a given requested result count.
    #[must_use]
    pub fn candidate_pool(&self, max_results: usize) -> usize {
        self.candidate_pool_min
            .max(self.candidate_pool_factor.saturating_mul(max_results))
    }
}
