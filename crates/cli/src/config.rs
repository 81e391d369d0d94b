//! Runtime configuration from the environment (after `.env` is loaded)

use anyhow::Context;
use engine::api::sina::{DEFAULT_HISTORY_URL, DEFAULT_QUOTE_URL};
use std::str::FromStr;

const DEFAULT_CACHE_PATH: &str = "data/advisor_cache.db";
const DEFAULT_CACHE_TTL_MINUTES: i64 = 30;
const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorConfig {
    pub cache_path: String,
    pub cache_ttl_minutes: i64,
    pub sina_base_url: String,
    pub sina_history_url: String,
    pub concurrency: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            cache_path: DEFAULT_CACHE_PATH.to_string(),
            cache_ttl_minutes: DEFAULT_CACHE_TTL_MINUTES,
            sina_base_url: DEFAULT_QUOTE_URL.to_string(),
            sina_history_url: DEFAULT_HISTORY_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl AdvisorConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let config = Self {
            cache_path: lookup("STOCK_ADVISOR_CACHE_PATH").unwrap_or(defaults.cache_path),
            cache_ttl_minutes: parsed(&lookup, "STOCK_ADVISOR_CACHE_TTL_MINUTES")?
                .unwrap_or(defaults.cache_ttl_minutes),
            sina_base_url: lookup("STOCK_ADVISOR_SINA_BASE_URL").unwrap_or(defaults.sina_base_url),
            sina_history_url: lookup("STOCK_ADVISOR_SINA_HISTORY_URL")
                .unwrap_or(defaults.sina_history_url),
            concurrency: parsed(&lookup, "STOCK_ADVISOR_CONCURRENCY")?
                .unwrap_or(defaults.concurrency),
        };

        anyhow::ensure!(config.cache_ttl_minutes > 0, "STOCK_ADVISOR_CACHE_TTL_MINUTES must be positive");
        anyhow::ensure!(config.concurrency > 0, "STOCK_ADVISOR_CONCURRENCY must be positive");
        Ok(config)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.cache_ttl_minutes)
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>().with_context(|| format!("invalid {key}: {raw:?}")))
        .transpose()
}
