//! TTL cache in front of a provider, backed by the SQLite cache crate.
//!
//! Empty results are never stored. Cache read or write failures are logged
//! and bypassed; only the inner provider's errors reach the caller.

use super::{FundamentalProvider, HistoryProvider, NewsProvider, Provider, ProviderResult};
use crate::types::{Candle, FinancialData, HistoryPeriod, NewsItem};
use async_trait::async_trait;
use cache::{cache_key, CacheDb};
use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct CachedProvider<P: ?Sized> {
    inner: Arc<P>,
    db: CacheDb,
    ttl: Duration,
    name: String,
}

impl<P: Provider + ?Sized> CachedProvider<P> {
    pub fn new(inner: Arc<P>, db: CacheDb, ttl: Duration) -> Self {
        let name = format!("cached-{}", inner.name());
        Self { inner, db, ttl, name }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn lookup<T: DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        match self.db.repository().get_json::<T>(key, self.ttl).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(provider = %self.name, error = %e, "Cache read failed, bypassing");
                None
            }
        }
    }

    async fn store<T: Serialize + Sync>(&self, key: &str, kind: &str, value: &T) {
        if let Err(e) = self.db.repository().put_json(key, kind, value).await {
            warn!(provider = %self.name, kind = %kind, error = %e, "Cache write failed");
        }
    }
}

impl<P: Provider + ?Sized> Provider for CachedProvider<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

#[async_trait]
impl<P: HistoryProvider + ?Sized> HistoryProvider for CachedProvider<P> {
    async fn fetch_history(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        count: usize,
    ) -> ProviderResult<Vec<Candle>> {
        let count_param = count.to_string();
        let key = cache_key(
            "history",
            &[("symbol", symbol), ("period", period.as_str()), ("count", count_param.as_str())],
        );

        if let Some(candles) = self.lookup::<Vec<Candle>>(&key).await {
            debug!(symbol = %symbol, bars = candles.len(), "History cache hit");
            return Ok(candles);
        }

        let candles = self.inner.fetch_history(symbol, period, count).await?;
        if !candles.is_empty() {
            self.store(&key, "history", &candles).await;
        }
        Ok(candles)
    }
}

#[async_trait]
impl<P: FundamentalProvider + ?Sized> FundamentalProvider for CachedProvider<P> {
    async fn fetch_financial(&self, symbol: &str) -> ProviderResult<FinancialData> {
        let key = cache_key("financial", &[("symbol", symbol)]);

        if let Some(data) = self.lookup::<FinancialData>(&key).await {
            debug!(symbol = %symbol, "Financial cache hit");
            return Ok(data);
        }

        let data = self.inner.fetch_financial(symbol).await?;
        if data != FinancialData::default() {
            self.store(&key, "financial", &data).await;
        }
        Ok(data)
    }
}

#[async_trait]
impl<P: NewsProvider + ?Sized> NewsProvider for CachedProvider<P> {
    async fn fetch_news(&self, symbol: &str, count: usize) -> ProviderResult<Vec<NewsItem>> {
        let count_param = count.to_string();
        let key = cache_key("news", &[("symbol", symbol), ("count", count_param.as_str())]);

        if let Some(items) = self.lookup::<Vec<NewsItem>>(&key).await {
            debug!(symbol = %symbol, items = items.len(), "News cache hit");
            return Ok(items);
        }

        let items = self.inner.fetch_news(symbol, count).await?;
        if !items.is_empty() {
            self.store(&key, "news", &items).await;
        }
        Ok(items)
    }

    /// Mention counts move quickly and are not cached
    async fn social_mentions(&self, symbol: &str) -> ProviderResult<Option<u32>> {
        self.inner.social_mentions(symbol).await
    }
}
