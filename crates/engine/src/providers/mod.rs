//! Market data capabilities and the fallback chain over them.
//!
//! Each capability (quote, history, fundamentals, news) is a trait over a
//! common [`Provider`] base. A [`SourceChain`] holds providers of one
//! capability in priority order and implements that same capability, so the
//! pipeline never knows whether it talks to one source or several.

pub mod cached;
pub mod mock;

pub use cached::CachedProvider;
pub use mock::MockMarketData;

use crate::types::{Candle, FinancialData, HistoryPeriod, NewsItem, Quote};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned HTTP {status}")]
    Status { provider: String, status: u16 },

    #[error("Invalid response from {provider}: {message}")]
    Parse { provider: String, message: String },

    #[error("No data for {0}")]
    NotFound(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("All {capability} providers failed for {symbol}")]
    Exhausted { capability: String, symbol: String },
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

// ============================================================================
// Capability traits
// ============================================================================

/// Identity shared by every data source
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap local check; a chain skips providers that report false
    fn is_available(&self) -> bool {
        true
    }
}

#[async_trait]
pub trait QuoteProvider: Provider {
    async fn fetch_quote(&self, symbol: &str) -> ProviderResult<Quote>;
}

#[async_trait]
pub trait HistoryProvider: Provider {
    /// Oldest bar first
    async fn fetch_history(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        count: usize,
    ) -> ProviderResult<Vec<Candle>>;
}

#[async_trait]
pub trait FundamentalProvider: Provider {
    async fn fetch_financial(&self, symbol: &str) -> ProviderResult<FinancialData>;
}

#[async_trait]
pub trait NewsProvider: Provider {
    async fn fetch_news(&self, symbol: &str, count: usize) -> ProviderResult<Vec<NewsItem>>;

    async fn social_mentions(&self, _symbol: &str) -> ProviderResult<Option<u32>> {
        Ok(None)
    }
}

// ============================================================================
// Fallback chain
// ============================================================================

/// Providers of one capability tried in order until one succeeds.
///
/// For list-valued capabilities an empty success falls through to the next
/// provider; it is returned only when no provider has anything better.
pub struct SourceChain<P: ?Sized> {
    capability: String,
    name: String,
    providers: Vec<Arc<P>>,
}

impl<P: Provider + ?Sized> SourceChain<P> {
    pub fn new(capability: impl Into<String>) -> Self {
        let capability = capability.into();
        Self {
            name: format!("{capability}-chain"),
            capability,
            providers: Vec::new(),
        }
    }

    /// Append a provider at the lowest priority so far
    pub fn with(mut self, provider: Arc<P>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    fn candidates(&self) -> impl Iterator<Item = &Arc<P>> {
        self.providers.iter().filter(|p| {
            let available = p.is_available();
            if !available {
                debug!(provider = %p.name(), capability = %self.capability, "Skipping unavailable provider");
            }
            available
        })
    }

    fn log_failure(&self, provider: &str, symbol: &str, err: &ProviderError) {
        warn!(
            provider = %provider,
            capability = %self.capability,
            symbol = %symbol,
            error = %err,
            "Provider failed, falling back"
        );
    }

    fn exhausted(&self, symbol: &str) -> ProviderError {
        ProviderError::Exhausted {
            capability: self.capability.clone(),
            symbol: symbol.to_string(),
        }
    }
}

impl<P: Provider + ?Sized> Provider for SourceChain<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.providers.iter().any(|p| p.is_available())
    }
}

#[async_trait]
impl QuoteProvider for SourceChain<dyn QuoteProvider> {
    async fn fetch_quote(&self, symbol: &str) -> ProviderResult<Quote> {
        for provider in self.candidates() {
            match provider.fetch_quote(symbol).await {
                Ok(quote) => {
                    debug!(provider = %provider.name(), symbol = %symbol, "Quote fetched");
                    return Ok(quote);
                }
                Err(e) => self.log_failure(provider.name(), symbol, &e),
            }
        }
        Err(self.exhausted(symbol))
    }
}

#[async_trait]
impl HistoryProvider for SourceChain<dyn HistoryProvider> {
    async fn fetch_history(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        count: usize,
    ) -> ProviderResult<Vec<Candle>> {
        let mut empty_success = false;
        for provider in self.candidates() {
            match provider.fetch_history(symbol, period, count).await {
                Ok(candles) if !candles.is_empty() => {
                    debug!(provider = %provider.name(), symbol = %symbol, bars = candles.len(), "History fetched");
                    return Ok(candles);
                }
                Ok(_) => {
                    debug!(provider = %provider.name(), symbol = %symbol, "Empty history, trying next");
                    empty_success = true;
                }
                Err(e) => self.log_failure(provider.name(), symbol, &e),
            }
        }
        if empty_success {
            Ok(Vec::new())
        } else {
            Err(self.exhausted(symbol))
        }
    }
}

#[async_trait]
impl FundamentalProvider for SourceChain<dyn FundamentalProvider> {
    async fn fetch_financial(&self, symbol: &str) -> ProviderResult<FinancialData> {
        for provider in self.candidates() {
            match provider.fetch_financial(symbol).await {
                Ok(data) => return Ok(data),
                Err(e) => self.log_failure(provider.name(), symbol, &e),
            }
        }
        Err(self.exhausted(symbol))
    }
}

#[async_trait]
impl NewsProvider for SourceChain<dyn NewsProvider> {
    async fn fetch_news(&self, symbol: &str, count: usize) -> ProviderResult<Vec<NewsItem>> {
        let mut empty_success = false;
        for provider in self.candidates() {
            match provider.fetch_news(symbol, count).await {
                Ok(items) if !items.is_empty() => return Ok(items),
                Ok(_) => empty_success = true,
                Err(e) => self.log_failure(provider.name(), symbol, &e),
            }
        }
        if empty_success {
            Ok(Vec::new())
        } else {
            Err(self.exhausted(symbol))
        }
    }

    /// First provider that reports a mention count wins
    async fn social_mentions(&self, symbol: &str) -> ProviderResult<Option<u32>> {
        for provider in self.candidates() {
            match provider.social_mentions(symbol).await {
                Ok(Some(mentions)) => return Ok(Some(mentions)),
                Ok(None) => {}
                Err(e) => self.log_failure(provider.name(), symbol, &e),
            }
        }
        Ok(None)
    }
}
