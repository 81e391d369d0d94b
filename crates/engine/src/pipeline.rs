//! Analysis pipeline: fetch, score, debate, decide, diagnose.
//!
//! Providers and policies are injected; the pipeline owns no global state.
//! Provider I/O shares one semaphore budget, and every provider failure
//! degrades to a neutral input instead of failing the symbol.

use crate::debate::{DebateEngine, DebateResult};
use crate::decision::{DecisionEngine, PriceLevelPolicy, TradingDecision};
use crate::diagnosis::{diagnose, DiagnosisResult};
use crate::fundamental::{FundamentalAnalyzer, FundamentalResult};
use crate::providers::{
    FundamentalProvider, HistoryProvider, MockMarketData, NewsProvider, ProviderError,
    ProviderResult, QuoteProvider,
};
use crate::scoring::{BlendPolicy, WeightProfile};
use crate::sentiment::{SentimentAnalyzer, SentimentInput, SentimentResult};
use crate::technical::{TechnicalAnalyzer, TechnicalResult};
use crate::types::{normalize_symbol, FinancialData, HistoryPeriod, Quote};
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Tunables for one pipeline instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub period: HistoryPeriod,
    pub history_bars: usize,
    pub news_count: usize,
    /// Symbols analyzed at once in a batch
    pub concurrency: usize,
    /// Provider calls in flight across all symbols
    pub provider_permits: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            period: HistoryPeriod::Day,
            history_bars: 120,
            news_count: 10,
            concurrency: 4,
            provider_permits: 8,
        }
    }
}

/// One data source per capability; each may itself be a chain
#[derive(Clone)]
pub struct Providers {
    pub quotes: Arc<dyn QuoteProvider>,
    pub history: Arc<dyn HistoryProvider>,
    pub fundamentals: Arc<dyn FundamentalProvider>,
    pub news: Arc<dyn NewsProvider>,
}

impl Providers {
    /// Serve every capability from one mock source
    pub fn mock(mock: MockMarketData) -> Self {
        let mock = Arc::new(mock);
        Self {
            quotes: mock.clone(),
            history: mock.clone(),
            fundamentals: mock.clone(),
            news: mock,
        }
    }
}

/// Everything produced for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub quote: Option<Quote>,
    pub technical: TechnicalResult,
    pub fundamental: FundamentalResult,
    pub sentiment: SentimentResult,
    pub debate: DebateResult,
    pub decision: TradingDecision,
    pub diagnosis: DiagnosisResult,
    /// Provider failures that were degraded around
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

pub struct AnalysisPipeline {
    providers: Providers,
    technical: TechnicalAnalyzer,
    fundamental: FundamentalAnalyzer,
    sentiment: SentimentAnalyzer,
    debate: DebateEngine,
    decision: DecisionEngine,
    limiter: Arc<Semaphore>,
    config: PipelineConfig,
}

impl AnalysisPipeline {
    /// The blend policy is shared by debate and decision so both compute the
    /// same overall score.
    pub fn new(
        providers: Providers,
        weights: WeightProfile,
        blend: BlendPolicy,
        config: PipelineConfig,
    ) -> Self {
        Self {
            providers,
            technical: TechnicalAnalyzer::new(weights),
            fundamental: FundamentalAnalyzer::new(),
            sentiment: SentimentAnalyzer::new(),
            debate: DebateEngine::new(blend),
            decision: DecisionEngine::new(blend, PriceLevelPolicy::default()),
            limiter: Arc::new(Semaphore::new(config.provider_permits.max(1))),
            config,
        }
    }

    pub fn with_price_levels(mut self, levels: PriceLevelPolicy) -> Self {
        self.decision = DecisionEngine::new(*self.debate.blend(), levels);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn weights(&self) -> &WeightProfile {
        self.technical.weights()
    }

    async fn limited<T>(&self, fut: impl Future<Output = ProviderResult<T>>) -> ProviderResult<T> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| ProviderError::Unavailable("provider budget closed".to_string()))?;
        fut.await
    }

    /// Analyze one symbol. Never fails: missing inputs become unknown or
    /// neutral results and are listed in `warnings`.
    pub async fn run(&self, symbol: &str) -> AnalysisReport {
        let symbol = normalize_symbol(symbol);
        let cfg = self.config;

        let (quote, history, financial, news, mentions) = tokio::join!(
            self.limited(self.providers.quotes.fetch_quote(&symbol)),
            self.limited(self.providers.history.fetch_history(&symbol, cfg.period, cfg.history_bars)),
            self.limited(self.providers.fundamentals.fetch_financial(&symbol)),
            self.limited(self.providers.news.fetch_news(&symbol, cfg.news_count)),
            self.limited(self.providers.news.social_mentions(&symbol)),
        );

        let mut warnings = Vec::new();
        let quote = degrade(&symbol, "quote", quote, &mut warnings);
        let history = degrade(&symbol, "history", history, &mut warnings).unwrap_or_default();
        let financial: FinancialData =
            degrade(&symbol, "financial", financial, &mut warnings).unwrap_or_default();
        let news = degrade(&symbol, "news", news, &mut warnings).unwrap_or_default();
        let social_mentions = degrade(&symbol, "social mentions", mentions, &mut warnings).flatten();

        let technical = self.technical.analyze(&symbol, &history, quote.as_ref());
        let fundamental = self.fundamental.analyze(&symbol, &financial);
        let sentiment = self
            .sentiment
            .analyze(&symbol, &SentimentInput { news, social_mentions });

        let debate = self.debate.debate(&technical, &fundamental, &sentiment);
        let price = quote.as_ref().map(|q| q.price);
        let decision = self
            .decision
            .decide(&symbol, &technical, &fundamental, &sentiment, &debate, price);
        let diagnosis = diagnose(&technical, &fundamental, &sentiment);

        info!(
            symbol = %symbol,
            action = %decision.action,
            overall = decision.overall_score,
            risk = %diagnosis.risk_level.as_str(),
            warnings = warnings.len(),
            "Analysis complete"
        );

        AnalysisReport {
            symbol,
            quote,
            technical,
            fundamental,
            sentiment,
            debate,
            decision,
            diagnosis,
            warnings,
            generated_at: Utc::now(),
        }
    }

    /// Analyze many symbols concurrently. Reports come back in input order.
    pub async fn batch(&self, symbols: &[String]) -> Vec<AnalysisReport> {
        info!(count = symbols.len(), concurrency = self.config.concurrency, "Starting batch analysis");

        let mut indexed: Vec<(usize, AnalysisReport)> = stream::iter(symbols.iter().enumerate())
            .map(|(index, symbol)| async move { (index, self.run(symbol).await) })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, report)| report).collect()
    }
}

fn degrade<T>(
    symbol: &str,
    what: &str,
    result: ProviderResult<T>,
    warnings: &mut Vec<String>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(symbol = %symbol, input = %what, error = %e, "Provider failed, degrading");
            warnings.push(format!("{what} unavailable: {e}"));
            None
        }
    }
}
