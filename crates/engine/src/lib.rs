//! Stock Advisor Engine: signal scoring and consensus decisions
//!
//! Provides:
//! - Technical indicators (SMA, EMA, RSI, MACD, Bollinger, KDJ) and chart patterns
//! - Technical, fundamental and sentiment scorers
//! - Bull/bear debate, trading decision and risk diagnosis
//! - Market data providers with fallback chains, caching and a Sina Finance client
//! - An analysis pipeline tying it all together

pub mod api;
pub mod debate;
pub mod decision;
pub mod diagnosis;
pub mod fundamental;
pub mod indicators;
pub mod patterns;
pub mod pipeline;
pub mod providers;
pub mod scoring;
pub mod sentiment;
pub mod technical;
pub mod types;

// Re-exports for convenience
pub use api::SinaClient;
pub use debate::{reach_consensus, DebateEngine, DebateResult};
pub use decision::{determine_action, DecisionEngine, PriceLevelPolicy, TradingDecision};
pub use diagnosis::{
    diagnose, DiagnosisResult, OpportunityLevel, OverallHealth, Recommendation, RiskLevel,
};
pub use fundamental::{FundamentalAnalyzer, FundamentalResult};
pub use indicators::{IndicatorSet, IndicatorSnapshot};
pub use patterns::{recognize, Pattern, PatternBias};
pub use pipeline::{AnalysisPipeline, AnalysisReport, PipelineConfig, Providers};
pub use providers::{
    CachedProvider, FundamentalProvider, HistoryProvider, MockMarketData, NewsProvider, Provider,
    ProviderError, ProviderResult, QuoteProvider, SourceChain,
};
pub use scoring::{BlendPolicy, MarketRegime, ScoreBreakdown, WeightProfile, WeightProfileError};
pub use sentiment::{analyze_sentiment, SentimentAnalyzer, SentimentInput, SentimentResult};
pub use technical::{TechnicalAnalyzer, TechnicalResult, MIN_HISTORY_BARS};
pub use types::*;
