//! Bull/bear debate: collects arguments from the three domain results and
//! reaches a consensus from the blended score.

use crate::fundamental::FundamentalResult;
use crate::scoring::BlendPolicy;
use crate::sentiment::SentimentResult;
use crate::technical::TechnicalResult;
use crate::types::{Consensus, EventImpact, FinancialHealth, NewsSentiment, PricePosition, Trend, Valuation};
use serde::{Deserialize, Serialize};

/// `|bull - bear|` strictly below this is a neutral consensus
pub const CONSENSUS_BAND: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateResult {
    pub bull_score: f64,
    /// Always `1 - bull_score`
    pub bear_score: f64,
    pub bull_arguments: Vec<String>,
    pub bear_arguments: Vec<String>,
    pub consensus: Consensus,
    pub score: f64,
    pub signals: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DebateEngine {
    blend: BlendPolicy,
}

impl DebateEngine {
    pub fn new(blend: BlendPolicy) -> Self {
        Self { blend }
    }

    pub fn blend(&self) -> &BlendPolicy {
        &self.blend
    }

    /// Single pass over the three results; no state is kept between calls
    pub fn debate(
        &self,
        technical: &TechnicalResult,
        fundamental: &FundamentalResult,
        sentiment: &SentimentResult,
    ) -> DebateResult {
        let bull_arguments = bull_arguments(technical, fundamental, sentiment);
        let bear_arguments = bear_arguments(technical, fundamental, sentiment);

        let bull_score = self
            .blend
            .blend(technical.score, fundamental.score, sentiment.score);
        let bear_score = 1.0 - bull_score;
        let consensus = reach_consensus(bull_score, bear_score);

        let signal = match consensus {
            Consensus::Bullish => "bulls have the edge",
            Consensus::Bearish => "bears have the edge",
            Consensus::Neutral => "bulls and bears balanced",
        };

        DebateResult {
            bull_score,
            bear_score,
            bull_arguments,
            bear_arguments,
            consensus,
            score: bull_score,
            signals: vec![signal.to_string()],
        }
    }
}

/// Neutral when the gap is strictly below the band, otherwise the larger side
pub fn reach_consensus(bull_score: f64, bear_score: f64) -> Consensus {
    if (bull_score - bear_score).abs() < CONSENSUS_BAND {
        Consensus::Neutral
    } else if bull_score > bear_score {
        Consensus::Bullish
    } else {
        Consensus::Bearish
    }
}

fn bull_arguments(
    technical: &TechnicalResult,
    fundamental: &FundamentalResult,
    sentiment: &SentimentResult,
) -> Vec<String> {
    let mut args = Vec::new();
    if technical.trend == Trend::Up {
        args.push("technicals show an uptrend".to_string());
    }
    if technical.position == PricePosition::Low {
        args.push("price sits at a low position".to_string());
    }
    if fundamental.valuation == Valuation::Undervalued {
        args.push("valuation is low with a margin of safety".to_string());
    }
    if matches!(fundamental.health, FinancialHealth::Excellent | FinancialHealth::Good) {
        args.push(format!("company has {}", fundamental.health));
    }
    if sentiment.news_sentiment == NewsSentiment::Positive {
        args.push("news flow is positive".to_string());
    }
    if sentiment.event_impact == EventImpact::Favorable {
        args.push("favorable news catalyst".to_string());
    }
    args
}

fn bear_arguments(
    technical: &TechnicalResult,
    fundamental: &FundamentalResult,
    sentiment: &SentimentResult,
) -> Vec<String> {
    let mut args = Vec::new();
    if technical.trend == Trend::Down {
        args.push("technicals show a downtrend".to_string());
    }
    if technical.position == PricePosition::High {
        args.push("price sits at a high position".to_string());
    }
    if fundamental.valuation == Valuation::Overvalued {
        args.push("valuation is stretched".to_string());
    }
    if fundamental.health == FinancialHealth::Average {
        args.push("financial health is only average".to_string());
    }
    if sentiment.news_sentiment == NewsSentiment::Negative {
        args.push("news flow is negative".to_string());
    }
    if sentiment.event_impact == EventImpact::Unfavorable {
        args.push("unfavorable news overhang".to_string());
    }
    args
}
