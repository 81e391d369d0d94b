//! Trading decision: action, confidence and price levels

use crate::debate::DebateResult;
use crate::fundamental::FundamentalResult;
use crate::scoring::BlendPolicy;
use crate::sentiment::SentimentResult;
use crate::technical::TechnicalResult;
use crate::types::{
    Action, Consensus, EventImpact, FinancialHealth, NewsSentiment, PricePosition, Trend,
    Valuation, VolumePrice,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingDecision {
    pub symbol: String,
    pub action: Action,
    pub confidence: f64,
    pub buy_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub target_price: Option<Decimal>,
    /// Realtime price the levels were derived from
    pub reference_price: Option<Decimal>,
    pub reasons: Vec<String>,
    pub technical_score: f64,
    pub fundamental_score: f64,
    pub sentiment_score: f64,
    pub overall_score: f64,
}

/// Stop-loss and take-profit distances as fractions of the reference price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevelPolicy {
    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    /// Added to take-profit when the price sits at a low position
    pub low_position_bonus_pct: Decimal,
}

impl Default for PriceLevelPolicy {
    fn default() -> Self {
        Self {
            stop_loss_pct: dec!(0.03),
            take_profit_pct: dec!(0.05),
            low_position_bonus_pct: dec!(0.02),
        }
    }
}

/// Map the overall score and consensus to an action and confidence.
///
/// Confidence never decreases as the score rises under a bullish consensus,
/// nor as it falls under a bearish one.
pub fn determine_action(overall_score: f64, consensus: Consensus) -> (Action, f64) {
    match consensus {
        Consensus::Bullish if overall_score >= 0.7 => (Action::Buy, (overall_score + 0.1).min(0.9)),
        Consensus::Bullish if overall_score >= 0.5 => (Action::Buy, overall_score),
        Consensus::Bearish if overall_score <= 0.3 => {
            (Action::Sell, ((1.0 - overall_score) + 0.1).min(0.9))
        }
        Consensus::Bearish if overall_score <= 0.4 => (Action::Sell, 1.0 - overall_score),
        _ => (Action::Hold, 0.5),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionEngine {
    blend: BlendPolicy,
    levels: PriceLevelPolicy,
}

impl DecisionEngine {
    pub fn new(blend: BlendPolicy, levels: PriceLevelPolicy) -> Self {
        Self { blend, levels }
    }

    pub fn blend(&self) -> &BlendPolicy {
        &self.blend
    }

    /// Decide for one symbol. `price` is the realtime quote price; without it
    /// the action still stands but no price levels are produced.
    pub fn decide(
        &self,
        symbol: &str,
        technical: &TechnicalResult,
        fundamental: &FundamentalResult,
        sentiment: &SentimentResult,
        debate: &DebateResult,
        price: Option<Decimal>,
    ) -> TradingDecision {
        let overall_score = self
            .blend
            .blend(technical.score, fundamental.score, sentiment.score);
        let (action, confidence) = determine_action(overall_score, debate.consensus);

        let mut reasons = collect_reasons(technical, fundamental, sentiment, debate);
        let price = price.filter(|p| *p > Decimal::ZERO);

        let mut decision = TradingDecision {
            symbol: symbol.to_string(),
            action,
            confidence,
            buy_price: None,
            sell_price: None,
            stop_loss: None,
            target_price: None,
            reference_price: price,
            reasons: Vec::new(),
            technical_score: technical.score,
            fundamental_score: fundamental.score,
            sentiment_score: sentiment.score,
            overall_score,
        };

        match (action, price) {
            (Action::Buy, Some(p)) => {
                let take_profit = if technical.position == PricePosition::Low {
                    self.levels.take_profit_pct + self.levels.low_position_bonus_pct
                } else {
                    self.levels.take_profit_pct
                };
                decision.buy_price = Some(p);
                decision.stop_loss = Some((p * (Decimal::ONE - self.levels.stop_loss_pct)).round_dp(2));
                decision.target_price = Some((p * (Decimal::ONE + take_profit)).round_dp(2));
            }
            (Action::Sell, Some(p)) => decision.sell_price = Some(p),
            (Action::Buy | Action::Sell, None) => {
                debug!(symbol = %symbol, "No realtime price, omitting price levels");
                reasons.push("no realtime price available, price levels omitted".to_string());
            }
            (Action::Hold, _) => {}
        }
        decision.reasons = reasons;

        info!(
            symbol = %symbol,
            action = %decision.action,
            confidence = decision.confidence,
            overall = decision.overall_score,
            "Decision made"
        );
        decision
    }
}

fn collect_reasons(
    technical: &TechnicalResult,
    fundamental: &FundamentalResult,
    sentiment: &SentimentResult,
    debate: &DebateResult,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if !matches!(technical.trend, Trend::Sideways | Trend::Unknown) {
        reasons.push(technical.trend.to_string());
    }
    if !matches!(technical.position, PricePosition::Mid | PricePosition::Unknown) {
        reasons.push(technical.position.to_string());
    }
    if technical.volume_price != VolumePrice::Unknown {
        reasons.push(technical.volume_price.to_string());
    }
    if !matches!(fundamental.valuation, Valuation::Fair | Valuation::Unknown) {
        reasons.push(format!("stock is {}", fundamental.valuation));
    }
    if !matches!(fundamental.health, FinancialHealth::Average | FinancialHealth::Unknown) {
        reasons.push(fundamental.health.to_string());
    }
    if sentiment.news_sentiment != NewsSentiment::Neutral {
        reasons.push(sentiment.news_sentiment.to_string());
    }
    if sentiment.event_impact != EventImpact::None {
        reasons.push(sentiment.event_impact.to_string());
    }
    if debate.consensus != Consensus::Neutral {
        reasons.push(format!("debate consensus is {}", debate.consensus));
    }
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::tests::{fundamental, sentiment, technical};
    use crate::debate::DebateEngine;

    const EPS: f64 = 1e-9;

    fn bullish_inputs(position: PricePosition) -> (TechnicalResult, FundamentalResult, SentimentResult) {
        (
            technical(0.9, Trend::Up, position),
            fundamental(0.85, Valuation::Undervalued, FinancialHealth::Excellent),
            sentiment(0.65, NewsSentiment::Positive, EventImpact::Favorable),
        )
    }

    #[test]
    fn test_buy_scenario() {
        let (t, f, s) = bullish_inputs(PricePosition::Mid);
        let debate = DebateEngine::default().debate(&t, &f, &s);
        let decision = DecisionEngine::default().decide("sh600519", &t, &f, &s, &debate, Some(dec!(100)));

        assert!((decision.overall_score - 0.81).abs() < EPS);
        assert_eq!(decision.action, Action::Buy);
        assert!((decision.confidence - 0.9).abs() < EPS);
        assert_eq!(decision.buy_price, Some(dec!(100)));
        assert_eq!(decision.stop_loss, Some(dec!(97.00)));
        assert_eq!(decision.target_price, Some(dec!(105.00)));
        assert_eq!(decision.sell_price, None);
        assert!(decision.reasons.iter().any(|r| r == "debate consensus is bullish"));
    }

    #[test]
    fn test_low_position_widens_target() {
        let (t, f, s) = bullish_inputs(PricePosition::Low);
        let debate = DebateEngine::default().debate(&t, &f, &s);
        let decision = DecisionEngine::default().decide("sh600519", &t, &f, &s, &debate, Some(dec!(50)));
        assert_eq!(decision.target_price, Some(dec!(53.50)));
        assert_eq!(decision.stop_loss, Some(dec!(48.50)));
    }

    #[test]
    fn test_sell_sets_only_sell_price() {
        let t = technical(0.1, Trend::Down, PricePosition::High);
        let f = fundamental(0.1, Valuation::Overvalued, FinancialHealth::Average);
        let s = sentiment(0.2, NewsSentiment::Negative, EventImpact::Unfavorable);
        let debate = DebateEngine::default().debate(&t, &f, &s);
        let decision = DecisionEngine::default().decide("sh600000", &t, &f, &s, &debate, Some(dec!(8.8)));

        assert_eq!(decision.action, Action::Sell);
        // overall = 0.04 + 0.03 + 0.06 = 0.13
        assert!((decision.confidence - 0.9).abs() < EPS);
        assert_eq!(decision.sell_price, Some(dec!(8.8)));
        assert_eq!(decision.stop_loss, None);
        assert_eq!(decision.target_price, None);
        assert_eq!(decision.buy_price, None);
    }

    #[test]
    fn test_missing_price_omits_levels() {
        let (t, f, s) = bullish_inputs(PricePosition::Mid);
        let debate = DebateEngine::default().debate(&t, &f, &s);
        let decision = DecisionEngine::default().decide("sh600519", &t, &f, &s, &debate, None);
        assert_eq!(decision.action, Action::Buy);
        assert_eq!(decision.buy_price, None);
        assert_eq!(decision.stop_loss, None);
        assert_eq!(decision.reference_price, None);
        assert!(decision.reasons.iter().any(|r| r.contains("no realtime price")));
    }

    #[test]
    fn test_unknown_technical_with_neutral_blend_holds() {
        let t = technical(0.0, Trend::Unknown, PricePosition::Unknown);
        let f = fundamental(0.8, Valuation::Fair, FinancialHealth::Good);
        let s = sentiment(0.8, NewsSentiment::Neutral, EventImpact::None);
        let debate = DebateEngine::default().debate(&t, &f, &s);
        let decision = DecisionEngine::default().decide("sh600519", &t, &f, &s, &debate, Some(dec!(10)));
        // overall 0.48 sits inside the neutral band
        assert_eq!(debate.consensus, Consensus::Neutral);
        assert_eq!(decision.action, Action::Hold);
        assert_eq!(decision.confidence, 0.5);
        assert_eq!(decision.buy_price, None);
        assert_eq!(decision.reference_price, Some(dec!(10)));
    }

    #[test]
    fn test_action_table_edges() {
        assert_eq!(determine_action(0.7, Consensus::Bullish), (Action::Buy, 0.7 + 0.1));
        assert_eq!(determine_action(0.5, Consensus::Bullish), (Action::Buy, 0.5));
        assert_eq!(determine_action(0.49, Consensus::Bullish), (Action::Hold, 0.5));
        assert_eq!(determine_action(0.4, Consensus::Bearish).0, Action::Sell);
        assert_eq!(determine_action(0.41, Consensus::Bearish), (Action::Hold, 0.5));
        assert_eq!(determine_action(0.9, Consensus::Neutral), (Action::Hold, 0.5));
    }

    #[test]
    fn test_confidence_monotonic() {
        let scores: Vec<f64> = (0..=100).map(|i| i as f64 / 100.0).collect();

        let mut prev = 0.0;
        for &s in &scores {
            let (_, c) = determine_action(s, Consensus::Bullish);
            assert!(c >= prev, "bullish confidence dropped at {s}");
            prev = c;
        }

        let mut prev = 0.0;
        for &s in scores.iter().rev() {
            let (_, c) = determine_action(s, Consensus::Bearish);
            assert!(c >= prev - EPS, "bearish confidence dropped at {s}");
            prev = c;
        }
    }

    #[test]
    fn test_identical_inputs_give_identical_decisions() {
        let (t, f, s) = bullish_inputs(PricePosition::Mid);
        let debate = DebateEngine::default().debate(&t, &f, &s);
        let engine = DecisionEngine::default();
        let a = engine.decide("sh600519", &t, &f, &s, &debate, Some(dec!(100)));
        let b = engine.decide("sh600519", &t, &f, &s, &debate, Some(dec!(100)));
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }
}
