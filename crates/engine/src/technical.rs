//! Technical analysis: trend, price position, volume-price, patterns and
//! indicators reduced to one score.

use crate::indicators::{IndicatorSet, IndicatorSnapshot, KdjState, MacdState, RsiZone};
use crate::patterns::{self, Pattern};
use crate::scoring::{ScoreBreakdown, TechnicalInputs, TechnicalScorer, WeightProfile};
use crate::types::{to_f64, Candle, PricePosition, Quote, Trend, VolumePrice};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fewer candles than this short-circuits to an unknown result
pub const MIN_HISTORY_BARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalResult {
    pub symbol: String,
    pub trend: Trend,
    pub position: PricePosition,
    pub patterns: Vec<Pattern>,
    pub indicators: IndicatorSnapshot,
    pub volume_price: VolumePrice,
    pub breakdown: Option<ScoreBreakdown>,
    pub score: f64,
    pub signals: Vec<String>,
    pub bars: usize,
}

impl TechnicalResult {
    /// Result for a symbol without enough history
    pub fn unknown(symbol: &str, bars: usize) -> Self {
        let mut builder = TechnicalResultBuilder::new(symbol, bars);
        builder.push_signal("insufficient history");
        builder.build()
    }
}

struct TechnicalResultBuilder {
    symbol: String,
    bars: usize,
    trend: Trend,
    position: PricePosition,
    patterns: Vec<Pattern>,
    indicators: Option<IndicatorSnapshot>,
    volume_price: VolumePrice,
    breakdown: Option<ScoreBreakdown>,
    signals: Vec<String>,
}

impl TechnicalResultBuilder {
    fn new(symbol: &str, bars: usize) -> Self {
        Self {
            symbol: symbol.to_string(),
            bars,
            trend: Trend::Unknown,
            position: PricePosition::Unknown,
            patterns: Vec::new(),
            indicators: None,
            volume_price: VolumePrice::Unknown,
            breakdown: None,
            signals: Vec::new(),
        }
    }

    fn push_signal(&mut self, signal: impl Into<String>) {
        self.signals.push(signal.into());
    }

    fn build(self) -> TechnicalResult {
        TechnicalResult {
            symbol: self.symbol,
            trend: self.trend,
            position: self.position,
            patterns: self.patterns,
            indicators: self.indicators.unwrap_or_else(IndicatorSnapshot::empty),
            volume_price: self.volume_price,
            score: self.breakdown.map(|b| b.overall).unwrap_or(0.0),
            breakdown: self.breakdown,
            signals: self.signals,
            bars: self.bars,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TechnicalAnalyzer {
    scorer: TechnicalScorer,
}

impl TechnicalAnalyzer {
    pub fn new(weights: WeightProfile) -> Self {
        Self {
            scorer: TechnicalScorer::new(weights),
        }
    }

    pub fn weights(&self) -> &WeightProfile {
        self.scorer.weights()
    }

    /// Analyze a candle series (oldest first). The quote, when present,
    /// supplies the current price, volume and change for position and
    /// volume-price; otherwise the last candle stands in.
    pub fn analyze(&self, symbol: &str, candles: &[Candle], quote: Option<&Quote>) -> TechnicalResult {
        if candles.len() < MIN_HISTORY_BARS {
            debug!(symbol = %symbol, bars = candles.len(), "Insufficient history for technical analysis");
            return TechnicalResult::unknown(symbol, candles.len());
        }

        let mut builder = TechnicalResultBuilder::new(symbol, candles.len());
        let closes: Vec<f64> = candles.iter().map(|c| to_f64(c.close)).collect();

        let current_price = quote
            .map(|q| to_f64(q.price))
            .filter(|p| *p > 0.0)
            .unwrap_or(closes[closes.len() - 1]);

        builder.trend = analyze_trend(&closes);
        builder.position = analyze_position(candles, current_price);
        builder.patterns = patterns::recognize(candles);
        builder.volume_price = analyze_volume_price(candles, quote);

        let snapshot = IndicatorSet::compute(candles).snapshot();
        let breakdown = self.scorer.score(&TechnicalInputs {
            trend: builder.trend,
            position: builder.position,
            patterns: &builder.patterns,
            volume_price: builder.volume_price,
            rsi: snapshot.rsi,
            macd: snapshot.macd,
        });

        builder.push_signal(rating_signal(breakdown.overall));
        for signal in indicator_signals(&snapshot) {
            builder.push_signal(signal);
        }
        let pattern_signals: Vec<String> =
            builder.patterns.iter().map(|p| format!("pattern: {p}")).collect();
        builder.signals.extend(pattern_signals);

        builder.indicators = Some(snapshot);
        builder.breakdown = Some(breakdown);

        let result = builder.build();
        debug!(
            symbol = %symbol,
            trend = %result.trend,
            position = %result.position,
            patterns = result.patterns.len(),
            score = result.score,
            "Technical analysis complete"
        );
        result
    }
}

/// Up/down when both the 5-bar and 20-bar changes exceed 2% in the same direction
pub fn analyze_trend(closes: &[f64]) -> Trend {
    let n = closes.len();
    if n < 6 {
        return Trend::Unknown;
    }
    let change = |back: usize| {
        let base = closes[n - 1 - back];
        if base > 0.0 {
            (closes[n - 1] - base) / base
        } else {
            0.0
        }
    };

    let short = change(5);
    let mid = if n >= 21 { change(20) } else { 0.0 };

    if short > 0.02 && mid > 0.02 {
        Trend::Up
    } else if short < -0.02 && mid < -0.02 {
        Trend::Down
    } else {
        Trend::Sideways
    }
}

/// Position of `price` inside the last 10 bars' high/low range
pub fn analyze_position(candles: &[Candle], price: f64) -> PricePosition {
    if candles.len() < MIN_HISTORY_BARS {
        return PricePosition::Unknown;
    }
    let recent = &candles[candles.len() - 10..];
    let highest = recent.iter().map(|c| to_f64(c.high)).fold(f64::MIN, f64::max);
    let lowest = recent.iter().map(|c| to_f64(c.low)).fold(f64::MAX, f64::min);
    let range = highest - lowest;
    if range <= 0.0 {
        return PricePosition::Unknown;
    }

    let position = (price - lowest) / range;
    if position < 0.3 {
        PricePosition::Low
    } else if position > 0.7 {
        PricePosition::High
    } else {
        PricePosition::Mid
    }
}

/// Current volume against the mean of the 9 bars before the latest one
pub fn analyze_volume_price(candles: &[Candle], quote: Option<&Quote>) -> VolumePrice {
    let n = candles.len();
    if n < MIN_HISTORY_BARS {
        return VolumePrice::Unknown;
    }

    let (current_volume, change_pct) = match quote {
        Some(q) => (to_f64(q.volume), to_f64(q.change_percent)),
        None => {
            let last = to_f64(candles[n - 1].close);
            let prev = to_f64(candles[n - 2].close);
            let change = if prev > 0.0 { (last - prev) / prev * 100.0 } else { 0.0 };
            (to_f64(candles[n - 1].volume), change)
        }
    };

    let window = &candles[n - 10..n - 1];
    let avg_volume = window.iter().map(|c| to_f64(c.volume)).sum::<f64>() / window.len() as f64;
    let ratio = if avg_volume > 0.0 { current_volume / avg_volume } else { 1.0 };

    if change_pct > 2.0 && ratio > 1.5 {
        VolumePrice::HeavyVolumeRise
    } else if change_pct < -2.0 && ratio > 1.5 {
        VolumePrice::HeavyVolumeDecline
    } else if change_pct > 2.0 && ratio < 0.8 {
        VolumePrice::LightVolumeRise
    } else if change_pct < -2.0 && ratio < 0.8 {
        VolumePrice::LightVolumeDecline
    } else {
        VolumePrice::Normal
    }
}

fn rating_signal(score: f64) -> &'static str {
    if score >= 0.7 {
        "strong buy signal"
    } else if score >= 0.5 {
        "buy signal"
    } else if score <= 0.1 {
        "strong sell signal"
    } else if score <= 0.3 {
        "sell signal"
    } else {
        "wait and see"
    }
}

fn indicator_signals(snapshot: &IndicatorSnapshot) -> Vec<&'static str> {
    let mut signals = Vec::new();
    match snapshot.rsi_zone {
        RsiZone::ExtremelyOverbought | RsiZone::Overbought => signals.push("RSI overbought"),
        RsiZone::ExtremelyOversold | RsiZone::Oversold => signals.push("RSI oversold"),
        _ => {}
    }
    match snapshot.macd_state {
        MacdState::GoldenCross => signals.push("MACD above signal line"),
        MacdState::DeathCross => signals.push("MACD below signal line"),
        _ => {}
    }
    match snapshot.kdj_state {
        KdjState::GoldenCross => signals.push("KDJ golden cross"),
        KdjState::DeathCross => signals.push("KDJ death cross"),
        KdjState::Overbought => signals.push("KDJ overbought"),
        KdjState::Oversold => signals.push("KDJ oversold"),
        _ => {}
    }
    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn make_candles(closes: &[i64], volume: i64) -> Vec<Candle> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let close = Decimal::from(c);
                Candle {
                    date: start + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + dec!(1),
                    low: close - dec!(1),
                    close,
                    volume: Decimal::from(volume),
                    amount: None,
                }
            })
            .collect()
    }

    fn quote(price: Decimal, change_percent: Decimal, volume: Decimal) -> Quote {
        Quote {
            symbol: "sh600519".to_string(),
            name: "Test".to_string(),
            price,
            open: price,
            yesterday_close: price,
            high: price,
            low: price,
            change_percent,
            volume,
            amount: Decimal::ZERO,
        }
    }

    #[test]
    fn test_insufficient_history_is_unknown_with_zero_score() {
        let candles = make_candles(&[10, 11, 12, 13, 14], 1000);
        let result = TechnicalAnalyzer::default().analyze("sh600519", &candles, None);
        assert_eq!(result.trend, Trend::Unknown);
        assert_eq!(result.position, PricePosition::Unknown);
        assert_eq!(result.score, 0.0);
        assert!(result.breakdown.is_none());
        assert_eq!(result.bars, 5);
    }

    #[test]
    fn test_trend_needs_both_horizons() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(analyze_trend(&rising), Trend::Up);

        let falling: Vec<f64> = (0..30).map(|i| 200.0 - i as f64 * 2.0).collect();
        assert_eq!(analyze_trend(&falling), Trend::Down);

        // short-term up, but fewer than 21 bars gives no mid-term change
        let short: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        assert_eq!(analyze_trend(&short), Trend::Sideways);
    }

    #[test]
    fn test_position_buckets_and_flat_range() {
        let candles = make_candles(&[100; 12], 1000);
        // range 99..101
        assert_eq!(analyze_position(&candles, 99.2), PricePosition::Low);
        assert_eq!(analyze_position(&candles, 100.0), PricePosition::Mid);
        assert_eq!(analyze_position(&candles, 100.9), PricePosition::High);

        let mut flat = candles.clone();
        for c in flat.iter_mut() {
            c.high = c.close;
            c.low = c.close;
        }
        assert_eq!(analyze_position(&flat, 100.0), PricePosition::Unknown);
    }

    #[test]
    fn test_volume_price_from_quote() {
        let candles = make_candles(&[100; 12], 1_000_000);
        let heavy_up = quote(dec!(103), dec!(3.0), dec!(2000000));
        assert_eq!(analyze_volume_price(&candles, Some(&heavy_up)), VolumePrice::HeavyVolumeRise);

        let light_down = quote(dec!(97), dec!(-3.0), dec!(500000));
        assert_eq!(analyze_volume_price(&candles, Some(&light_down)), VolumePrice::LightVolumeDecline);

        let quiet = quote(dec!(100.5), dec!(0.5), dec!(2000000));
        assert_eq!(analyze_volume_price(&candles, Some(&quiet)), VolumePrice::Normal);
    }

    #[test]
    fn test_volume_price_without_quote_uses_last_bar() {
        let mut candles = make_candles(&[100; 11], 1_000_000);
        let last = candles.len() - 1;
        candles[last].close = dec!(95);
        candles[last].volume = dec!(3000000);
        assert_eq!(analyze_volume_price(&candles, None), VolumePrice::HeavyVolumeDecline);
    }

    #[test]
    fn test_uptrend_scores_bounded_and_idempotent() {
        let closes: Vec<i64> = (0..40).map(|i| 100 + i).collect();
        let candles = make_candles(&closes, 1_000_000);
        let analyzer = TechnicalAnalyzer::default();

        let a = analyzer.analyze("sh600519", &candles, None);
        let b = analyzer.analyze("sh600519", &candles, None);
        assert_eq!(a, b);
        assert_eq!(a.trend, Trend::Up);
        assert_eq!(a.position, PricePosition::High);
        assert!((0.0..=1.0).contains(&a.score));
        assert!(a.patterns.contains(&Pattern::MaBullishAlignment));
        assert!(a.signals.iter().any(|s| s == "RSI overbought"));
    }

    #[test]
    fn test_rating_signal_order() {
        assert_eq!(rating_signal(0.75), "strong buy signal");
        assert_eq!(rating_signal(0.55), "buy signal");
        assert_eq!(rating_signal(0.4), "wait and see");
        assert_eq!(rating_signal(0.25), "sell signal");
        assert_eq!(rating_signal(0.05), "strong sell signal");
    }
}
