//! Chart pattern recognition
//!
//! Works on the same candle series as the indicators. Patterns are not
//! mutually exclusive; any number may fire for one series. Each pattern has a
//! fixed quality score and bias used by the technical scorer.

use crate::types::{to_f64, Candle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Minimum bars before any pattern is evaluated
pub const MIN_PATTERN_BARS: usize = 20;

/// Head-and-shoulders needs a longer series to hold three swings
const MIN_HEAD_SHOULDERS_BARS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    HeadAndShouldersTop,
    HeadAndShouldersBottom,
    DoubleTop,
    DoubleBottom,
    AscendingTriangle,
    DescendingTriangle,
    SymmetricTriangle,
    BullFlag,
    BearFlag,
    ConvergingWedge,
    BroadeningWedge,
    BottomConsolidation,
    MaBullishAlignment,
    MaBearishAlignment,
    BullishEngulfing,
    BearishEngulfing,
    GoldenCross,
    DeathCross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternBias {
    Bullish,
    Bearish,
    Neutral,
}

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HeadAndShouldersTop => "head and shoulders top",
            Self::HeadAndShouldersBottom => "head and shoulders bottom",
            Self::DoubleTop => "double top",
            Self::DoubleBottom => "double bottom",
            Self::AscendingTriangle => "ascending triangle",
            Self::DescendingTriangle => "descending triangle",
            Self::SymmetricTriangle => "symmetric triangle",
            Self::BullFlag => "bull flag",
            Self::BearFlag => "bear flag",
            Self::ConvergingWedge => "converging wedge",
            Self::BroadeningWedge => "broadening wedge",
            Self::BottomConsolidation => "bottom consolidation",
            Self::MaBullishAlignment => "bullish MA alignment",
            Self::MaBearishAlignment => "bearish MA alignment",
            Self::BullishEngulfing => "bullish engulfing",
            Self::BearishEngulfing => "bearish engulfing",
            Self::GoldenCross => "MA golden cross",
            Self::DeathCross => "MA death cross",
        }
    }

    /// Fixed quality score used by the pattern sub-score
    pub fn quality(&self) -> f64 {
        match self {
            Self::HeadAndShouldersTop | Self::HeadAndShouldersBottom => 0.90,
            Self::DoubleTop | Self::DoubleBottom => 0.85,
            Self::AscendingTriangle | Self::DescendingTriangle => 0.80,
            Self::SymmetricTriangle => 0.75,
            Self::BullFlag | Self::BearFlag => 0.80,
            Self::ConvergingWedge | Self::BroadeningWedge => 0.70,
            Self::BottomConsolidation => 0.75,
            Self::MaBullishAlignment => 0.70,
            Self::MaBearishAlignment => 0.30,
            Self::BullishEngulfing => 0.75,
            Self::BearishEngulfing => 0.25,
            Self::GoldenCross => 0.70,
            Self::DeathCross => 0.30,
        }
    }

    pub fn bias(&self) -> PatternBias {
        match self {
            Self::HeadAndShouldersBottom
            | Self::DoubleBottom
            | Self::AscendingTriangle
            | Self::BullFlag
            | Self::BottomConsolidation
            | Self::MaBullishAlignment
            | Self::BullishEngulfing
            | Self::GoldenCross => PatternBias::Bullish,
            Self::HeadAndShouldersTop
            | Self::DoubleTop
            | Self::DescendingTriangle
            | Self::BearFlag
            | Self::MaBearishAlignment
            | Self::BearishEngulfing
            | Self::DeathCross => PatternBias::Bearish,
            Self::SymmetricTriangle | Self::ConvergingWedge | Self::BroadeningWedge => {
                PatternBias::Neutral
            }
        }
    }

    /// Patterns that earn the +0.1 pattern-score bonus
    pub fn is_strong_bullish(&self) -> bool {
        matches!(
            self,
            Self::HeadAndShouldersBottom
                | Self::DoubleBottom
                | Self::BottomConsolidation
                | Self::MaBullishAlignment
                | Self::BullishEngulfing
                | Self::GoldenCross
        )
    }

    /// Patterns that earn the -0.1 pattern-score penalty
    pub fn is_strong_bearish(&self) -> bool {
        matches!(
            self,
            Self::HeadAndShouldersTop
                | Self::DoubleTop
                | Self::MaBearishAlignment
                | Self::BearishEngulfing
                | Self::DeathCross
        )
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Recognition
// ============================================================================

/// Price columns as f64, extracted once per call
struct Bars {
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
}

impl Bars {
    fn new(candles: &[Candle]) -> Self {
        Self {
            open: candles.iter().map(|c| to_f64(c.open)).collect(),
            high: candles.iter().map(|c| to_f64(c.high)).collect(),
            low: candles.iter().map(|c| to_f64(c.low)).collect(),
            close: candles.iter().map(|c| to_f64(c.close)).collect(),
        }
    }

    fn len(&self) -> usize {
        self.close.len()
    }
}

/// Recognize every pattern present in the series. Fewer than
/// [`MIN_PATTERN_BARS`] candles yields no patterns.
pub fn recognize(candles: &[Candle]) -> Vec<Pattern> {
    if candles.len() < MIN_PATTERN_BARS {
        return Vec::new();
    }
    let bars = Bars::new(candles);

    let mut patterns = Vec::new();
    basic_patterns(&bars, &mut patterns);
    head_and_shoulders(&bars, &mut patterns);
    double_top_bottom(&bars, &mut patterns);
    triangles(&bars, &mut patterns);
    flags(&bars, &mut patterns);
    wedges(&bars, &mut patterns);
    patterns
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::MIN, f64::max)
}

fn min_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::MAX, f64::min)
}

/// Relative change from first to last value; zero when the base is not positive
fn relative_change(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => (last - first) / first,
        _ => 0.0,
    }
}

fn basic_patterns(bars: &Bars, out: &mut Vec<Pattern>) {
    let n = bars.len();

    let recent_lows = &bars.low[n - 10..];
    let low_span = max_of(recent_lows) - min_of(recent_lows);
    if low_span < 0.05 * mean(recent_lows) {
        out.push(Pattern::BottomConsolidation);
    }

    let ma5 = mean(&bars.close[n - 5..]);
    let ma10 = mean(&bars.close[n - 10..]);
    let ma20 = mean(&bars.close[n - 20..]);
    if ma5 > ma10 && ma10 > ma20 {
        out.push(Pattern::MaBullishAlignment);
    }
    if ma5 < ma10 && ma10 < ma20 {
        out.push(Pattern::MaBearishAlignment);
    }

    let (prev_open, prev_close) = (bars.open[n - 2], bars.close[n - 2]);
    let (last_open, last_close) = (bars.open[n - 1], bars.close[n - 1]);
    if last_close > prev_open && last_open < prev_close && last_close > prev_close && last_open < prev_open {
        out.push(Pattern::BullishEngulfing);
    }
    if last_close < prev_open && last_open > prev_close && last_close < prev_close && last_open > prev_open {
        out.push(Pattern::BearishEngulfing);
    }

    let ma5_prev = mean(&bars.close[n - 6..n - 1]);
    let ma10_prev = mean(&bars.close[n - 11..n - 1]);
    if ma5_prev <= ma10_prev && ma5 > ma10 {
        out.push(Pattern::GoldenCross);
    }
    if ma5_prev >= ma10_prev && ma5 < ma10 {
        out.push(Pattern::DeathCross);
    }
}

/// Swing highs/lows: strictly above (below) the two bars on each side
fn swing_points(bars: &Bars, scan: Range<usize>) -> (Vec<(usize, f64)>, Vec<(usize, f64)>) {
    let mut highs = Vec::new();
    let mut lows = Vec::new();

    for i in scan {
        if i < 2 || i + 2 >= bars.len() {
            continue;
        }
        let h = bars.high[i];
        if h > bars.high[i - 1] && h > bars.high[i - 2] && h > bars.high[i + 1] && h > bars.high[i + 2] {
            highs.push((i, h));
        }
        let l = bars.low[i];
        if l < bars.low[i - 1] && l < bars.low[i - 2] && l < bars.low[i + 1] && l < bars.low[i + 2] {
            lows.push((i, l));
        }
    }
    (highs, lows)
}

fn head_and_shoulders(bars: &Bars, out: &mut Vec<Pattern>) {
    let n = bars.len();
    if n < MIN_HEAD_SHOULDERS_BARS {
        return;
    }
    let (highs, lows) = swing_points(bars, 2..n - 2);

    if let [.., (_, left), (_, head), (_, right)] = highs.as_slice() {
        if left < head && head > right && (left - right).abs() / left < 0.05 {
            out.push(Pattern::HeadAndShouldersTop);
        }
    }
    if let [.., (_, left), (_, head), (_, right)] = lows.as_slice() {
        if left > head && head < right && *left > 0.0 && (left - right).abs() / left < 0.05 {
            out.push(Pattern::HeadAndShouldersBottom);
        }
    }
}

fn double_top_bottom(bars: &Bars, out: &mut Vec<Pattern>) {
    let n = bars.len();
    let (highs, lows) = swing_points(bars, 5..n.saturating_sub(5));

    if let [.., (i1, h1), (i2, h2)] = highs.as_slice() {
        if (h1 - h2).abs() / h1 < 0.03 {
            let min_between = min_of(&bars.low[*i1..*i2]);
            if min_between < h1 * 0.95 {
                out.push(Pattern::DoubleTop);
            }
        }
    }
    if let [.., (i1, l1), (i2, l2)] = lows.as_slice() {
        if *l1 > 0.0 && (l1 - l2).abs() / l1 < 0.03 {
            let max_between = max_of(&bars.high[*i1..*i2]);
            if max_between > l1 * 1.05 {
                out.push(Pattern::DoubleBottom);
            }
        }
    }
}

fn triangles(bars: &Bars, out: &mut Vec<Pattern>) {
    let n = bars.len();
    let high_trend = relative_change(&bars.high[n - 20..]);
    let low_trend = relative_change(&bars.low[n - 20..]);

    if low_trend > 0.05 && high_trend.abs() < 0.02 {
        out.push(Pattern::AscendingTriangle);
    }
    if high_trend < -0.05 && low_trend.abs() < 0.02 {
        out.push(Pattern::DescendingTriangle);
    }
    if high_trend < -0.05 && low_trend > 0.05 {
        out.push(Pattern::SymmetricTriangle);
    }
}

/// Pole is bars -20..-10, flag is the last 10 bars
fn flags(bars: &Bars, out: &mut Vec<Pattern>) {
    let n = bars.len();
    let pole = &bars.close[n - 20..n - 10];
    let pole_end = pole[pole.len() - 1];
    let pole_trend = relative_change(pole);

    let flag_range = max_of(&bars.high[n - 10..]) - min_of(&bars.low[n - 10..]);
    let flag_close = bars.close[n - 1];
    let tight = flag_range < pole_end * 0.05;

    if pole_trend > 0.05 && flag_close < pole_end && tight {
        out.push(Pattern::BullFlag);
    }
    if pole_trend < -0.05 && flag_close > pole_end && tight {
        out.push(Pattern::BearFlag);
    }
}

fn wedges(bars: &Bars, out: &mut Vec<Pattern>) {
    let n = bars.len();
    let highs = &bars.high[n - 20..];
    let lows = &bars.low[n - 20..];
    let high_trend = relative_change(highs);
    let low_trend = relative_change(lows);

    if high_trend < -0.05 && low_trend > 0.05 {
        let high_range = max_of(highs) - min_of(highs);
        let low_range = max_of(lows) - min_of(lows);
        if high_range < low_range * 0.5 {
            out.push(Pattern::ConvergingWedge);
        }
    }
    if high_trend > 0.05 && low_trend < -0.05 {
        out.push(Pattern::BroadeningWedge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn dec_f(v: f64) -> Decimal {
        Decimal::from_str_exact(&format!("{:.4}", v)).unwrap()
    }

    fn candle(i: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Candle {
            date: start + chrono::Duration::days(i as i64),
            open: dec_f(open),
            high: dec_f(high),
            low: dec_f(low),
            close: dec_f(close),
            volume: Decimal::from(1_000_000),
            amount: None,
        }
    }

    /// Bars with the given (high, low); open and close at the midpoint
    fn from_ranges(ranges: &[(f64, f64)]) -> Vec<Candle> {
        ranges
            .iter()
            .enumerate()
            .map(|(i, &(h, l))| {
                let mid = (h + l) / 2.0;
                candle(i, mid, h, l, mid)
            })
            .collect()
    }

    fn from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| candle(i, c, c + 0.5, c - 0.5, c))
            .collect()
    }

    #[test]
    fn test_too_few_bars_yields_nothing() {
        let candles = from_closes(&[10.0; 19]);
        assert!(recognize(&candles).is_empty());
    }

    #[test]
    fn test_head_and_shoulders_top() {
        let mut ranges = vec![(100.0, 90.0); 30];
        ranges[8].0 = 105.0;
        ranges[15].0 = 110.0;
        ranges[22].0 = 104.0;
        let patterns = recognize(&from_ranges(&ranges));
        assert!(patterns.contains(&Pattern::HeadAndShouldersTop));
        // 110 vs 104 is more than 3% apart
        assert!(!patterns.contains(&Pattern::DoubleTop));
    }

    #[test]
    fn test_double_bottom() {
        let mut ranges = vec![(110.0, 100.0); 30];
        ranges[10].1 = 90.0;
        ranges[20].1 = 90.5;
        let patterns = recognize(&from_ranges(&ranges));
        assert!(patterns.contains(&Pattern::DoubleBottom));
        assert!(!patterns.contains(&Pattern::HeadAndShouldersBottom));
    }

    #[test]
    fn test_ascending_triangle() {
        let mut ranges = vec![(110.0, 103.0); 20];
        ranges[0] = (110.0, 100.0);
        ranges[19] = (110.5, 106.0);
        let patterns = recognize(&from_ranges(&ranges));
        assert!(patterns.contains(&Pattern::AscendingTriangle));
        assert!(!patterns.contains(&Pattern::DescendingTriangle));
    }

    #[test]
    fn test_converging_and_broadening_wedges() {
        let mut converging = vec![(126.0, 110.0); 20];
        converging[0] = (130.0, 100.0);
        converging[19] = (122.0, 120.0);
        let patterns = recognize(&from_ranges(&converging));
        assert!(patterns.contains(&Pattern::ConvergingWedge));
        assert!(patterns.contains(&Pattern::SymmetricTriangle));

        let mut broadening = vec![(105.0, 90.0); 20];
        broadening[0] = (100.0, 95.0);
        broadening[19] = (110.0, 85.0);
        let patterns = recognize(&from_ranges(&broadening));
        assert!(patterns.contains(&Pattern::BroadeningWedge));
    }

    #[test]
    fn test_bull_flag() {
        let mut candles = Vec::new();
        for i in 0..10 {
            let c = 100.0 + i as f64 * (10.0 / 9.0);
            candles.push(candle(i, c, c + 0.5, c - 0.5, c));
        }
        for i in 10..20 {
            candles.push(candle(i, 109.0, 110.0, 107.5, 109.0));
        }
        let patterns = recognize(&candles);
        assert!(patterns.contains(&Pattern::BullFlag));
        assert!(!patterns.contains(&Pattern::BearFlag));
    }

    #[test]
    fn test_golden_cross_and_alignment() {
        let mut closes = vec![10.0; 19];
        closes.push(12.0);
        let patterns = recognize(&from_closes(&closes));
        assert!(patterns.contains(&Pattern::GoldenCross));
        assert!(patterns.contains(&Pattern::MaBullishAlignment));
        assert!(!patterns.contains(&Pattern::DeathCross));
    }

    #[test]
    fn test_bullish_engulfing_and_bottom_consolidation() {
        let mut candles = from_closes(&[10.0; 18]);
        candles.push(candle(18, 10.5, 10.6, 9.9, 10.0));
        candles.push(candle(19, 9.8, 10.9, 9.7, 10.8));
        let patterns = recognize(&candles);
        assert!(patterns.contains(&Pattern::BullishEngulfing));
        assert!(patterns.contains(&Pattern::BottomConsolidation));
        assert!(!patterns.contains(&Pattern::BearishEngulfing));
    }

    #[test]
    fn test_quality_table_and_bias() {
        assert_eq!(Pattern::HeadAndShouldersBottom.quality(), 0.90);
        assert_eq!(Pattern::BearishEngulfing.quality(), 0.25);
        assert_eq!(Pattern::SymmetricTriangle.bias(), PatternBias::Neutral);
        assert_eq!(Pattern::BullFlag.bias(), PatternBias::Bullish);
        assert!(Pattern::BottomConsolidation.is_strong_bullish());
        assert!(!Pattern::BullFlag.is_strong_bullish());
        assert!(Pattern::DeathCross.is_strong_bearish());
    }
}
