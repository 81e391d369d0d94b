//! Technical indicator series
//!
//! Every function returns a series aligned 1:1 with its input. `None` marks a
//! bar without enough history for the lookback period and is a distinct state
//! from zero (a zero MACD histogram is meaningful). A period of zero, or one
//! longer than the input, yields an all-`None` series.
//!
//! SMA and Bollinger Bands run on the `ta` streaming indicators. EMA, RSI, MACD
//! and KDJ are computed here because their seeding differs from `ta`'s
//! (SMA-seeded EMA, Wilder RSI seeded with simple means, KDJ seeded with the
//! first RSV).

use crate::types::{to_f64, Candle};
use serde::{Deserialize, Serialize};
use ta::indicators::{BollingerBands, SimpleMovingAverage};
use ta::Next;

pub type Series = Vec<Option<f64>>;

// ============================================================================
// Series calculations
// ============================================================================

/// Trailing arithmetic mean. First defined index is `period - 1`.
pub fn sma(values: &[f64], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 || period > values.len() {
        return out;
    }
    let Ok(mut indicator) = SimpleMovingAverage::new(period) else {
        return out;
    };

    for (i, &value) in values.iter().enumerate() {
        let avg = indicator.next(value);
        if i + 1 >= period {
            out[i] = Some(avg);
        }
    }
    out
}

/// Exponential moving average seeded with the SMA of the first `period` values
pub fn ema(values: &[f64], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 || period > values.len() {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(prev);

    for i in period..values.len() {
        prev = values[i] * alpha + prev * (1.0 - alpha);
        out[i] = Some(prev);
    }
    out
}

/// Wilder RSI. Needs `period + 1` values; the first defined index is `period`.
pub fn rsi(values: &[f64], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period + 1 {
        return out;
    }

    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |d: f64| if d > 0.0 { d } else { 0.0 };
    let loss = |d: f64| if d < 0.0 { -d } else { 0.0 };

    let mut avg_gain = deltas[..period].iter().map(|&d| gain(d)).sum::<f64>() / period as f64;
    let mut avg_loss = deltas[..period].iter().map(|&d| loss(d)).sum::<f64>() / period as f64;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    let p = period as f64;
    for (i, &delta) in deltas.iter().enumerate().skip(period) {
        avg_gain = (avg_gain * (p - 1.0) + gain(delta)) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss(delta)) / p;
        out[i + 1] = Some(rsi_value(avg_gain, avg_loss));
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub macd: Series,
    pub signal: Series,
    pub histogram: Series,
}

/// MACD line, signal line (EMA over the defined part of the MACD line) and histogram
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let len = values.len();
    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);

    let macd_line: Series = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let defined: Vec<f64> = macd_line.iter().flatten().copied().collect();
    let mut signal_line = vec![None; len];
    if signal > 0 && defined.len() >= signal {
        // The defined MACD values are a contiguous tail, so left-pad to realign
        let offset = len - defined.len();
        for (j, value) in ema(&defined, signal).into_iter().enumerate() {
            signal_line[offset + j] = value;
        }
    }

    let histogram: Series = macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        })
        .collect();

    MacdSeries {
        macd: macd_line,
        signal: signal_line,
        histogram,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerSeries {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
}

/// Bollinger Bands: SMA middle, `k` population standard deviations either side
pub fn bollinger(values: &[f64], period: usize, k: f64) -> BollingerSeries {
    let len = values.len();
    let mut bands = BollingerSeries {
        upper: vec![None; len],
        middle: vec![None; len],
        lower: vec![None; len],
    };
    if period == 0 || period > len {
        return bands;
    }
    let Ok(mut indicator) = BollingerBands::new(period, k) else {
        return bands;
    };

    for (i, &value) in values.iter().enumerate() {
        let out = indicator.next(value);
        if i + 1 >= period {
            bands.upper[i] = Some(out.upper);
            bands.middle[i] = Some(out.average);
            bands.lower[i] = Some(out.lower);
        }
    }
    bands
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdjSeries {
    pub k: Series,
    pub d: Series,
    pub j: Series,
}

/// KDJ stochastic oscillator
///
/// RSV is 50 when the window's high/low range is zero. K starts at the first
/// RSV and smooths with `1/m1`; D starts at the first K and smooths with `1/m2`.
pub fn kdj(closes: &[f64], highs: &[f64], lows: &[f64], period: usize, m1: usize, m2: usize) -> KdjSeries {
    let len = closes.len();
    let mut out = KdjSeries {
        k: vec![None; len],
        d: vec![None; len],
        j: vec![None; len],
    };
    if period == 0 || m1 == 0 || m2 == 0 || len < period || highs.len() != len || lows.len() != len {
        return out;
    }

    let m1 = m1 as f64;
    let m2 = m2 as f64;
    let mut prev: Option<(f64, f64)> = None;

    for i in (period - 1)..len {
        let window = (i + 1 - period)..=i;
        let highest = highs[window.clone()].iter().copied().fold(f64::MIN, f64::max);
        let lowest = lows[window].iter().copied().fold(f64::MAX, f64::min);

        let rsv = if highest == lowest {
            50.0
        } else {
            (closes[i] - lowest) / (highest - lowest) * 100.0
        };

        let (k, d) = match prev {
            None => (rsv, rsv),
            Some((k_prev, d_prev)) => {
                let k = ((m1 - 1.0) * k_prev + rsv) / m1;
                let d = ((m2 - 1.0) * d_prev + k) / m2;
                (k, d)
            }
        };

        out.k[i] = Some(k);
        out.d[i] = Some(d);
        out.j[i] = Some(3.0 * k - 2.0 * d);
        prev = Some((k, d));
    }
    out
}

// ============================================================================
// Indicator set
// ============================================================================

/// All indicators used by the analyzers, computed in one pass over a candle series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub sma5: Series,
    pub sma10: Series,
    pub sma20: Series,
    pub sma60: Series,
    pub ema12: Series,
    pub ema26: Series,
    pub rsi14: Series,
    pub macd: MacdSeries,
    pub bollinger: BollingerSeries,
    pub kdj: KdjSeries,
    closes: Vec<f64>,
}

impl IndicatorSet {
    pub fn compute(candles: &[Candle]) -> Self {
        let closes: Vec<f64> = candles.iter().map(|c| to_f64(c.close)).collect();
        let highs: Vec<f64> = candles.iter().map(|c| to_f64(c.high)).collect();
        let lows: Vec<f64> = candles.iter().map(|c| to_f64(c.low)).collect();

        Self {
            sma5: sma(&closes, 5),
            sma10: sma(&closes, 10),
            sma20: sma(&closes, 20),
            sma60: sma(&closes, 60),
            ema12: ema(&closes, 12),
            ema26: ema(&closes, 26),
            rsi14: rsi(&closes, 14),
            macd: macd(&closes, 12, 26, 9),
            bollinger: bollinger(&closes, 20, 2.0),
            kdj: kdj(&closes, &highs, &lows, 9, 3, 3),
            closes,
        }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Latest values with their interpretation
    pub fn snapshot(&self) -> IndicatorSnapshot {
        let last = |series: &Series| series.last().copied().flatten();

        let rsi = last(&self.rsi14);
        let macd = last(&self.macd.macd);
        let macd_signal = last(&self.macd.signal);
        let macd_histogram = last(&self.macd.histogram);
        let (k, d, j) = (last(&self.kdj.k), last(&self.kdj.d), last(&self.kdj.j));
        let (upper, middle, lower) = (
            last(&self.bollinger.upper),
            last(&self.bollinger.middle),
            last(&self.bollinger.lower),
        );
        let (sma5, sma10, sma20) = (last(&self.sma5), last(&self.sma10), last(&self.sma20));
        let close = self.closes.last().copied();

        IndicatorSnapshot {
            rsi,
            macd,
            macd_signal,
            macd_histogram,
            k,
            d,
            j,
            boll_upper: upper,
            boll_middle: middle,
            boll_lower: lower,
            sma5,
            sma10,
            sma20,
            rsi_zone: RsiZone::classify(rsi),
            macd_state: MacdState::classify(macd, macd_signal, macd_histogram),
            kdj_state: KdjState::classify(k, d, j),
            bollinger_position: BollingerPosition::classify(close, upper, middle, lower),
            ma_alignment: MaAlignment::classify(sma5, sma10, sma20),
        }
    }
}

// ============================================================================
// Interpretation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZone {
    ExtremelyOverbought,
    Overbought,
    Normal,
    Oversold,
    ExtremelyOversold,
    NoData,
}

impl RsiZone {
    pub fn classify(rsi: Option<f64>) -> Self {
        match rsi {
            None => Self::NoData,
            Some(v) if v >= 80.0 => Self::ExtremelyOverbought,
            Some(v) if v >= 70.0 => Self::Overbought,
            Some(v) if v >= 30.0 => Self::Normal,
            Some(v) if v >= 20.0 => Self::Oversold,
            Some(_) => Self::ExtremelyOversold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdState {
    GoldenCross,
    DeathCross,
    BullMarket,
    BearMarket,
    Ranging,
    NoData,
}

impl MacdState {
    pub fn classify(macd: Option<f64>, signal: Option<f64>, histogram: Option<f64>) -> Self {
        let (Some(m), Some(s)) = (macd, signal) else {
            return Self::NoData;
        };
        let h = histogram.unwrap_or(m - s);
        if m > s && h > 0.0 {
            Self::GoldenCross
        } else if m < s && h < 0.0 {
            Self::DeathCross
        } else if m > 0.0 && s > 0.0 {
            Self::BullMarket
        } else if m < 0.0 && s < 0.0 {
            Self::BearMarket
        } else {
            Self::Ranging
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KdjState {
    Overbought,
    Oversold,
    GoldenCross,
    DeathCross,
    Bullish,
    Bearish,
    Ranging,
    NoData,
}

impl KdjState {
    pub fn classify(k: Option<f64>, d: Option<f64>, j: Option<f64>) -> Self {
        let (Some(k), Some(d), Some(j)) = (k, d, j) else {
            return Self::NoData;
        };
        if k > 80.0 && d > 80.0 {
            Self::Overbought
        } else if k < 20.0 && d < 20.0 {
            Self::Oversold
        } else if k > d && j > k {
            Self::GoldenCross
        } else if k < d && j < k {
            Self::DeathCross
        } else if k > d {
            Self::Bullish
        } else if k < d {
            Self::Bearish
        } else {
            Self::Ranging
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BollingerPosition {
    UpperTouch,
    LowerTouch,
    Inside,
    NoData,
}

impl BollingerPosition {
    pub fn classify(close: Option<f64>, upper: Option<f64>, middle: Option<f64>, lower: Option<f64>) -> Self {
        match (close, upper, middle, lower) {
            (Some(c), Some(u), Some(_), Some(_)) if c >= u => Self::UpperTouch,
            (Some(c), Some(_), Some(_), Some(l)) if c <= l => Self::LowerTouch,
            (Some(_), Some(_), Some(_), Some(_)) => Self::Inside,
            _ => Self::NoData,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaAlignment {
    Bullish,
    Bearish,
    Mixed,
    NoData,
}

impl MaAlignment {
    pub fn classify(sma5: Option<f64>, sma10: Option<f64>, sma20: Option<f64>) -> Self {
        let (Some(a), Some(b), Some(c)) = (sma5, sma10, sma20) else {
            return Self::NoData;
        };
        if a > b && b > c {
            Self::Bullish
        } else if a < b && b < c {
            Self::Bearish
        } else {
            Self::Mixed
        }
    }
}

/// Latest indicator values plus their labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub k: Option<f64>,
    pub d: Option<f64>,
    pub j: Option<f64>,
    pub boll_upper: Option<f64>,
    pub boll_middle: Option<f64>,
    pub boll_lower: Option<f64>,
    pub sma5: Option<f64>,
    pub sma10: Option<f64>,
    pub sma20: Option<f64>,
    pub rsi_zone: RsiZone,
    pub macd_state: MacdState,
    pub kdj_state: KdjState,
    pub bollinger_position: BollingerPosition,
    pub ma_alignment: MaAlignment,
}

impl IndicatorSnapshot {
    /// Snapshot with every value undefined
    pub fn empty() -> Self {
        IndicatorSet::compute(&[]).snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const EPS: f64 = 1e-6;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let v = actual.unwrap_or_else(|| panic!("expected {expected}, got None"));
        assert!((v - expected).abs() < EPS, "expected {expected}, got {v}");
    }

    fn ramp(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_sma_values_and_undefined_prefix() {
        let values = ramp(20);
        let out = sma(&values, 5);
        assert_eq!(out.len(), 20);
        assert!(out[..4].iter().all(Option::is_none));
        assert_close(out[4], 3.0);
        assert_close(out[19], 18.0);
    }

    #[test]
    fn test_period_longer_than_history_is_all_undefined() {
        let values = ramp(5);
        assert!(sma(&values, 6).iter().all(Option::is_none));
        assert!(ema(&values, 6).iter().all(Option::is_none));
        assert!(rsi(&values, 5).iter().all(Option::is_none));
        assert!(sma(&values, 0).iter().all(Option::is_none));
        let bands = bollinger(&values, 6, 2.0);
        assert!(bands.middle.iter().all(Option::is_none));
    }

    #[test]
    fn test_ema_seeded_with_sma() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 10.0];
        let out = ema(&values, 3);
        assert!(out[0].is_none() && out[1].is_none());
        assert_close(out[2], 2.0);
        // alpha = 0.5
        assert_close(out[3], 3.0);
        assert_close(out[4], 4.0);
        assert_close(out[5], 7.0);
    }

    #[test]
    fn test_rsi_wilder_smoothing() {
        // deltas: +1, -1, +1, +1
        let values = [1.0, 2.0, 1.0, 2.0, 3.0];
        let out = rsi(&values, 3);
        assert!(out[..3].iter().all(Option::is_none));
        // gains 2/3, losses 1/3 -> RS 2
        assert_close(out[3], 100.0 - 100.0 / 3.0);
        // gains 7/9, losses 2/9 -> RS 3.5
        assert_close(out[4], 100.0 - 100.0 / 4.5);
    }

    #[test]
    fn test_rsi_zero_loss_is_exactly_100() {
        let values = ramp(15);
        let out = rsi(&values, 14);
        assert_eq!(out[14], Some(100.0));
    }

    // Reference values for REFERENCE_CLOSES, computed in exact rational
    // arithmetic and rounded to 9 places. Each table starts at its first
    // defined index.
    const REFERENCE_CLOSES: [f64; 20] = [
        10.00, 10.50, 10.20, 10.80, 11.30, 11.00, 11.60, 12.10, 11.80, 12.40,
        12.00, 11.50, 11.90, 12.60, 13.00, 12.70, 13.40, 13.10, 13.80, 14.20,
    ];
    const SMA5: (usize, &[f64]) = (
        4,
        &[
            10.560000000, 10.760000000, 10.980000000, 11.360000000,
            11.560000000, 11.780000000, 11.980000000, 11.960000000,
            11.920000000, 12.080000000, 12.200000000, 12.340000000,
            12.720000000, 12.960000000, 13.200000000, 13.440000000,
        ],
    );
    const EMA5: (usize, &[f64]) = (
        4,
        &[
            10.560000000, 10.706666667, 11.004444444, 11.369629630,
            11.513086420, 11.808724280, 11.872482853, 11.748321902,
            11.798881268, 12.065920845, 12.377280564, 12.484853709,
            12.789902473, 12.893268315, 13.195512210, 13.530341473,
        ],
    );
    const RSI14: (usize, &[f64]) = (
        14,
        &[
            72.727272727, 69.333333333, 72.552019584, 69.199856315,
            72.403810149, 74.064091203,
        ],
    );
    const MACD_3_6: (usize, &[f64]) = (
        5,
        &[
            0.320833333, 0.367559524, 0.438881803, 0.337370931,
            0.381492629, 0.257037146, 0.068726309, 0.077368681,
            0.219402573, 0.324500024, 0.251391968, 0.339368809,
            0.258022137, 0.342109449, 0.408982139,
        ],
    );
    const SIGNAL_4: (usize, &[f64]) = (
        8,
        &[
            0.366161398, 0.372293890, 0.326191192, 0.223205239,
            0.164870616, 0.186683399, 0.241810049, 0.245642817,
            0.283133214, 0.273088783, 0.300697049, 0.344011085,
        ],
    );
    const HISTOGRAM: (usize, &[f64]) = (
        8,
        &[
            -0.028790467, 0.009198739, -0.069154047, -0.154478930,
            -0.087501935, 0.032719175, 0.082689975, 0.005749151,
            0.056235596, -0.015066646, 0.041412399, 0.064971054,
        ],
    );
    const KDJ_K: (usize, &[f64]) = (
        8,
        &[
            78.571428571, 82.266009852, 80.131362890, 69.362937579,
            66.876879021, 73.570093260, 77.834607628, 76.132162661,
            80.241954595, 79.135662037, 82.757108025, 85.563562213,
        ],
    );
    const KDJ_D: (usize, &[f64]) = (
        8,
        &[
            78.571428571, 79.802955665, 79.912424740, 76.395929020,
            73.222912353, 73.338639322, 74.837295424, 75.268917837,
            76.926596756, 77.662951850, 79.361003908, 81.428523343,
        ],
    );
    const KDJ_J: (usize, &[f64]) = (
        8,
        &[
            78.571428571, 87.192118227, 80.569239190, 55.296954697,
            54.184812356, 74.033001136, 83.829232036, 77.858652310,
            86.872670272, 82.081082413, 89.549316259, 93.833639952,
        ],
    );

    fn assert_matches_reference(actual: &Series, (first, expected): (usize, &[f64])) {
        assert_eq!(actual.len(), REFERENCE_CLOSES.len());
        assert!(actual[..first].iter().all(Option::is_none), "defined before index {first}");
        assert_eq!(actual.len() - first, expected.len());
        for (value, &want) in actual[first..].iter().zip(expected) {
            assert_close(*value, want);
        }
    }

    #[test]
    fn test_reference_series() {
        let closes = REFERENCE_CLOSES;
        let highs: Vec<f64> = closes.iter().map(|c| c + 0.30).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 0.40).collect();

        assert_matches_reference(&sma(&closes, 5), SMA5);
        assert_matches_reference(&ema(&closes, 5), EMA5);
        assert_matches_reference(&rsi(&closes, 14), RSI14);

        let m = macd(&closes, 3, 6, 4);
        assert_matches_reference(&m.macd, MACD_3_6);
        assert_matches_reference(&m.signal, SIGNAL_4);
        assert_matches_reference(&m.histogram, HISTOGRAM);

        let stoch = kdj(&closes, &highs, &lows, 9, 3, 3);
        assert_matches_reference(&stoch.k, KDJ_K);
        assert_matches_reference(&stoch.d, KDJ_D);
        assert_matches_reference(&stoch.j, KDJ_J);

        let bands = bollinger(&closes, 5, 2.0);
        assert_close(bands.middle[19], 13.44);
        assert_close(bands.upper[19], 14.487664068);
        assert_close(bands.lower[19], 12.392335932);
    }

    #[test]
    fn test_macd_signal_needs_enough_defined_values() {
        let values = ramp(27);
        let out = macd(&values, 12, 26, 9);
        assert!(out.macd[25].is_some());
        assert!(out.signal.iter().all(Option::is_none));
        assert!(out.histogram.iter().all(Option::is_none));
    }

    #[test]
    fn test_bollinger_population_std_dev() {
        let values = ramp(5);
        let bands = bollinger(&values, 5, 2.0);
        assert!(bands.upper[..4].iter().all(Option::is_none));
        assert_close(bands.middle[4], 3.0);
        let sd = 2.0_f64.sqrt();
        assert_close(bands.upper[4], 3.0 + 2.0 * sd);
        assert_close(bands.lower[4], 3.0 - 2.0 * sd);
    }

    #[test]
    fn test_kdj_values() {
        let closes = [2.0, 3.0, 4.0, 3.0];
        let highs: Vec<f64> = closes.iter().map(|c| c + 1.0).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 1.0).collect();
        let out = kdj(&closes, &highs, &lows, 3, 3, 3);

        assert!(out.k[0].is_none() && out.k[1].is_none());
        // window highs 3..5, lows 1..3 -> RSV 75
        assert_close(out.k[2], 75.0);
        assert_close(out.d[2], 75.0);
        assert_close(out.j[2], 75.0);
        // window highs 4,5,4 lows 2,3,2 -> RSV (3-2)/3*100
        let rsv = 100.0 / 3.0;
        let k = (2.0 * 75.0 + rsv) / 3.0;
        let d = (2.0 * 75.0 + k) / 3.0;
        assert_close(out.k[3], k);
        assert_close(out.d[3], d);
        assert_close(out.j[3], 3.0 * k - 2.0 * d);
    }

    #[test]
    fn test_kdj_flat_range_uses_rsv_50() {
        let flat = [5.0; 12];
        let out = kdj(&flat, &flat, &flat, 9, 3, 3);
        assert_close(out.k[11], 50.0);
        assert_close(out.d[11], 50.0);
        assert_close(out.j[11], 50.0);
    }

    #[test]
    fn test_interpretation_labels() {
        assert_eq!(RsiZone::classify(Some(85.0)), RsiZone::ExtremelyOverbought);
        assert_eq!(RsiZone::classify(Some(70.0)), RsiZone::Overbought);
        assert_eq!(RsiZone::classify(Some(25.0)), RsiZone::Oversold);
        assert_eq!(RsiZone::classify(Some(10.0)), RsiZone::ExtremelyOversold);
        assert_eq!(RsiZone::classify(None), RsiZone::NoData);

        assert_eq!(MacdState::classify(Some(1.0), Some(0.5), Some(0.5)), MacdState::GoldenCross);
        assert_eq!(MacdState::classify(Some(-1.0), Some(-0.5), Some(-0.5)), MacdState::DeathCross);
        assert_eq!(MacdState::classify(None, Some(0.5), None), MacdState::NoData);

        assert_eq!(KdjState::classify(Some(85.0), Some(82.0), Some(91.0)), KdjState::Overbought);
        assert_eq!(KdjState::classify(Some(50.0), Some(40.0), Some(70.0)), KdjState::GoldenCross);
        assert_eq!(KdjState::classify(Some(40.0), Some(50.0), Some(20.0)), KdjState::DeathCross);

        assert_eq!(MaAlignment::classify(Some(3.0), Some(2.0), Some(1.0)), MaAlignment::Bullish);
        assert_eq!(MaAlignment::classify(Some(1.0), Some(2.0), Some(3.0)), MaAlignment::Bearish);
        assert_eq!(MaAlignment::classify(Some(2.0), Some(3.0), Some(1.0)), MaAlignment::Mixed);
    }

    #[test]
    fn test_indicator_set_on_candles() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let candles: Vec<Candle> = (0..30)
            .map(|i| {
                let close = Decimal::from(100 + i);
                Candle {
                    date: start + chrono::Duration::days(i as i64),
                    open: close - dec!(0.5),
                    high: close + dec!(1),
                    low: close - dec!(1),
                    close,
                    volume: dec!(1000000),
                    amount: None,
                }
            })
            .collect();

        let set = IndicatorSet::compute(&candles);
        assert_eq!(set.len(), 30);
        assert_eq!(set.sma60.len(), 30);
        assert!(set.sma60.iter().all(Option::is_none));

        let snap = set.snapshot();
        assert_eq!(snap.rsi, Some(100.0));
        assert_eq!(snap.rsi_zone, RsiZone::ExtremelyOverbought);
        assert_eq!(snap.ma_alignment, MaAlignment::Bullish);
        assert!(snap.macd.unwrap() > 0.0);
        // 30 bars: MACD defined from 25, signal needs 9 defined values
        assert!(snap.macd_signal.is_none());
        assert_eq!(snap.macd_state, MacdState::NoData);
    }

    #[test]
    fn test_empty_snapshot_has_no_data() {
        let snap = IndicatorSnapshot::empty();
        assert_eq!(snap.rsi, None);
        assert_eq!(snap.kdj_state, KdjState::NoData);
        assert_eq!(snap.bollinger_position, BollingerPosition::NoData);
    }
}
