//! Types shared across the advisor engine

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Convert a Decimal price/volume to f64 for indicator math
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

// ============================================================================
// Market data
// ============================================================================

/// A single OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

/// Realtime quote snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
    pub open: Decimal,
    pub yesterday_close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    /// Percent, e.g. 2.5 for +2.5%
    pub change_percent: Decimal,
    pub volume: Decimal,
    pub amount: Decimal,
}

/// Bar period for historical data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPeriod {
    #[default]
    Day,
    Week,
    Month,
}

impl HistoryPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Parse "1d"/"day", "1w"/"week", "1M"/"month"
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1d" | "d" | "day" | "daily" => Some(Self::Day),
            "1w" | "w" | "week" | "weekly" => Some(Self::Week),
            "1M" | "M" | "month" | "monthly" => Some(Self::Month),
            _ => None,
        }
    }
}

/// Canonical A-share symbol: lowercase with an exchange prefix. Codes
/// starting with 6 or 9 trade in Shanghai, everything else in Shenzhen.
pub fn normalize_symbol(symbol: &str) -> String {
    let symbol = symbol.trim().to_ascii_lowercase();
    if symbol.starts_with("sh") || symbol.starts_with("sz") || symbol.starts_with("bj") {
        symbol
    } else if symbol.starts_with('6') || symbol.starts_with('9') {
        format!("sh{symbol}")
    } else {
        format!("sz{symbol}")
    }
}

/// Normalized fundamental fields. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialData {
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    /// Fraction, 0.15 = 15%
    pub roe: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub profit_growth: Option<f64>,
    pub debt_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub source: String,
}

// ============================================================================
// Qualitative labels
// ============================================================================

macro_rules! label_display {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Sideways,
    #[default]
    Unknown,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "uptrend",
            Self::Down => "downtrend",
            Self::Sideways => "sideways",
            Self::Unknown => "unknown",
        }
    }
}
label_display!(Trend);

/// Where the price sits inside its recent high/low range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PricePosition {
    Low,
    Mid,
    High,
    #[default]
    Unknown,
}

impl PricePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low position",
            Self::Mid => "mid position",
            Self::High => "high position",
            Self::Unknown => "unknown",
        }
    }
}
label_display!(PricePosition);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VolumePrice {
    HeavyVolumeRise,
    HeavyVolumeDecline,
    LightVolumeRise,
    LightVolumeDecline,
    Normal,
    #[default]
    Unknown,
}

impl VolumePrice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HeavyVolumeRise => "rising on heavy volume",
            Self::HeavyVolumeDecline => "falling on heavy volume",
            Self::LightVolumeRise => "rising on light volume",
            Self::LightVolumeDecline => "falling on light volume",
            Self::Normal => "normal volume-price",
            Self::Unknown => "unknown",
        }
    }
}
label_display!(VolumePrice);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Valuation {
    Undervalued,
    Fair,
    Overvalued,
    #[default]
    Unknown,
}

impl Valuation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undervalued => "undervalued",
            Self::Fair => "fairly valued",
            Self::Overvalued => "overvalued",
            Self::Unknown => "unknown",
        }
    }
}
label_display!(Valuation);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FinancialHealth {
    Excellent,
    Good,
    Average,
    #[default]
    Unknown,
}

impl FinancialHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent financial health",
            Self::Good => "good financial health",
            Self::Average => "average financial health",
            Self::Unknown => "unknown",
        }
    }
}
label_display!(FinancialHealth);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NewsSentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl NewsSentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive news",
            Self::Negative => "negative news",
            Self::Neutral => "neutral news",
        }
    }
}
label_display!(NewsSentiment);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventImpact {
    Favorable,
    Unfavorable,
    #[default]
    None,
}

impl EventImpact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Favorable => "favorable event",
            Self::Unfavorable => "unfavorable event",
            Self::None => "no significant event",
        }
    }
}
label_display!(EventImpact);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarketHeat {
    High,
    #[default]
    Medium,
    Low,
}

impl MarketHeat {
    /// Bucket a social-mention count; unknown counts are medium heat
    pub fn from_mentions(mentions: Option<u32>) -> Self {
        match mentions {
            Some(m) if m > 150 => Self::High,
            Some(m) if m > 100 => Self::Medium,
            Some(_) => Self::Low,
            None => Self::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high heat",
            Self::Medium => "medium heat",
            Self::Low => "low heat",
        }
    }
}
label_display!(MarketHeat);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Consensus {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl Consensus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
        }
    }
}
label_display!(Consensus);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Hold => "hold",
        }
    }
}
label_display!(Action);

/// Clamp a score into [0, 1]
pub fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_market_heat_buckets() {
        assert_eq!(MarketHeat::from_mentions(Some(151)), MarketHeat::High);
        assert_eq!(MarketHeat::from_mentions(Some(150)), MarketHeat::Medium);
        assert_eq!(MarketHeat::from_mentions(Some(101)), MarketHeat::Medium);
        assert_eq!(MarketHeat::from_mentions(Some(100)), MarketHeat::Low);
        assert_eq!(MarketHeat::from_mentions(None), MarketHeat::Medium);
    }

    #[test]
    fn test_labels_serialize_snake_case() {
        let json = serde_json::to_string(&VolumePrice::HeavyVolumeRise).unwrap();
        assert_eq!(json, "\"heavy_volume_rise\"");
        let back: Trend = serde_json::from_str("\"sideways\"").unwrap();
        assert_eq!(back, Trend::Sideways);
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("600519"), "sh600519");
        assert_eq!(normalize_symbol("900901"), "sh900901");
        assert_eq!(normalize_symbol("000001"), "sz000001");
        assert_eq!(normalize_symbol("300750"), "sz300750");
        assert_eq!(normalize_symbol(" SH600519 "), "sh600519");
    }

    #[test]
    fn test_history_period_parse() {
        assert_eq!(HistoryPeriod::parse("1d"), Some(HistoryPeriod::Day));
        assert_eq!(HistoryPeriod::parse("week"), Some(HistoryPeriod::Week));
        assert_eq!(HistoryPeriod::parse("1M"), Some(HistoryPeriod::Month));
        assert_eq!(HistoryPeriod::parse("5m"), None);
    }

    #[test]
    fn test_to_f64_and_clamp() {
        assert!((to_f64(dec!(12.34)) - 12.34).abs() < 1e-12);
        assert_eq!(clamp_unit(1.3), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }
}
