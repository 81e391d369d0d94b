//! Weighted scoring: weight profiles, the overall blend policy and the
//! technical sub-scores.

use crate::patterns::Pattern;
use crate::types::{clamp_unit, PricePosition, Trend, VolumePrice};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum WeightProfileError {
    #[error("Failed to read weight profile: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid weight profile: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown market regime: {0}")]
    UnknownRegime(String),

    #[error("Weight profile has no positive weights")]
    Degenerate,
}

// ============================================================================
// Market regimes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    #[default]
    Default,
    Trending,
    Ranging,
    Volatile,
}

impl MarketRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Trending => "trending",
            Self::Ranging => "ranging",
            Self::Volatile => "volatile",
        }
    }
}

impl FromStr for MarketRegime {
    type Err = WeightProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "trending" => Ok(Self::Trending),
            "ranging" => Ok(Self::Ranging),
            "volatile" => Ok(Self::Volatile),
            other => Err(WeightProfileError::UnknownRegime(other.to_string())),
        }
    }
}

// ============================================================================
// Weight profile
// ============================================================================

/// Category weights for the technical score. Always sums to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub trend: f64,
    pub position: f64,
    pub pattern: f64,
    pub volume_price: f64,
    pub indicator: f64,
}

fn default_version() -> u32 {
    1
}

impl Default for WeightProfile {
    fn default() -> Self {
        Self::for_regime(MarketRegime::Default)
    }
}

impl WeightProfile {
    /// Build a profile, renormalizing when the weights drift more than 0.01 from 1.0
    pub fn new(
        name: impl Into<String>,
        trend: f64,
        position: f64,
        pattern: f64,
        volume_price: f64,
        indicator: f64,
    ) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            trend,
            position,
            pattern,
            volume_price,
            indicator,
        }
        .normalized()
    }

    pub fn for_regime(regime: MarketRegime) -> Self {
        let (t, p, pat, vp, ind) = match regime {
            MarketRegime::Default => (0.25, 0.20, 0.20, 0.15, 0.20),
            MarketRegime::Trending => (0.35, 0.25, 0.15, 0.10, 0.15),
            MarketRegime::Ranging => (0.15, 0.15, 0.35, 0.25, 0.10),
            MarketRegime::Volatile => (0.20, 0.20, 0.15, 0.25, 0.20),
        };
        Self::new(regime.as_str(), t, p, pat, vp, ind)
    }

    pub fn total(&self) -> f64 {
        self.trend + self.position + self.pattern + self.volume_price + self.indicator
    }

    pub fn normalized(mut self) -> Self {
        let total = self.total();
        if (total - 1.0).abs() > 0.01 && total > 0.0 {
            debug!(profile = %self.name, total, "Renormalizing weight profile");
            self.trend /= total;
            self.position /= total;
            self.pattern /= total;
            self.volume_price /= total;
            self.indicator /= total;
        }
        self
    }

    /// Parse a JSON profile and renormalize it
    pub fn from_json(json: &str) -> Result<Self, WeightProfileError> {
        let profile: WeightProfile = serde_json::from_str(json)?;
        let weights = [
            profile.trend,
            profile.position,
            profile.pattern,
            profile.volume_price,
            profile.indicator,
        ];
        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) || profile.total() <= 0.0 {
            return Err(WeightProfileError::Degenerate);
        }
        Ok(profile.normalized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, WeightProfileError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }
}

// ============================================================================
// Blend policy
// ============================================================================

/// The one technical/fundamental/sentiment blend used for every overall score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendPolicy {
    pub technical: f64,
    pub fundamental: f64,
    pub sentiment: f64,
}

impl Default for BlendPolicy {
    fn default() -> Self {
        Self {
            technical: 0.4,
            fundamental: 0.3,
            sentiment: 0.3,
        }
    }
}

impl BlendPolicy {
    pub fn new(technical: f64, fundamental: f64, sentiment: f64) -> Self {
        let total = technical + fundamental + sentiment;
        if total <= 0.0 || !total.is_finite() {
            warn!(technical, fundamental, sentiment, "Degenerate blend policy, using default");
            return Self::default();
        }
        Self {
            technical: technical / total,
            fundamental: fundamental / total,
            sentiment: sentiment / total,
        }
    }

    /// Weighted overall score, clamped to [0, 1]
    pub fn blend(&self, technical: f64, fundamental: f64, sentiment: f64) -> f64 {
        clamp_unit(
            self.technical * technical + self.fundamental * fundamental + self.sentiment * sentiment,
        )
    }
}

// ============================================================================
// Technical scorer
// ============================================================================

/// Sub-scores and the weighted total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub trend: f64,
    pub position: f64,
    pub pattern: f64,
    pub volume_price: f64,
    pub indicator: f64,
    pub overall: f64,
}

/// Inputs for one technical score
#[derive(Debug, Clone, Copy)]
pub struct TechnicalInputs<'a> {
    pub trend: Trend,
    pub position: PricePosition,
    pub patterns: &'a [Pattern],
    pub volume_price: VolumePrice,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct TechnicalScorer {
    weights: WeightProfile,
}

impl TechnicalScorer {
    pub fn new(weights: WeightProfile) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &WeightProfile {
        &self.weights
    }

    pub fn score(&self, inputs: &TechnicalInputs<'_>) -> ScoreBreakdown {
        let trend = trend_score(inputs.trend);
        let position = position_score(inputs.position);
        let pattern = pattern_score(inputs.patterns);
        let volume_price = volume_price_score(inputs.volume_price);
        let indicator = indicator_score(inputs.rsi, inputs.macd);

        let w = &self.weights;
        let overall = clamp_unit(
            trend * w.trend
                + position * w.position
                + pattern * w.pattern
                + volume_price * w.volume_price
                + indicator * w.indicator,
        );

        ScoreBreakdown {
            trend,
            position,
            pattern,
            volume_price,
            indicator,
            overall,
        }
    }
}

pub fn trend_score(trend: Trend) -> f64 {
    match trend {
        Trend::Up => 0.85,
        Trend::Down => 0.15,
        Trend::Sideways | Trend::Unknown => 0.50,
    }
}

pub fn position_score(position: PricePosition) -> f64 {
    match position {
        PricePosition::Low => 0.85,
        PricePosition::High => 0.15,
        PricePosition::Mid | PricePosition::Unknown => 0.50,
    }
}

/// Mean quality, +0.1 if any strong bullish pattern, -0.1 if any strong bearish
pub fn pattern_score(patterns: &[Pattern]) -> f64 {
    if patterns.is_empty() {
        return 0.5;
    }
    let mut score = patterns.iter().map(Pattern::quality).sum::<f64>() / patterns.len() as f64;
    if patterns.iter().any(Pattern::is_strong_bullish) {
        score = (score + 0.1).min(1.0);
    }
    if patterns.iter().any(Pattern::is_strong_bearish) {
        score = (score - 0.1).max(0.0);
    }
    score
}

pub fn volume_price_score(volume_price: VolumePrice) -> f64 {
    match volume_price {
        VolumePrice::HeavyVolumeRise => 0.90,
        VolumePrice::LightVolumeDecline => 0.80,
        VolumePrice::LightVolumeRise => 0.60,
        VolumePrice::HeavyVolumeDecline => 0.15,
        VolumePrice::Normal | VolumePrice::Unknown => 0.50,
    }
}

/// Oscillator state from the latest RSI and MACD line; undefined values add nothing
pub fn indicator_score(rsi: Option<f64>, macd: Option<f64>) -> f64 {
    let mut score = 0.5;

    if let Some(rsi) = rsi {
        if rsi < 30.0 {
            score += 0.25;
        } else if rsi < 40.0 {
            score += 0.10;
        } else if rsi > 70.0 {
            score -= 0.25;
        } else if rsi > 60.0 {
            score -= 0.10;
        }
    }

    if let Some(macd) = macd {
        if macd > 0.0 {
            score += 0.15;
        } else if macd < 0.0 {
            score -= 0.15;
        }
    }

    clamp_unit(score)
}
