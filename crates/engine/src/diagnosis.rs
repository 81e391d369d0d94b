//! Diagnosis: a read-only risk/opportunity view over the domain results.
//!
//! Advisory only. Nothing here feeds back into the decision.

use crate::fundamental::FundamentalResult;
use crate::patterns::{Pattern, PatternBias};
use crate::sentiment::SentimentResult;
use crate::technical::TechnicalResult;
use crate::types::{FinancialHealth, NewsSentiment, PricePosition, Trend, Valuation};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub fn from_points(points: u32) -> Self {
        match points {
            p if p >= 5 => Self::VeryHigh,
            4 => Self::High,
            3 => Self::Medium,
            1 | 2 => Self::Low,
            _ => Self::VeryLow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLow => "very low risk",
            Self::Low => "low risk",
            Self::Medium => "medium risk",
            Self::High => "high risk",
            Self::VeryHigh => "very high risk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityLevel {
    VeryPoor,
    Poor,
    Moderate,
    Good,
    Excellent,
}

impl OpportunityLevel {
    pub fn from_points(points: u32) -> Self {
        match points {
            p if p >= 5 => Self::Excellent,
            4 => Self::Good,
            3 => Self::Moderate,
            1 | 2 => Self::Poor,
            _ => Self::VeryPoor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryPoor => "very poor opportunity",
            Self::Poor => "poor opportunity",
            Self::Moderate => "moderate opportunity",
            Self::Good => "good opportunity",
            Self::Excellent => "excellent opportunity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendHealth {
    Healthy,
    Fair,
    Unhealthy,
    Unknown,
}

impl TrendHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Fair => "fair",
            Self::Unhealthy => "unhealthy",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionHealth {
    Safe,
    Fair,
    Risky,
    Unknown,
}

impl PositionHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Fair => "fair",
            Self::Risky => "risky",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternHealth {
    Healthy,
    Neutral,
    Unhealthy,
    NoPatterns,
}

impl PatternHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Neutral => "neutral",
            Self::Unhealthy => "unhealthy",
            Self::NoPatterns => "no patterns",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    VeryHealthy,
    Healthy,
    Fair,
    Unhealthy,
}

impl OverallHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryHealthy => "very healthy",
            Self::Healthy => "healthy",
            Self::Fair => "fair",
            Self::Unhealthy => "unhealthy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Buy,
    Reduce,
    Watch,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "consider buying",
            Self::Reduce => "consider selling or reducing the position",
            Self::Watch => "watch and wait",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub symbol: String,
    pub risk_level: RiskLevel,
    pub opportunity_level: OpportunityLevel,
    pub trend_health: TrendHealth,
    pub position_health: PositionHealth,
    pub pattern_health: PatternHealth,
    pub overall_health: OverallHealth,
    pub risk_factors: Vec<String>,
    pub opportunity_factors: Vec<String>,
    pub recommendation: Recommendation,
    pub report: String,
}

pub fn diagnose(
    technical: &TechnicalResult,
    fundamental: &FundamentalResult,
    sentiment: &SentimentResult,
) -> DiagnosisResult {
    let trend_health = match technical.trend {
        Trend::Up => TrendHealth::Healthy,
        Trend::Down => TrendHealth::Unhealthy,
        Trend::Sideways => TrendHealth::Fair,
        Trend::Unknown => TrendHealth::Unknown,
    };
    let position_health = match technical.position {
        PricePosition::Low => PositionHealth::Safe,
        PricePosition::Mid => PositionHealth::Fair,
        PricePosition::High => PositionHealth::Risky,
        PricePosition::Unknown => PositionHealth::Unknown,
    };
    let pattern_health = pattern_health(&technical.patterns);

    let (risk_points, risk_factors) = assess_risk(technical, fundamental, sentiment);
    let (opportunity_points, opportunity_factors) = assess_opportunity(technical, fundamental, sentiment);
    let risk_level = RiskLevel::from_points(risk_points);
    let opportunity_level = OpportunityLevel::from_points(opportunity_points);

    let overall_health = overall_health(trend_health, position_health, pattern_health);
    let recommendation = recommend(risk_level, opportunity_level);

    let mut result = DiagnosisResult {
        symbol: technical.symbol.clone(),
        risk_level,
        opportunity_level,
        trend_health,
        position_health,
        pattern_health,
        overall_health,
        risk_factors,
        opportunity_factors,
        recommendation,
        report: String::new(),
    };
    result.report = render_report(&result);
    result
}

/// Bullish vs bearish pattern count; neutral-bias patterns count for neither
pub fn pattern_health(patterns: &[Pattern]) -> PatternHealth {
    if patterns.is_empty() {
        return PatternHealth::NoPatterns;
    }
    let bullish = patterns.iter().filter(|p| p.bias() == PatternBias::Bullish).count();
    let bearish = patterns.iter().filter(|p| p.bias() == PatternBias::Bearish).count();
    match bullish.cmp(&bearish) {
        std::cmp::Ordering::Greater => PatternHealth::Healthy,
        std::cmp::Ordering::Less => PatternHealth::Unhealthy,
        std::cmp::Ordering::Equal => PatternHealth::Neutral,
    }
}

fn assess_risk(
    technical: &TechnicalResult,
    fundamental: &FundamentalResult,
    sentiment: &SentimentResult,
) -> (u32, Vec<String>) {
    let mut points = 0;
    let mut factors = Vec::new();

    if technical.trend == Trend::Down {
        points += 2;
        factors.push("technicals in a downtrend".to_string());
    }
    if technical.position == PricePosition::High {
        points += 2;
        factors.push("price at a high position".to_string());
    }
    if fundamental.valuation == Valuation::Overvalued {
        points += 2;
        factors.push("valuation on the high side".to_string());
    }
    if fundamental.health == FinancialHealth::Average {
        points += 1;
        factors.push("financial health only average".to_string());
    }
    if sentiment.news_sentiment == NewsSentiment::Negative {
        points += 1;
        factors.push("negative news sentiment".to_string());
    }

    if factors.is_empty() {
        factors.push("no notable risk factors".to_string());
    }
    (points, factors)
}

fn assess_opportunity(
    technical: &TechnicalResult,
    fundamental: &FundamentalResult,
    sentiment: &SentimentResult,
) -> (u32, Vec<String>) {
    let mut points = 0;
    let mut factors = Vec::new();

    if technical.trend == Trend::Up {
        points += 2;
        factors.push("technicals in an uptrend".to_string());
    }
    if technical.position == PricePosition::Low {
        points += 2;
        factors.push("price at a low position".to_string());
    }
    if fundamental.valuation == Valuation::Undervalued {
        points += 2;
        factors.push("valuation on the low side".to_string());
    }
    if fundamental.health == FinancialHealth::Excellent {
        points += 1;
        factors.push("excellent financial health".to_string());
    }
    if sentiment.news_sentiment == NewsSentiment::Positive {
        points += 1;
        factors.push("positive news sentiment".to_string());
    }

    if factors.is_empty() {
        factors.push("no notable opportunity factors".to_string());
    }
    (points, factors)
}

fn overall_health(trend: TrendHealth, position: PositionHealth, pattern: PatternHealth) -> OverallHealth {
    let trend = match trend {
        TrendHealth::Healthy => 1.0,
        TrendHealth::Unhealthy => 0.0,
        TrendHealth::Fair | TrendHealth::Unknown => 0.5,
    };
    let position = match position {
        PositionHealth::Safe => 1.0,
        PositionHealth::Risky => 0.0,
        PositionHealth::Fair | PositionHealth::Unknown => 0.5,
    };
    let pattern = match pattern {
        PatternHealth::Healthy => 1.0,
        PatternHealth::Unhealthy => 0.0,
        PatternHealth::Neutral | PatternHealth::NoPatterns => 0.5,
    };

    let avg = (trend + position + pattern) / 3.0;
    if avg >= 0.75 {
        OverallHealth::VeryHealthy
    } else if avg >= 0.5 {
        OverallHealth::Healthy
    } else if avg >= 0.25 {
        OverallHealth::Fair
    } else {
        OverallHealth::Unhealthy
    }
}

pub fn recommend(risk: RiskLevel, opportunity: OpportunityLevel) -> Recommendation {
    let risky = matches!(risk, RiskLevel::High | RiskLevel::VeryHigh);
    let weak = matches!(opportunity, OpportunityLevel::Poor | OpportunityLevel::VeryPoor);
    let safe = matches!(risk, RiskLevel::Low | RiskLevel::VeryLow);
    let strong = matches!(opportunity, OpportunityLevel::Good | OpportunityLevel::Excellent);

    if risky && weak {
        Recommendation::Reduce
    } else if safe && strong {
        Recommendation::Buy
    } else {
        Recommendation::Watch
    }
}

fn render_report(result: &DiagnosisResult) -> String {
    let rule = "=".repeat(72);
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Stock diagnosis: {}", result.symbol);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Overall");
    let _ = writeln!(out, "  health:      {}", result.overall_health.as_str());
    let _ = writeln!(out, "  risk:        {}", result.risk_level.as_str());
    let _ = writeln!(out, "  opportunity: {}", result.opportunity_level.as_str());
    let _ = writeln!(out);
    let _ = writeln!(out, "Dimensions");
    let _ = writeln!(out, "  trend:    {}", result.trend_health.as_str());
    let _ = writeln!(out, "  position: {}", result.position_health.as_str());
    let _ = writeln!(out, "  patterns: {}", result.pattern_health.as_str());
    let _ = writeln!(out);
    let _ = writeln!(out, "Risk factors");
    for (i, factor) in result.risk_factors.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, factor);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Opportunity factors");
    for (i, factor) in result.opportunity_factors.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, factor);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Recommendation: {}", result.recommendation.as_str());
    let _ = writeln!(out, "{rule}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::tests::{fundamental, sentiment, technical};
    use crate::types::EventImpact;

    #[test]
    fn test_level_buckets() {
        assert_eq!(RiskLevel::from_points(0), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_points(2), RiskLevel::Low);
        assert_eq!(RiskLevel::from_points(3), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_points(4), RiskLevel::High);
        assert_eq!(RiskLevel::from_points(8), RiskLevel::VeryHigh);
        assert_eq!(OpportunityLevel::from_points(1), OpportunityLevel::Poor);
        assert_eq!(OpportunityLevel::from_points(5), OpportunityLevel::Excellent);
    }

    #[test]
    fn test_bullish_diagnosis_recommends_buy() {
        let mut t = technical(0.86, Trend::Up, PricePosition::Low);
        t.patterns = vec![Pattern::BottomConsolidation, Pattern::MaBullishAlignment];
        let f = fundamental(0.85, Valuation::Undervalued, FinancialHealth::Excellent);
        let s = sentiment(0.65, NewsSentiment::Positive, EventImpact::Favorable);

        let result = diagnose(&t, &f, &s);
        assert_eq!(result.risk_level, RiskLevel::VeryLow);
        assert_eq!(result.opportunity_level, OpportunityLevel::Excellent);
        assert_eq!(result.pattern_health, PatternHealth::Healthy);
        assert_eq!(result.overall_health, OverallHealth::VeryHealthy);
        assert_eq!(result.recommendation, Recommendation::Buy);
        assert_eq!(result.risk_factors, vec!["no notable risk factors"]);
        assert_eq!(result.opportunity_factors.len(), 5);
        assert!(result.report.contains("Recommendation: consider buying"));
        assert!(result.report.contains("health:      very healthy"));
        assert!(result.report.contains("position: safe"));
    }

    #[test]
    fn test_bearish_diagnosis_recommends_reduce() {
        let mut t = technical(0.1, Trend::Down, PricePosition::High);
        t.patterns = vec![Pattern::DeathCross, Pattern::BearFlag, Pattern::GoldenCross];
        let f = fundamental(0.1, Valuation::Overvalued, FinancialHealth::Average);
        let s = sentiment(0.3, NewsSentiment::Neutral, EventImpact::None);

        let result = diagnose(&t, &f, &s);
        assert_eq!(result.risk_level, RiskLevel::VeryHigh);
        assert_eq!(result.opportunity_level, OpportunityLevel::VeryPoor);
        assert_eq!(result.pattern_health, PatternHealth::Unhealthy);
        assert_eq!(result.overall_health, OverallHealth::Unhealthy);
        assert_eq!(result.recommendation, Recommendation::Reduce);
    }

    #[test]
    fn test_neutral_trend_counts_for_neither_side() {
        let t = technical(0.5, Trend::Sideways, PricePosition::Mid);
        let f = fundamental(0.5, Valuation::Fair, FinancialHealth::Good);
        let s = sentiment(0.5, NewsSentiment::Neutral, EventImpact::None);

        let result = diagnose(&t, &f, &s);
        assert_eq!(result.risk_level, RiskLevel::VeryLow);
        assert_eq!(result.opportunity_level, OpportunityLevel::VeryPoor);
        assert_eq!(result.pattern_health, PatternHealth::NoPatterns);
        assert_eq!(result.overall_health, OverallHealth::Healthy);
        assert_eq!(result.recommendation, Recommendation::Watch);
    }

    #[test]
    fn test_report_uses_readable_labels() {
        let t = technical(0.5, Trend::Sideways, PricePosition::Mid);
        let f = fundamental(0.5, Valuation::Fair, FinancialHealth::Good);
        let s = sentiment(0.5, NewsSentiment::Neutral, EventImpact::None);

        let report = diagnose(&t, &f, &s).report;
        assert!(report.contains("health:      healthy"));
        assert!(report.contains("trend:    fair"));
        assert!(report.contains("position: fair"));
        assert!(report.contains("patterns: no patterns"));
        assert!(!report.contains("NoPatterns"));
        assert!(!report.contains("Healthy"));
    }
}
