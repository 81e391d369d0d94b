//! Fundamental analysis: valuation and financial health from normalized fields

use crate::types::{clamp_unit, FinancialData, FinancialHealth, Valuation};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalResult {
    pub symbol: String,
    pub valuation: Valuation,
    pub health: FinancialHealth,
    pub financials: FinancialData,
    pub score: f64,
    pub signals: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FundamentalAnalyzer;

impl FundamentalAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Score normalized fundamentals. Missing fields never fail the
    /// computation; each contributes its middle bucket.
    pub fn analyze(&self, symbol: &str, data: &FinancialData) -> FundamentalResult {
        let valuation = classify_valuation(data.pe_ratio);
        let health = classify_health(data.roe, data.debt_ratio);
        let score = fundamental_score(data);

        let mut signals = Vec::new();
        match (valuation, health) {
            (Valuation::Undervalued, FinancialHealth::Excellent | FinancialHealth::Good) => {
                signals.push("fundamentals strongly positive".to_string())
            }
            (Valuation::Undervalued, _) => signals.push("valuation on the low side".to_string()),
            (Valuation::Overvalued, _) => signals.push("valuation on the high side".to_string()),
            _ => signals.push("fundamentals neutral".to_string()),
        }

        debug!(symbol = %symbol, valuation = %valuation, health = %health, score, "Fundamental analysis complete");

        FundamentalResult {
            symbol: symbol.to_string(),
            valuation,
            health,
            financials: data.clone(),
            score,
            signals,
        }
    }
}

/// P/E below 20 is undervalued, below 35 fair. The thresholds apply to any
/// reported P/E, negative ones included; only a missing P/E is unlabelled.
pub fn classify_valuation(pe_ratio: Option<f64>) -> Valuation {
    match pe_ratio {
        Some(pe) if pe < 20.0 => Valuation::Undervalued,
        Some(pe) if pe < 35.0 => Valuation::Fair,
        Some(_) => Valuation::Overvalued,
        None => Valuation::Unknown,
    }
}

pub fn classify_health(roe: Option<f64>, debt_ratio: Option<f64>) -> FinancialHealth {
    let (Some(roe), Some(debt)) = (roe, debt_ratio) else {
        return FinancialHealth::Unknown;
    };
    if roe > 0.15 && debt < 0.5 {
        FinancialHealth::Excellent
    } else if roe > 0.10 && debt < 0.6 {
        FinancialHealth::Good
    } else {
        FinancialHealth::Average
    }
}

/// Additive score over P/E, ROE, average growth and debt, clamped to [0, 1]
pub fn fundamental_score(data: &FinancialData) -> f64 {
    let pe = match data.pe_ratio {
        Some(pe) if pe < 20.0 => 0.20,
        Some(pe) if pe < 30.0 => 0.10,
        Some(_) => -0.10,
        None => 0.10,
    };

    let roe = match data.roe {
        Some(r) if r > 0.15 => 0.25,
        Some(r) if r > 0.10 => 0.15,
        Some(_) => 0.05,
        None => 0.15,
    };

    let growth = match average_growth(data) {
        Some(g) if g > 0.15 => 0.25,
        Some(g) if g > 0.10 => 0.15,
        Some(g) if g > 0.05 => 0.05,
        Some(_) => 0.0,
        None => 0.05,
    };

    let debt = match data.debt_ratio {
        Some(d) if d < 0.4 => 0.15,
        Some(d) if d < 0.6 => 0.10,
        Some(_) => -0.10,
        None => 0.10,
    };

    clamp_unit(pe + roe + growth + debt)
}

/// Mean of the growth figures that are present
fn average_growth(data: &FinancialData) -> Option<f64> {
    match (data.revenue_growth, data.profit_growth) {
        (Some(r), Some(p)) => Some((r + p) / 2.0),
        (Some(g), None) | (None, Some(g)) => Some(g),
        (None, None) => None,
    }
}
