//! Deterministic offline market data.
//!
//! Every call reseeds from `(seed, symbol, capability)`, so the same symbol
//! always yields the same series regardless of call order.

use super::{
    FundamentalProvider, HistoryProvider, NewsProvider, Provider, ProviderError, ProviderResult,
    QuoteProvider,
};
use crate::types::{Candle, FinancialData, HistoryPeriod, NewsItem, Quote};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const DEFAULT_SEED: u64 = 42;
const NEWS_TEMPLATES: &[&str] = &[
    "{code} 发布年度业绩预告，净利润同比增长20%",
    "{code} 董事会通过重大资产重组方案",
    "{code} 获得政府补贴5000万元",
    "{code} 新产品研发取得重大突破",
    "{code} 发布投资者关系活动记录",
];

#[derive(Debug, Clone)]
pub struct MockMarketData {
    seed: u64,
    as_of: NaiveDate,
}

impl Default for MockMarketData {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl MockMarketData {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            as_of: Utc::now().date_naive(),
        }
    }

    /// Pin the date of the newest generated bar
    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = as_of;
        self
    }

    fn rng(&self, symbol: &str, salt: &str) -> StdRng {
        // FNV-1a over symbol and salt
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in symbol.bytes().chain(salt.bytes()) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        StdRng::seed_from_u64(self.seed ^ hash)
    }

    /// Random walk ending at `as_of`, oldest bar first.
    ///
    /// The walk is drawn backwards from the newest bar, so a longer request
    /// only extends the past: the last `n` bars agree for every `count >= n`.
    pub fn generate_history(&self, symbol: &str, period: HistoryPeriod, count: usize) -> Vec<Candle> {
        let mut rng = self.rng(symbol, period.as_str());
        let code = board_code(symbol);
        let step_days = match period {
            HistoryPeriod::Day => 1,
            HistoryPeriod::Week => 7,
            HistoryPeriod::Month => 30,
        };

        let mut close = base_price(code, &mut rng);
        let mut candles = Vec::with_capacity(count);
        for back in 0..count {
            let date = self.as_of - Duration::days(back as i64 * step_days);

            // Percent moves keep the walk strictly positive
            let open = close / (1.0 + rng.gen_range(-5.0_f64..5.0) / 100.0);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0_f64..0.02));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0_f64..0.02));
            let volume: u64 = rng.gen_range(1_000_000..10_000_000);

            candles.push(Candle {
                date,
                open: price(open),
                high: price(high),
                low: price(low),
                close: price(close),
                volume: Decimal::from(volume),
                amount: Some(price(close * volume as f64)),
            });
            close = open / (1.0 + rng.gen_range(-0.01_f64..0.01));
        }
        candles.reverse();
        candles
    }

    /// Quote from the newest two daily bars, the same bars any daily history ends with
    pub fn generate_quote(&self, symbol: &str) -> Option<Quote> {
        let bars = self.generate_history(symbol, HistoryPeriod::Day, 2);
        let [.., prev, last] = bars.as_slice() else {
            return None;
        };

        let change_percent = if prev.close > Decimal::ZERO {
            ((last.close - prev.close) / prev.close * dec!(100)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Some(Quote {
            symbol: symbol.to_string(),
            name: format!("Mock {}", board_code(symbol)),
            price: last.close,
            open: last.open,
            yesterday_close: prev.close,
            high: last.high,
            low: last.low,
            change_percent,
            volume: last.volume,
            amount: last.amount.unwrap_or_default(),
        })
    }

    /// Fixed fundamentals per exchange board
    pub fn generate_financial(&self, symbol: &str) -> FinancialData {
        let code = board_code(symbol);
        let (pe, pb, roe, revenue, profit, debt) = if code.starts_with("60") {
            (25.0, 3.5, 0.12, 0.08, 0.10, 0.45)
        } else if code.starts_with("00") {
            (30.0, 4.0, 0.15, 0.12, 0.15, 0.50)
        } else if code.starts_with("30") {
            (40.0, 5.0, 0.18, 0.20, 0.25, 0.40)
        } else {
            (20.0, 2.5, 0.10, 0.05, 0.06, 0.55)
        };
        FinancialData {
            pe_ratio: Some(pe),
            pb_ratio: Some(pb),
            roe: Some(roe),
            revenue_growth: Some(revenue),
            profit_growth: Some(profit),
            debt_ratio: Some(debt),
        }
    }

    pub fn generate_news(&self, symbol: &str, count: usize) -> Vec<NewsItem> {
        let mut rng = self.rng(symbol, "news");
        let code = board_code(symbol);
        (0..count)
            .map(|i| {
                let template = NEWS_TEMPLATES[rng.gen_range(0..NEWS_TEMPLATES.len())];
                let days_ago: i64 = rng.gen_range(0..=3);
                let date = self.as_of - Duration::days(days_ago);
                NewsItem {
                    title: template.replace("{code}", code),
                    time: Some(format!("{} 09:30:00", date.format("%Y-%m-%d"))),
                    url: Some(format!("http://example.com/news/{symbol}_{i}")),
                    source: "mock".to_string(),
                }
            })
            .collect()
    }

    pub fn generate_mentions(&self, symbol: &str) -> u32 {
        self.rng(symbol, "mentions").gen_range(50..=200)
    }
}

/// Strip an exchange prefix: "sh600519" -> "600519"
fn board_code(symbol: &str) -> &str {
    let lower = symbol.get(..2).map(|p| p.to_ascii_lowercase());
    match lower.as_deref() {
        Some("sh") | Some("sz") | Some("bj") => &symbol[2..],
        _ => symbol,
    }
}

fn base_price(code: &str, rng: &mut StdRng) -> f64 {
    if code.starts_with('6') {
        rng.gen_range(100.0..500.0)
    } else if code.starts_with('0') {
        rng.gen_range(10.0..100.0)
    } else {
        rng.gen_range(20.0..200.0)
    }
}

fn price(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default().round_dp(2)
}

impl Provider for MockMarketData {
    fn name(&self) -> &str {
        "mock"
    }
}

#[async_trait]
impl QuoteProvider for MockMarketData {
    async fn fetch_quote(&self, symbol: &str) -> ProviderResult<Quote> {
        self.generate_quote(symbol)
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))
    }
}

#[async_trait]
impl HistoryProvider for MockMarketData {
    async fn fetch_history(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        count: usize,
    ) -> ProviderResult<Vec<Candle>> {
        Ok(self.generate_history(symbol, period, count))
    }
}

#[async_trait]
impl FundamentalProvider for MockMarketData {
    async fn fetch_financial(&self, symbol: &str) -> ProviderResult<FinancialData> {
        Ok(self.generate_financial(symbol))
    }
}

#[async_trait]
impl NewsProvider for MockMarketData {
    async fn fetch_news(&self, symbol: &str, count: usize) -> ProviderResult<Vec<NewsItem>> {
        Ok(self.generate_news(symbol, count))
    }

    async fn social_mentions(&self, symbol: &str) -> ProviderResult<Option<u32>> {
        Ok(Some(self.generate_mentions(symbol)))
    }
}
