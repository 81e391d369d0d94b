//! Sina Finance public endpoints: realtime quotes and K-line history

use crate::providers::{HistoryProvider, Provider, ProviderError, ProviderResult, QuoteProvider};
use crate::types::{normalize_symbol, Candle, HistoryPeriod, Quote};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_QUOTE_URL: &str = "http://hq.sinajs.cn";
pub const DEFAULT_HISTORY_URL: &str =
    "http://money.finance.sina.com.cn/quotes_service/api/json_v2.php/CN_MarketData.getKLineData";

const PROVIDER_NAME: &str = "sina";
const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const SINA_REFERER: &str = "https://finance.sina.com.cn/";
/// The list format has 32 or more comma-separated fields per stock
const MIN_QUOTE_FIELDS: usize = 32;
/// The K-line endpoint caps `datalen`
const MAX_BARS_PER_REQUEST: usize = 1023;

/// Sina Finance client (no authentication required)
#[derive(Clone)]
pub struct SinaClient {
    client: Client,
    quote_url: String,
    history_url: String,
}

/// One K-line row. Sina sends numbers as strings, occasionally as numbers.
#[derive(Debug, Deserialize)]
struct RawKline {
    day: String,
    open: Value,
    high: Value,
    low: Value,
    close: Value,
    #[serde(alias = "vol")]
    volume: Value,
    #[serde(default)]
    amount: Option<Value>,
}

/// Bare array, or the older `{"result": {"data": [...]}}` envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KlinePayload {
    Bare(Vec<RawKline>),
    Wrapped { result: KlineEnvelope },
}

#[derive(Debug, Deserialize)]
struct KlineEnvelope {
    data: Vec<RawKline>,
}

impl SinaClient {
    pub fn new() -> ProviderResult<Self> {
        Self::with_urls(DEFAULT_QUOTE_URL, DEFAULT_HISTORY_URL)
    }

    pub fn with_urls(quote_url: impl Into<String>, history_url: impl Into<String>) -> ProviderResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
        headers.insert(REFERER, HeaderValue::from_static(SINA_REFERER));

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            quote_url: quote_url.into().trim_end_matches('/').to_string(),
            history_url: history_url.into(),
        })
    }

    /// Fetch the realtime quote for one symbol
    pub async fn get_quote(&self, symbol: &str) -> ProviderResult<Quote> {
        let symbol = normalize_symbol(symbol);
        let url = format!("{}/list={}", self.quote_url, symbol);

        debug!(symbol = %symbol, "Fetching quote from Sina");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER_NAME.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        parse_quote(&symbol, &body)
    }

    /// Fetch up to `count` bars, oldest first
    pub async fn get_klines(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        count: usize,
    ) -> ProviderResult<Vec<Candle>> {
        let symbol = normalize_symbol(symbol);
        let datalen = count.clamp(1, MAX_BARS_PER_REQUEST).to_string();

        debug!(symbol = %symbol, period = %period.as_str(), count, "Fetching klines from Sina");
        let response = self
            .client
            .get(&self.history_url)
            .query(&[
                ("symbol", symbol.as_str()),
                ("scale", scale(period)),
                ("ma", "no"),
                ("datalen", datalen.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER_NAME.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let candles = parse_klines(&body)?;
        info!(symbol = %symbol, bars = candles.len(), "Fetched klines from Sina");
        Ok(candles)
    }
}

/// Bar size in minutes as the K-line endpoint expects it
fn scale(period: HistoryPeriod) -> &'static str {
    match period {
        HistoryPeriod::Day => "240",
        HistoryPeriod::Week => "1200",
        HistoryPeriod::Month => "7200",
    }
}

fn parse_error(message: impl Into<String>) -> ProviderError {
    ProviderError::Parse {
        provider: PROVIDER_NAME.to_string(),
        message: message.into(),
    }
}

fn field(parts: &[&str], index: usize) -> Decimal {
    parts
        .get(index)
        .and_then(|s| Decimal::from_str(s.trim()).ok())
        .unwrap_or(Decimal::ZERO)
}

/// Parse `var hq_str_sh600519="name,open,prev_close,price,high,low,...";`
pub fn parse_quote(symbol: &str, body: &str) -> ProviderResult<Quote> {
    let prefix = format!("var hq_str_{symbol}=");
    let line = body
        .lines()
        .find(|l| l.trim_start().starts_with(&prefix))
        .ok_or_else(|| parse_error(format!("no quote line for {symbol}")))?;

    let data = line
        .split('"')
        .nth(1)
        .ok_or_else(|| parse_error("quote line is not quoted"))?;
    if data.is_empty() {
        return Err(ProviderError::NotFound(symbol.to_string()));
    }

    let parts: Vec<&str> = data.split(',').collect();
    if parts.len() < MIN_QUOTE_FIELDS {
        return Err(parse_error(format!(
            "expected at least {MIN_QUOTE_FIELDS} fields, got {}",
            parts.len()
        )));
    }

    let open = field(&parts, 1);
    let yesterday_close = field(&parts, 2);
    let price = field(&parts, 3);
    let change_percent = if yesterday_close > Decimal::ZERO && price > Decimal::ZERO {
        ((price - yesterday_close) / yesterday_close * dec!(100)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    Ok(Quote {
        symbol: symbol.to_string(),
        name: parts[0].to_string(),
        price,
        open,
        yesterday_close,
        high: field(&parts, 4),
        low: field(&parts, 5),
        change_percent,
        volume: field(&parts, 8),
        amount: field(&parts, 9),
    })
}

fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

/// Parse K-line JSON. Rows with malformed fields are skipped; `null` means
/// the symbol has no history.
pub fn parse_klines(body: &str) -> ProviderResult<Vec<Candle>> {
    let body = body.trim();
    if body.is_empty() || body == "null" {
        return Ok(Vec::new());
    }

    let payload: KlinePayload =
        serde_json::from_str(body).map_err(|e| parse_error(format!("kline json: {e}")))?;
    let rows = match payload {
        KlinePayload::Bare(rows) => rows,
        KlinePayload::Wrapped { result } => result.data,
    };

    let mut candles: Vec<Candle> = rows
        .into_iter()
        .filter_map(|raw| {
            let date = NaiveDate::parse_from_str(raw.day.get(..10)?, "%Y-%m-%d").ok()?;
            Some(Candle {
                date,
                open: decimal(&raw.open)?,
                high: decimal(&raw.high)?,
                low: decimal(&raw.low)?,
                close: decimal(&raw.close)?,
                volume: decimal(&raw.volume)?,
                amount: raw.amount.as_ref().and_then(decimal),
            })
        })
        .collect();
    candles.sort_by_key(|c| c.date);
    Ok(candles)
}

impl Provider for SinaClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

#[async_trait]
impl QuoteProvider for SinaClient {
    async fn fetch_quote(&self, symbol: &str) -> ProviderResult<Quote> {
        self.get_quote(symbol).await
    }
}

#[async_trait]
impl HistoryProvider for SinaClient {
    async fn fetch_history(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        count: usize,
    ) -> ProviderResult<Vec<Candle>> {
        self.get_klines(symbol, period, count).await
    }
}
