//! Sentiment analysis: keyword news sentiment, event impact and market heat

use crate::types::{clamp_unit, EventImpact, MarketHeat, NewsItem, NewsSentiment};
use serde::{Deserialize, Serialize};
use tracing::debug;

const POSITIVE_KEYWORDS: &[&str] = &[
    "增长", "上涨", "盈利", "突破", "利好", "优秀", "推荐", "买入", "业绩",
    "growth", "surge", "rally", "profit", "breakthrough", "beat", "upgrade", "buy", "record",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "下跌", "亏损", "风险", "利空", "减持", "卖出", "下滑", "预警",
    "decline", "plunge", "loss", "risk", "downgrade", "sell", "warning", "slump",
];

const FAVORABLE_EVENT_KEYWORDS: &[&str] = &[
    "利好", "重组", "补贴", "中标", "回购", "增持", "分红",
    "buyback", "acquisition", "subsidy", "contract win", "dividend",
];

const UNFAVORABLE_EVENT_KEYWORDS: &[&str] = &[
    "利空", "减持", "处罚", "立案", "诉讼", "退市", "预警",
    "investigation", "penalty", "lawsuit", "delisting", "recall",
];

/// Keyword tally over a batch of headlines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub sentiment: NewsSentiment,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    /// (positive - negative) / total, in [-1, 1]
    pub score: f64,
}

/// Everything the sentiment scorer consumes for one symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentInput {
    pub news: Vec<NewsItem>,
    pub social_mentions: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub symbol: String,
    pub news_sentiment: NewsSentiment,
    pub sentiment_score: f64,
    pub event_impact: EventImpact,
    pub market_heat: MarketHeat,
    pub social_mentions: Option<u32>,
    pub summary: SentimentSummary,
    pub score: f64,
    pub signals: Vec<String>,
}

fn contains_any(title: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| title.contains(k))
}

/// Classify each headline as positive, negative or neutral. A headline with
/// both kinds of keywords is neutral. An empty list is neutral with score 0.
pub fn analyze_sentiment(items: &[NewsItem]) -> SentimentSummary {
    if items.is_empty() {
        return SentimentSummary::default();
    }

    let mut summary = SentimentSummary::default();
    for item in items {
        let title = item.title.to_lowercase();
        let positive = contains_any(&title, POSITIVE_KEYWORDS);
        let negative = contains_any(&title, NEGATIVE_KEYWORDS);
        match (positive, negative) {
            (true, false) => summary.positive_count += 1,
            (false, true) => summary.negative_count += 1,
            _ => summary.neutral_count += 1,
        }
    }

    summary.score =
        (summary.positive_count as f64 - summary.negative_count as f64) / items.len() as f64;
    summary.sentiment = if summary.score > 0.2 {
        NewsSentiment::Positive
    } else if summary.score < -0.2 {
        NewsSentiment::Negative
    } else {
        NewsSentiment::Neutral
    };
    summary
}

/// Net direction of event keywords across headlines
pub fn detect_event_impact(items: &[NewsItem]) -> EventImpact {
    let mut favorable = 0usize;
    let mut unfavorable = 0usize;
    for item in items {
        let title = item.title.to_lowercase();
        if contains_any(&title, FAVORABLE_EVENT_KEYWORDS) {
            favorable += 1;
        }
        if contains_any(&title, UNFAVORABLE_EVENT_KEYWORDS) {
            unfavorable += 1;
        }
    }

    if favorable > unfavorable {
        EventImpact::Favorable
    } else if unfavorable > favorable {
        EventImpact::Unfavorable
    } else {
        EventImpact::None
    }
}

/// Remap [-1, 1] to [0, 1], then scale by market heat
pub fn sentiment_score(sentiment: f64, heat: MarketHeat) -> f64 {
    let base = (sentiment.clamp(-1.0, 1.0) + 1.0) / 2.0;
    let adjusted = match heat {
        MarketHeat::High => base * 1.1,
        MarketHeat::Low => base * 0.9,
        MarketHeat::Medium => base,
    };
    clamp_unit(adjusted)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, symbol: &str, input: &SentimentInput) -> SentimentResult {
        let summary = analyze_sentiment(&input.news);
        let event_impact = detect_event_impact(&input.news);
        let market_heat = MarketHeat::from_mentions(input.social_mentions);
        let score = sentiment_score(summary.score, market_heat);

        let mut signals = Vec::new();
        let s = summary.score;
        signals.push(
            if s > 0.5 {
                "sentiment strongly bullish"
            } else if s > 0.2 {
                "sentiment leaning bullish"
            } else if s < -0.5 {
                "sentiment strongly bearish"
            } else if s < -0.2 {
                "sentiment leaning bearish"
            } else {
                "sentiment neutral"
            }
            .to_string(),
        );
        match event_impact {
            EventImpact::Favorable => signals.push("favorable news event".to_string()),
            EventImpact::Unfavorable => signals.push("unfavorable news event".to_string()),
            EventImpact::None => {}
        }

        debug!(
            symbol = %symbol,
            news = input.news.len(),
            sentiment = %summary.sentiment,
            heat = %market_heat,
            score,
            "Sentiment analysis complete"
        );

        SentimentResult {
            symbol: symbol.to_string(),
            news_sentiment: summary.sentiment,
            sentiment_score: summary.score,
            event_impact,
            market_heat,
            social_mentions: input.social_mentions,
            summary,
            score,
            signals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn news(titles: &[&str]) -> Vec<NewsItem> {
        titles
            .iter()
            .map(|t| NewsItem {
                title: t.to_string(),
                time: None,
                url: None,
                source: "test".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_empty_news_is_neutral() {
        let summary = analyze_sentiment(&[]);
        assert_eq!(summary.sentiment, NewsSentiment::Neutral);
        assert_eq!(summary.score, 0.0);
        assert_eq!(summary.positive_count + summary.negative_count + summary.neutral_count, 0);
    }

    #[test]
    fn test_keyword_classification() {
        let items = news(&[
            "600519 发布年度业绩预告，净利润同比增长20%",
            "Company posts record profit",
            "股东计划减持股份",
            "Profit up but risk warning issued",
            "发布投资者关系活动记录",
        ]);
        let summary = analyze_sentiment(&items);
        assert_eq!(summary.positive_count, 2);
        assert_eq!(summary.negative_count, 1);
        assert_eq!(summary.neutral_count, 2);
        assert!((summary.score - 0.2).abs() < EPS);
        // 0.2 is not strictly above the threshold
        assert_eq!(summary.sentiment, NewsSentiment::Neutral);
    }

    #[test]
    fn test_event_impact() {
        assert_eq!(detect_event_impact(&news(&["董事会通过重大资产重组方案"])), EventImpact::Favorable);
        assert_eq!(detect_event_impact(&news(&["SEC opens investigation"])), EventImpact::Unfavorable);
        assert_eq!(detect_event_impact(&news(&["quarterly report"])), EventImpact::None);
    }

    #[test]
    fn test_heat_adjustment() {
        assert!((sentiment_score(0.0, MarketHeat::Medium) - 0.5).abs() < EPS);
        assert!((sentiment_score(0.0, MarketHeat::High) - 0.55).abs() < EPS);
        assert!((sentiment_score(0.0, MarketHeat::Low) - 0.45).abs() < EPS);
        assert_eq!(sentiment_score(1.0, MarketHeat::High), 1.0);
    }

    #[test]
    fn test_analyze_positive_hot_stock() {
        let input = SentimentInput {
            news: news(&["利好：获得政府补贴", "业绩大幅增长", "新产品取得突破"]),
            social_mentions: Some(200),
        };
        let result = SentimentAnalyzer::new().analyze("sh600519", &input);
        assert_eq!(result.news_sentiment, NewsSentiment::Positive);
        assert_eq!(result.market_heat, MarketHeat::High);
        assert_eq!(result.event_impact, EventImpact::Favorable);
        assert_eq!(result.score, 1.0);
        assert!(result.signals.contains(&"sentiment strongly bullish".to_string()));
        assert!(result.signals.contains(&"favorable news event".to_string()));
    }
}
