//! In-memory demo market for the Indian large caps the dashboard ships with.

use crate::config::Settings;
use crate::domain::market::{
    IndexValuePoint, MarketActivity, MarketIndex, MarketSentiment, Period, Stock, StockPricePoint,
};
use crate::market::{self, MarketDataProvider};
use crate::time::window::today_utc;
use anyhow::Result;
use std::time::Duration;

const SNAPSHOT_LATENCY: Duration = Duration::from_millis(800);
const LOOKUP_LATENCY: Duration = Duration::from_millis(500);
const SEARCH_LATENCY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Latency {
    /// Per-operation delays that mimic a remote service.
    Simulated,
    Fixed(Duration),
}

#[derive(Debug, Clone)]
pub struct MockMarketData {
    stocks: Vec<Stock>,
    indices: Vec<MarketIndex>,
    activity: MarketActivity,
    sentiment: MarketSentiment,
    latency: Latency,
}

impl Default for MockMarketData {
    fn default() -> Self {
        Self {
            stocks: fixture_stocks(),
            indices: fixture_indices(),
            activity: MarketActivity {
                advances: 32,
                declines: 18,
                unchanged: 0,
                volume: 1_743_865_432,
                value: 352_467_890_123,
                market_breadth: 1.78,
            },
            sentiment: MarketSentiment {
                overall: 0.72,
                social: 0.68,
                news: 0.75,
                technical: 0.74,
            },
            latency: Latency::Simulated,
        }
    }
}

impl MockMarketData {
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.mock_latency_ms {
            Some(ms) => Self::default().with_latency(Duration::from_millis(ms)),
            None => Self::default(),
        }
    }

    /// Answers immediately.
    pub fn instant() -> Self {
        Self::default().with_latency(Duration::ZERO)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Latency::Fixed(latency);
        self
    }

    async fn pause(&self, simulated: Duration) {
        let delay = match self.latency {
            Latency::Simulated => simulated,
            Latency::Fixed(d) => d,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn stock(&self, id: &str) -> Option<&Stock> {
        self.stocks.iter().find(|s| s.id == id)
    }

    fn index(&self, id: &str) -> Option<&MarketIndex> {
        self.indices.iter().find(|i| i.id == id)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for MockMarketData {
    fn provider_name(&self) -> &'static str {
        "mock"
    }

    async fn all_stocks(&self) -> Result<Vec<Stock>> {
        self.pause(SNAPSHOT_LATENCY).await;
        Ok(self.stocks.clone())
    }

    async fn top_gainers(&self, limit: usize) -> Result<Vec<Stock>> {
        self.pause(LOOKUP_LATENCY).await;
        Ok(market::gainers(&self.stocks, limit))
    }

    async fn top_losers(&self, limit: usize) -> Result<Vec<Stock>> {
        self.pause(LOOKUP_LATENCY).await;
        Ok(market::losers(&self.stocks, limit))
    }

    async fn search(&self, query: &str) -> Result<Vec<Stock>> {
        self.pause(SEARCH_LATENCY).await;
        Ok(market::matching(&self.stocks, query))
    }

    async fn stock_by_id(&self, id: &str) -> Result<Option<Stock>> {
        self.pause(LOOKUP_LATENCY).await;
        Ok(self.stock(id).cloned())
    }

    async fn stock_history(
        &self,
        id: &str,
        period: Period,
    ) -> Result<Option<Vec<StockPricePoint>>> {
        self.pause(SNAPSHOT_LATENCY).await;
        let Some(stock) = self.stock(id) else {
            return Ok(None);
        };
        let series = market::stock_price_walk(&mut rand::rng(), stock, period, today_utc());
        tracing::debug!(id, %period, points = series.len(), "generated stock history");
        Ok(Some(series))
    }

    async fn indices(&self) -> Result<Vec<MarketIndex>> {
        self.pause(SNAPSHOT_LATENCY).await;
        Ok(self.indices.clone())
    }

    async fn index_history(
        &self,
        id: &str,
        period: Period,
    ) -> Result<Option<Vec<IndexValuePoint>>> {
        self.pause(SNAPSHOT_LATENCY).await;
        let Some(index) = self.index(id) else {
            return Ok(None);
        };
        let series = market::index_value_walk(&mut rand::rng(), index, period, today_utc());
        tracing::debug!(id, %period, points = series.len(), "generated index history");
        Ok(Some(series))
    }

    async fn market_activity(&self) -> Result<MarketActivity> {
        self.pause(SNAPSHOT_LATENCY).await;
        Ok(self.activity.clone())
    }

    async fn market_sentiment(&self) -> Result<MarketSentiment> {
        self.pause(SNAPSHOT_LATENCY).await;
        Ok(self.sentiment.clone())
    }
}

#[allow(clippy::too_many_arguments)]
fn stock(
    id: &str,
    name: &str,
    price: f64,
    change: f64,
    change_percent: f64,
    volume: u64,
    market_cap: u64,
    pe: f64,
    dividend: f64,
    sector: &str,
    sentiment: f64,
) -> Stock {
    Stock {
        id: id.to_string(),
        name: name.to_string(),
        price,
        change,
        change_percent,
        volume,
        market_cap,
        pe,
        dividend,
        sector: sector.to_string(),
        sentiment,
    }
}

#[rustfmt::skip]
pub(crate) fn fixture_stocks() -> Vec<Stock> {
    vec![
        stock("RELIANCE", "Reliance Industries", 2825.50, 35.20, 1.26, 8_543_267, 19_076_342_456_789, 28.75, 0.85, "Energy", 0.78),
        stock("TCS", "Tata Consultancy Services", 3645.80, -42.30, -1.15, 2_345_678, 13_435_673_456_789, 32.45, 1.2, "IT", 0.65),
        stock("HDFCBANK", "HDFC Bank", 1678.25, 23.45, 1.42, 5_678_934, 9_345_678_345_678, 24.5, 1.8, "Banking", 0.82),
        stock("INFY", "Infosys", 1425.60, -18.75, -1.30, 3_456_789, 5_986_734_567_890, 26.8, 1.5, "IT", 0.62),
        stock("ICICIBANK", "ICICI Bank", 987.35, 15.40, 1.58, 4_567_890, 6_878_956_789_012, 21.4, 1.9, "Banking", 0.75),
        stock("HINDUNILVR", "Hindustan Unilever", 2456.75, -28.90, -1.16, 1_234_567, 5_789_234_567_890, 34.2, 2.1, "FMCG", 0.58),
        stock("SBIN", "State Bank of India", 645.85, 8.75, 1.37, 7_890_123, 5_789_012_345_678, 18.6, 2.5, "Banking", 0.72),
        stock("BAJFINANCE", "Bajaj Finance", 7234.50, -124.30, -1.69, 1_345_678, 4_367_890_123_456, 36.8, 0.6, "Finance", 0.56),
        stock("BHARTIARTL", "Bharti Airtel", 876.45, 12.35, 1.43, 3_456_789, 4_890_123_456_789, 22.5, 1.3, "Telecom", 0.68),
        stock("ASIANPAINT", "Asian Paints", 3245.80, -56.70, -1.72, 876_543, 3_123_456_789_012, 42.1, 1.1, "Consumer Goods", 0.53),
    ]
}

pub(crate) fn fixture_indices() -> Vec<MarketIndex> {
    vec![
        MarketIndex {
            id: "NIFTY50".to_string(),
            name: "Nifty 50".to_string(),
            value: 21345.67,
            change: 165.34,
            change_percent: 0.78,
            previous_close: 21180.33,
        },
        MarketIndex {
            id: "SENSEX".to_string(),
            name: "SENSEX".to_string(),
            value: 70123.45,
            change: 542.65,
            change_percent: 0.82,
            previous_close: 69580.80,
        },
    ]
}
