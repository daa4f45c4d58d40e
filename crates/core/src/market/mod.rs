pub mod mock;

use crate::domain::market::{
    IndexValuePoint, MarketActivity, MarketIndex, MarketSentiment, Period, Stock, StockPricePoint,
};
use crate::time::window::trailing_days;
use anyhow::Result;
use chrono::NaiveDate;
use rand::Rng;

pub const DEFAULT_MOVER_LIMIT: usize = 5;

/// Largest single-day move of the synthetic stock series, as a fraction of the anchor price.
const STOCK_MAX_DAILY_STEP: f64 = 0.02;
const INDEX_MAX_DAILY_STEP: f64 = 0.01;
/// A big move can multiply the day's volume by up to this factor on top of the base draw.
const VOLUME_MOVE_WEIGHT: f64 = 5.0;

/// Source of market snapshots and chart series. Lookups by id answer `Ok(None)` for unknown
/// symbols; `Err` is reserved for the provider itself failing.
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn all_stocks(&self) -> Result<Vec<Stock>>;

    /// Stocks with a positive change, best first.
    async fn top_gainers(&self, limit: usize) -> Result<Vec<Stock>>;

    /// Stocks with a negative change, worst first.
    async fn top_losers(&self, limit: usize) -> Result<Vec<Stock>>;

    /// Case-insensitive substring match on symbol or company name.
    async fn search(&self, query: &str) -> Result<Vec<Stock>>;

    async fn stock_by_id(&self, id: &str) -> Result<Option<Stock>>;

    async fn stock_history(&self, id: &str, period: Period) -> Result<Option<Vec<StockPricePoint>>>;

    async fn indices(&self) -> Result<Vec<MarketIndex>>;

    async fn index_history(&self, id: &str, period: Period)
        -> Result<Option<Vec<IndexValuePoint>>>;

    async fn market_activity(&self) -> Result<MarketActivity>;

    async fn market_sentiment(&self) -> Result<MarketSentiment>;
}

pub fn gainers(stocks: &[Stock], limit: usize) -> Vec<Stock> {
    let mut out: Vec<Stock> = stocks
        .iter()
        .filter(|s| s.change_percent > 0.0)
        .cloned()
        .collect();
    out.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent));
    out.truncate(limit);
    out
}

pub fn losers(stocks: &[Stock], limit: usize) -> Vec<Stock> {
    let mut out: Vec<Stock> = stocks
        .iter()
        .filter(|s| s.change_percent < 0.0)
        .cloned()
        .collect();
    out.sort_by(|a, b| a.change_percent.total_cmp(&b.change_percent));
    out.truncate(limit);
    out
}

pub fn matching(stocks: &[Stock], query: &str) -> Vec<Stock> {
    let needle = query.trim().to_lowercase();
    stocks
        .iter()
        .filter(|s| {
            s.id.to_lowercase().contains(&needle) || s.name.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Daily closes for `period` ending at `today` on the stock's current price.
pub fn stock_price_walk<R: Rng>(
    rng: &mut R,
    stock: &Stock,
    period: Period,
    today: NaiveDate,
) -> Vec<StockPricePoint> {
    let steps = walk_back(rng, stock.price, STOCK_MAX_DAILY_STEP, period.days());
    let base_volume = stock.volume as f64;

    trailing_days(today, period.days())
        .into_iter()
        .zip(steps)
        .map(|(date, (price, step))| {
            let multiplier = 1.0 + (step / stock.price).abs() * VOLUME_MOVE_WEIGHT;
            let volume = base_volume * rng.random_range(0.5..1.5) * multiplier;
            StockPricePoint {
                date,
                price: round_cents(price),
                volume: volume.floor() as u64,
            }
        })
        .collect()
}

/// Daily index values for `period` ending at `today` on the index's current value.
pub fn index_value_walk<R: Rng>(
    rng: &mut R,
    index: &MarketIndex,
    period: Period,
    today: NaiveDate,
) -> Vec<IndexValuePoint> {
    let steps = walk_back(rng, index.value, INDEX_MAX_DAILY_STEP, period.days());

    trailing_days(today, period.days())
        .into_iter()
        .zip(steps)
        .map(|(date, (value, _))| IndexValuePoint {
            date,
            value: round_cents(value),
        })
        .collect()
}

/// Random walk run backwards from `anchor`, returned oldest first as `(level, step into that
/// level)`. The last level is exactly `anchor` and no level drops below one step's size.
fn walk_back<R: Rng>(rng: &mut R, anchor: f64, max_step: f64, points: u32) -> Vec<(f64, f64)> {
    let half_range = anchor * max_step / 2.0;
    let floor = anchor * max_step;

    let mut out = Vec::with_capacity(points as usize);
    let mut level = anchor;
    for _ in 0..points {
        let step = if half_range > 0.0 {
            rng.random_range(-half_range..half_range)
        } else {
            0.0
        };
        out.push((level, step));
        level = (level - step).max(floor);
    }
    out.reverse();
    out
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
