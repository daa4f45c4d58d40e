use crate::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use finoak_core::domain::analysis::{
    Analyzed, Platform, PricePrediction, SentimentReport, StockInsight,
};
use finoak_core::domain::market::{
    IndexValuePoint, MarketActivity, MarketIndex, MarketSentiment, Period, Stock, StockPricePoint,
};
use finoak_core::llm::service::AnalysisService;
use finoak_core::llm::Message;
use finoak_core::market::{MarketDataProvider, DEFAULT_MOVER_LIMIT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub analysis: Arc<AnalysisService>,
    pub market: Arc<dyn MarketDataProvider>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/chat", post(chat))
        .route("/stocks", get(all_stocks))
        .route("/stocks/search", get(search_stocks))
        .route("/stocks/top-gainers", get(top_gainers))
        .route("/stocks/top-losers", get(top_losers))
        .route("/stocks/:id", get(stock_by_id))
        .route("/stocks/:id/history", get(stock_history))
        .route("/stocks/:id/sentiment", get(stock_sentiment))
        .route("/stocks/:id/prediction", get(stock_prediction))
        .route("/stocks/:id/analysis", get(stock_analysis))
        .route("/indices", get(indices))
        .route("/indices/:id/history", get(index_history))
        .route("/market/activity", get(market_activity))
        .route("/market/sentiment", get(market_sentiment))
        .route("/sentiment/social", get(social_sentiment))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatReply {
    reply: String,
}

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    if req.messages.is_empty() {
        return Err(ApiError::BadRequest("messages must not be empty".to_string()));
    }
    let reply = state.analysis.chat(&req.messages).await?;
    Ok(Json(ChatReply { reply }))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Deserialize)]
struct LimitParams {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct PeriodParams {
    period: Option<String>,
}

impl PeriodParams {
    fn period(&self) -> Result<Period, ApiError> {
        match self.period.as_deref() {
            None => Ok(Period::default()),
            Some(p) => p
                .parse()
                .map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SocialParams {
    #[serde(default)]
    query: String,
    /// Comma separated; empty means every platform.
    platforms: Option<String>,
}

impl SocialParams {
    fn platforms(&self) -> Result<Vec<Platform>, ApiError> {
        self.platforms
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<Platform>().map_err(|e| ApiError::BadRequest(e.to_string())))
            .collect()
    }
}

async fn all_stocks(State(state): State<AppState>) -> Result<Json<Vec<Stock>>, ApiError> {
    Ok(Json(state.market.all_stocks().await?))
}

async fn search_stocks(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Stock>>, ApiError> {
    Ok(Json(state.market.search(&params.q).await?))
}

async fn top_gainers(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<Stock>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_MOVER_LIMIT);
    Ok(Json(state.market.top_gainers(limit).await?))
}

async fn top_losers(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<Stock>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_MOVER_LIMIT);
    Ok(Json(state.market.top_losers(limit).await?))
}

async fn require_stock(state: &AppState, id: &str) -> Result<Stock, ApiError> {
    state
        .market
        .stock_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("stock {id}")))
}

async fn stock_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Stock>, ApiError> {
    Ok(Json(require_stock(&state, &id).await?))
}

async fn stock_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<Vec<StockPricePoint>>, ApiError> {
    let period = params.period()?;
    state
        .market
        .stock_history(&id, period)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("stock {id}")))
}

async fn stock_sentiment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Analyzed<f64>>, ApiError> {
    let stock = require_stock(&state, &id).await?;
    Ok(Json(state.analysis.score_sentiment(&stock.id, &stock.name).await))
}

async fn stock_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Analyzed<PricePrediction>>, ApiError> {
    let stock = require_stock(&state, &id).await?;
    Ok(Json(
        state
            .analysis
            .predict_price(&stock.id, &stock.name, stock.price)
            .await,
    ))
}

async fn stock_analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StockInsight>, ApiError> {
    let stock = require_stock(&state, &id).await?;
    Ok(Json(
        state
            .analysis
            .analyze_stock(&stock.id, &stock.name, stock.price)
            .await,
    ))
}

async fn indices(State(state): State<AppState>) -> Result<Json<Vec<MarketIndex>>, ApiError> {
    Ok(Json(state.market.indices().await?))
}

async fn index_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<Vec<IndexValuePoint>>, ApiError> {
    let period = params.period()?;
    state
        .market
        .index_history(&id, period)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("index {id}")))
}

async fn market_activity(State(state): State<AppState>) -> Result<Json<MarketActivity>, ApiError> {
    Ok(Json(state.market.market_activity().await?))
}

async fn market_sentiment(
    State(state): State<AppState>,
) -> Result<Json<MarketSentiment>, ApiError> {
    Ok(Json(state.market.market_sentiment().await?))
}

async fn social_sentiment(
    State(state): State<AppState>,
    Query(params): Query<SocialParams>,
) -> Result<Json<Analyzed<SentimentReport>>, ApiError> {
    let platforms = params.platforms()?;
    Ok(Json(
        state
            .analysis
            .analyze_social_sentiment(&params.query, &platforms)
            .await,
    ))
}
