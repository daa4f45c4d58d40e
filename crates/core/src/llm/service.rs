//! The four AI entry points used by the dashboard.
//!
//! Chat failures are returned to the caller. The analytic entry points never fail: any
//! transport, shape or extraction problem is logged and replaced by a synthesized value tagged
//! [`Source::Fallback`].

use crate::config::Settings;
use crate::domain::analysis::{Analyzed, Platform, PricePrediction, SentimentReport, StockInsight};
use crate::llm::error::{CompletionError, ExtractionError};
use crate::llm::openrouter::OpenRouterClient;
use crate::llm::sanitize::sanitize;
use crate::llm::{fallback, json, prompts};
use crate::llm::{ChatCompletion, CompletionParams, CompletionRequest, Message};
use crate::time::window::{today_utc, trailing_days};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
enum AnalysisFailure {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

#[derive(Clone)]
pub struct AnalysisService {
    client: Option<Arc<dyn ChatCompletion>>,
    social_model: Option<String>,
}

impl std::fmt::Debug for AnalysisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisService")
            .field("provider", &self.client.as_ref().map(|c| c.provider_name()))
            .field("social_model", &self.social_model)
            .finish()
    }
}

impl AnalysisService {
    /// Without a client every analytic call answers from the fallback generators and chat
    /// reports [`CompletionError::NotConfigured`].
    pub fn new(client: Option<Arc<dyn ChatCompletion>>) -> Self {
        Self {
            client,
            social_model: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        if settings.openrouter_api_key.is_none() {
            tracing::warn!("OPENROUTER_API_KEY missing; AI analysis will use synthesized values");
            return Ok(Self::new(None));
        }

        let client = OpenRouterClient::from_settings(settings)?;
        tracing::info!(model = client.model(), "chat completion client configured");
        let client: Arc<dyn ChatCompletion> = Arc::new(client);
        Ok(Self::new(Some(client)).with_social_model(settings.sentiment_model.clone()))
    }

    /// Model used for the social sentiment report instead of the client default.
    pub fn with_social_model(mut self, model: impl Into<String>) -> Self {
        self.social_model = Some(model.into());
        self
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let Some(client) = &self.client else {
            return Err(CompletionError::NotConfigured("OPENROUTER_API_KEY is not set"));
        };
        client.complete(request).await
    }

    /// One conversational turn. The reply is sanitized; failures propagate unchanged.
    pub async fn chat(&self, history: &[Message]) -> Result<String, CompletionError> {
        let request =
            CompletionRequest::new(prompts::chat_messages(history), CompletionParams::CHAT);
        match self.complete(request).await {
            Ok(raw) => Ok(sanitize(&raw)),
            Err(err) => {
                tracing::error!(error = %err, turns = history.len(), "chat completion failed");
                Err(err)
            }
        }
    }

    pub async fn score_sentiment(&self, symbol: &str, name: &str) -> Analyzed<f64> {
        match self.try_score_sentiment(symbol, name).await {
            Ok(score) => Analyzed::model(score),
            Err(err) => {
                tracing::warn!(symbol, error = %err, "sentiment score unavailable; using fallback");
                Analyzed::fallback(fallback::fallback_score(&mut rand::rng()))
            }
        }
    }

    async fn try_score_sentiment(&self, symbol: &str, name: &str) -> Result<f64, AnalysisFailure> {
        let request = CompletionRequest::new(
            prompts::sentiment_score_messages(symbol, name),
            CompletionParams::SENTIMENT_SCORE,
        );
        let raw = self.complete(request).await?;
        Ok(json::extract_score(&sanitize(&raw))?)
    }

    pub async fn predict_price(
        &self,
        symbol: &str,
        name: &str,
        current_price: f64,
    ) -> Analyzed<PricePrediction> {
        match self.try_predict_price(symbol, name, current_price).await {
            Ok(prediction) => Analyzed::model(prediction),
            Err(err) => {
                tracing::warn!(
                    symbol,
                    error = %err,
                    "price prediction unavailable; using fallback"
                );
                Analyzed::fallback(fallback::fallback_prediction(&mut rand::rng(), current_price))
            }
        }
    }

    async fn try_predict_price(
        &self,
        symbol: &str,
        name: &str,
        current_price: f64,
    ) -> Result<PricePrediction, AnalysisFailure> {
        let request = CompletionRequest::new(
            prompts::price_prediction_messages(symbol, name, current_price),
            CompletionParams::PRICE_PREDICTION,
        );
        let raw = self.complete(request).await?;
        Ok(json::parse_prediction(&sanitize(&raw))?)
    }

    /// Social sentiment for `query` on `platforms`. An empty platform list means all platforms;
    /// duplicates collapse.
    pub async fn analyze_social_sentiment(
        &self,
        query: &str,
        platforms: &[Platform],
    ) -> Analyzed<SentimentReport> {
        let requested: BTreeSet<Platform> = if platforms.is_empty() {
            Platform::ALL.into_iter().collect()
        } else {
            platforms.iter().copied().collect()
        };

        match self.try_social_sentiment(query, &requested).await {
            Ok(report) => Analyzed::model(report),
            Err(err) => {
                tracing::warn!(
                    query,
                    platforms = ?requested,
                    error = %err,
                    "social sentiment unavailable; using synthesized report"
                );
                Analyzed::fallback(fallback::synthetic_report(
                    &mut rand::rng(),
                    query,
                    &requested,
                    today_utc(),
                ))
            }
        }
    }

    async fn try_social_sentiment(
        &self,
        query: &str,
        requested: &BTreeSet<Platform>,
    ) -> Result<SentimentReport, AnalysisFailure> {
        let platforms: Vec<Platform> = requested.iter().copied().collect();
        let mut request = CompletionRequest::new(
            prompts::social_sentiment_messages(query, &platforms),
            CompletionParams::SOCIAL_SENTIMENT,
        );
        if let Some(model) = &self.social_model {
            request = request.with_model(model.clone());
        }

        let raw = self.complete(request).await?;
        let window = trailing_days(today_utc(), prompts::TIMELINE_DAYS);
        // Parsed from the raw reply: bracket stripping would destroy the JSON arrays.
        Ok(json::parse_sentiment_report(&raw, requested, &window)?)
    }

    /// Sentiment score, price prediction and social report for one stock, requested concurrently.
    pub async fn analyze_stock(
        &self,
        symbol: &str,
        name: &str,
        current_price: f64,
    ) -> StockInsight {
        let social_query = format!("{name} {symbol}");
        let (sentiment, prediction, social) = tokio::join!(
            self.score_sentiment(symbol, name),
            self.predict_price(symbol, name, current_price),
            self.analyze_social_sentiment(&social_query, &Platform::ALL),
        );

        StockInsight {
            symbol: symbol.to_string(),
            sentiment,
            prediction,
            social,
        }
    }
}
