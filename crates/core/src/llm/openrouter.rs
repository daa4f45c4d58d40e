use crate::config::Settings;
use crate::llm::error::CompletionError;
use crate::llm::{ChatCompletion, CompletionRequest, Message};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chat-completion client for OpenRouter (or any OpenAI-compatible endpoint).
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_url: String,
    model: String,
    headers: HeaderMap,
}

impl OpenRouterClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_openrouter_api_key()?;
        Self::new(
            &settings.openrouter_api_url,
            api_key,
            &settings.openrouter_model,
            settings.app_url.as_deref(),
            settings.app_title.as_deref(),
        )
    }

    pub fn new(
        api_url: &str,
        api_key: &str,
        model: &str,
        app_url: Option<&str>,
        app_title: Option<&str>,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .context("OPENROUTER_API_KEY is not a valid header value")?,
        );
        if let Some(app_url) = app_url {
            headers.insert(
                "http-referer",
                HeaderValue::from_str(app_url).context("invalid OPENROUTER_APP_URL")?,
            );
        }
        if let Some(app_title) = app_title {
            headers.insert(
                "x-title",
                HeaderValue::from_str(app_title).context("invalid OPENROUTER_APP_TITLE")?,
            );
        }

        let http = reqwest::Client::builder()
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_url: api_url.to_string(),
            model: model.to_string(),
            headers,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn error_message(status: reqwest::StatusCode, body: &str) -> String {
        serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|e| e.error)
            .and_then(|e| e.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| status.to_string())
            })
    }

    fn response_text(body: &str) -> Result<String, CompletionError> {
        let raw: Value = serde_json::from_str(body).map_err(|e| {
            CompletionError::MalformedResponse(format!("response body is not JSON: {e}"))
        })?;

        let parsed = serde_json::from_value::<ChatCompletionResponse>(raw.clone()).map_err(|e| {
            CompletionError::MalformedResponse(format!("unexpected response shape: {e}"))
        })?;

        if let Some(content) = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty())
        {
            return Ok(content);
        }

        // Some gateways answer 200 with an error object instead of choices (exhausted credits).
        if let Some(message) = parsed.error.and_then(|e| e.message) {
            return Err(CompletionError::Transport {
                status: None,
                message,
            });
        }

        Err(CompletionError::MalformedResponse(format!(
            "missing choices[0].message.content: {raw}"
        )))
    }
}

#[async_trait::async_trait]
impl ChatCompletion for OpenRouterClient {
    fn provider_name(&self) -> &'static str {
        "openrouter"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatCompletionRequest {
            model: request.model.as_deref().unwrap_or(&self.model),
            messages: &request.messages,
            temperature: request.params.temperature,
            max_tokens: request.params.max_tokens,
            top_p: request.params.top_p,
            stream: false,
        };

        tracing::debug!(
            model = body.model,
            messages = body.messages.len(),
            max_tokens = ?body.max_tokens,
            "sending chat completion request"
        );

        let res = self
            .http
            .post(&self.api_url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport {
                status: e.status(),
                message: format!("chat completion request failed: {e}"),
            })?;

        let status = res.status();
        let text = res.text().await.map_err(|e| CompletionError::Transport {
            status: Some(status),
            message: format!("failed to read chat completion response body: {e}"),
        })?;

        if !status.is_success() {
            let message = Self::error_message(status, &text);
            tracing::warn!(%status, error = %message, "chat completion returned an error status");
            return Err(CompletionError::Transport {
                status: Some(status),
                message,
            });
        }

        Self::response_text(&text)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
}
