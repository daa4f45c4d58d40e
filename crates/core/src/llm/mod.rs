pub mod error;
pub mod fallback;
pub mod json;
pub mod openrouter;
pub mod prompts;
pub mod sanitize;
pub mod service;

use crate::llm::error::CompletionError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation. Order within a conversation matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling knobs fixed per request kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

impl CompletionParams {
    pub const CHAT: Self = Self {
        temperature: 0.3,
        max_tokens: Some(1000),
        top_p: Some(0.9),
    };

    pub const SENTIMENT_SCORE: Self = Self {
        temperature: 0.2,
        max_tokens: Some(50),
        top_p: None,
    };

    pub const PRICE_PREDICTION: Self = Self {
        temperature: 0.3,
        max_tokens: Some(100),
        top_p: None,
    };

    pub const SOCIAL_SENTIMENT: Self = Self {
        temperature: 0.3,
        max_tokens: Some(2048),
        top_p: None,
    };
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub params: CompletionParams,
    /// Overrides the client's default model for this request.
    pub model: Option<String>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>, params: CompletionParams) -> Self {
        Self {
            messages,
            params,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[async_trait::async_trait]
pub trait ChatCompletion: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Sends one request and returns the raw assistant text. No retries.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}
