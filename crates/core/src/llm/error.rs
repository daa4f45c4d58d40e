use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a chat-completion round trip.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("chat completion is not configured: {0}")]
    NotConfigured(&'static str),

    /// Network failure or non-success HTTP status. `message` is the server-reported error when
    /// one was present, otherwise the status text.
    #[error("{message}")]
    Transport {
        status: Option<StatusCode>,
        message: String,
    },

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CompletionError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

/// Model text could not be turned into the expected shape. Never leaves the analysis service;
/// it is logged and replaced by a synthesized value.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no {0} found in model output")]
    NoMatch(&'static str),

    #[error("model output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid `{field}`: {detail}")]
    InvalidValue { field: &'static str, detail: String },
}
