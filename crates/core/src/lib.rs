pub mod domain;
pub mod llm;
pub mod market;
pub mod time;

pub mod config {
    use anyhow::Context;

    const DEFAULT_OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
    const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-pro";
    const DEFAULT_SENTIMENT_MODEL: &str = "google/gemini-pro-1.5";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub openrouter_api_key: Option<String>,
        pub openrouter_api_url: String,
        pub openrouter_model: String,
        pub sentiment_model: String,
        pub app_url: Option<String>,
        pub app_title: Option<String>,
        pub sentry_dsn: Option<String>,
        pub mock_latency_ms: Option<u64>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let mock_latency_ms = match non_empty_var("MOCK_MARKET_LATENCY_MS") {
                Some(s) => Some(
                    s.parse::<u64>()
                        .with_context(|| format!("MOCK_MARKET_LATENCY_MS is not a number: {s}"))?,
                ),
                None => None,
            };

            Ok(Self {
                openrouter_api_key: non_empty_var("OPENROUTER_API_KEY"),
                openrouter_api_url: non_empty_var("OPENROUTER_API_URL")
                    .unwrap_or_else(|| DEFAULT_OPENROUTER_API_URL.to_string()),
                openrouter_model: non_empty_var("OPENROUTER_MODEL")
                    .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
                sentiment_model: non_empty_var("OPENROUTER_SENTIMENT_MODEL")
                    .unwrap_or_else(|| DEFAULT_SENTIMENT_MODEL.to_string()),
                app_url: non_empty_var("OPENROUTER_APP_URL"),
                app_title: non_empty_var("OPENROUTER_APP_TITLE"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                mock_latency_ms,
            })
        }

        pub fn require_openrouter_api_key(&self) -> anyhow::Result<&str> {
            self.openrouter_api_key
                .as_deref()
                .context("OPENROUTER_API_KEY is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }
}
