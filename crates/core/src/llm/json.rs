use crate::domain::analysis::{Platform, PricePrediction, SentimentReport};
use crate::domain::contract::{LlmPricePrediction, LlmSentimentReport};
use crate::llm::error::ExtractionError;
use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

// `1.0` is the only fraction-free value in range worth recognizing; everything else is `.x`
// with an optional leading zero.
static SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b1\.0+\b|0?\.\d+")
        .unwrap_or_else(|e| panic!("invalid score pattern: {e}"))
});

/// Best-effort extraction of the JSON object embedded in model text.
pub fn extract_json(text: &str) -> Option<String> {
    let mut inner = text.trim();
    if inner.starts_with("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```).
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
    }

    // First '{' to last '}', which also spans multi-line payloads.
    let start = inner.find('{')?;
    let end = inner.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(inner[start..=end].trim().to_string())
}

/// First decimal fraction in the text, clamped to `[0, 1]`.
pub fn extract_score(text: &str) -> Result<f64, ExtractionError> {
    let m = SCORE
        .find(text)
        .ok_or(ExtractionError::NoMatch("decimal score"))?;
    let score = m
        .as_str()
        .parse::<f64>()
        .map_err(|e| ExtractionError::InvalidValue {
            field: "score",
            detail: format!("{}: {e}", m.as_str()),
        })?;
    Ok(score.clamp(0.0, 1.0))
}

pub fn parse_prediction(text: &str) -> Result<PricePrediction, ExtractionError> {
    let json_str = extract_json(text).ok_or(ExtractionError::NoMatch("JSON object"))?;
    let parsed = serde_json::from_str::<LlmPricePrediction>(&json_str)?;
    parsed.validate_and_into_prediction()
}

/// Report for `requested` platforms whose timeline covers exactly `window`.
pub fn parse_sentiment_report(
    text: &str,
    requested: &BTreeSet<Platform>,
    window: &[NaiveDate],
) -> Result<SentimentReport, ExtractionError> {
    let json_str = extract_json(text).ok_or(ExtractionError::NoMatch("JSON object"))?;
    let parsed = serde_json::from_str::<LlmSentimentReport>(&json_str)?;
    parsed.validate_and_into_report(requested, window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::Direction;
    use crate::time::window::trailing_days;
    use serde_json::json;

    #[test]
    fn extract_json_trims_prose_inside_a_fence() {
        let reply = "```json\nHere is the report: {\"overall\": 0.6} as requested\n```";
        assert_eq!(extract_json(reply), Some("{\"overall\": 0.6}".to_string()));
    }

    #[test]
    fn extract_json_stops_at_the_closing_fence() {
        let reply = "```\n{\"overall\": 0.6}\n```\nNote: scores use {0..1}.";
        assert_eq!(extract_json(reply), Some("{\"overall\": 0.6}".to_string()));
    }

    #[test]
    fn extract_json_with_a_preamble_before_the_fence() {
        let reply = "Sure!\n```json\n{\"topics\": [\"a\", \"b\"]}\n```";
        assert_eq!(
            extract_json(reply),
            Some("{\"topics\": [\"a\", \"b\"]}".to_string())
        );
    }

    #[test]
    fn extract_json_spans_lines() {
        let s = "Here you go:\n{\n  \"a\": {\"b\": 2}\n}\nThanks";
        assert_eq!(extract_json(s), Some("{\n  \"a\": {\"b\": 2}\n}".to_string()));
    }

    #[test]
    fn extract_json_rejects_unbalanced_text() {
        assert_eq!(extract_json("} nothing {"), None);
        assert_eq!(extract_json("no braces"), None);
    }

    #[test]
    fn score_embedded_in_prose() {
        let score = extract_score("Sentiment score: 0.42, moderately bullish").unwrap();
        assert_eq!(score, 0.42);
    }

    #[test]
    fn score_without_leading_zero() {
        assert_eq!(extract_score("about .75").unwrap(), 0.75);
    }

    #[test]
    fn score_of_exactly_one() {
        assert_eq!(extract_score("1.0").unwrap(), 1.0);
    }

    #[test]
    fn score_missing() {
        assert!(matches!(
            extract_score("very bullish"),
            Err(ExtractionError::NoMatch(_))
        ));
    }

    #[test]
    fn prediction_embedded_in_prose() {
        let text = "Sure. {\"prediction\": \"bullish\", \"priceTarget\": 150.5} Hope that helps";
        let p = parse_prediction(text).unwrap();
        assert_eq!(p.prediction, Direction::Bullish);
        assert_eq!(p.price_target, 150.5);
    }

    #[test]
    fn prediction_with_broken_json() {
        assert!(matches!(
            parse_prediction("{\"prediction\": bullish}"),
            Err(ExtractionError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_prediction("no idea"),
            Err(ExtractionError::NoMatch(_))
        ));
    }

    #[test]
    fn sentiment_report_from_model_text() {
        let payload = json!({
            "overall": 0.64,
            "platforms": {
                "twitter": {
                    "score": 0.7,
                    "distribution": {"positive": 0.6, "neutral": 0.25, "negative": 0.15},
                    "topics": ["earnings", "guidance"]
                }
            },
            "timeline": [{"date": "2026-01-01", "twitter": 0.66}]
        });
        let text = format!("```json\n{payload:#}\n```");
        let requested: BTreeSet<_> = [Platform::Twitter].into_iter().collect();
        let window = trailing_days(NaiveDate::from_ymd_opt(2026, 1, 14).unwrap(), 14);
        let report = parse_sentiment_report(&text, &requested, &window).unwrap();
        assert_eq!(report.overall, 0.64);
        assert_eq!(report.platforms[&Platform::Twitter].topics, vec!["earnings", "guidance"]);
        assert_eq!(report.timeline.len(), 14);
        assert_eq!(report.timeline[13].twitter, Some(0.66));
    }

    #[test]
    fn sentiment_report_missing_overall() {
        let requested: BTreeSet<_> = Platform::ALL.into_iter().collect();
        let err = parse_sentiment_report("{\"platforms\": {}}", &requested, &[]).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingField("overall")));
    }
}
