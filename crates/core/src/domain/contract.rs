//! Wire shapes the model is asked to emit, and their conversion into domain types.
//!
//! Fields are loose (`Option`, `serde_json::Value`): models quote numbers, drop keys and echo
//! template placeholders. The `validate_and_into_*` methods decide what is usable.

use crate::domain::analysis::{
    clamp_score, Direction, Distribution, Platform, PlatformSentiment, PricePrediction,
    SentimentReport, TimelineEntry,
};
use crate::llm::error::ExtractionError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

const MAX_TOPICS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmPricePrediction {
    #[serde(default)]
    pub prediction: Option<String>,
    #[serde(default, rename = "priceTarget")]
    pub price_target: Option<Value>,
}

impl LlmPricePrediction {
    pub fn validate_and_into_prediction(self) -> Result<PricePrediction, ExtractionError> {
        let label = self
            .prediction
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .ok_or(ExtractionError::MissingField("prediction"))?;

        let price_target = self
            .price_target
            .as_ref()
            .ok_or(ExtractionError::MissingField("priceTarget"))
            .and_then(|v| lenient_f64(v).ok_or_else(|| invalid("priceTarget", v)))?;

        if !price_target.is_finite() || price_target <= 0.0 {
            return Err(ExtractionError::InvalidValue {
                field: "priceTarget",
                detail: format!("must be a positive number (got {price_target})"),
            });
        }

        Ok(PricePrediction {
            prediction: parse_direction(&label)?,
            price_target,
        })
    }
}

fn parse_direction(label: &str) -> Result<Direction, ExtractionError> {
    // "bullish/bearish" echoes the prompt template verbatim and carries no signal.
    let bull = label.contains("bull");
    let bear = label.contains("bear");
    match (bull, bear) {
        (true, false) => Ok(Direction::Bullish),
        (false, true) => Ok(Direction::Bearish),
        (false, false) if label.contains("neutral") => Ok(Direction::Neutral),
        _ => Err(ExtractionError::InvalidValue {
            field: "prediction",
            detail: format!("unrecognized direction label: {label}"),
        }),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSentimentReport {
    #[serde(default)]
    pub overall: Option<Value>,
    #[serde(default)]
    pub platforms: Option<Value>,
    #[serde(default)]
    pub timeline: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmPlatformSentiment {
    #[serde(default)]
    pub score: Option<Value>,
    #[serde(default)]
    pub distribution: Option<LlmDistribution>,
    #[serde(default)]
    pub topics: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmDistribution {
    #[serde(default)]
    pub positive: Option<Value>,
    #[serde(default)]
    pub neutral: Option<Value>,
    #[serde(default)]
    pub negative: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmTimelineEntry {
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(flatten)]
    pub scores: BTreeMap<String, Value>,
}

impl LlmSentimentReport {
    /// Accepts the report when `overall` and `platforms` are present, then brings it in line
    /// with the domain invariants: scores clamped, unrequested platforms dropped, distributions
    /// summing to one, at most five topics, one timeline entry per day of `window`.
    ///
    /// Nested data is read leniently. A platform without a usable score is skipped, and
    /// timeline entries or fields of the wrong shape are ignored rather than failing the report.
    pub fn validate_and_into_report(
        self,
        requested: &BTreeSet<Platform>,
        window: &[NaiveDate],
    ) -> Result<SentimentReport, ExtractionError> {
        let overall = self
            .overall
            .as_ref()
            .ok_or(ExtractionError::MissingField("overall"))
            .and_then(|v| lenient_f64(v).ok_or_else(|| invalid("overall", v)))?;

        let raw_platforms = match self.platforms {
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(ExtractionError::InvalidValue {
                    field: "platforms",
                    detail: format!("expected an object, got {other}"),
                });
            }
            None => return Err(ExtractionError::MissingField("platforms")),
        };

        let mut platforms = BTreeMap::new();
        for (key, raw) in raw_platforms {
            let Ok(platform) = key.parse::<Platform>() else {
                continue;
            };
            if !requested.contains(&platform) {
                continue;
            }
            let Some(sentiment) = from_loose::<LlmPlatformSentiment>(raw)
                .and_then(LlmPlatformSentiment::into_platform_sentiment)
            else {
                tracing::debug!(%platform, "platform entry without a usable score skipped");
                continue;
            };
            platforms.insert(platform, sentiment);
        }

        if platforms.is_empty() {
            return Err(ExtractionError::InvalidValue {
                field: "platforms",
                detail: "none of the requested platforms are present".to_string(),
            });
        }

        let entries = match self.timeline {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        let mut seen_dates = BTreeSet::new();
        let mut raw_timeline: Vec<(Option<NaiveDate>, LlmTimelineEntry)> = entries
            .into_iter()
            .filter_map(from_loose::<LlmTimelineEntry>)
            .map(|e| (e.parsed_date(), e))
            .filter(|(date, _)| match date {
                Some(d) => seen_dates.insert(*d),
                None => true,
            })
            .collect();
        // Without a usable date on every entry, the model's order is taken as chronological.
        if raw_timeline.iter().all(|(date, _)| date.is_some()) {
            raw_timeline.sort_by_key(|(date, _)| *date);
        }

        // The newest entries are re-dated onto the tail of the window; days the model skipped
        // repeat the platform score.
        let keep = raw_timeline.len().min(window.len());
        let raw_timeline = &raw_timeline[raw_timeline.len() - keep..];
        let offset = window.len() - keep;
        let timeline = window
            .iter()
            .enumerate()
            .map(|(i, &date)| {
                let raw = i.checked_sub(offset).map(|j| &raw_timeline[j].1);
                let mut entry = TimelineEntry::new(date);
                for (&platform, sentiment) in &platforms {
                    let score = raw
                        .and_then(|r| r.score_for(platform))
                        .unwrap_or(sentiment.score);
                    entry.set(platform, Some(score));
                }
                entry
            })
            .collect();

        Ok(SentimentReport {
            overall: clamp_score(overall),
            platforms,
            timeline,
        })
    }
}

impl LlmTimelineEntry {
    fn parsed_date(&self) -> Option<NaiveDate> {
        self.date
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
    }

    fn score_for(&self, platform: Platform) -> Option<f64> {
        self.scores
            .iter()
            .find(|(key, _)| key.parse::<Platform>().ok() == Some(platform))
            .and_then(|(_, value)| lenient_f64(value))
            .map(clamp_score)
    }
}

impl LlmPlatformSentiment {
    fn into_platform_sentiment(self) -> Option<PlatformSentiment> {
        let score = self.score.as_ref().and_then(lenient_f64).map(clamp_score)?;

        let distribution = self
            .distribution
            .and_then(|d| {
                let part = |v: &Option<Value>| v.as_ref().and_then(lenient_f64).unwrap_or(0.0);
                Distribution {
                    positive: part(&d.positive),
                    neutral: part(&d.neutral),
                    negative: part(&d.negative),
                }
                .normalized()
            })
            .unwrap_or_else(|| Distribution::from_score(score));

        let topics = match self.topics {
            Some(Value::Array(items)) => items,
            Some(single @ Value::String(_)) => vec![single],
            _ => Vec::new(),
        };
        let topics = topics
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .take(MAX_TOPICS)
            .map(str::to_string)
            .collect();

        Some(PlatformSentiment {
            score,
            distribution,
            topics,
        })
    }
}

/// Deserializes a nested value, treating a shape mismatch as absent.
fn from_loose<T: serde::de::DeserializeOwned>(value: Value) -> Option<T> {
    serde_json::from_value(value).ok()
}

/// Reads a number, or a string holding one.
fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('₹').trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn invalid(field: &'static str, value: &Value) -> ExtractionError {
    ExtractionError::InvalidValue {
        field,
        detail: format!("expected a number, got {value}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::window::trailing_days;
    use serde_json::json;

    fn requested(platforms: &[Platform]) -> BTreeSet<Platform> {
        platforms.iter().copied().collect()
    }

    fn window() -> Vec<NaiveDate> {
        trailing_days(NaiveDate::from_ymd_opt(2026, 1, 4).unwrap(), 4)
    }

    #[test]
    fn prediction_accepts_quoted_target() {
        let raw: LlmPricePrediction =
            serde_json::from_value(json!({"prediction": "Bearish", "priceTarget": "95.25"}))
                .unwrap();
        let p = raw.validate_and_into_prediction().unwrap();
        assert_eq!(p.prediction, Direction::Bearish);
        assert_eq!(p.price_target, 95.25);
    }

    #[test]
    fn prediction_rejects_template_echo() {
        let raw: LlmPricePrediction =
            serde_json::from_value(json!({"prediction": "bullish/bearish", "priceTarget": 10}))
                .unwrap();
        assert!(raw.validate_and_into_prediction().is_err());
    }

    #[test]
    fn prediction_rejects_non_positive_target() {
        let raw: LlmPricePrediction =
            serde_json::from_value(json!({"prediction": "bullish", "priceTarget": 0})).unwrap();
        assert!(raw.validate_and_into_prediction().is_err());
    }

    #[test]
    fn prediction_requires_both_fields() {
        let raw: LlmPricePrediction =
            serde_json::from_value(json!({"priceTarget": 12.0})).unwrap();
        assert!(matches!(
            raw.validate_and_into_prediction(),
            Err(ExtractionError::MissingField("prediction"))
        ));
    }

    #[test]
    fn report_drops_unrequested_platforms_and_clamps() {
        let raw: LlmSentimentReport = serde_json::from_value(json!({
            "overall": 1.4,
            "platforms": {
                "twitter": {
                    "score": 0.8,
                    "distribution": {"positive": 2.0, "neutral": 1.0, "negative": 1.0},
                    "topics": ["a", "b", "c", "d", "e", "f"]
                },
                "quora": {"score": 0.2, "topics": []}
            },
            "timeline": [
                {"date": "2026-01-02", "twitter": 0.7, "quora": 0.1},
                {"date": "2026-01-01", "twitter": "0.6"}
            ]
        }))
        .unwrap();

        let report = raw
            .validate_and_into_report(&requested(&[Platform::Twitter]), &window())
            .unwrap();

        assert_eq!(report.overall, 1.0);
        assert_eq!(report.platforms.keys().copied().collect::<Vec<_>>(), vec![Platform::Twitter]);
        let twitter = &report.platforms[&Platform::Twitter];
        assert_eq!(twitter.topics.len(), 5);
        assert!((twitter.distribution.positive - 0.5).abs() < 1e-9);

        let dates: Vec<_> = report.timeline.iter().map(|e| e.date).collect();
        assert_eq!(dates, window());
        // Two model days land on the last two window days; earlier days repeat the score.
        assert_eq!(report.timeline[0].twitter, Some(0.8));
        assert_eq!(report.timeline[2].twitter, Some(0.6));
        assert_eq!(report.timeline[3].twitter, Some(0.7));
        assert!(report.timeline.iter().all(|e| e.quora.is_none() && e.reddit.is_none()));
    }

    #[test]
    fn report_without_platforms_is_rejected() {
        let raw: LlmSentimentReport = serde_json::from_value(json!({"overall": 0.5})).unwrap();
        assert!(matches!(
            raw.validate_and_into_report(&requested(&Platform::ALL), &window()),
            Err(ExtractionError::MissingField("platforms"))
        ));
    }

    #[test]
    fn missing_distribution_is_derived_from_score() {
        let raw: LlmSentimentReport = serde_json::from_value(json!({
            "overall": 0.5,
            "platforms": {"reddit": {"score": 0.5}}
        }))
        .unwrap();
        let report = raw
            .validate_and_into_report(&requested(&[Platform::Reddit]), &window())
            .unwrap();
        let d = report.platforms[&Platform::Reddit].distribution;
        assert!((d.sum() - 1.0).abs() < 1e-9);
        assert_eq!(report.timeline.len(), 4);
        assert!(report.timeline.iter().all(|e| e.reddit == Some(0.5)));
    }

    #[test]
    fn long_timelines_keep_the_newest_days() {
        let raw: LlmSentimentReport = serde_json::from_value(json!({
            "overall": 0.5,
            "platforms": {"Reddit": {"score": 0.5}},
            "timeline": [
                {"date": "2023-05-01", "reddit": 0.1},
                {"date": "2023-05-02", "reddit": 0.2},
                {"date": "2023-05-03", "reddit": 0.3},
                {"date": "2023-05-03", "reddit": 0.9},
                {"date": "2023-05-04", "reddit": 0.4},
                {"date": "2023-05-05", "Reddit": 0.5}
            ]
        }))
        .unwrap();
        let report = raw
            .validate_and_into_report(&requested(&[Platform::Reddit]), &window())
            .unwrap();
        let scores: Vec<_> = report.timeline.iter().map(|e| e.reddit).collect();
        assert_eq!(scores, vec![Some(0.2), Some(0.3), Some(0.4), Some(0.5)]);
        assert_eq!(report.timeline.last().map(|e| e.date), window().last().copied());
    }

    #[test]
    fn placeholder_and_missing_dates_are_re_dated_in_order() {
        let raw: LlmSentimentReport = serde_json::from_value(json!({
            "overall": 0.7,
            "platforms": {"twitter": {"score": 0.7}},
            "timeline": [
                {"date": "YYYY-MM-DD", "twitter": 0.3},
                {"twitter": 0.4},
                {"date": 20260103, "twitter": 0.5},
                "not an entry"
            ]
        }))
        .unwrap();
        let report = raw
            .validate_and_into_report(&requested(&[Platform::Twitter]), &window())
            .unwrap();

        let dates: Vec<_> = report.timeline.iter().map(|e| e.date).collect();
        assert_eq!(dates, window());
        let scores: Vec<_> = report.timeline.iter().map(|e| e.twitter).collect();
        assert_eq!(scores, vec![Some(0.7), Some(0.3), Some(0.4), Some(0.5)]);
    }

    #[test]
    fn quoted_ratios_and_stray_topics_are_tolerated() {
        let raw: LlmSentimentReport = serde_json::from_value(json!({
            "overall": "0.6",
            "platforms": {
                "reddit": {
                    "score": 0.6,
                    "distribution": {"positive": "0.6", "neutral": "0.3", "negative": 0.1},
                    "topics": ["Earnings", 42, null, {"name": "x"}, "  ", "Guidance "]
                },
                "twitter": {
                    "score": 0.4,
                    "distribution": {"positive": "lots", "neutral": null},
                    "topics": "Buyback"
                },
                "quora": {"distribution": {"positive": 1.0}}
            },
            "timeline": {"date": "2026-01-04"}
        }))
        .unwrap();
        let report = raw
            .validate_and_into_report(&requested(&Platform::ALL), &window())
            .unwrap();

        assert_eq!(report.overall, 0.6);
        assert_eq!(
            report.platforms.keys().copied().collect::<Vec<_>>(),
            vec![Platform::Twitter, Platform::Reddit]
        );

        let reddit = &report.platforms[&Platform::Reddit];
        assert!((reddit.distribution.positive - 0.6).abs() < 1e-9);
        assert!((reddit.distribution.neutral - 0.3).abs() < 1e-9);
        assert_eq!(reddit.topics, vec!["Earnings".to_string(), "Guidance".to_string()]);

        let twitter = &report.platforms[&Platform::Twitter];
        assert!((twitter.distribution.sum() - 1.0).abs() < 1e-9);
        assert_eq!(twitter.distribution, Distribution::from_score(0.4));
        assert_eq!(twitter.topics, vec!["Buyback".to_string()]);

        assert_eq!(report.timeline.len(), 4);
        assert!(report.timeline.iter().all(|e| e.quora.is_none()));
    }

    #[test]
    fn platforms_without_usable_scores_are_rejected_when_nothing_remains() {
        let raw: LlmSentimentReport = serde_json::from_value(json!({
            "overall": 0.5,
            "platforms": {"twitter": {"score": "n/a"}, "reddit": 0.5}
        }))
        .unwrap();
        assert!(matches!(
            raw.validate_and_into_report(&requested(&Platform::ALL), &window()),
            Err(ExtractionError::InvalidValue { field: "platforms", .. })
        ));
    }
}
