use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Whether a value came back from the model or was synthesized locally after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Model,
    Fallback,
}

/// An analytic result tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analyzed<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Analyzed<T> {
    pub fn model(value: T) -> Self {
        Self {
            value,
            source: Source::Model,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            source: Source::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == Source::Fallback
    }
}

/// Clamps a sentiment score into `[0, 1]`. NaN maps to the neutral midpoint.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.5;
    }
    score.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// Direction implied by a price move.
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Direction::Bullish
        } else if change < 0.0 {
            Direction::Bearish
        } else {
            Direction::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
            Direction::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePrediction {
    pub prediction: Direction,
    #[serde(rename = "priceTarget")]
    pub price_target: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Reddit,
    Quora,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Twitter, Platform::Reddit, Platform::Quora];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Reddit => "reddit",
            Platform::Quora => "quora",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlatform(pub String);

impl fmt::Display for UnknownPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown platform: {}", self.0)
    }
}

impl std::error::Error for UnknownPlatform {}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twitter" => Ok(Platform::Twitter),
            "reddit" => Ok(Platform::Reddit),
            "quora" => Ok(Platform::Quora),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

/// Share of positive, neutral and negative posts. The three parts sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl Distribution {
    /// Splits 90% of the mass between positive and negative in proportion to the score and
    /// leaves the rest as neutral.
    pub fn from_score(score: f64) -> Self {
        let score = clamp_score(score);
        Self {
            positive: score * 0.9,
            neutral: 0.1,
            negative: (1.0 - score) * 0.9,
        }
        .normalized()
        .unwrap_or(Self::even())
    }

    pub fn even() -> Self {
        Self {
            positive: 1.0 / 3.0,
            neutral: 1.0 / 3.0,
            negative: 1.0 / 3.0,
        }
    }

    pub fn sum(&self) -> f64 {
        self.positive + self.neutral + self.negative
    }

    /// Rescales the parts to sum to 1. Returns `None` when there is no mass to rescale.
    pub fn normalized(self) -> Option<Self> {
        let positive = self.positive.max(0.0);
        let neutral = self.neutral.max(0.0);
        let negative = self.negative.max(0.0);
        let sum = positive + neutral + negative;
        if !sum.is_finite() || sum <= 0.0 {
            return None;
        }
        Some(Self {
            positive: positive / sum,
            neutral: neutral / sum,
            negative: negative / sum,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSentiment {
    pub score: f64,
    pub distribution: Distribution,
    pub topics: Vec<String>,
}

/// One day of the sentiment timeline. Only requested platforms carry a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reddit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quora: Option<f64>,
}

impl TimelineEntry {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            twitter: None,
            reddit: None,
            quora: None,
        }
    }

    pub fn get(&self, platform: Platform) -> Option<f64> {
        match platform {
            Platform::Twitter => self.twitter,
            Platform::Reddit => self.reddit,
            Platform::Quora => self.quora,
        }
    }

    pub fn set(&mut self, platform: Platform, score: Option<f64>) {
        let slot = match platform {
            Platform::Twitter => &mut self.twitter,
            Platform::Reddit => &mut self.reddit,
            Platform::Quora => &mut self.quora,
        };
        *slot = score;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub overall: f64,
    pub platforms: BTreeMap<Platform, PlatformSentiment>,
    pub timeline: Vec<TimelineEntry>,
}

/// Everything the stock detail view asks the model for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockInsight {
    pub symbol: String,
    pub sentiment: Analyzed<f64>,
    pub prediction: Analyzed<PricePrediction>,
    pub social: Analyzed<SentimentReport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn distribution_from_score_sums_to_one() {
        for score in [0.0, 0.05, 0.37, 0.5, 0.95, 1.0] {
            let d = Distribution::from_score(score);
            assert!((d.sum() - 1.0).abs() < 1e-9, "score={score} sum={}", d.sum());
            assert!(d.positive >= 0.0 && d.neutral >= 0.0 && d.negative >= 0.0);
        }
    }

    #[test]
    fn normalized_rejects_empty_mass() {
        let d = Distribution {
            positive: 0.0,
            neutral: 0.0,
            negative: 0.0,
        };
        assert!(d.normalized().is_none());
    }

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("Twitter".parse::<Platform>().unwrap(), Platform::Twitter);
        assert_eq!(" reddit ".parse::<Platform>().unwrap(), Platform::Reddit);
        assert!("facebook".parse::<Platform>().is_err());
    }

    #[test]
    fn prediction_uses_camel_case_target_on_the_wire() {
        let p = PricePrediction {
            prediction: Direction::Bullish,
            price_target: 150.5,
        };
        assert_eq!(
            serde_json::to_value(&p).unwrap(),
            json!({"prediction": "bullish", "priceTarget": 150.5})
        );
    }

    #[test]
    fn timeline_entry_skips_missing_platforms() {
        let mut entry = TimelineEntry::new(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        entry.set(Platform::Reddit, Some(0.4));
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"date": "2026-01-05", "reddit": 0.4})
        );
        assert_eq!(entry.get(Platform::Twitter), None);
    }

    #[test]
    fn direction_from_change_handles_zero() {
        assert_eq!(Direction::from_change(1.2), Direction::Bullish);
        assert_eq!(Direction::from_change(-0.01), Direction::Bearish);
        assert_eq!(Direction::from_change(0.0), Direction::Neutral);
    }
}
