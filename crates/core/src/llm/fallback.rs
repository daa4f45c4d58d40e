//! Locally synthesized stand-ins for model answers. Every generator takes the random source as
//! a parameter so callers can seed it.

use crate::domain::analysis::{
    Direction, Distribution, Platform, PlatformSentiment, PricePrediction, SentimentReport,
    TimelineEntry,
};
use crate::llm::prompts::TIMELINE_DAYS;
use crate::time::window::trailing_days;
use chrono::NaiveDate;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

const SCORE_MIDPOINT: f64 = 0.5;
const SCORE_JITTER: f64 = 0.2;

/// Largest synthetic move as a fraction of the current price.
const PREDICTION_MAX_MOVE: f64 = 0.05;

const PLATFORM_NOISE: f64 = 0.1;
const DAILY_NOISE: f64 = 0.075;
const SCORE_FLOOR: f64 = 0.05;
const SCORE_CEIL: f64 = 0.95;

const MAX_TOPICS: usize = 5;
const FINANCE_TOPIC_DRAWS: usize = 2;
const FINANCE_TOPIC_PROBABILITY: f64 = 0.7;

const FINANCE_TOPICS: [&str; 10] = [
    "earnings",
    "stock price",
    "investment",
    "market",
    "trading",
    "dividend",
    "forecast",
    "growth",
    "performance",
    "shareholders",
];

/// Base score bands keyed by names the query may mention: `(names, low, width)`.
const BASE_BANDS: [(&[&str], f64, f64); 5] = [
    (&["aapl", "apple", "goog", "google", "msft", "microsoft"], 0.7, 0.15),
    (&["meta", "fb", "facebook", "amzn", "amazon"], 0.6, 0.15),
    (
        &[
            "reliance", "tcs", "hdfcbank", "hdfc", "infy", "infosys", "icicibank", "icici",
            "sbin", "sbi", "bhartiartl", "airtel",
        ],
        0.55,
        0.2,
    ),
    (&["tsla", "tesla", "nflx", "netflix"], 0.4, 0.4),
    (&["btc", "bitcoin", "eth", "ethereum", "crypto", "doge"], 0.3, 0.6),
];
const DEFAULT_BAND: (f64, f64) = (0.4, 0.3);

/// Midpoint score with symmetric jitter, in `[0.3, 0.7]`.
pub fn fallback_score<R: Rng>(rng: &mut R) -> f64 {
    SCORE_MIDPOINT + rng.random_range(-SCORE_JITTER..=SCORE_JITTER)
}

/// A move of at most 5% off `current_price`, rounded to paise. The direction follows the sign of
/// the rounded move.
pub fn fallback_prediction<R: Rng>(rng: &mut R, current_price: f64) -> PricePrediction {
    let change = current_price * rng.random_range(-PREDICTION_MAX_MOVE..=PREDICTION_MAX_MOVE);
    let price_target = round_cents(current_price + change);
    PricePrediction {
        prediction: Direction::from_change(price_target - current_price),
        price_target,
    }
}

/// Fully synthetic report for `platforms`, with a timeline of [`TIMELINE_DAYS`] days ending at
/// `today`.
pub fn synthetic_report<R: Rng>(
    rng: &mut R,
    query: &str,
    platforms: &BTreeSet<Platform>,
    today: NaiveDate,
) -> SentimentReport {
    let (low, width) = base_band(query);
    let base = low + rng.random_range(0.0..width);

    let mut out_platforms = BTreeMap::new();
    for &platform in platforms {
        let score = clamp_band(base + rng.random_range(-PLATFORM_NOISE..PLATFORM_NOISE));
        out_platforms.insert(
            platform,
            PlatformSentiment {
                score,
                distribution: Distribution::from_score(score),
                topics: synthetic_topics(rng, query, platform),
            },
        );
    }

    let timeline = trailing_days(today, TIMELINE_DAYS)
        .into_iter()
        .map(|date| {
            let mut entry = TimelineEntry::new(date);
            for (&platform, sentiment) in &out_platforms {
                let daily =
                    clamp_band(sentiment.score + rng.random_range(-DAILY_NOISE..DAILY_NOISE));
                entry.set(platform, Some(daily));
            }
            entry
        })
        .collect();

    SentimentReport {
        overall: base.clamp(0.0, 1.0),
        platforms: out_platforms,
        timeline,
    }
}

fn base_band(query: &str) -> (f64, f64) {
    let tokens: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();

    BASE_BANDS
        .iter()
        .find(|(names, _, _)| tokens.iter().any(|t| names.contains(&t.as_str())))
        .map(|&(_, low, width)| (low, width))
        .unwrap_or(DEFAULT_BAND)
}

/// Query term, one platform-flavoured tag and up to two generic finance tags, deduplicated.
fn synthetic_topics<R: Rng>(rng: &mut R, query: &str, platform: Platform) -> Vec<String> {
    let mut topics = vec![query_topic(query)];

    let flavours: &[&str] = match platform {
        Platform::Twitter => &["trending", "breaking news", "latest update"],
        Platform::Reddit => &["r/wallstreetbets", "DD thread", "analysis"],
        Platform::Quora => &["expert opinion", "financial advice", "investment strategy"],
    };
    let flavours: Vec<&str> = flavours
        .iter()
        .copied()
        .filter(|f| !topics[0].eq_ignore_ascii_case(f))
        .collect();
    push_unique(&mut topics, flavours[rng.random_range(0..flavours.len())]);

    for _ in 0..FINANCE_TOPIC_DRAWS {
        if rng.random_bool(FINANCE_TOPIC_PROBABILITY) {
            push_unique(
                &mut topics,
                FINANCE_TOPICS[rng.random_range(0..FINANCE_TOPICS.len())],
            );
        }
    }

    topics.truncate(MAX_TOPICS);
    topics
}

fn query_topic(query: &str) -> String {
    let query = query.trim();
    let mut chars = query.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Market".to_string(),
    }
}

fn push_unique(topics: &mut Vec<String>, topic: &str) {
    if !topics.iter().any(|t| t.eq_ignore_ascii_case(topic)) {
        topics.push(topic.to_string());
    }
}

fn clamp_band(score: f64) -> f64 {
    score.clamp(SCORE_FLOOR, SCORE_CEIL)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn set(platforms: &[Platform]) -> BTreeSet<Platform> {
        platforms.iter().copied().collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn fallback_score_stays_within_jitter() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let s = fallback_score(&mut rng);
            assert!((0.3..=0.7).contains(&s), "{s}");
        }
    }

    #[test]
    fn fallback_prediction_is_bounded_and_consistent() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1_000 {
            let p = fallback_prediction(&mut rng, 100.0);
            assert!((95.0..=105.0).contains(&p.price_target), "{}", p.price_target);
            assert_eq!(p.prediction, Direction::from_change(p.price_target - 100.0));
        }
    }

    #[test]
    fn fallback_prediction_rounds_to_cents() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = fallback_prediction(&mut rng, 2825.5);
        assert_eq!(p.price_target, round_cents(p.price_target));
    }

    #[test]
    fn synthetic_report_covers_exactly_the_requested_platforms() {
        let subsets: [&[Platform]; 7] = [
            &[Platform::Twitter],
            &[Platform::Reddit],
            &[Platform::Quora],
            &[Platform::Twitter, Platform::Reddit],
            &[Platform::Twitter, Platform::Quora],
            &[Platform::Reddit, Platform::Quora],
            &Platform::ALL,
        ];
        let mut rng = StdRng::seed_from_u64(42);
        for subset in subsets {
            let requested = set(subset);
            let report =
                synthetic_report(&mut rng, "Reliance Industries RELIANCE", &requested, today());

            assert_eq!(report.platforms.keys().copied().collect::<BTreeSet<_>>(), requested);
            assert!((0.0..=1.0).contains(&report.overall));

            for sentiment in report.platforms.values() {
                assert!((SCORE_FLOOR..=SCORE_CEIL).contains(&sentiment.score));
                assert!((sentiment.distribution.sum() - 1.0).abs() < 1e-6);
                assert!((2..=MAX_TOPICS).contains(&sentiment.topics.len()));
            }

            assert_eq!(report.timeline.len(), TIMELINE_DAYS as usize);
            assert_eq!(report.timeline.last().map(|e| e.date), Some(today()));
            for pair in report.timeline.windows(2) {
                assert!(pair[0].date < pair[1].date);
            }
            for entry in &report.timeline {
                for platform in Platform::ALL {
                    let score = entry.get(platform);
                    if requested.contains(&platform) {
                        let score = score.unwrap();
                        assert!((SCORE_FLOOR..=SCORE_CEIL).contains(&score));
                    } else {
                        assert_eq!(score, None);
                    }
                }
            }
        }
    }

    #[test]
    fn base_band_recognizes_tokens_in_longer_queries() {
        assert_eq!(base_band("Apple"), (0.7, 0.15));
        assert_eq!(base_band("what about $TSLA today"), (0.4, 0.4));
        assert_eq!(base_band("Infosys INFY"), (0.55, 0.2));
        assert_eq!(base_band("XYZCORP"), DEFAULT_BAND);
    }

    #[test]
    fn topics_start_with_the_capitalized_query() {
        let mut rng = StdRng::seed_from_u64(5);
        let topics = synthetic_topics(&mut rng, "bitcoin", Platform::Reddit);
        assert_eq!(topics[0], "Bitcoin");
        let unique: BTreeSet<_> = topics.iter().map(|t| t.to_lowercase()).collect();
        assert_eq!(unique.len(), topics.len());
    }

    #[test]
    fn platform_tag_never_collides_with_the_query() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let topics = synthetic_topics(&mut rng, "analysis", Platform::Reddit);
            assert!(topics.len() >= 2, "{topics:?}");
        }
    }

    #[test]
    fn empty_query_still_gets_a_topic() {
        assert_eq!(query_topic("   "), "Market");
    }

    #[test]
    fn seeded_generators_are_reproducible() {
        let requested = set(&[Platform::Twitter, Platform::Quora]);
        let a = synthetic_report(&mut StdRng::seed_from_u64(9), "TCS", &requested, today());
        let b = synthetic_report(&mut StdRng::seed_from_u64(9), "TCS", &requested, today());
        assert_eq!(a, b);
    }
}
