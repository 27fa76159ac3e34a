//! Sentiment labels, verdicts, and the star-rating policy.
//!
//! A 1–5 star rating is the strongest signal we have about a piece of
//! feedback: ratings 1–2 force NEGATIVE, ratings 4–5 force POSITIVE. Rating 3,
//! a missing rating, or an out-of-range value forces nothing and leaves the
//! label to text analysis.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Confidence attached to a label forced by the star rating.
pub const RATING_CONFIDENCE: f64 = 0.8;

/// Confidence for a rating-only label used when text analysis blew up.
pub const RATING_FALLBACK_CONFIDENCE: f64 = 0.7;

/// Confidence for a keyword-heuristic label with a clear winner.
pub const KEYWORD_CONFIDENCE: f64 = 0.7;

/// Confidence for NEUTRAL when there is no text to analyse.
pub const EMPTY_TEXT_CONFIDENCE: f64 = 0.6;

/// Confidence for NEUTRAL when the keyword counts tie.
pub const KEYWORD_TIE_CONFIDENCE: f64 = 0.5;

/// Sentiment label. Persisted as its upper-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Self::Positive, Self::Negative, Self::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Negative => "NEGATIVE",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sentiment label: {0:?}")]
pub struct ParseSentimentError(pub String);

impl FromStr for Sentiment {
    type Err = ParseSentimentError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" => Ok(Self::Positive),
            "NEGATIVE" => Ok(Self::Negative),
            "NEUTRAL" => Ok(Self::Neutral),
            _ => Err(ParseSentimentError(s.to_string())),
        }
    }
}

/// Final (label, confidence) pair for one piece of feedback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentVerdict {
    pub label: Sentiment,
    pub confidence: f64,
}

impl SentimentVerdict {
    pub fn new(label: Sentiment, confidence: f64) -> Self {
        Self { label, confidence }
    }

    /// Verdict forced by the star rating, if the rating forces one.
    pub fn from_rating(rating: Option<i32>) -> Option<Self> {
        sentiment_for_rating(rating).map(|label| Self::new(label, RATING_CONFIDENCE))
    }
}

/// Label forced by a star rating: 1–2 → NEGATIVE, 4–5 → POSITIVE.
///
/// Rating 3, no rating, and out-of-range ratings force nothing.
pub fn sentiment_for_rating(rating: Option<i32>) -> Option<Sentiment> {
    match rating {
        Some(1 | 2) => Some(Sentiment::Negative),
        Some(4 | 5) => Some(Sentiment::Positive),
        _ => None,
    }
}

/// Total rating → label mapping; anything without a forced label is NEUTRAL.
pub fn map_rating_to_sentiment(rating: Option<i32>) -> Sentiment {
    sentiment_for_rating(rating).unwrap_or(Sentiment::Neutral)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_ratings_force_negative() {
        assert_eq!(sentiment_for_rating(Some(1)), Some(Sentiment::Negative));
        assert_eq!(sentiment_for_rating(Some(2)), Some(Sentiment::Negative));
    }

    #[test]
    fn high_ratings_force_positive() {
        assert_eq!(sentiment_for_rating(Some(4)), Some(Sentiment::Positive));
        assert_eq!(sentiment_for_rating(Some(5)), Some(Sentiment::Positive));
    }

    #[test]
    fn middle_missing_and_out_of_range_force_nothing() {
        assert_eq!(sentiment_for_rating(Some(3)), None);
        assert_eq!(sentiment_for_rating(None), None);
        assert_eq!(sentiment_for_rating(Some(0)), None);
        assert_eq!(sentiment_for_rating(Some(6)), None);
        assert_eq!(sentiment_for_rating(Some(-1)), None);
    }

    #[test]
    fn total_mapping_defaults_to_neutral() {
        assert_eq!(map_rating_to_sentiment(Some(3)), Sentiment::Neutral);
        assert_eq!(map_rating_to_sentiment(None), Sentiment::Neutral);
        assert_eq!(map_rating_to_sentiment(Some(5)), Sentiment::Positive);
        assert_eq!(map_rating_to_sentiment(Some(1)), Sentiment::Negative);
    }

    #[test]
    fn rating_verdict_uses_rating_confidence() {
        let v = SentimentVerdict::from_rating(Some(4)).unwrap();
        assert_eq!(v.label, Sentiment::Positive);
        assert_eq!(v.confidence, RATING_CONFIDENCE);
        assert!(SentimentVerdict::from_rating(Some(3)).is_none());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("positive".parse::<Sentiment>(), Ok(Sentiment::Positive));
        assert_eq!(" NEGATIVE ".parse::<Sentiment>(), Ok(Sentiment::Negative));
        assert_eq!("Neutral".parse::<Sentiment>(), Ok(Sentiment::Neutral));
        assert!("LABEL_1".parse::<Sentiment>().is_err());
        assert!("".parse::<Sentiment>().is_err());
    }

    #[test]
    fn display_matches_persisted_form() {
        for s in Sentiment::ALL {
            assert_eq!(s.to_string(), s.as_str());
            assert_eq!(s.as_str().parse::<Sentiment>(), Ok(s));
        }
    }

    #[test]
    fn serde_uses_upper_case_names() {
        let json = serde_json::to_string(&Sentiment::Negative).unwrap();
        assert_eq!(json, "\"NEGATIVE\"");
    }
}
