//! Keyword-count sentiment heuristic, used when no model is available.
//!
//! Deterministic and dependency-free: lower-case the text, count how many
//! words from each list occur in it, and let the larger count win.

use plaudit_core::{KEYWORD_CONFIDENCE, KEYWORD_TIE_CONFIDENCE, Sentiment, SentimentVerdict};

/// Words that signal a satisfied customer.
pub const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "helpful",
    "satisfied",
    "resolved",
    "quick",
    "polite",
];

/// Words that signal a dissatisfied customer.
pub const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "poor",
    "terrible",
    "unhelpful",
    "delayed",
    "disappointed",
    "slow",
    "rude",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordCounts {
    pub positive: usize,
    pub negative: usize,
}

/// Count list members occurring in `text`.
///
/// Matching is by substring on the lower-cased text, and each list member
/// counts at most once, so "quickly" hits "quick" and "unhelpful" hits both
/// "helpful" and "unhelpful".
pub fn count_keywords(text: &str) -> KeywordCounts {
    let lower = text.to_lowercase();
    let hits = |words: &[&str]| words.iter().filter(|w| lower.contains(*w)).count();
    KeywordCounts {
        positive: hits(POSITIVE_WORDS),
        negative: hits(NEGATIVE_WORDS),
    }
}

/// Heuristic verdict: the larger count wins at 0.7; a tie is NEUTRAL at 0.5.
pub fn keyword_verdict(text: &str) -> SentimentVerdict {
    let counts = count_keywords(text);
    if counts.positive > counts.negative {
        SentimentVerdict::new(Sentiment::Positive, KEYWORD_CONFIDENCE)
    } else if counts.negative > counts.positive {
        SentimentVerdict::new(Sentiment::Negative, KEYWORD_CONFIDENCE)
    } else {
        SentimentVerdict::new(Sentiment::Neutral, KEYWORD_TIE_CONFIDENCE)
    }
}
