//! Rating-first sentiment resolution.
//!
//! Decision order for one piece of feedback:
//!
//! 1. Rating 1–2 → NEGATIVE (0.8); rating 4–5 → POSITIVE (0.8). Text is not read.
//! 2. No text → NEUTRAL (0.6).
//! 3. Provider available and answers sensibly → the provider's label and score.
//! 4. Otherwise → the keyword heuristic.
//!
//! Out-of-range ratings are not rejected; they force nothing and fall through
//! to the text path like rating 3.

use plaudit_core::{EMPTY_TEXT_CONFIDENCE, Sentiment, SentimentVerdict};
use tracing::{debug, warn};

use crate::keywords::keyword_verdict;
use crate::provider::InferenceCapability;

/// Combines star rating, free text, and an optional inference provider into
/// a final verdict. Never fails.
pub struct Resolver {
    capability: Option<InferenceCapability>,
}

impl Resolver {
    pub fn new(capability: Option<InferenceCapability>) -> Self {
        Self { capability }
    }

    /// A resolver with no provider: text goes straight to the keyword heuristic.
    pub fn unavailable() -> Self {
        Self { capability: None }
    }

    pub fn is_available(&self) -> bool {
        self.capability.is_some()
    }

    /// Name of the configured provider, if any.
    pub fn provider_name(&self) -> Option<&str> {
        self.capability.as_ref().map(InferenceCapability::name)
    }

    /// Resolve a verdict from text and an optional star rating.
    pub fn resolve(&self, text: &str, rating: Option<i32>) -> SentimentVerdict {
        if let Some(verdict) = SentimentVerdict::from_rating(rating) {
            debug!(?rating, label = %verdict.label, "rating forces sentiment");
            return verdict;
        }
        self.analyze_text(text)
    }

    /// Text-only path: empty text, then provider, then keywords.
    pub fn analyze_text(&self, text: &str) -> SentimentVerdict {
        if text.trim().is_empty() {
            return SentimentVerdict::new(Sentiment::Neutral, EMPTY_TEXT_CONFIDENCE);
        }

        if let Some(cap) = &self.capability {
            match cap.predict(text) {
                Ok(verdict) => {
                    debug!(
                        provider = cap.name(),
                        label = %verdict.label,
                        confidence = verdict.confidence,
                        "provider classified feedback"
                    );
                    return verdict;
                }
                Err(e) => {
                    warn!(provider = cap.name(), error = %e, "inference failed, using keyword fallback");
                }
            }
        }

        let verdict = keyword_verdict(text);
        debug!(label = %verdict.label, "keyword heuristic classified feedback");
        verdict
    }
}
