//! The inference provider seam.
//!
//! A provider wraps a pretrained model (local or remote) behind two calls:
//! classify text into a sentiment label with a score, and summarize long
//! text. [`InferenceCapability`] pairs a provider with the summarization
//! policy so the resolver never sees thresholds or word bounds.

use std::borrow::Cow;
use std::time::Duration;

use plaudit_core::{Sentiment, SentimentVerdict};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("{0} is not supported by this provider")]
    Unsupported(&'static str),

    #[error("provider returned unknown label {0:?}")]
    UnknownLabel(String),

    #[error("provider returned confidence {0} outside [0, 1]")]
    InvalidConfidence(f64),

    #[error("inference timed out after {0:?}")]
    Timeout(Duration),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Ort(#[from] ort::Error),

    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Raw classifier output: a label string and its score.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

impl Prediction {
    /// Validate into a verdict. Unknown labels and out-of-range scores are errors.
    pub fn to_verdict(&self) -> Result<SentimentVerdict, InferenceError> {
        let label: Sentiment = self
            .label
            .parse()
            .map_err(|_| InferenceError::UnknownLabel(self.label.clone()))?;
        if !(0.0..=1.0).contains(&self.score) {
            return Err(InferenceError::InvalidConfidence(self.score));
        }
        Ok(SentimentVerdict::new(label, self.score))
    }
}

/// Output length bounds for summarization, in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryBounds {
    pub min_words: usize,
    pub max_words: usize,
}

impl Default for SummaryBounds {
    fn default() -> Self {
        Self {
            min_words: 50,
            max_words: 150,
        }
    }
}

/// When to summarize before classifying, and how long the summary may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryPolicy {
    /// Texts with more words than this are summarized first.
    pub threshold_words: usize,
    pub bounds: SummaryBounds,
}

impl Default for SummaryPolicy {
    fn default() -> Self {
        Self {
            threshold_words: 512,
            bounds: SummaryBounds::default(),
        }
    }
}

/// A pretrained sentiment model, local or remote.
///
/// Implementations must be deterministic: no sampling during summarization.
pub trait InferenceProvider {
    /// Short human-readable name for logs.
    fn name(&self) -> &str;

    /// Classify text into a label with a confidence score.
    fn classify(&self, text: &str) -> Result<Prediction, InferenceError>;

    /// Paraphrase `text` into roughly `bounds` words.
    fn summarize(&self, text: &str, bounds: SummaryBounds) -> Result<String, InferenceError>;
}

/// An available provider together with its summarization policy.
pub struct InferenceCapability {
    provider: Box<dyn InferenceProvider>,
    policy: SummaryPolicy,
}

impl InferenceCapability {
    pub fn new(provider: Box<dyn InferenceProvider>, policy: SummaryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    pub fn policy(&self) -> SummaryPolicy {
        self.policy
    }

    /// Summarize `text` if it exceeds the word threshold.
    ///
    /// A failed summarization is logged and the original text is returned.
    pub fn shorten<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let words = text.split_whitespace().count();
        if words <= self.policy.threshold_words {
            return Cow::Borrowed(text);
        }
        match self.provider.summarize(text, self.policy.bounds) {
            Ok(summary) => {
                debug!(
                    words,
                    summary_words = summary.split_whitespace().count(),
                    "summarized long feedback"
                );
                Cow::Owned(summary)
            }
            Err(e) => {
                warn!(provider = self.name(), error = %e, "summarization failed, classifying full text");
                Cow::Borrowed(text)
            }
        }
    }

    /// Shorten if needed, then classify and validate the provider's answer.
    pub fn predict(&self, text: &str) -> Result<SentimentVerdict, InferenceError> {
        let input = self.shorten(text);
        self.provider.classify(&input)?.to_verdict()
    }
}
