//! Feedback records and the shapes they arrive in.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sentiment::Sentiment;

/// A persisted piece of customer feedback.
///
/// Created by intake or review import with `sentiment` unset; the
/// reconciler fills and corrects `sentiment` / `sentiment_confidence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: i64,
    pub complaint_id: String,
    pub category: String,
    pub subcategory: String,
    pub feedback_message: String,
    /// Star rating, normally 1–5. Imported reviews may carry none.
    pub rating: Option<i32>,
    pub name: String,
    pub email: String,
    /// ISO 8601 timestamp string.
    pub submitted_at: String,
    /// Raw persisted label. Legacy rows may hold an empty string.
    pub sentiment: Option<String>,
    pub sentiment_confidence: Option<f64>,
}

impl FeedbackRecord {
    /// True when the sentiment column is null or empty.
    pub fn needs_sentiment(&self) -> bool {
        self.sentiment.as_deref().is_none_or(str::is_empty)
    }

    /// The persisted label, if it is one we recognise.
    pub fn sentiment_label(&self) -> Option<Sentiment> {
        self.sentiment.as_deref().and_then(|s| s.parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(i32),
    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),
}

/// Body of a feedback submission as accepted by the intake endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub complaint_id: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub feedback_message: String,
    pub rating: Option<i32>,
    pub name: String,
    pub email: String,
}

impl FeedbackSubmission {
    /// Check a submission coming from outside before it is stored.
    pub fn validate(&self) -> Result<(), SubmissionError> {
        let required = [
            ("complaint_id", &self.complaint_id),
            ("category", &self.category),
            ("name", &self.name),
            ("email", &self.email),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SubmissionError::MissingField(field));
            }
        }

        match self.rating {
            None => return Err(SubmissionError::MissingField("rating")),
            Some(r) if !(1..=5).contains(&r) => return Err(SubmissionError::RatingOutOfRange(r)),
            Some(_) => {}
        }

        if !self.email.contains('@') {
            return Err(SubmissionError::InvalidEmail(self.email.clone()));
        }

        Ok(())
    }
}

/// Category assigned to imported app-store reviews.
pub const REVIEW_CATEGORY: &str = "App Review";
/// Subcategory assigned to imported app-store reviews.
pub const REVIEW_SUBCATEGORY: &str = "Google Play";

/// One entry of a Play Store review dump (camelCase keys as the scraper emits them).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
    #[serde(default)]
    pub review_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub score: Option<i32>,
    /// Review timestamp as emitted by the scraper.
    #[serde(default)]
    pub at: Option<String>,
}

impl ReviewEntry {
    /// Review text, empty when the review has none.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("").trim()
    }

    /// Convert to a submission for storage. `ordinal` names reviews without an id.
    ///
    /// Returns `None` for reviews with no text.
    pub fn to_submission(&self, ordinal: usize) -> Option<FeedbackSubmission> {
        let text = self.text();
        if text.is_empty() {
            return None;
        }
        Some(FeedbackSubmission {
            complaint_id: self
                .review_id
                .clone()
                .unwrap_or_else(|| format!("REVIEW-{ordinal}")),
            category: REVIEW_CATEGORY.to_string(),
            subcategory: REVIEW_SUBCATEGORY.to_string(),
            feedback_message: text.to_string(),
            rating: self.score,
            name: self.user_name.clone().unwrap_or_default(),
            email: String::new(),
        })
    }
}
