//! Storage layer: the feedback record store and its backends.
//!
//! [`MemoryStore`] is always available; [`DuckStore`] persists to a DuckDB
//! file and is gated behind the `duckdb` feature.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;

use plaudit_core::{FeedbackRecord, FeedbackSubmission, Sentiment, SentimentVerdict};

/// Record store holding feedback records.
///
/// Every write is an independent single-record operation; there is no
/// multi-record transaction. Query results are ordered by record id.
pub trait FeedbackStore {
    /// Store a new record with sentiment unset.
    fn insert(
        &self,
        submission: &FeedbackSubmission,
        submitted_at: &str,
    ) -> Result<FeedbackRecord, StoreError>;

    /// Every stored record.
    fn all(&self) -> Result<Vec<FeedbackRecord>, StoreError>;

    /// Records whose sentiment is null or the empty string.
    fn missing_sentiment(&self) -> Result<Vec<FeedbackRecord>, StoreError>;

    /// Records with `rating in ratings AND sentiment in labels`.
    fn by_rating_and_sentiment(
        &self,
        ratings: &[i32],
        labels: &[Sentiment],
    ) -> Result<Vec<FeedbackRecord>, StoreError>;

    /// Overwrite one record's sentiment and confidence.
    fn set_sentiment(&self, id: i64, verdict: &SentimentVerdict) -> Result<(), StoreError>;

    /// Number of stored records.
    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.all()?.len())
    }
}
