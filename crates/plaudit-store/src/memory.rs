//! In-memory record store.

use std::sync::{Mutex, MutexGuard};

use plaudit_core::{FeedbackRecord, FeedbackSubmission, Sentiment, SentimentVerdict};

use crate::{FeedbackStore, StoreError};

/// Volatile [`FeedbackStore`] backed by a `Vec`.
///
/// Used for tests and dry runs; contents vanish with the process.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    records: Vec<FeedbackRecord>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing records. New inserts get ids above the largest seeded id.
    pub fn with_records(mut records: Vec<FeedbackRecord>) -> Self {
        records.sort_by_key(|r| r.id);
        let next_id = records.last().map_or(1, |r| r.id + 1);
        Self {
            inner: Mutex::new(Inner { records, next_id }),
        }
    }

    /// Fetch one record by id.
    pub fn get(&self, id: i64) -> Result<FeedbackRecord, StoreError> {
        self.lock()?
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Other("memory store lock poisoned".into()))
    }

    fn select(
        &self,
        pred: impl Fn(&FeedbackRecord) -> bool,
    ) -> Result<Vec<FeedbackRecord>, StoreError> {
        Ok(self
            .lock()?
            .records
            .iter()
            .filter(|r| pred(r))
            .cloned()
            .collect())
    }
}

impl FeedbackStore for MemoryStore {
    fn insert(
        &self,
        submission: &FeedbackSubmission,
        submitted_at: &str,
    ) -> Result<FeedbackRecord, StoreError> {
        let mut inner = self.lock()?;
        let id = inner.next_id.max(1);
        inner.next_id = id + 1;

        let record = FeedbackRecord {
            id,
            complaint_id: submission.complaint_id.clone(),
            category: submission.category.clone(),
            subcategory: submission.subcategory.clone(),
            feedback_message: submission.feedback_message.clone(),
            rating: submission.rating,
            name: submission.name.clone(),
            email: submission.email.clone(),
            submitted_at: submitted_at.to_string(),
            sentiment: None,
            sentiment_confidence: None,
        };
        inner.records.push(record.clone());
        Ok(record)
    }

    fn all(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.select(|_| true)
    }

    fn missing_sentiment(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.select(FeedbackRecord::needs_sentiment)
    }

    fn by_rating_and_sentiment(
        &self,
        ratings: &[i32],
        labels: &[Sentiment],
    ) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.select(|r| {
            r.rating.is_some_and(|rating| ratings.contains(&rating))
                && r
                    .sentiment
                    .as_deref()
                    .is_some_and(|s| labels.iter().any(|l| l.as_str() == s))
        })
    }

    fn set_sentiment(&self, id: i64, verdict: &SentimentVerdict) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        record.sentiment = Some(verdict.label.as_str().to_string());
        record.sentiment_confidence = Some(verdict.confidence);
        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.records.len())
    }
}
