//! Batch reconciliation of stored feedback sentiment.
//!
//! Three passes run in order: fill records with no sentiment, then force
//! POSITIVE on 4–5 star records, then force NEGATIVE on 1–2 star records.
//! Every write is a single-record update, so a failure on one record (or a
//! whole pass) leaves the rest of the run intact.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use plaudit_ai::Resolver;
use plaudit_core::{
    EMPTY_TEXT_CONFIDENCE, FeedbackRecord, RATING_CONFIDENCE, RATING_FALLBACK_CONFIDENCE,
    Sentiment, SentimentVerdict, map_rating_to_sentiment,
};
use plaudit_store::{FeedbackStore, StoreError};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    FillMissing,
    CorrectHighRated,
    CorrectLowRated,
}

impl Pass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FillMissing => "fill_missing",
            Self::CorrectHighRated => "correct_high_rated",
            Self::CorrectLowRated => "correct_low_rated",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub pass: Pass,
    /// Records selected by the pass query.
    pub matched: usize,
    pub updated: usize,
    /// Records whose update failed.
    pub failed: usize,
    /// Set when the pass could not run at all (e.g. its query failed).
    pub aborted: Option<String>,
}

impl PassReport {
    fn new(pass: Pass, matched: usize) -> Self {
        Self {
            pass,
            matched,
            updated: 0,
            failed: 0,
            aborted: None,
        }
    }

    fn aborted(pass: Pass, err: &StoreError) -> Self {
        Self {
            aborted: Some(err.to_string()),
            ..Self::new(pass, 0)
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.aborted.is_none()
    }
}

/// Outcome of a full run, one report per pass in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub passes: Vec<PassReport>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.passes.iter().all(PassReport::is_clean)
    }

    pub fn updated(&self) -> usize {
        self.passes.iter().map(|p| p.updated).sum()
    }

    pub fn failed(&self) -> usize {
        self.passes.iter().map(|p| p.failed).sum()
    }
}

pub struct Reconciler<'a> {
    store: &'a dyn FeedbackStore,
    resolver: &'a Resolver,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn FeedbackStore, resolver: &'a Resolver) -> Self {
        Self { store, resolver }
    }

    /// Run all three passes in order. A pass that fails outright is recorded
    /// and the next pass still runs.
    pub fn run_all(&self) -> ReconcileReport {
        let results = [
            (Pass::FillMissing, self.fill_missing()),
            (Pass::CorrectHighRated, self.correct_high_rated()),
            (Pass::CorrectLowRated, self.correct_low_rated()),
        ];

        let mut report = ReconcileReport::default();
        for (pass, result) in results {
            match result {
                Ok(r) => report.passes.push(r),
                Err(e) => {
                    error!(%pass, error = %e, "pass failed");
                    report.passes.push(PassReport::aborted(pass, &e));
                }
            }
        }

        info!(
            updated = report.updated(),
            failed = report.failed(),
            clean = report.is_clean(),
            "reconciliation complete"
        );
        report
    }

    /// Give every record with null or empty sentiment a label.
    pub fn fill_missing(&self) -> Result<PassReport, StoreError> {
        let records = self.store.missing_sentiment()?;
        info!(pass = %Pass::FillMissing, matched = records.len(), "records without sentiment");

        let mut report = PassReport::new(Pass::FillMissing, records.len());
        for record in &records {
            let verdict = self.fill_verdict(record);
            self.write(&mut report, record.id, &verdict);
        }

        info!(
            pass = %Pass::FillMissing,
            updated = report.updated,
            failed = report.failed,
            "filled missing sentiment"
        );
        Ok(report)
    }

    /// 4–5 star records labelled NEUTRAL or NEGATIVE become POSITIVE.
    pub fn correct_high_rated(&self) -> Result<PassReport, StoreError> {
        self.correct(
            Pass::CorrectHighRated,
            &[4, 5],
            &[Sentiment::Neutral, Sentiment::Negative],
            Sentiment::Positive,
        )
    }

    /// 1–2 star records labelled NEUTRAL or POSITIVE become NEGATIVE.
    pub fn correct_low_rated(&self) -> Result<PassReport, StoreError> {
        self.correct(
            Pass::CorrectLowRated,
            &[1, 2],
            &[Sentiment::Neutral, Sentiment::Positive],
            Sentiment::Negative,
        )
    }

    fn correct(
        &self,
        pass: Pass,
        ratings: &[i32],
        wrong: &[Sentiment],
        target: Sentiment,
    ) -> Result<PassReport, StoreError> {
        let records = self.store.by_rating_and_sentiment(ratings, wrong)?;
        info!(%pass, matched = records.len(), ?ratings, "records needing correction");

        let verdict = SentimentVerdict::new(target, RATING_CONFIDENCE);
        let mut report = PassReport::new(pass, records.len());
        for record in &records {
            self.write(&mut report, record.id, &verdict);
        }

        info!(
            %pass,
            updated = report.updated,
            failed = report.failed,
            label = %target,
            "corrected sentiment"
        );
        Ok(report)
    }

    fn fill_verdict(&self, record: &FeedbackRecord) -> SentimentVerdict {
        if let Some(verdict) = SentimentVerdict::from_rating(record.rating) {
            return verdict;
        }
        if record.feedback_message.trim().is_empty() {
            return SentimentVerdict::new(Sentiment::Neutral, EMPTY_TEXT_CONFIDENCE);
        }

        let resolved = panic::catch_unwind(AssertUnwindSafe(|| {
            self.resolver.resolve(&record.feedback_message, None)
        }));
        resolved.unwrap_or_else(|_| {
            warn!(id = record.id, "resolver panicked, labelling from rating");
            SentimentVerdict::new(
                map_rating_to_sentiment(record.rating),
                RATING_FALLBACK_CONFIDENCE,
            )
        })
    }

    fn write(&self, report: &mut PassReport, id: i64, verdict: &SentimentVerdict) {
        match self.store.set_sentiment(id, verdict) {
            Ok(()) => report.updated += 1,
            Err(e) => {
                error!(pass = %report.pass, id, error = %e, "failed to update record");
                report.failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plaudit_ai::{
        InferenceCapability, InferenceError, InferenceProvider, Prediction, SummaryBounds,
        SummaryPolicy,
    };
    use plaudit_core::FeedbackSubmission;
    use plaudit_store::MemoryStore;

    fn record(
        id: i64,
        rating: Option<i32>,
        message: &str,
        sentiment: Option<&str>,
    ) -> FeedbackRecord {
        FeedbackRecord {
            id,
            complaint_id: format!("C{id:03}"),
            category: "Punctuality".into(),
            subcategory: "Delay".into(),
            feedback_message: message.into(),
            rating,
            name: "Asha".into(),
            email: "asha@example.com".into(),
            submitted_at: "2024-03-01T09:00:00Z".into(),
            sentiment: sentiment.map(String::from),
            sentiment_confidence: sentiment.map(|_| 0.5),
        }
    }

    fn verdict_of(store: &MemoryStore, id: i64) -> (Option<String>, Option<f64>) {
        let r = store.get(id).unwrap();
        (r.sentiment, r.sentiment_confidence)
    }

    fn labelled(label: &str, confidence: f64) -> (Option<String>, Option<f64>) {
        (Some(label.to_string()), Some(confidence))
    }

    /// Delegates to a [`MemoryStore`], failing chosen operations.
    struct Flaky {
        inner: MemoryStore,
        fail_update_for: Option<i64>,
        fail_missing_query: bool,
    }

    impl FeedbackStore for Flaky {
        fn insert(
            &self,
            submission: &FeedbackSubmission,
            submitted_at: &str,
        ) -> Result<FeedbackRecord, StoreError> {
            self.inner.insert(submission, submitted_at)
        }

        fn all(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
            self.inner.all()
        }

        fn missing_sentiment(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
            if self.fail_missing_query {
                return Err(StoreError::Other("connection reset".into()));
            }
            self.inner.missing_sentiment()
        }

        fn by_rating_and_sentiment(
            &self,
            ratings: &[i32],
            labels: &[Sentiment],
        ) -> Result<Vec<FeedbackRecord>, StoreError> {
            self.inner.by_rating_and_sentiment(ratings, labels)
        }

        fn set_sentiment(&self, id: i64, verdict: &SentimentVerdict) -> Result<(), StoreError> {
            if self.fail_update_for == Some(id) {
                return Err(StoreError::Other("disk full".into()));
            }
            self.inner.set_sentiment(id, verdict)
        }
    }

    /// Labels everything NEGATIVE.
    struct Gloomy;

    impl InferenceProvider for Gloomy {
        fn name(&self) -> &str {
            "gloomy"
        }

        fn classify(&self, _text: &str) -> Result<Prediction, InferenceError> {
            Ok(Prediction {
                label: "NEGATIVE".into(),
                score: 0.95,
            })
        }

        fn summarize(&self, _text: &str, _bounds: SummaryBounds) -> Result<String, InferenceError> {
            Err(InferenceError::Unsupported("summarization"))
        }
    }

    struct Panicky;

    impl InferenceProvider for Panicky {
        fn name(&self) -> &str {
            "panicky"
        }

        fn classify(&self, _text: &str) -> Result<Prediction, InferenceError> {
            panic!("native runtime aborted");
        }

        fn summarize(&self, _text: &str, _bounds: SummaryBounds) -> Result<String, InferenceError> {
            Err(InferenceError::Unsupported("summarization"))
        }
    }

    fn resolver_with(provider: impl InferenceProvider + 'static) -> Resolver {
        Resolver::new(Some(InferenceCapability::new(
            Box::new(provider),
            SummaryPolicy::default(),
        )))
    }

    #[test]
    fn fill_missing_uses_rating_first() {
        let store = MemoryStore::with_records(vec![
            record(1, Some(1), "Excellent, great, helpful", None),
            record(2, Some(5), "bad poor rude", Some("")),
            record(3, Some(3), "good great helpful", None),
            record(4, Some(3), "   ", None),
            record(5, None, "", None),
            record(6, Some(4), "", Some("POSITIVE")),
        ]);
        let resolver = Resolver::unavailable();
        let report = Reconciler::new(&store, &resolver).fill_missing().unwrap();

        assert_eq!(report.matched, 5);
        assert_eq!(report.updated, 5);
        assert!(report.is_clean());
        assert_eq!(verdict_of(&store, 1), labelled("NEGATIVE", 0.8));
        assert_eq!(verdict_of(&store, 2), labelled("POSITIVE", 0.8));
        assert_eq!(verdict_of(&store, 3), labelled("POSITIVE", 0.7));
        assert_eq!(verdict_of(&store, 4), labelled("NEUTRAL", 0.6));
        assert_eq!(verdict_of(&store, 5), labelled("NEUTRAL", 0.6));
        // Already labelled: untouched.
        assert_eq!(verdict_of(&store, 6), labelled("POSITIVE", 0.5));
    }

    #[test]
    fn fill_missing_uses_provider_for_neutral_ratings() {
        let store = MemoryStore::with_records(vec![record(1, Some(3), "it was fine", None)]);
        let resolver = resolver_with(Gloomy);
        Reconciler::new(&store, &resolver).fill_missing().unwrap();
        assert_eq!(verdict_of(&store, 1), labelled("NEGATIVE", 0.95));
    }

    #[test]
    fn resolver_panic_falls_back_to_rating() {
        let store = MemoryStore::with_records(vec![
            record(1, Some(3), "good service", None),
            record(2, None, "good service", None),
            record(3, Some(2), "good service", None),
        ]);
        let resolver = resolver_with(Panicky);
        let report = Reconciler::new(&store, &resolver).fill_missing().unwrap();

        assert_eq!(report.updated, 3);
        assert_eq!(verdict_of(&store, 1), labelled("NEUTRAL", 0.7));
        assert_eq!(verdict_of(&store, 2), labelled("NEUTRAL", 0.7));
        // Rating short-circuit never reaches the provider.
        assert_eq!(verdict_of(&store, 3), labelled("NEGATIVE", 0.8));
    }

    #[test]
    fn corrections_only_touch_contradictions() {
        let store = MemoryStore::with_records(vec![
            record(1, Some(5), "", Some("NEGATIVE")),
            record(2, Some(4), "", Some("NEUTRAL")),
            record(3, Some(4), "", Some("POSITIVE")),
            record(4, Some(1), "", Some("POSITIVE")),
            record(5, Some(2), "", Some("NEUTRAL")),
            record(6, Some(2), "", Some("NEGATIVE")),
            record(7, Some(3), "", Some("POSITIVE")),
        ]);
        let resolver = Resolver::unavailable();
        let reconciler = Reconciler::new(&store, &resolver);

        let high = reconciler.correct_high_rated().unwrap();
        assert_eq!((high.matched, high.updated), (2, 2));
        let low = reconciler.correct_low_rated().unwrap();
        assert_eq!((low.matched, low.updated), (2, 2));

        assert_eq!(verdict_of(&store, 1), labelled("POSITIVE", 0.8));
        assert_eq!(verdict_of(&store, 2), labelled("POSITIVE", 0.8));
        assert_eq!(verdict_of(&store, 3), labelled("POSITIVE", 0.5));
        assert_eq!(verdict_of(&store, 4), labelled("NEGATIVE", 0.8));
        assert_eq!(verdict_of(&store, 5), labelled("NEGATIVE", 0.8));
        assert_eq!(verdict_of(&store, 6), labelled("NEGATIVE", 0.5));
        assert_eq!(verdict_of(&store, 7), labelled("POSITIVE", 0.5));
    }

    #[test]
    fn corrections_are_idempotent() {
        let store = MemoryStore::with_records(vec![
            record(1, Some(5), "", Some("NEUTRAL")),
            record(2, Some(1), "", Some("POSITIVE")),
        ]);
        let resolver = Resolver::unavailable();
        let reconciler = Reconciler::new(&store, &resolver);

        assert_eq!(reconciler.correct_high_rated().unwrap().matched, 1);
        assert_eq!(reconciler.correct_high_rated().unwrap().matched, 0);
        assert_eq!(reconciler.correct_low_rated().unwrap().matched, 1);
        assert_eq!(reconciler.correct_low_rated().unwrap().matched, 0);

        let second = reconciler.run_all();
        assert_eq!(second.updated(), 0);
        assert!(second.is_clean());
    }

    #[test]
    fn failing_record_does_not_block_others() {
        let records = (1..=5)
            .map(|id| record(id, Some(5), "great", None))
            .collect();
        let store = Flaky {
            inner: MemoryStore::with_records(records),
            fail_update_for: Some(3),
            fail_missing_query: false,
        };
        let resolver = Resolver::unavailable();
        let report = Reconciler::new(&store, &resolver).fill_missing().unwrap();

        assert_eq!(report.matched, 5);
        assert_eq!(report.updated, 4);
        assert_eq!(report.failed, 1);
        assert!(!report.is_clean());
        for id in [1, 2, 4, 5] {
            assert_eq!(verdict_of(&store.inner, id), labelled("POSITIVE", 0.8));
        }
        assert_eq!(verdict_of(&store.inner, 3), (None, None));
    }

    #[test]
    fn failing_pass_does_not_block_later_passes() {
        let store = Flaky {
            inner: MemoryStore::with_records(vec![
                record(1, Some(4), "", Some("NEGATIVE")),
                record(2, Some(2), "", Some("NEUTRAL")),
                record(3, Some(5), "", None),
            ]),
            fail_update_for: None,
            fail_missing_query: true,
        };
        let resolver = Resolver::unavailable();
        let report = Reconciler::new(&store, &resolver).run_all();

        assert_eq!(report.passes.len(), 3);
        assert_eq!(report.passes[0].pass, Pass::FillMissing);
        assert!(report.passes[0].aborted.is_some());
        assert_eq!(report.passes[1].updated, 1);
        assert_eq!(report.passes[2].updated, 1);
        assert!(!report.is_clean());
        assert_eq!(verdict_of(&store.inner, 3), (None, None));
    }

    #[test]
    fn high_rating_ends_positive_either_way() {
        // Direct: rating short-circuit in fill-missing.
        let store = MemoryStore::with_records(vec![record(1, Some(5), "awful awful", None)]);
        let resolver = resolver_with(Gloomy);
        let report = Reconciler::new(&store, &resolver).run_all();
        assert!(report.is_clean());
        assert_eq!(verdict_of(&store, 1), labelled("POSITIVE", 0.8));

        // Indirect: a text-derived NEGATIVE later corrected.
        let store = MemoryStore::with_records(vec![record(1, Some(5), "awful", Some("NEGATIVE"))]);
        let report = Reconciler::new(&store, &resolver).run_all();
        assert_eq!(report.passes[1].updated, 1);
        assert_eq!(verdict_of(&store, 1), labelled("POSITIVE", 0.8));
    }

    #[test]
    fn pass_order_and_names() {
        let store = MemoryStore::new();
        let resolver = Resolver::unavailable();
        let report = Reconciler::new(&store, &resolver).run_all();
        let names: Vec<_> = report.passes.iter().map(|p| p.pass.as_str()).collect();
        assert_eq!(names, ["fill_missing", "correct_high_rated", "correct_low_rated"]);
        assert!(report.is_clean());
    }
}
