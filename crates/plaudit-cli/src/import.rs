//! App-store review dumps: loading, importing as feedback, and evaluation samples.

use std::path::Path;

use anyhow::Context;
use plaudit_core::ReviewEntry;
use plaudit_store::FeedbackStore;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    /// Reviews with no text.
    pub skipped: usize,
    pub failed: usize,
}

/// Read a JSON array of reviews as written by a Play Store scraper.
pub fn load_reviews(path: &Path) -> anyhow::Result<Vec<ReviewEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading reviews from {}", path.display()))?;
    let reviews: Vec<ReviewEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing reviews in {}", path.display()))?;
    info!(count = reviews.len(), path = %path.display(), "loaded reviews");
    Ok(reviews)
}

/// Insert each review with text as a feedback record with sentiment unset.
pub fn import_reviews(
    store: &dyn FeedbackStore,
    reviews: &[ReviewEntry],
    imported_at: &str,
) -> ImportReport {
    let mut report = ImportReport::default();
    for (i, review) in reviews.iter().enumerate() {
        let Some(submission) = review.to_submission(i + 1) else {
            report.skipped += 1;
            continue;
        };
        let submitted_at = review.at.as_deref().unwrap_or(imported_at);
        match store.insert(&submission, submitted_at) {
            Ok(_) => report.inserted += 1,
            Err(e) => {
                error!(complaint_id = %submission.complaint_id, error = %e, "failed to import review");
                report.failed += 1;
            }
        }
    }
    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        failed = report.failed,
        "review import complete"
    );
    report
}
