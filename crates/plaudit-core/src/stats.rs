//! Sentiment distribution over a set of feedback records.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::feedback::FeedbackRecord;
use crate::sentiment::Sentiment;

/// Label counts and rating average for one feedback category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySentiment {
    pub category: String,
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub positive_percent: f64,
    /// Mean over rated records; `None` when no record in the category is rated.
    pub avg_rating: Option<f64>,
}

/// How many records carry each label.
///
/// Percentages are of all records (labelled and unlabelled alike) and rounded
/// to one decimal place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    /// Records whose sentiment is unset or not a recognised label.
    pub unlabelled: usize,
    pub positive_percent: f64,
    pub negative_percent: f64,
    pub neutral_percent: f64,
}

/// One row of the recent-feedback list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentFeedback {
    pub id: i64,
    pub feedback_message: String,
    pub rating: Option<i32>,
    pub sentiment: Option<String>,
    pub sentiment_confidence: Option<f64>,
    pub submitted_at: String,
}

impl From<&FeedbackRecord> for RecentFeedback {
    fn from(r: &FeedbackRecord) -> Self {
        Self {
            id: r.id,
            feedback_message: r.feedback_message.clone(),
            rating: r.rating,
            sentiment: r.sentiment.clone(),
            sentiment_confidence: r.sentiment_confidence,
            submitted_at: r.submitted_at.clone(),
        }
    }
}

/// Longest recent-feedback list in [`SentimentStats`].
pub const RECENT_FEEDBACK_LIMIT: usize = 10;

/// Dashboard payload: overall distribution, average rating, per-category
/// breakdown, and the newest feedback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentStats {
    pub total_feedback: usize,
    pub sentiment_distribution: SentimentDistribution,
    /// Mean over rated records; `None` when nothing is rated.
    pub avg_rating: Option<f64>,
    /// Sorted by category name.
    pub category_sentiment: Vec<CategorySentiment>,
    /// Newest first by `submitted_at`, at most [`RECENT_FEEDBACK_LIMIT`] entries.
    pub recent_feedback: Vec<RecentFeedback>,
}

#[derive(Default)]
struct Tally {
    total: usize,
    positive: usize,
    negative: usize,
    neutral: usize,
    rating_sum: i64,
    rated: usize,
}

impl Tally {
    fn avg_rating(&self) -> Option<f64> {
        (self.rated > 0).then(|| round1(self.rating_sum as f64 / self.rated as f64))
    }

    fn add(&mut self, record: &FeedbackRecord) {
        self.total += 1;
        match record.sentiment_label() {
            Some(Sentiment::Positive) => self.positive += 1,
            Some(Sentiment::Negative) => self.negative += 1,
            Some(Sentiment::Neutral) => self.neutral += 1,
            None => {}
        }
        if let Some(r) = record.rating {
            self.rating_sum += i64::from(r);
            self.rated += 1;
        }
    }
}

impl SentimentStats {
    pub fn from_records(records: &[FeedbackRecord]) -> Self {
        let mut overall = Tally::default();
        let mut by_category: BTreeMap<&str, Tally> = BTreeMap::new();

        for record in records {
            overall.add(record);
            by_category
                .entry(record.category.as_str())
                .or_default()
                .add(record);
        }

        let categories = by_category
            .into_iter()
            .map(|(category, t)| CategorySentiment {
                category: category.to_string(),
                total: t.total,
                positive: t.positive,
                negative: t.negative,
                neutral: t.neutral,
                positive_percent: percent(t.positive, t.total),
                avg_rating: t.avg_rating(),
            })
            .collect();

        let mut recent: Vec<&FeedbackRecord> = records.iter().collect();
        recent.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        let recent_feedback = recent
            .into_iter()
            .take(RECENT_FEEDBACK_LIMIT)
            .map(RecentFeedback::from)
            .collect();

        let labelled = overall.positive + overall.negative + overall.neutral;
        Self {
            total_feedback: overall.total,
            sentiment_distribution: SentimentDistribution {
                positive: overall.positive,
                negative: overall.negative,
                neutral: overall.neutral,
                unlabelled: overall.total - labelled,
                positive_percent: percent(overall.positive, overall.total),
                negative_percent: percent(overall.negative, overall.total),
                neutral_percent: percent(overall.neutral, overall.total),
            },
            avg_rating: overall.avg_rating(),
            category_sentiment: categories,
            recent_feedback,
        }
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(part as f64 / total as f64 * 100.0)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
