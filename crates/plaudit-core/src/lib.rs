pub mod feedback;
pub mod sentiment;
pub mod stats;

pub use feedback::{FeedbackRecord, FeedbackSubmission, ReviewEntry, SubmissionError};
pub use sentiment::{
    EMPTY_TEXT_CONFIDENCE, KEYWORD_CONFIDENCE, KEYWORD_TIE_CONFIDENCE, RATING_CONFIDENCE,
    RATING_FALLBACK_CONFIDENCE, Sentiment, SentimentVerdict, map_rating_to_sentiment,
    sentiment_for_rating,
};
pub use stats::{
    CategorySentiment, RECENT_FEEDBACK_LIMIT, RecentFeedback, SentimentDistribution, SentimentStats,
};
