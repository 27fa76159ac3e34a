//! Accuracy of text-only predictions against star-rating ground truth.
//!
//! Ground truth is the rating mapping (1–2 NEGATIVE, 4–5 POSITIVE). Rows
//! whose ground truth would be NEUTRAL are excluded, since the rating says
//! nothing definite about them.

use plaudit_core::{Sentiment, map_rating_to_sentiment};
use tracing::info;

use crate::resolver::Resolver;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Samples seen, including excluded ones.
    pub total: usize,
    /// Samples with a definite ground-truth label.
    pub evaluated: usize,
    pub correct: usize,
    pub predicted_positive: usize,
    pub predicted_negative: usize,
    pub predicted_neutral: usize,
}

impl Evaluation {
    /// Percentage of evaluated samples predicted correctly.
    pub fn accuracy_percent(&self) -> Option<f64> {
        (self.evaluated > 0).then(|| self.correct as f64 / self.evaluated as f64 * 100.0)
    }

    pub fn excluded(&self) -> usize {
        self.total - self.evaluated
    }
}

/// Score the resolver's text path over `(text, rating)` samples.
///
/// The rating is only used as ground truth; predictions never see it.
pub fn evaluate<'a, I>(resolver: &Resolver, samples: I) -> Evaluation
where
    I: IntoIterator<Item = (&'a str, Option<i32>)>,
{
    let mut eval = Evaluation::default();

    for (text, rating) in samples {
        eval.total += 1;
        let truth = map_rating_to_sentiment(rating);
        if truth == Sentiment::Neutral {
            continue;
        }
        eval.evaluated += 1;

        let predicted = resolver.analyze_text(text).label;
        match predicted {
            Sentiment::Positive => eval.predicted_positive += 1,
            Sentiment::Negative => eval.predicted_negative += 1,
            Sentiment::Neutral => eval.predicted_neutral += 1,
        }
        if predicted == truth {
            eval.correct += 1;
        }
    }

    info!(
        total = eval.total,
        evaluated = eval.evaluated,
        correct = eval.correct,
        "evaluation complete"
    );
    eval
}
