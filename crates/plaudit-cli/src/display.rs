//! Text cards for sentiment statistics, evaluation results, and run reports.

use std::fmt::Write;

use plaudit_ai::Evaluation;
use plaudit_core::{SentimentStats, SentimentVerdict};

use crate::reconcile::ReconcileReport;

const LABEL_WIDTH: usize = 12;
const BAR_WIDTH: usize = 30;

/// Render the overall distribution and the per-category breakdown.
pub fn render_stats(stats: &SentimentStats) -> String {
    let mut out = String::new();
    let d = &stats.sentiment_distribution;
    let _ = writeln!(
        out,
        "=== Sentiment Distribution ({} records) ===",
        stats.total_feedback
    );
    for (label, count, pct) in [
        ("POSITIVE", d.positive, d.positive_percent),
        ("NEGATIVE", d.negative, d.negative_percent),
        ("NEUTRAL", d.neutral, d.neutral_percent),
    ] {
        let _ = writeln!(
            out,
            "  {label:<LABEL_WIDTH$} {count:>6}  {pct:>5.1}%  {}",
            bar(pct)
        );
    }
    if d.unlabelled > 0 {
        let _ = writeln!(out, "  {:<LABEL_WIDTH$} {:>6}", "unlabelled", d.unlabelled);
    }
    if let Some(avg) = stats.avg_rating {
        let _ = writeln!(out, "  {:<LABEL_WIDTH$} {avg:>6.1}", "avg rating");
    }

    if stats.category_sentiment.is_empty() {
        return out;
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "── By Category ──");
    let width = stats
        .category_sentiment
        .iter()
        .map(|c| c.category.len())
        .max()
        .unwrap_or(0);
    for c in &stats.category_sentiment {
        let avg = c
            .avg_rating
            .map_or_else(|| "-".to_string(), |a| format!("{a:.1}"));
        let _ = writeln!(
            out,
            "  {:<width$}  n={:<5} +{:<4} -{:<4} ={:<4} {:>5.1}% positive  avg rating {avg}",
            c.category, c.total, c.positive, c.negative, c.neutral, c.positive_percent
        );
    }
    out
}

pub fn render_evaluation(eval: &Evaluation, provider: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Model Evaluation ===");
    let _ = writeln!(out, "  provider   {}", provider.unwrap_or("keyword fallback"));
    let _ = writeln!(out, "  samples    {}", eval.total);
    let _ = writeln!(out, "  evaluated  {}  ({} neutral excluded)", eval.evaluated, eval.excluded());
    let _ = writeln!(out, "  correct    {}", eval.correct);
    match eval.accuracy_percent() {
        Some(acc) => {
            let _ = writeln!(out, "  accuracy   {acc:.2}%");
        }
        None => {
            let _ = writeln!(out, "  accuracy   n/a");
        }
    }
    let _ = writeln!(
        out,
        "  predicted  POSITIVE {}  NEGATIVE {}  NEUTRAL {}",
        eval.predicted_positive, eval.predicted_negative, eval.predicted_neutral
    );
    out
}

pub fn render_report(report: &ReconcileReport) -> String {
    let mut out = String::new();
    for p in &report.passes {
        let _ = write!(
            out,
            "  {:<20} matched {:>5}  updated {:>5}  failed {:>5}",
            p.pass.as_str(),
            p.matched,
            p.updated,
            p.failed
        );
        if let Some(reason) = &p.aborted {
            let _ = write!(out, "  ABORTED: {reason}");
        }
        let _ = writeln!(out);
    }
    out
}

pub fn render_verdict(verdict: &SentimentVerdict) -> String {
    format!("{} ({:.4})", verdict.label, verdict.confidence)
}

fn bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled.min(BAR_WIDTH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{Pass, PassReport};
    use plaudit_core::{FeedbackRecord, Sentiment};

    fn rec(category: &str, rating: Option<i32>, sentiment: Option<&str>) -> FeedbackRecord {
        FeedbackRecord {
            id: 0,
            complaint_id: "C".into(),
            category: category.into(),
            subcategory: String::new(),
            feedback_message: String::new(),
            rating,
            name: String::new(),
            email: String::new(),
            submitted_at: String::new(),
            sentiment: sentiment.map(String::from),
            sentiment_confidence: None,
        }
    }

    #[test]
    fn stats_card_lists_labels_and_categories() {
        let stats = SentimentStats::from_records(&[
            rec("Cleanliness", Some(1), Some("NEGATIVE")),
            rec("Punctuality", Some(5), Some("POSITIVE")),
            rec("Punctuality", None, None),
        ]);
        let card = render_stats(&stats);
        assert!(card.starts_with("=== Sentiment Distribution (3 records) ==="));
        assert!(card.contains("POSITIVE"));
        assert!(card.contains("unlabelled"));
        assert!(card.contains("Cleanliness"));
        assert!(card.contains("avg rating 5.0"));
        // overall: (1 + 5) / 2
        assert!(card.contains("avg rating      3.0"));
    }

    #[test]
    fn empty_stats_card() {
        let card = render_stats(&SentimentStats::from_records(&[]));
        assert!(!card.contains("By Category"));
        assert!(!card.contains("unlabelled"));
        assert!(!card.contains("avg rating"));
    }

    #[test]
    fn evaluation_card() {
        let eval = Evaluation {
            total: 10,
            evaluated: 8,
            correct: 6,
            predicted_positive: 4,
            predicted_negative: 3,
            predicted_neutral: 1,
        };
        let card = render_evaluation(&eval, None);
        assert!(card.contains("keyword fallback"));
        assert!(card.contains("75.00%"));
        assert!(card.contains("2 neutral excluded"));
    }

    #[test]
    fn report_marks_aborted_pass() {
        let report = ReconcileReport {
            passes: vec![PassReport {
                pass: Pass::FillMissing,
                matched: 0,
                updated: 0,
                failed: 0,
                aborted: Some("connection reset".into()),
            }],
        };
        assert!(render_report(&report).contains("ABORTED: connection reset"));
    }

    #[test]
    fn verdict_format() {
        let v = SentimentVerdict::new(Sentiment::Positive, 0.8);
        assert_eq!(render_verdict(&v), "POSITIVE (0.8000)");
    }

    #[test]
    fn bar_is_bounded() {
        assert_eq!(bar(0.0), "");
        assert_eq!(bar(100.0).len(), BAR_WIDTH);
        assert_eq!(bar(250.0).len(), BAR_WIDTH);
    }
}
