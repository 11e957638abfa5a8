// Per-review signals: language tag + sentiment, fanned out over a bounded
// pool of blocking tasks.
//
// Results are keyed by review id, so completion order never shows up in the
// output. A task that panics still produces an outcome for its review: a
// sentiment error and an "unknown" language tag.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::db::models::{LanguageTag, Review, SentimentError, SentimentResult, UNKNOWN_LANGUAGE};
use crate::language::LanguageDetector;
use crate::sentiment::SentimentScorer;

#[derive(Debug, Clone, Default)]
pub struct ReviewSignals {
    pub sentiments: BTreeMap<String, SentimentResult>,
    pub errors: BTreeMap<String, SentimentError>,
    pub languages: BTreeMap<String, LanguageTag>,
}

impl ReviewSignals {
    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

struct Outcome {
    review_id: String,
    language: LanguageTag,
    sentiment: Result<SentimentResult>,
}

/// Build a progress bar, hidden when `visible` is false.
pub(crate) fn progress_bar(len: usize, label: &str, visible: bool) -> Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!("  {label} [{{bar:30}}] {{pos}}/{{len}} ({{eta}})"))?,
    );
    Ok(pb)
}

/// Detect language and score sentiment for every review.
pub async fn analyze_reviews(
    reviews: Vec<Review>,
    scorer: Arc<SentimentScorer>,
    detector: Arc<LanguageDetector>,
    concurrency: usize,
    show_progress: bool,
) -> Result<ReviewSignals> {
    let pb = progress_bar(reviews.len(), "Scoring", show_progress)?;

    let mut outcomes = stream::iter(reviews.into_iter().map(|review| {
        let scorer = Arc::clone(&scorer);
        let detector = Arc::clone(&detector);
        let review_id = review.review_id.clone();
        async move {
            let task = tokio::task::spawn_blocking(move || Outcome {
                review_id: review.review_id.clone(),
                language: detector.tag(&review),
                sentiment: scorer.score_review(&review),
            });
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => Outcome {
                    language: LanguageTag {
                        review_id: review_id.clone(),
                        language: UNKNOWN_LANGUAGE.to_string(),
                    },
                    sentiment: Err(anyhow::anyhow!("Scoring task for review {review_id} failed: {e}")),
                    review_id,
                },
            }
        }
    }))
    .buffer_unordered(concurrency.max(1));

    let mut signals = ReviewSignals::default();
    while let Some(outcome) = outcomes.next().await {
        signals
            .languages
            .insert(outcome.review_id.clone(), outcome.language);
        match outcome.sentiment {
            Ok(result) => {
                signals.sentiments.insert(outcome.review_id, result);
            }
            Err(e) => {
                warn!(review_id = %outcome.review_id, error = %e, "Sentiment scoring failed");
                signals.errors.insert(
                    outcome.review_id.clone(),
                    SentimentError {
                        review_id: outcome.review_id,
                        message: format!("{e:#}"),
                    },
                );
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        reviews = signals.len(),
        scored = signals.sentiments.len(),
        errors = signals.errors.len(),
        "Sentiment and language analysis complete"
    );

    Ok(signals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::traits::FailingEstimator;
    use crate::sentiment::SentimentThresholds;
    use crate::sentiment::lexicon::LexiconScorer;

    fn reviews() -> Vec<Review> {
        vec![
            Review::new("1", "CIH", 5.0, "Excellent accueil, personnel très aimable et efficace"),
            Review::new("2", "CIH", 1.0, "Service très mauvais, attente longue"),
            Review::new("3", "BMCE", 3.0, ""),
        ]
    }

    #[tokio::test]
    async fn test_every_review_gets_one_outcome() {
        let signals = analyze_reviews(
            reviews(),
            Arc::new(SentimentScorer::default()),
            Arc::new(LanguageDetector::new()),
            2,
            false,
        )
        .await
        .unwrap();

        assert_eq!(signals.len(), 3);
        assert_eq!(signals.sentiments.len() + signals.errors.len(), 3);
        assert_eq!(signals.languages["3"].language, UNKNOWN_LANGUAGE);
        assert_eq!(
            signals.sentiments["2"].sentiment,
            crate::db::models::SentimentLabel::Negative
        );
    }

    #[tokio::test]
    async fn test_failures_become_errors() {
        let scorer = SentimentScorer::with_estimators(
            Box::new(LexiconScorer::new()),
            Box::new(FailingEstimator),
            SentimentThresholds::default(),
        );
        let signals = analyze_reviews(
            reviews(),
            Arc::new(scorer),
            Arc::new(LanguageDetector::new()),
            4,
            false,
        )
        .await
        .unwrap();

        assert!(signals.sentiments.is_empty());
        assert_eq!(signals.errors.len(), 3);
        assert_eq!(signals.languages.len(), 3);
        assert!(signals.errors["1"].message.contains("review 1"));
    }
}
