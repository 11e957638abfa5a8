// Sentiment scorer: combines both estimators and applies the label rule.
//
// The label comes from the compound (lexicon) score alone:
//   positive if compound >= positive threshold
//   negative if compound <= negative threshold
//   neutral otherwise
// confidence = |compound|. The secondary score is carried through untouched.

use anyhow::{Context, Result};

use crate::db::models::{Review, SentimentLabel, SentimentResult};

use super::lexicon::LexiconScorer;
use super::polarity::AveragedPolarity;
use super::traits::PolarityEstimator;

/// Compound-score cut-offs for the label rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentThresholds {
    /// Compound at or above this is positive (default 0.05)
    pub positive: f64,
    /// Compound at or below this is negative (default -0.05)
    pub negative: f64,
}

impl Default for SentimentThresholds {
    fn default() -> Self {
        Self {
            positive: 0.05,
            negative: -0.05,
        }
    }
}

/// Apply the threshold rule to a compound score.
pub fn classify(compound: f64, thresholds: &SentimentThresholds) -> SentimentLabel {
    if compound >= thresholds.positive {
        SentimentLabel::Positive
    } else if compound <= thresholds.negative {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Scores for one text, before it is tied to a review id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentScore {
    pub label: SentimentLabel,
    pub compound: f64,
    pub secondary: f64,
    pub confidence: f64,
}

impl SentimentScore {
    pub fn into_result(self, review_id: impl Into<String>) -> SentimentResult {
        SentimentResult {
            review_id: review_id.into(),
            sentiment: self.label,
            compound_score: self.compound,
            secondary_score: self.secondary,
            confidence: self.confidence,
        }
    }
}

pub struct SentimentScorer {
    primary: Box<dyn PolarityEstimator>,
    secondary: Box<dyn PolarityEstimator>,
    thresholds: SentimentThresholds,
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new(SentimentThresholds::default())
    }
}

impl SentimentScorer {
    /// Lexicon scorer as primary, averaged polarity as secondary.
    pub fn new(thresholds: SentimentThresholds) -> Self {
        Self::with_estimators(
            Box::new(LexiconScorer::new()),
            Box::new(AveragedPolarity::new()),
            thresholds,
        )
    }

    pub fn with_estimators(
        primary: Box<dyn PolarityEstimator>,
        secondary: Box<dyn PolarityEstimator>,
        thresholds: SentimentThresholds,
    ) -> Self {
        Self {
            primary,
            secondary,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &SentimentThresholds {
        &self.thresholds
    }

    /// Score a text with both estimators.
    ///
    /// Fails if either estimator fails or returns a non-finite value; the
    /// caller records that as a per-review error.
    pub fn score(&self, text: &str) -> Result<SentimentScore> {
        let compound = checked(self.primary.as_ref(), text)?;
        let secondary = checked(self.secondary.as_ref(), text)?;

        Ok(SentimentScore {
            label: classify(compound, &self.thresholds),
            compound,
            secondary,
            confidence: compound.abs(),
        })
    }

    pub fn score_review(&self, review: &Review) -> Result<SentimentResult> {
        let score = self
            .score(&review.raw_text)
            .with_context(|| format!("Failed to score review {}", review.review_id))?;
        Ok(score.into_result(review.review_id.clone()))
    }
}

fn checked(estimator: &dyn PolarityEstimator, text: &str) -> Result<f64> {
    let value = estimator.polarity(text)?;
    if !value.is_finite() {
        anyhow::bail!("{} estimator returned a non-finite score", estimator.name());
    }
    Ok(value.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::traits::FailingEstimator;

    #[test]
    fn test_classify_boundaries() {
        let t = SentimentThresholds::default();
        assert_eq!(classify(0.05, &t), SentimentLabel::Positive);
        assert_eq!(classify(-0.05, &t), SentimentLabel::Negative);
        assert_eq!(classify(0.0499, &t), SentimentLabel::Neutral);
        assert_eq!(classify(-0.0499, &t), SentimentLabel::Neutral);
        assert_eq!(classify(0.0, &t), SentimentLabel::Neutral);
    }

    #[test]
    fn test_confidence_is_abs_compound() {
        let scorer = SentimentScorer::default();
        for text in ["très mauvais", "excellent accueil", "rien à signaler", ""] {
            let score = scorer.score(text).unwrap();
            assert_eq!(score.confidence, score.compound.abs());
        }
    }

    #[test]
    fn test_secondary_is_kept_even_when_it_disagrees() {
        let scorer = SentimentScorer::default();
        let score = scorer.score("bon accueil mais lent").unwrap();
        // Lexicon weights the clause after "mais", the averaged estimator does not
        assert_eq!(score.label, SentimentLabel::Negative);
        assert!(score.secondary > 0.0);
    }

    #[test]
    fn test_estimator_failure_is_an_error() {
        let scorer = SentimentScorer::with_estimators(
            Box::new(LexiconScorer::new()),
            Box::new(FailingEstimator),
            SentimentThresholds::default(),
        );
        let review = Review::new("42", "CIH", 1.0, "nul");
        let err = scorer.score_review(&review).unwrap_err();
        assert!(format!("{err:#}").contains("review 42"));
    }
}
