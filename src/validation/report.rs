// Quality report types.
//
// A report is recomputed on every validation run; the latest one is also
// stored as a JSON snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::SentimentLabel;

use super::coherence::CoherenceCell;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub label: SentimentLabel,
    pub count: usize,
    /// Share of all reviews, 0-100
    pub percentage: f64,
    pub avg_rating: Option<f64>,
    pub avg_confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub language: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub count: usize,
    /// Share of reviews with a topic, 0-100
    pub percentage: f64,
    pub avg_confidence: f64,
    pub sample_keywords: Vec<String>,
}

/// Sentiment counts among reviews of one topic category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySentiment {
    pub category: String,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRollup {
    pub bank: String,
    pub total_reviews: usize,
    pub avg_rating: f64,
    pub positive: usize,
    pub negative: usize,
}

/// Fractions of all reviews, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub sentiment: f64,
    pub topic: f64,
    pub language: f64,
}

/// Advisory findings. They never fail a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QualityWarning {
    LowSentimentCoverage { actual: f64, threshold: f64 },
    LowTopicCoverage { actual: f64, threshold: f64 },
    LowCoherence { actual: f64, threshold: f64 },
    LowConfidence { actual: f64, threshold: f64 },
}

impl std::fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityWarning::LowSentimentCoverage { actual, threshold } => write!(
                f,
                "Low sentiment coverage: {:.1}% (expected at least {:.0}%)",
                actual * 100.0,
                threshold * 100.0
            ),
            QualityWarning::LowTopicCoverage { actual, threshold } => write!(
                f,
                "Low topic coverage: {:.1}% (expected at least {:.0}%)",
                actual * 100.0,
                threshold * 100.0
            ),
            QualityWarning::LowCoherence { actual, threshold } => write!(
                f,
                "Low rating/sentiment coherence: {:.1}% (expected at least {:.0}%)",
                actual * 100.0,
                threshold * 100.0
            ),
            QualityWarning::LowConfidence { actual, threshold } => write!(
                f,
                "Low mean sentiment confidence: {actual:.3} (expected at least {threshold:.2})"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub generated_at: DateTime<Utc>,
    pub total_reviews: usize,
    pub sentiment: Vec<SentimentBreakdown>,
    pub coherence: Vec<CoherenceCell>,
    pub coherent_reviews: usize,
    /// coherent / total reviews (unscored reviews count as incoherent)
    pub coherence_rate: f64,
    pub languages: Vec<LanguageShare>,
    pub categories: Vec<CategoryBreakdown>,
    pub category_sentiment: Vec<CategorySentiment>,
    pub banks: Vec<BankRollup>,
    pub coverage: Coverage,
    /// None when no review was scored
    pub mean_sentiment_confidence: Option<f64>,
    /// Share of scored reviews where the secondary estimator points the same
    /// way as the label. None when no review was scored.
    pub scorer_agreement: Option<f64>,
    /// Reviews the scorer failed on; filled from the error sink
    pub sentiment_errors: usize,
    pub warnings: Vec<QualityWarning>,
}

impl QualityReport {
    pub fn with_sentiment_errors(mut self, count: usize) -> Self {
        self.sentiment_errors = count;
        self
    }

    pub fn sentiment_count(&self, label: SentimentLabel) -> usize {
        self.sentiment
            .iter()
            .find(|s| s.label == label)
            .map_or(0, |s| s.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display() {
        let w = QualityWarning::LowTopicCoverage {
            actual: 0.5,
            threshold: 0.7,
        };
        assert_eq!(w.to_string(), "Low topic coverage: 50.0% (expected at least 70%)");

        let w = QualityWarning::LowConfidence {
            actual: 0.1234,
            threshold: 0.3,
        };
        assert_eq!(
            w.to_string(),
            "Low mean sentiment confidence: 0.123 (expected at least 0.30)"
        );
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let w = QualityWarning::LowCoherence {
            actual: 0.5,
            threshold: 0.7,
        };
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["kind"], "low_coherence");
        assert_eq!(json["threshold"], 0.7);
    }
}
