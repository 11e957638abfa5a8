// Rating/sentiment coherence.
//
// A star rating implies an expected sentiment direction. A scored review is
// coherent when its label matches that direction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::models::{EnrichedReview, SentimentLabel};

/// Rating cut-offs for the expected direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingBands {
    /// Ratings at or above this expect positive (default 4)
    pub positive_min: f64,
    /// Ratings at or below this expect negative (default 2)
    pub negative_max: f64,
}

impl Default for RatingBands {
    fn default() -> Self {
        Self {
            positive_min: 4.0,
            negative_max: 2.0,
        }
    }
}

impl RatingBands {
    pub fn expected(&self, rating: f64) -> SentimentLabel {
        if rating >= self.positive_min {
            SentimentLabel::Positive
        } else if rating <= self.negative_max {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// One cell of the expected-vs-actual cross-tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceCell {
    pub expected: SentimentLabel,
    pub actual: SentimentLabel,
    pub count: usize,
}

impl CoherenceCell {
    pub fn is_coherent(&self) -> bool {
        self.expected == self.actual
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Coherence {
    /// Non-empty cells only, ordered by (expected, actual)
    pub cells: Vec<CoherenceCell>,
    pub coherent: usize,
    pub scored: usize,
}

/// Cross-tabulate every scored review. Unscored reviews are skipped here but
/// still count in the coherence-rate denominator.
pub fn cross_tab(reviews: &[EnrichedReview], bands: &RatingBands) -> Coherence {
    let mut counts: BTreeMap<(SentimentLabel, SentimentLabel), usize> = BTreeMap::new();
    for enriched in reviews {
        let Some(sentiment) = &enriched.sentiment else {
            continue;
        };
        let expected = bands.expected(enriched.review.rating);
        *counts.entry((expected, sentiment.sentiment)).or_insert(0) += 1;
    }

    let cells: Vec<CoherenceCell> = counts
        .into_iter()
        .map(|((expected, actual), count)| CoherenceCell {
            expected,
            actual,
            count,
        })
        .collect();

    Coherence {
        coherent: cells.iter().filter(|c| c.is_coherent()).map(|c| c.count).sum(),
        scored: cells.iter().map(|c| c.count).sum(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{LanguageTag, Review, SentimentResult};

    fn enriched(id: &str, rating: f64, label: Option<SentimentLabel>) -> EnrichedReview {
        EnrichedReview {
            review: Review::new(id, "CIH", rating, "texte"),
            sentiment: label.map(|sentiment| SentimentResult {
                review_id: id.to_string(),
                sentiment,
                compound_score: 0.0,
                secondary_score: 0.0,
                confidence: 0.0,
            }),
            language: LanguageTag {
                review_id: id.to_string(),
                language: "fr".to_string(),
            },
            topic: None,
        }
    }

    #[test]
    fn test_expected_direction() {
        let bands = RatingBands::default();
        assert_eq!(bands.expected(5.0), SentimentLabel::Positive);
        assert_eq!(bands.expected(4.0), SentimentLabel::Positive);
        assert_eq!(bands.expected(3.0), SentimentLabel::Neutral);
        assert_eq!(bands.expected(3.5), SentimentLabel::Neutral);
        assert_eq!(bands.expected(2.0), SentimentLabel::Negative);
        assert_eq!(bands.expected(1.0), SentimentLabel::Negative);
    }

    #[test]
    fn test_cross_tab_counts() {
        let reviews = vec![
            enriched("1", 5.0, Some(SentimentLabel::Positive)),
            enriched("2", 1.0, Some(SentimentLabel::Negative)),
            enriched("3", 1.0, Some(SentimentLabel::Positive)),
            enriched("4", 3.0, Some(SentimentLabel::Neutral)),
            enriched("5", 4.0, None),
        ];
        let c = cross_tab(&reviews, &RatingBands::default());
        assert_eq!(c.scored, 4);
        assert_eq!(c.coherent, 3);
        assert_eq!(c.cells.len(), 4);
        assert!(c
            .cells
            .iter()
            .any(|cell| cell.expected == SentimentLabel::Negative
                && cell.actual == SentimentLabel::Positive
                && cell.count == 1));
    }

    #[test]
    fn test_empty_input() {
        let c = cross_tab(&[], &RatingBands::default());
        assert_eq!(c, Coherence::default());
    }
}
