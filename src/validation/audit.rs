// Quality audit over enriched reviews.
//
// Read-only: takes the merged records, returns a report. Every ratio guards
// its denominator; an empty input is "no data" and yields None.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::models::{EnrichedReview, SentimentLabel};
use crate::sentiment::{classify, SentimentThresholds};

use super::coherence::{cross_tab, RatingBands};
use super::report::{
    BankRollup, CategoryBreakdown, CategorySentiment, Coverage, LanguageShare, QualityReport,
    QualityWarning, SentimentBreakdown,
};

/// Sample keywords kept per topic category.
const SAMPLE_KEYWORDS: usize = 5;

/// Minimum acceptable values; anything below raises a warning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub min_sentiment_coverage: f64,
    pub min_topic_coverage: f64,
    pub min_coherence: f64,
    pub min_confidence: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_sentiment_coverage: 0.90,
            min_topic_coverage: 0.70,
            min_coherence: 0.70,
            min_confidence: 0.30,
        }
    }
}

/// `n / d`, or 0 when `d` is 0.
pub fn ratio(n: usize, d: usize) -> f64 {
    if d == 0 {
        0.0
    } else {
        n as f64 / d as f64
    }
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

pub fn audit(
    reviews: &[EnrichedReview],
    thresholds: &QualityThresholds,
    bands: &RatingBands,
) -> Option<QualityReport> {
    let total = reviews.len();
    if total == 0 {
        return None;
    }

    let scored: Vec<&EnrichedReview> = reviews.iter().filter(|r| r.sentiment.is_some()).collect();
    let with_topic = reviews.iter().filter(|r| r.topic.is_some()).count();
    let recognized = reviews.iter().filter(|r| r.language.is_recognized()).count();

    let coverage = Coverage {
        sentiment: ratio(scored.len(), total),
        topic: ratio(with_topic, total),
        language: ratio(recognized, total),
    };

    let coherence = cross_tab(reviews, bands);
    let coherence_rate = ratio(coherence.coherent, total);

    let mean_sentiment_confidence =
        mean(scored.iter().filter_map(|r| r.sentiment.as_ref().map(|s| s.confidence)));

    // The secondary score is read with the default label thresholds
    let agreement_thresholds = SentimentThresholds::default();
    let agreeing = scored
        .iter()
        .filter_map(|r| r.sentiment.as_ref())
        .filter(|s| classify(s.secondary_score, &agreement_thresholds) == s.sentiment)
        .count();
    let scorer_agreement = (!scored.is_empty()).then(|| ratio(agreeing, scored.len()));

    let warnings = collect_warnings(&coverage, coherence_rate, mean_sentiment_confidence, thresholds);

    let report = QualityReport {
        generated_at: chrono::Utc::now(),
        total_reviews: total,
        sentiment: sentiment_breakdown(reviews),
        coherence: coherence.cells,
        coherent_reviews: coherence.coherent,
        coherence_rate,
        languages: language_shares(reviews),
        categories: category_breakdown(reviews),
        category_sentiment: category_sentiment(reviews),
        banks: bank_rollups(reviews),
        coverage,
        mean_sentiment_confidence,
        scorer_agreement,
        sentiment_errors: 0,
        warnings,
    };

    info!(
        reviews = total,
        sentiment_coverage = report.coverage.sentiment,
        topic_coverage = report.coverage.topic,
        coherence = report.coherence_rate,
        warnings = report.warnings.len(),
        "Quality audit complete"
    );

    Some(report)
}

fn collect_warnings(
    coverage: &Coverage,
    coherence_rate: f64,
    mean_confidence: Option<f64>,
    thresholds: &QualityThresholds,
) -> Vec<QualityWarning> {
    let mut warnings = Vec::new();
    if coverage.sentiment < thresholds.min_sentiment_coverage {
        warnings.push(QualityWarning::LowSentimentCoverage {
            actual: coverage.sentiment,
            threshold: thresholds.min_sentiment_coverage,
        });
    }
    if coverage.topic < thresholds.min_topic_coverage {
        warnings.push(QualityWarning::LowTopicCoverage {
            actual: coverage.topic,
            threshold: thresholds.min_topic_coverage,
        });
    }
    if coherence_rate < thresholds.min_coherence {
        warnings.push(QualityWarning::LowCoherence {
            actual: coherence_rate,
            threshold: thresholds.min_coherence,
        });
    }
    if let Some(confidence) = mean_confidence {
        if confidence < thresholds.min_confidence {
            warnings.push(QualityWarning::LowConfidence {
                actual: confidence,
                threshold: thresholds.min_confidence,
            });
        }
    }
    warnings
}

fn sentiment_breakdown(reviews: &[EnrichedReview]) -> Vec<SentimentBreakdown> {
    SentimentLabel::ALL
        .iter()
        .map(|&label| {
            let matching: Vec<_> = reviews
                .iter()
                .filter_map(|r| {
                    r.sentiment
                        .as_ref()
                        .filter(|s| s.sentiment == label)
                        .map(|s| (r.review.rating, s.confidence))
                })
                .collect();
            SentimentBreakdown {
                label,
                count: matching.len(),
                percentage: ratio(matching.len(), reviews.len()) * 100.0,
                avg_rating: mean(matching.iter().map(|(rating, _)| *rating)),
                avg_confidence: mean(matching.iter().map(|(_, confidence)| *confidence)),
            }
        })
        .collect()
}

fn language_shares(reviews: &[EnrichedReview]) -> Vec<LanguageShare> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in reviews {
        *counts.entry(r.language.language.as_str()).or_insert(0) += 1;
    }
    let mut shares: Vec<LanguageShare> = counts
        .into_iter()
        .map(|(language, count)| LanguageShare {
            language: language.to_string(),
            count,
            percentage: ratio(count, reviews.len()) * 100.0,
        })
        .collect();
    // Most common first; BTreeMap order breaks ties alphabetically
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

fn category_breakdown(reviews: &[EnrichedReview]) -> Vec<CategoryBreakdown> {
    struct Acc {
        count: usize,
        confidence: f64,
        keywords: BTreeSet<String>,
        samples: Vec<String>,
    }

    let mut by_category: BTreeMap<&str, Acc> = BTreeMap::new();
    let mut assigned = 0;
    for topic in reviews.iter().filter_map(|r| r.topic.as_ref()) {
        assigned += 1;
        let acc = by_category.entry(topic.category.as_str()).or_insert(Acc {
            count: 0,
            confidence: 0.0,
            keywords: BTreeSet::new(),
            samples: Vec::new(),
        });
        acc.count += 1;
        acc.confidence += topic.confidence;
        for keyword in &topic.keywords {
            if acc.samples.len() < SAMPLE_KEYWORDS && acc.keywords.insert(keyword.clone()) {
                acc.samples.push(keyword.clone());
            }
        }
    }

    let mut categories: Vec<CategoryBreakdown> = by_category
        .into_iter()
        .map(|(category, acc)| CategoryBreakdown {
            category: category.to_string(),
            count: acc.count,
            percentage: ratio(acc.count, assigned) * 100.0,
            avg_confidence: acc.confidence / acc.count as f64,
            sample_keywords: acc.samples,
        })
        .collect();
    categories.sort_by(|a, b| b.count.cmp(&a.count));
    categories
}

fn category_sentiment(reviews: &[EnrichedReview]) -> Vec<CategorySentiment> {
    let mut by_category: BTreeMap<&str, [usize; 3]> = BTreeMap::new();
    for r in reviews {
        let (Some(topic), Some(sentiment)) = (&r.topic, &r.sentiment) else {
            continue;
        };
        let counts = by_category.entry(topic.category.as_str()).or_insert([0; 3]);
        match sentiment.sentiment {
            SentimentLabel::Positive => counts[0] += 1,
            SentimentLabel::Neutral => counts[1] += 1,
            SentimentLabel::Negative => counts[2] += 1,
        }
    }
    by_category
        .into_iter()
        .map(|(category, [positive, neutral, negative])| CategorySentiment {
            category: category.to_string(),
            positive,
            neutral,
            negative,
        })
        .collect()
}

fn bank_rollups(reviews: &[EnrichedReview]) -> Vec<BankRollup> {
    let mut by_bank: BTreeMap<&str, Vec<&EnrichedReview>> = BTreeMap::new();
    for r in reviews {
        by_bank.entry(r.review.bank.as_str()).or_default().push(r);
    }

    let count_label = |group: &[&EnrichedReview], label: SentimentLabel| {
        group
            .iter()
            .filter(|r| r.sentiment.as_ref().is_some_and(|s| s.sentiment == label))
            .count()
    };

    let mut banks: Vec<BankRollup> = by_bank
        .into_iter()
        .map(|(bank, group)| BankRollup {
            bank: bank.to_string(),
            total_reviews: group.len(),
            avg_rating: mean(group.iter().map(|r| r.review.rating)).unwrap_or(0.0),
            positive: count_label(&group, SentimentLabel::Positive),
            negative: count_label(&group, SentimentLabel::Negative),
        })
        .collect();
    banks.sort_by(|a, b| b.total_reviews.cmp(&a.total_reviews));
    banks
}
