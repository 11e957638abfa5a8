// Merge of raw reviews with their derived signals.

use std::collections::BTreeMap;

use crate::db::models::{
    EnrichedReview, LanguageTag, Review, SentimentResult, TopicAssignment, UNKNOWN_LANGUAGE,
};

/// One enriched record per review, in input order. A review with no
/// language tag is reported as "unknown".
pub fn enrich(
    reviews: Vec<Review>,
    sentiments: &BTreeMap<String, SentimentResult>,
    languages: &BTreeMap<String, LanguageTag>,
    topics: &BTreeMap<String, TopicAssignment>,
) -> Vec<EnrichedReview> {
    reviews
        .into_iter()
        .map(|review| {
            let id = review.review_id.as_str();
            let language = languages.get(id).cloned().unwrap_or_else(|| LanguageTag {
                review_id: review.review_id.clone(),
                language: UNKNOWN_LANGUAGE.to_string(),
            });
            EnrichedReview {
                sentiment: sentiments.get(id).cloned(),
                topic: topics.get(id).cloned(),
                language,
                review,
            }
        })
        .collect()
}

/// Index topic assignments by review id.
pub fn index_assignments(
    assignments: impl IntoIterator<Item = TopicAssignment>,
) -> BTreeMap<String, TopicAssignment> {
    assignments
        .into_iter()
        .map(|a| (a.review_id.clone(), a))
        .collect()
}
