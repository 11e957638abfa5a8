// Language cohorts and per-cohort topic modeling.
//
// Reviews are partitioned into owned cohorts, one per detected language, so
// each model task holds its own corpus. A cohort's assignments only exist as
// a whole CohortTopics value: a failed or panicked cohort contributes
// nothing.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::db::models::{LanguageTag, Review, TopicAssignment, TopicModel};
use crate::topics::taxonomy::Taxonomy;
use crate::topics::{TextNormalizer, TopicModeler};

/// Keywords copied onto each assignment.
pub const ASSIGNMENT_KEYWORDS: usize = 5;

/// The normalized documents of one language.
#[derive(Debug, Clone, PartialEq)]
pub struct Cohort {
    pub language: String,
    /// Parallel to `documents`
    pub review_ids: Vec<String>,
    pub documents: Vec<Vec<String>>,
}

impl Cohort {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CohortTopics {
    pub model: TopicModel,
    pub assignments: Vec<TopicAssignment>,
}

/// Group reviews by detected language.
///
/// Skipped: reviews tagged "unknown" or not tagged at all, and reviews whose
/// text has `min_text_chars` characters or fewer. Cohorts come out sorted by
/// language; reviews keep their input order.
pub fn partition_cohorts(
    reviews: &[Review],
    languages: &BTreeMap<String, LanguageTag>,
    normalizer: &TextNormalizer,
    min_text_chars: usize,
) -> Vec<Cohort> {
    let mut cohorts: BTreeMap<&str, Cohort> = BTreeMap::new();

    for review in reviews {
        let Some(tag) = languages.get(&review.review_id) else {
            continue;
        };
        if !tag.is_recognized() || review.text_length() <= min_text_chars {
            continue;
        }
        let cohort = cohorts.entry(tag.language.as_str()).or_insert_with(|| Cohort {
            language: tag.language.clone(),
            review_ids: Vec::new(),
            documents: Vec::new(),
        });
        cohort.review_ids.push(review.review_id.clone());
        cohort.documents.push(normalizer.normalize(&review.raw_text));
    }

    cohorts.into_values().collect()
}

/// Fit, categorize, and assign topics for one cohort.
pub fn model_cohort(
    cohort: &Cohort,
    modeler: &dyn TopicModeler,
    taxonomy: &Taxonomy,
) -> Option<CohortTopics> {
    let Some(inference) = modeler.infer(&cohort.documents) else {
        info!(
            language = %cohort.language,
            documents = cohort.len(),
            "No topic model for cohort"
        );
        return None;
    };

    let topics = taxonomy.categorize_topics(&inference.topics);

    let mut assignments = Vec::with_capacity(inference.documents.len());
    for doc in &inference.documents {
        let (Some(review_id), Some(topic)) = (
            cohort.review_ids.get(doc.document),
            topics.iter().find(|t| t.topic_id == doc.topic_id),
        ) else {
            warn!(
                language = %cohort.language,
                document = doc.document,
                topic_id = doc.topic_id,
                "Topic result does not match the cohort, discarding cohort"
            );
            return None;
        };
        assignments.push(TopicAssignment {
            review_id: review_id.clone(),
            language: cohort.language.clone(),
            topic_id: doc.topic_id,
            category: topic.category.clone(),
            confidence: doc.confidence,
            keywords: topic.keywords.iter().take(ASSIGNMENT_KEYWORDS).cloned().collect(),
        });
    }

    info!(
        language = %cohort.language,
        documents = cohort.len(),
        assigned = assignments.len(),
        topics = topics.len(),
        "Cohort topic model built"
    );

    Some(CohortTopics {
        model: TopicModel {
            language: cohort.language.clone(),
            document_count: assignments.len(),
            vocabulary_size: inference.vocabulary_size,
            topics,
        },
        assignments,
    })
}

/// Model every cohort in parallel, one blocking task per cohort.
///
/// Output is sorted by language. Cohorts that yield nothing, or whose task
/// panics, are left out.
pub async fn model_cohorts(
    cohorts: Vec<Cohort>,
    modeler: Arc<dyn TopicModeler>,
    taxonomy: Arc<Taxonomy>,
    concurrency: usize,
) -> Vec<CohortTopics> {
    let mut results: Vec<CohortTopics> = stream::iter(cohorts.into_iter().map(|cohort| {
        let modeler = Arc::clone(&modeler);
        let taxonomy = Arc::clone(&taxonomy);
        async move {
            let language = cohort.language.clone();
            match tokio::task::spawn_blocking(move || {
                model_cohort(&cohort, modeler.as_ref(), &taxonomy)
            })
            .await
            {
                Ok(result) => result,
                Err(e) => {
                    warn!(language = %language, error = %e, "Topic modeling task failed, skipping cohort");
                    None
                }
            }
        }
    }))
    .buffer_unordered(concurrency.max(1))
    .filter_map(|result| async move { result })
    .collect()
    .await;

    results.sort_by(|a, b| a.model.language.cmp(&b.model.language));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::modeler::{DocumentTopics, TopicInference, TopicTerms};

    fn tag(id: &str, language: &str) -> (String, LanguageTag) {
        (
            id.to_string(),
            LanguageTag {
                review_id: id.to_string(),
                language: language.to_string(),
            },
        )
    }

    /// Puts every document on topic 0 with the given keywords.
    struct SingleTopic(Vec<&'static str>);

    impl TopicModeler for SingleTopic {
        fn infer(&self, documents: &[Vec<String>]) -> Option<TopicInference> {
            Some(TopicInference {
                topics: vec![TopicTerms {
                    topic_id: 0,
                    keywords: self.0.iter().map(|k| k.to_string()).collect(),
                    weight_sum: 1.0,
                }],
                documents: (0..documents.len())
                    .map(|document| DocumentTopics {
                        document,
                        topic_id: 0,
                        confidence: 1.0,
                        distribution: vec![1.0],
                    })
                    .collect(),
                vocabulary_size: 3,
            })
        }
    }

    struct Panics;

    impl TopicModeler for Panics {
        fn infer(&self, _documents: &[Vec<String>]) -> Option<TopicInference> {
            panic!("model blew up");
        }
    }

    #[test]
    fn test_partition_skips_unknown_and_short() {
        let reviews = vec![
            Review::new("1", "CIH", 2.0, "Attente beaucoup trop longue au guichet"),
            Review::new("2", "CIH", 2.0, "Trop court"),
            Review::new("3", "CIH", 2.0, "Long enough english review text"),
            Review::new("4", "CIH", 2.0, "?????????????????????????"),
            Review::new("5", "CIH", 2.0, "Untagged review with plenty of text"),
        ];
        let languages: BTreeMap<_, _> =
            [tag("1", "fr"), tag("2", "fr"), tag("3", "en"), tag("4", "unknown")]
                .into_iter()
                .collect();

        let cohorts = partition_cohorts(&reviews, &languages, &TextNormalizer::default(), 20);
        assert_eq!(cohorts.len(), 2);
        assert_eq!(cohorts[0].language, "en");
        assert_eq!(cohorts[1].language, "fr");
        assert_eq!(cohorts[1].review_ids, vec!["1"]);
        assert_eq!(cohorts[1].documents.len(), 1);
    }

    #[test]
    fn test_model_cohort_builds_assignments() {
        let cohort = Cohort {
            language: "fr".to_string(),
            review_ids: vec!["a".to_string(), "b".to_string()],
            documents: vec![vec!["frais".to_string()], vec!["cher".to_string()]],
        };
        let modeler = SingleTopic(vec!["frais", "cher", "prix", "tarif", "commission", "retrait"]);
        let result = model_cohort(&cohort, &modeler, &Taxonomy::default()).unwrap();

        assert_eq!(result.model.topics[0].category, "fees");
        assert_eq!(result.assignments.len(), 2);
        assert_eq!(result.assignments[1].review_id, "b");
        assert_eq!(result.assignments[0].keywords.len(), ASSIGNMENT_KEYWORDS);
        assert_eq!(result.assignments[0].category, "fees");
    }

    #[tokio::test]
    async fn test_panicking_cohort_is_dropped() {
        let cohort = Cohort {
            language: "fr".to_string(),
            review_ids: vec!["a".to_string()],
            documents: vec![vec!["frais".to_string()]],
        };
        let results = model_cohorts(vec![cohort], Arc::new(Panics), Arc::new(Taxonomy::default()), 2).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_model_cohorts_sorted_by_language() {
        let make = |language: &str| Cohort {
            language: language.to_string(),
            review_ids: vec!["x".to_string()],
            documents: vec![vec!["application".to_string()]],
        };
        let results = model_cohorts(
            vec![make("fr"), make("ar"), make("en")],
            Arc::new(SingleTopic(vec!["application"])),
            Arc::new(Taxonomy::default()),
            3,
        )
        .await;
        let languages: Vec<_> = results.iter().map(|r| r.model.language.as_str()).collect();
        assert_eq!(languages, vec!["ar", "en", "fr"]);
    }
}
