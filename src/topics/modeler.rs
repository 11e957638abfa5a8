// Topic inference for one language cohort.
//
// normalized documents -> TF-IDF -> LDA -> per-topic keywords and
// per-document dominant topic. A cohort with too few usable documents, or
// any failure along the way, yields None: one bad cohort never aborts the
// run.

use anyhow::Result;
use tracing::{debug, warn};

use super::lda::{self, LdaConfig};
use super::vectorizer::{vectorize, VectorizerParams};

#[derive(Debug, Clone, PartialEq)]
pub struct TopicModelParams {
    /// Minimum number of non-empty documents to attempt modeling
    pub min_documents: usize,
    /// Keywords kept per topic
    pub max_keywords: usize,
    pub vectorizer: VectorizerParams,
    pub lda: LdaConfig,
}

impl Default for TopicModelParams {
    fn default() -> Self {
        Self {
            min_documents: 10,
            max_keywords: 10,
            vectorizer: VectorizerParams::default(),
            lda: LdaConfig::default(),
        }
    }
}

impl TopicModelParams {
    pub fn n_topics(&self) -> usize {
        self.lda.n_topics
    }
}

/// Top keywords of one topic, heaviest first.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicTerms {
    pub topic_id: usize,
    pub keywords: Vec<String>,
    /// Sum of the LDA weights of the returned keywords
    pub weight_sum: f64,
}

/// Dominant topic of one input document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTopics {
    /// Position of the document in the input slice
    pub document: usize,
    pub topic_id: usize,
    /// Probability of the dominant topic
    pub confidence: f64,
    pub distribution: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct TopicInference {
    pub topics: Vec<TopicTerms>,
    /// One entry per non-empty input document, in input order
    pub documents: Vec<DocumentTopics>,
    pub vocabulary_size: usize,
}

/// Index and value of the largest probability. The lowest index wins ties.
pub fn dominant_topic(distribution: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &p) in distribution.iter().enumerate() {
        match best {
            Some((_, b)) if p <= b => {}
            _ => best = Some((i, p)),
        }
    }
    best
}

/// Infer topics, logging and swallowing any failure.
pub fn infer_topics(documents: &[Vec<String>], params: &TopicModelParams) -> Option<TopicInference> {
    match try_infer_topics(documents, params) {
        Ok(inference) => inference,
        Err(e) => {
            warn!(
                documents = documents.len(),
                error = format!("{e:#}"),
                "Topic modeling failed, skipping cohort"
            );
            None
        }
    }
}

/// Infer topics. `Ok(None)` means there were too few non-empty documents.
pub fn try_infer_topics(
    documents: &[Vec<String>],
    params: &TopicModelParams,
) -> Result<Option<TopicInference>> {
    // Keep the original positions so results map back to the caller's input
    let (positions, usable): (Vec<usize>, Vec<Vec<String>>) = documents
        .iter()
        .enumerate()
        .filter(|(_, tokens)| !tokens.is_empty())
        .map(|(i, tokens)| (i, tokens.clone()))
        .unzip();

    if usable.len() < params.min_documents {
        debug!(
            usable = usable.len(),
            required = params.min_documents,
            "Not enough documents for topic modeling"
        );
        return Ok(None);
    }

    let matrix = vectorize(&usable, &params.vectorizer)?;
    let model = lda::fit(&matrix, &params.lda)?;
    let distributions = model.transform(&matrix)?;

    let topics = (0..model.n_topics())
        .map(|topic_id| {
            let top = model.top_terms(topic_id, params.max_keywords);
            TopicTerms {
                topic_id,
                weight_sum: top.iter().map(|(_, w)| w).sum(),
                keywords: top
                    .iter()
                    .filter_map(|&(v, _)| matrix.term(v).map(str::to_string))
                    .collect(),
            }
        })
        .collect();

    let mut assigned = Vec::with_capacity(distributions.len());
    for (document, distribution) in positions.into_iter().zip(distributions) {
        let Some((topic_id, confidence)) = dominant_topic(&distribution) else {
            anyhow::bail!("Empty topic distribution for document {document}");
        };
        assigned.push(DocumentTopics {
            document,
            topic_id,
            confidence,
            distribution,
        });
    }

    debug!(
        documents = assigned.len(),
        topics = model.n_topics(),
        vocabulary = matrix.n_terms(),
        "Topic model fitted"
    );

    Ok(Some(TopicInference {
        topics,
        documents: assigned,
        vocabulary_size: matrix.n_terms(),
    }))
}
