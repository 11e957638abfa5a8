// Topic modeler trait, so the cohort pipeline can run against a stand-in.

use super::modeler::{infer_topics, TopicInference, TopicModelParams};

/// Infers topics for one cohort of normalized documents.
///
/// Implementations must not fail: an unusable cohort is `None`.
pub trait TopicModeler: Send + Sync {
    fn infer(&self, documents: &[Vec<String>]) -> Option<TopicInference>;
}

/// TF-IDF + LDA.
#[derive(Debug, Clone, Default)]
pub struct LdaTopicModeler {
    pub params: TopicModelParams,
}

impl LdaTopicModeler {
    pub fn new(params: TopicModelParams) -> Self {
        Self { params }
    }
}

impl TopicModeler for LdaTopicModeler {
    fn infer(&self, documents: &[Vec<String>]) -> Option<TopicInference> {
        infer_topics(documents, &self.params)
    }
}
