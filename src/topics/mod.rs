// Topic modeling: normalization, TF-IDF, LDA, and business categorization.

pub mod lda;
pub mod modeler;
pub mod normalize;
pub mod stopwords;
pub mod taxonomy;
pub mod traits;
pub mod vectorizer;

pub use modeler::{infer_topics, TopicInference, TopicModelParams};
pub use normalize::TextNormalizer;
pub use taxonomy::{Taxonomy, OTHER_CATEGORY};
pub use traits::{LdaTopicModeler, TopicModeler};
