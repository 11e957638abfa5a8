// Data models: Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use serde::{Deserialize, Serialize};

/// Language code used when no detector path recognizes the text.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// A single review handed over by the staging collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub review_id: String,
    pub bank: String,
    pub agency: Option<String>,
    pub author: Option<String>,
    /// Star rating, 1 to 5
    pub rating: f64,
    pub review_date: Option<String>,
    pub raw_text: String,
}

impl Review {
    /// Minimal constructor for the fields the analytics actually read.
    pub fn new(review_id: impl Into<String>, bank: impl Into<String>, rating: f64, text: impl Into<String>) -> Self {
        Self {
            review_id: review_id.into(),
            bank: bank.into(),
            agency: None,
            author: None,
            rating,
            review_date: None,
            raw_text: text.into(),
        }
    }

    /// Length of the review text in characters (not bytes).
    pub fn text_length(&self) -> usize {
        self.raw_text.chars().count()
    }
}

/// Sentiment label derived from the compound score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }

    /// Parse the stored string form. Unknown strings yield None.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "positive" => Some(SentimentLabel::Positive),
            "neutral" => Some(SentimentLabel::Neutral),
            "negative" => Some(SentimentLabel::Negative),
            _ => None,
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sentiment for one review: the label plus both raw estimator outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub review_id: String,
    pub sentiment: SentimentLabel,
    /// Lexicon/rule scorer output in [-1, 1]; drives the label
    pub compound_score: f64,
    /// Secondary estimator output in [-1, 1]; kept for disagreement checks
    pub secondary_score: f64,
    /// Always |compound_score|
    pub confidence: f64,
}

/// A per-review scoring failure. Excluded from aggregate confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentError {
    pub review_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageTag {
    pub review_id: String,
    /// ISO-639-1 code or "unknown"
    pub language: String,
}

impl LanguageTag {
    pub fn is_recognized(&self) -> bool {
        self.language != UNKNOWN_LANGUAGE
    }
}

/// One categorized topic of a cohort model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub topic_id: usize,
    /// Up to 10 keywords, heaviest first
    pub keywords: Vec<String>,
    pub weight_sum: f64,
    pub category: String,
    /// Matched keywords / total keywords
    pub category_confidence: f64,
}

/// The fitted topics of one language cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicModel {
    pub language: String,
    pub document_count: usize,
    pub vocabulary_size: usize,
    pub topics: Vec<Topic>,
}

impl TopicModel {
    pub fn topic(&self, topic_id: usize) -> Option<&Topic> {
        self.topics.iter().find(|t| t.topic_id == topic_id)
    }
}

/// A review's dominant topic within its language cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicAssignment {
    pub review_id: String,
    pub language: String,
    pub topic_id: usize,
    pub category: String,
    /// Max entry of the document's topic-probability vector
    pub confidence: f64,
    /// Leading keywords of the assigned topic
    pub keywords: Vec<String>,
}

/// The merge target read by the quality auditor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedReview {
    pub review: Review,
    pub sentiment: Option<SentimentResult>,
    pub language: LanguageTag,
    pub topic: Option<TopicAssignment>,
}
