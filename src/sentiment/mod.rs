// Sentiment scoring: two independent polarity estimators behind a trait.
//
// The lexicon/rule scorer produces the compound score that drives the label.
// The secondary estimator's score is kept alongside it so the quality audit
// can measure how often the two disagree.

pub mod traits;
pub mod tokens;
pub mod lexicon;
pub mod polarity;
pub mod scorer;

pub use scorer::{classify, SentimentScore, SentimentScorer, SentimentThresholds};
