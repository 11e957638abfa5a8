// Language detection: statistical identification with a lexicon fallback.
//
// The detected language decides which cohort a review joins for topic
// modeling, so a wrong guess only moves a review between cohorts; it never
// drops the review.

pub mod detector;

pub use detector::LanguageDetector;
