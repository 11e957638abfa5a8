// Quality validation: coverage, rating/sentiment coherence, per-bank rollups.

pub mod audit;
pub mod coherence;
pub mod report;

pub use audit::{audit, QualityThresholds};
pub use coherence::RatingBands;
pub use report::{QualityReport, QualityWarning};
