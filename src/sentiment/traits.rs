// Polarity estimator trait: the swap-ready abstraction.
//
// Both sentiment estimators implement this. Replacing the rule-based scorer
// with a model-backed one only needs a new implementation, not changes to
// the pipeline.

use anyhow::Result;

/// Scores a text's polarity on a [-1, 1] scale.
pub trait PolarityEstimator: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Score a single text. Empty text scores 0.0.
    fn polarity(&self, text: &str) -> Result<f64>;
}

/// Estimator that always fails. Useful for exercising per-review error
/// handling without a real backend.
pub struct FailingEstimator;

impl PolarityEstimator for FailingEstimator {
    fn name(&self) -> &str {
        "failing"
    }

    fn polarity(&self, _text: &str) -> Result<f64> {
        anyhow::bail!("FailingEstimator never produces a score")
    }
}
