//! Fitness objectives scored by the genetic search.

use contagion_core::TunedParameters;

/// Scores a candidate; higher is better.
pub trait FitnessObjective: Send + Sync {
    /// Fitness of `candidate`. Non-finite values rank below every finite one.
    fn fitness(&self, candidate: &TunedParameters) -> f64;
}

/// Rewards low suppression and high risk weighting.
///
/// `100 / (suppression + 0.1) + 50 * risk_weight`
///
/// # Examples
/// ```
/// use contagion_core::TunedParameters;
/// use contagion_providers_genetic::{EngagementSafety, FitnessObjective};
///
/// let params = TunedParameters { risk_weight: 1.0, trust_weight: 0.5, suppression: 0.9 };
/// assert!((EngagementSafety.fitness(&params) - 150.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementSafety;

impl FitnessObjective for EngagementSafety {
    fn fitness(&self, candidate: &TunedParameters) -> f64 {
        100.0 / (candidate.suppression + 0.1) + 50.0 * candidate.risk_weight
    }
}

impl<F> FitnessObjective for F
where
    F: Fn(&TunedParameters) -> f64 + Send + Sync,
{
    fn fitness(&self, candidate: &TunedParameters) -> f64 {
        self(candidate)
    }
}
