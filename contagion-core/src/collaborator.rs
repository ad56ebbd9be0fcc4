//! Contracts for the external collaborators consulted by the engine.
//!
//! The engine never inspects how a collaborator reaches its answer; it only
//! consumes one scalar per node (structural oracle), one scalar per run
//! (text risk) and one parameter vector per run (tuner).

use std::collections::HashMap;

use crate::{
    error::CollaboratorError,
    graph::{Graph, NodeId},
};

/// Probability reported for nodes the structural oracle omits.
pub const DEFAULT_STRUCTURAL_PROBABILITY: f64 = 0.1;

/// Inclusive bounds of the tuned suppression factor.
pub const SUPPRESSION_RANGE: (f64, f64) = (0.5, 2.0);

/// Per-node structural infection probabilities returned by an [`InfectionOracle`].
///
/// Lookups degrade to [`DEFAULT_STRUCTURAL_PROBABILITY`] for omitted nodes and
/// for entries that are not finite probabilities.
///
/// # Examples
/// ```
/// use contagion_core::{NodeId, StructuralScores};
///
/// let mut scores = StructuralScores::default();
/// scores.insert(NodeId::new(0), 0.7);
/// scores.insert(NodeId::new(1), f64::NAN);
/// assert_eq!(scores.probability(NodeId::new(0)), 0.7);
/// assert_eq!(scores.probability(NodeId::new(1)), 0.1);
/// assert_eq!(scores.probability(NodeId::new(2)), 0.1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuralScores {
    scores: HashMap<NodeId, f64>,
}

impl StructuralScores {
    /// Records the probability for `node`, replacing earlier entries.
    pub fn insert(&mut self, node: NodeId, probability: f64) {
        self.scores.insert(node, probability);
    }

    /// Probability for `node`, or the default for missing or invalid entries.
    #[must_use]
    pub fn probability(&self, node: NodeId) -> f64 {
        self.scores
            .get(&node)
            .copied()
            .filter(|value| (0.0..=1.0).contains(value))
            .unwrap_or(DEFAULT_STRUCTURAL_PROBABILITY)
    }

    /// Number of entries reported, valid or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether the oracle reported nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl FromIterator<(NodeId, f64)> for StructuralScores {
    fn from_iter<T: IntoIterator<Item = (NodeId, f64)>>(iter: T) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

/// Scores how likely each node is to become infected given the graph's
/// topology and current infection state.
///
/// Called once per step; implementations must not rely on being called a
/// particular number of times and never see a mutable graph.
pub trait InfectionOracle: Send + Sync {
    /// Human-readable collaborator name used in diagnostics.
    fn name(&self) -> &str;

    /// Predicts a structural probability per node.
    ///
    /// # Errors
    /// Implementations may return a [`CollaboratorError`]; the engine treats a
    /// failed call as if every node were omitted.
    fn predict(
        &self,
        graph: &Graph,
        content_risk: f64,
    ) -> Result<StructuralScores, CollaboratorError>;
}

/// Scores the risk of a message once per run.
pub trait TextRiskOracle: Send + Sync {
    /// Human-readable collaborator name used in diagnostics.
    fn name(&self) -> &str;

    /// Returns a risk score in `[0, 1]`.
    ///
    /// # Errors
    /// Any error is fatal to the run that requested the score.
    fn score(&self, text: &str) -> Result<f64, CollaboratorError>;
}

/// Parameters proposed by a [`ParameterTuner`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TunedParameters {
    /// Weight given to content risk by the tuner's objective.
    pub risk_weight: f64,
    /// Weight given to trust by the tuner's objective.
    pub trust_weight: f64,
    /// Divisor applied to the blended transmission probability.
    pub suppression: f64,
}

impl TunedParameters {
    /// Checks the suppression factor against [`SUPPRESSION_RANGE`].
    ///
    /// # Errors
    /// Returns [`CollaboratorError::OutOfRange`] for a non-finite or
    /// out-of-range suppression.
    pub fn validate(&self) -> Result<(), CollaboratorError> {
        let (min, max) = SUPPRESSION_RANGE;
        if (min..=max).contains(&self.suppression) {
            Ok(())
        } else {
            Err(CollaboratorError::OutOfRange {
                field: "suppression",
                value: self.suppression,
                min,
                max,
            })
        }
    }
}

/// Black-box optimiser proposing suppression and weighting parameters.
pub trait ParameterTuner: Send + Sync {
    /// Human-readable collaborator name used in diagnostics.
    fn name(&self) -> &str;

    /// Runs the optimisation and returns the best parameters found.
    ///
    /// # Errors
    /// Any error is fatal to the run that requested tuning.
    fn optimize(&self) -> Result<TunedParameters, CollaboratorError>;
}

/// Collaborator handles constructed once by the process and lent to each run.
///
/// # Examples
/// ```
/// use contagion_core::{
///     CollaboratorError, Collaborators, Graph, InfectionOracle, StructuralScores, TextRiskOracle,
/// };
///
/// struct Flat;
/// impl InfectionOracle for Flat {
///     fn name(&self) -> &str { "flat" }
///     fn predict(&self, _: &Graph, _: f64) -> Result<StructuralScores, CollaboratorError> {
///         Ok(StructuralScores::default())
///     }
/// }
/// struct Calm;
/// impl TextRiskOracle for Calm {
///     fn name(&self) -> &str { "calm" }
///     fn score(&self, _: &str) -> Result<f64, CollaboratorError> { Ok(0.0) }
/// }
///
/// let collaborators = Collaborators::new(&Flat, &Calm);
/// assert!(collaborators.tuner().is_none());
/// ```
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    infection: &'a dyn InfectionOracle,
    text_risk: &'a dyn TextRiskOracle,
    tuner: Option<&'a dyn ParameterTuner>,
}

impl<'a> Collaborators<'a> {
    /// Bundles the two mandatory oracles.
    #[must_use]
    pub const fn new(infection: &'a dyn InfectionOracle, text_risk: &'a dyn TextRiskOracle) -> Self {
        Self {
            infection,
            text_risk,
            tuner: None,
        }
    }

    /// Adds the tuner consulted by the genetic-optimized strategy.
    #[must_use]
    pub const fn with_tuner(mut self, tuner: &'a dyn ParameterTuner) -> Self {
        self.tuner = Some(tuner);
        self
    }

    /// Structural oracle.
    #[must_use]
    pub const fn infection(&self) -> &'a dyn InfectionOracle {
        self.infection
    }

    /// Text risk oracle.
    #[must_use]
    pub const fn text_risk(&self) -> &'a dyn TextRiskOracle {
        self.text_risk
    }

    /// Optional tuner.
    #[must_use]
    pub const fn tuner(&self) -> Option<&'a dyn ParameterTuner> {
        self.tuner
    }
}

impl std::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("infection", &self.infection.name())
            .field("text_risk", &self.text_risk.name())
            .field("tuner", &self.tuner.map(ParameterTuner::name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(0.5, true)]
    #[case(2.0, true)]
    #[case(1.2, true)]
    #[case(0.49, false)]
    #[case(2.01, false)]
    #[case(f64::INFINITY, false)]
    #[case(f64::NAN, false)]
    fn suppression_bounds_are_inclusive(#[case] suppression: f64, #[case] valid: bool) {
        let params = TunedParameters {
            risk_weight: 0.5,
            trust_weight: 0.5,
            suppression,
        };
        assert_eq!(params.validate().is_ok(), valid);
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.1)]
    #[case(f64::NEG_INFINITY)]
    fn out_of_range_scores_degrade_to_default(#[case] raw: f64) {
        let scores: StructuralScores = [(NodeId::new(3), raw)].into_iter().collect();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores.probability(NodeId::new(3)), DEFAULT_STRUCTURAL_PROBABILITY);
    }
}
