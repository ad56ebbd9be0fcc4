//! Shared test utilities for `contagion-core`.

use std::sync::atomic::{AtomicUsize, Ordering};

use contagion_test_support::ci::property_test_profile::ProptestRunProfile;
use proptest::test_runner::Config as ProptestConfig;

use crate::{
    collaborator::{
        InfectionOracle, ParameterTuner, StructuralScores, TextRiskOracle, TunedParameters,
    },
    error::CollaboratorError,
    graph::Graph,
};

/// Builds a standard proptest configuration from the shared CI profile.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// Structural oracle reporting the same probability for every node.
pub(crate) struct UniformOracle(pub(crate) f64);

impl InfectionOracle for UniformOracle {
    fn name(&self) -> &str {
        "uniform"
    }

    fn predict(
        &self,
        graph: &Graph,
        _content_risk: f64,
    ) -> Result<StructuralScores, CollaboratorError> {
        Ok(graph.node_ids().map(|id| (id, self.0)).collect())
    }
}

/// Text risk oracle returning a fixed score.
pub(crate) struct FixedRisk(pub(crate) f64);

impl TextRiskOracle for FixedRisk {
    fn name(&self) -> &str {
        "fixed-risk"
    }

    fn score(&self, _text: &str) -> Result<f64, CollaboratorError> {
        Ok(self.0)
    }
}

/// Tuner returning fixed parameters and counting invocations.
pub(crate) struct FixedTuner {
    params: TunedParameters,
    calls: AtomicUsize,
}

impl FixedTuner {
    pub(crate) const fn with_suppression(suppression: f64) -> Self {
        Self {
            params: TunedParameters {
                risk_weight: 0.5,
                trust_weight: 0.5,
                suppression,
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl ParameterTuner for FixedTuner {
    fn name(&self) -> &str {
        "fixed-tuner"
    }

    fn optimize(&self) -> Result<TunedParameters, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.params)
    }
}
