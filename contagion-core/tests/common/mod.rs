#![expect(dead_code, reason = "each integration test uses a different subset")]

use std::sync::atomic::{AtomicUsize, Ordering};

use contagion_core::{
    CollaboratorError, CustomGraph, Graph, ImportedLink, ImportedNode, InfectionOracle,
    ParameterTuner, StructuralScores, TextRiskOracle, TunedParameters,
};

/// Reports the same structural probability for every node.
pub struct UniformOracle(pub f64);

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

/// Reports nothing, leaving every node on the default probability.
pub struct SilentOracle;

impl InfectionOracle for SilentOracle {
    fn name(&self) -> &str {
        "silent"
    }

    fn predict(
        &self,
        _graph: &Graph,
        _content_risk: f64,
    ) -> Result<StructuralScores, CollaboratorError> {
        Ok(StructuralScores::default())
    }
}

/// Fails every call.
pub struct FailingOracle;

impl InfectionOracle for FailingOracle {
    fn name(&self) -> &str {
        "failing"
    }

    fn predict(
        &self,
        _graph: &Graph,
        _content_risk: f64,
    ) -> Result<StructuralScores, CollaboratorError> {
        Err(CollaboratorError::unavailable("model offline"))
    }
}

/// Returns a fixed risk and counts calls.
pub struct FixedRisk {
    risk: f64,
    calls: AtomicUsize,
}

impl FixedRisk {
    pub fn new(risk: f64) -> Self {
        Self {
            risk,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl TextRiskOracle for FixedRisk {
    fn name(&self) -> &str {
        "fixed-risk"
    }

    fn score(&self, _text: &str) -> Result<f64, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.risk)
    }
}

/// Text oracle that cannot answer.
pub struct BrokenRisk;

impl TextRiskOracle for BrokenRisk {
    fn name(&self) -> &str {
        "broken-risk"
    }

    fn score(&self, _text: &str) -> Result<f64, CollaboratorError> {
        Err(CollaboratorError::malformed("no label scores in response"))
    }
}

/// Tuner returning a fixed suppression factor.
pub struct FixedTuner(pub f64);

impl ParameterTuner for FixedTuner {
    fn name(&self) -> &str {
        "fixed-tuner"
    }

    fn optimize(&self) -> Result<TunedParameters, CollaboratorError> {
        Ok(TunedParameters {
            risk_weight: 0.5,
            trust_weight: 0.5,
            suppression: self.0,
        })
    }
}

/// Imported ring `n0 - n1 - ... - n(size-1) - n0`.
pub fn ring(size: usize) -> CustomGraph {
    let nodes = (0..size)
        .map(|index| ImportedNode::new(format!("n{index}")))
        .collect();
    let links = (0..size)
        .map(|index| {
            ImportedLink::new(format!("n{index}"), format!("n{}", (index + 1) % size))
        })
        .collect();
    CustomGraph { nodes, links }
}
