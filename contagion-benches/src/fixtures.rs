//! Constant collaborators isolating engine cost from oracle cost.

use contagion_core::{
    CollaboratorError, Graph, InfectionOracle, StructuralScores, TextRiskOracle,
};

/// Structural oracle reporting one probability for every node.
#[derive(Clone, Copy, Debug)]
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

/// Text risk oracle returning a fixed score.
#[derive(Clone, Copy, Debug)]
pub struct FixedRisk(pub f64);

impl TextRiskOracle for FixedRisk {
    fn name(&self) -> &str {
        "fixed-risk"
    }

    fn score(&self, _text: &str) -> Result<f64, CollaboratorError> {
        Ok(self.0)
    }
}
