//! Benchmark parameter types.

use std::fmt;

/// Parameters for a simulation benchmark run.
#[derive(Clone, Debug)]
pub struct SimulationBenchParams {
    /// Generated node count.
    pub nodes: usize,
    /// Rounds per run.
    pub steps: usize,
}

impl fmt::Display for SimulationBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},steps={}", self.nodes, self.steps)
    }
}

/// Parameters for a structural scoring benchmark run.
#[derive(Clone, Debug)]
pub struct ScoringBenchParams {
    /// Generated node count.
    pub nodes: usize,
}

impl fmt::Display for ScoringBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={}", self.nodes)
    }
}
