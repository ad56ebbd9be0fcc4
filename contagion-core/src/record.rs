//! Output contract of a run: per-step records plus final topology and metadata.

use crate::{
    collaborator::TunedParameters, config::Strategy, graph::GraphTopology,
    leaderboard::LeaderboardEntry,
};

/// One successful transmission, as `[spreader, target]` display names.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivationPath(pub String, pub String);

impl ActivationPath {
    /// Display name of the spreader.
    #[must_use]
    pub const fn source(&self) -> &str {
        self.0.as_str()
    }

    /// Display name of the newly infected node.
    #[must_use]
    pub const fn target(&self) -> &str {
        self.1.as_str()
    }
}

/// Instrumentation emitted after each committed round.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepRecord {
    /// Zero-based round index.
    pub timestep: usize,
    /// Nodes in the round's active snapshot.
    pub active_spreaders: usize,
    /// Infected nodes after the round's commit.
    pub total_reach: usize,
    /// Display names infected in this round.
    pub newly_activated: Vec<String>,
    /// Successful transmissions in this round.
    pub activation_paths: Vec<ActivationPath>,
    /// Top spreaders by cumulative transmissions.
    pub live_top_5: Vec<LeaderboardEntry>,
}

/// Run-wide values reported alongside the records.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunMetadata {
    /// Content risk scored once for the run.
    pub calculated_risk: f64,
    /// Strategy the run executed.
    pub strategy_used: Strategy,
    /// Tuned parameters, present only for the genetic-optimized strategy.
    pub ga_params: Option<TunedParameters>,
}

/// Everything a completed run hands to transports and report assemblers.
///
/// The last entry of `results` always reflects the final committed state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunOutput {
    /// Step records in execution order.
    pub results: Vec<StepRecord>,
    /// Final graph snapshot.
    pub graph_topology: GraphTopology,
    /// Run-wide metadata.
    pub metadata: RunMetadata,
}

impl RunOutput {
    /// Final record, if any round was executed.
    #[must_use]
    pub fn last_step(&self) -> Option<&StepRecord> {
        self.results.last()
    }

    /// Reach after the last round; seeds only when no round ran.
    #[must_use]
    pub fn final_reach(&self) -> usize {
        self.last_step().map_or_else(
            || {
                self.graph_topology
                    .nodes
                    .iter()
                    .filter(|node| node.state == crate::graph::InfectionState::Infected)
                    .count()
            },
            |record| record.total_reach,
        )
    }
}
