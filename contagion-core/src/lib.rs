//! Contagion core library.
//!
//! Models message spread over a social graph as a discrete-time stochastic
//! process. Per-edge transmission probability blends a structural oracle's
//! per-node score with a run-wide content risk, optionally divided by a tuned
//! suppression factor.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod collaborator;
mod config;
mod engine;
mod error;
mod graph;
mod leaderboard;
mod record;
#[cfg(test)]
mod test_utils;

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
pub use crate::config::RunRequest;
pub use crate::{
    collaborator::{
        Collaborators, DEFAULT_STRUCTURAL_PROBABILITY, InfectionOracle, ParameterTuner,
        SUPPRESSION_RANGE, StructuralScores, TextRiskOracle, TunedParameters,
    },
    config::{ParseStrategyError, RunConfig, RunConfigBuilder, Strategy},
    engine::{
        CONTENT_WEIGHT, RunPhase, STRUCTURAL_WEIGHT, Simulation, SimulationEngine,
        transmission_probability,
    },
    error::{CollaboratorError, CollaboratorErrorCode, ContagionError, ContagionErrorCode, Result},
    graph::{
        BlockList, CustomGraph, DEFAULT_TRUST, GeneratedEdges, Graph, GraphGenerator, GraphSpec,
        GraphTopology, ImportedLink, ImportedNode, InfectionState, InfluenceTier, Node, NodeId,
        NodeKey, PreferentialAttachment, TopologyLink, TopologyNode, build_generated, build_graph,
    },
    leaderboard::{LEADERBOARD_SIZE, LeaderboardEntry, TransmissionLedger},
    record::{ActivationPath, RunMetadata, RunOutput, StepRecord},
};
