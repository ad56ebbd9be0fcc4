//! Candidate evaluation and conflict resolution for a single round.

use std::collections::HashSet;

use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::rng::attempt_rng;
use crate::{
    collaborator::{StructuralScores, TunedParameters},
    graph::{Graph, InfectionState, NodeId},
};

/// Weight of the structural oracle's score in the blended probability.
pub const STRUCTURAL_WEIGHT: f64 = 0.8;

/// Weight of the content risk in the blended probability.
pub const CONTENT_WEIGHT: f64 = 0.2;

/// Blends the structural and content signals into one transmission probability.
///
/// When tuned parameters are present the blend is divided by their
/// suppression factor. The result is not clamped; values above one always
/// transmit.
///
/// # Examples
/// ```
/// use contagion_core::{TunedParameters, transmission_probability};
///
/// let p = transmission_probability(0.5, 0.0, None);
/// assert!((p - 0.4).abs() < 1e-12);
///
/// let tuned = TunedParameters { risk_weight: 0.5, trust_weight: 0.5, suppression: 2.0 };
/// let suppressed = transmission_probability(0.5, 0.0, Some(&tuned));
/// assert!((suppressed - 0.2).abs() < 1e-12);
/// ```
#[must_use]
pub fn transmission_probability(
    structural: f64,
    content_risk: f64,
    tuned: Option<&TunedParameters>,
) -> f64 {
    let blended = STRUCTURAL_WEIGHT * structural + CONTENT_WEIGHT * content_risk;
    tuned.map_or(blended, |params| blended / params.suppression)
}

/// Successful draws of one active node, in ascending neighbour order.
pub(super) type Candidates = (NodeId, Vec<NodeId>);

/// Read-only view of the graph shared by every attempt in a round.
pub(super) struct Round<'r> {
    pub(super) graph: &'r Graph,
    pub(super) scores: &'r StructuralScores,
    pub(super) content_risk: f64,
    pub(super) tuned: Option<&'r TunedParameters>,
    pub(super) step_seed: u64,
}

impl Round<'_> {
    /// Draws once per susceptible neighbour of `source`.
    fn attempts_from(&self, source: NodeId) -> Candidates {
        let mut rng = attempt_rng(self.step_seed, source);
        let wins = self
            .graph
            .neighbors(source)
            .filter(|&target| self.graph.state(target) == Some(InfectionState::Susceptible))
            .filter(|&target| {
                let p = transmission_probability(
                    self.scores.probability(target),
                    self.content_risk,
                    self.tuned,
                );
                rng.gen_range(0.0..1.0) < p
            })
            .collect();
        (source, wins)
    }

    /// Evaluates every active node. Output order follows `active`.
    #[cfg(feature = "parallel")]
    pub(super) fn evaluate(&self, active: &[NodeId]) -> Vec<Candidates> {
        active
            .par_iter()
            .map(|&source| self.attempts_from(source))
            .collect()
    }

    /// Evaluates every active node. Output order follows `active`.
    #[cfg(not(feature = "parallel"))]
    pub(super) fn evaluate(&self, active: &[NodeId]) -> Vec<Candidates> {
        active
            .iter()
            .map(|&source| self.attempts_from(source))
            .collect()
    }
}

/// Keeps the first successful attempt on each target, as `(source, target)`.
pub(super) fn resolve(candidates: Vec<Candidates>) -> Vec<(NodeId, NodeId)> {
    let mut claimed = HashSet::new();
    let mut transmissions = Vec::new();
    for (source, wins) in candidates {
        for target in wins {
            if claimed.insert(target) {
                transmissions.push((source, target));
            }
        }
    }
    transmissions
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::{engine::rng::step_seed, graph::NodeKey};

    fn star(leaves: u64) -> Graph {
        let mut graph = Graph::default();
        let hub = graph.add_node(NodeKey::Index(0), 0.5, None);
        for index in 1..=leaves {
            let leaf = graph.add_node(NodeKey::Index(index), 0.5, None);
            graph.add_edge(hub, leaf);
        }
        graph.derive_features();
        graph
    }

    #[rstest]
    #[case(0.5, 0.0, 0.4)]
    #[case(1.0, 1.0, 1.0)]
    #[case(0.0, 0.5, 0.1)]
    #[case(0.1, 0.0, 0.08)]
    fn blend_weights_structural_over_content(
        #[case] structural: f64,
        #[case] risk: f64,
        #[case] expected: f64,
    ) {
        assert!((transmission_probability(structural, risk, None) - expected).abs() < 1e-12);
    }

    #[test]
    fn low_suppression_can_exceed_one() {
        let tuned = TunedParameters {
            risk_weight: 0.1,
            trust_weight: 0.1,
            suppression: 0.5,
        };
        assert!(transmission_probability(1.0, 1.0, Some(&tuned)) > 1.0);
    }

    #[test]
    fn first_attempt_claims_the_target() {
        let shared = NodeId::new(5);
        let candidates = vec![
            (NodeId::new(1), vec![NodeId::new(2), shared]),
            (NodeId::new(3), vec![shared, NodeId::new(4)]),
        ];
        let transmissions = resolve(candidates);
        assert_eq!(
            transmissions,
            vec![
                (NodeId::new(1), NodeId::new(2)),
                (NodeId::new(1), shared),
                (NodeId::new(3), NodeId::new(4)),
            ]
        );
    }

    #[test]
    fn certain_probability_reaches_every_susceptible_neighbour() {
        let mut graph = star(4);
        graph.set_state(NodeId::new(2), InfectionState::Infected);
        let scores: StructuralScores = graph.node_ids().map(|id| (id, 1.0)).collect();
        let round = Round {
            graph: &graph,
            scores: &scores,
            content_risk: 1.0,
            tuned: None,
            step_seed: 3,
        };
        let candidates = round.evaluate(&[NodeId::new(0)]);
        assert_eq!(
            candidates,
            vec![(
                NodeId::new(0),
                vec![NodeId::new(1), NodeId::new(3), NodeId::new(4)]
            )]
        );
    }

    #[test]
    fn zero_probability_never_transmits() {
        let graph = star(6);
        let scores: StructuralScores = graph.node_ids().map(|id| (id, 0.0)).collect();
        let round = Round {
            graph: &graph,
            scores: &scores,
            content_risk: 0.0,
            tuned: None,
            step_seed: 9,
        };
        assert!(resolve(round.evaluate(&[NodeId::new(0)])).is_empty());
    }

    /// Ten-node ring with chords 0-5 and 2-7; nodes 0, 3, 5 and 8 infected.
    fn chorded_ring() -> Graph {
        let mut graph = Graph::default();
        let ids: Vec<NodeId> = (0..10)
            .map(|index| graph.add_node(NodeKey::Index(index), 0.5, None))
            .collect();
        for (&left, &right) in ids.iter().zip(ids.iter().cycle().skip(1)) {
            graph.add_edge(left, right);
        }
        graph.add_edge(ids[0], ids[5]);
        graph.add_edge(ids[2], ids[7]);
        for infected in [0, 3, 5, 8] {
            graph.set_state(ids[infected], InfectionState::Infected);
        }
        graph.derive_features();
        graph
    }

    fn wins(source: usize, targets: &[usize]) -> Candidates {
        (
            NodeId::new(source),
            targets.iter().copied().map(NodeId::new).collect(),
        )
    }

    // Pinned draws: serial and parallel evaluation must both reproduce them.
    #[rstest]
    #[case(0, vec![wins(0, &[9]), wins(3, &[2]), wins(5, &[]), wins(8, &[7])])]
    #[case(1, vec![wins(0, &[1]), wins(3, &[2]), wins(5, &[]), wins(8, &[])])]
    fn rounds_replay_pinned_draws(#[case] timestep: usize, #[case] expected: Vec<Candidates>) {
        let graph = chorded_ring();
        let scores: StructuralScores = graph.node_ids().map(|id| (id, 0.5)).collect();
        let round = Round {
            graph: &graph,
            scores: &scores,
            content_risk: 0.0,
            tuned: None,
            step_seed: step_seed(42, timestep),
        };
        assert_eq!(round.evaluate(&graph.infected()), expected);
    }
}
