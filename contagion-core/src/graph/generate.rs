//! Random topology generators for synthetic social graphs.

use rand::{Rng, RngCore};

use crate::{Result, error::ContagionError};

/// Undirected edges over the id space `0..nodes`, each listed once.
pub type GeneratedEdges = Vec<(usize, usize)>;

/// A replaceable strategy that produces an edge list for `nodes` ids.
///
/// Implementations must only reference ids below `nodes` and must draw all
/// randomness from `rng` so generation is reproducible under a fixed seed.
pub trait GraphGenerator {
    /// Produces the edge list for a graph with `nodes` vertices.
    ///
    /// # Errors
    /// Returns [`ContagionError::InvalidGenerationParams`] when the
    /// generator's parameters cannot produce a graph.
    fn generate(&self, nodes: usize, rng: &mut dyn RngCore) -> Result<GeneratedEdges>;
}

/// Barabási–Albert preferential attachment.
///
/// Starts from a complete core of `edges_per_node + 1` vertices and attaches
/// every further vertex to `edges_per_node` distinct existing vertices chosen
/// with probability proportional to their degree.
///
/// # Examples
/// ```
/// use contagion_core::{GraphGenerator, PreferentialAttachment};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let mut rng = SmallRng::seed_from_u64(7);
/// let edges = PreferentialAttachment::default()
///     .generate(10, &mut rng)
///     .expect("default parameters are valid");
/// // 3 core edges plus 2 per remaining vertex.
/// assert_eq!(edges.len(), 3 + 2 * 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PreferentialAttachment {
    edges_per_node: usize,
}

impl Default for PreferentialAttachment {
    fn default() -> Self {
        Self { edges_per_node: 2 }
    }
}

impl PreferentialAttachment {
    /// Creates a generator attaching each new vertex with `edges_per_node` edges.
    #[must_use]
    pub const fn new(edges_per_node: usize) -> Self {
        Self { edges_per_node }
    }

    /// Number of edges each new vertex brings.
    #[must_use]
    pub const fn edges_per_node(&self) -> usize {
        self.edges_per_node
    }
}

impl GraphGenerator for PreferentialAttachment {
    fn generate(&self, nodes: usize, rng: &mut dyn RngCore) -> Result<GeneratedEdges> {
        let m = self.edges_per_node;
        if m == 0 {
            return Err(ContagionError::InvalidGenerationParams {
                reason: "edges_per_node must be at least 1",
            });
        }

        let core = m.saturating_add(1).min(nodes);
        let mut edges = Vec::new();
        // Each vertex appears once per incident edge, so uniform draws from the
        // pool are degree-proportional.
        let mut pool = Vec::new();

        for left in 0..core {
            for right in (left + 1)..core {
                edges.push((left, right));
                pool.push(left);
                pool.push(right);
            }
        }

        let mut targets = Vec::new();
        for vertex in core..nodes {
            targets.clear();
            while targets.len() < m {
                let Some(&candidate) = pool.get(rng.gen_range(0..pool.len())) else {
                    break;
                };
                if !targets.contains(&candidate) {
                    targets.push(candidate);
                }
            }
            for &target in &targets {
                edges.push((target, vertex));
                pool.push(target);
                pool.push(vertex);
            }
        }

        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 0)]
    #[case(2, 1)]
    #[case(3, 3)]
    #[case(50, 3 + 2 * 47)]
    fn edge_count_matches_construction(#[case] nodes: usize, #[case] expected: usize) {
        let mut rng = SmallRng::seed_from_u64(42);
        let edges = PreferentialAttachment::default()
            .generate(nodes, &mut rng)
            .expect("generation must succeed");
        assert_eq!(edges.len(), expected);
    }

    #[test]
    fn edges_are_simple_and_in_range() {
        let mut rng = SmallRng::seed_from_u64(9);
        let edges = PreferentialAttachment::new(3)
            .generate(120, &mut rng)
            .expect("generation must succeed");
        let mut seen = HashSet::new();
        for &(left, right) in &edges {
            assert_ne!(left, right, "self-loop generated");
            assert!(left < 120 && right < 120);
            assert!(seen.insert((left.min(right), left.max(right))), "multi-edge generated");
        }
    }

    #[test]
    fn generation_is_reproducible() {
        let generator = PreferentialAttachment::default();
        let first = generator
            .generate(64, &mut SmallRng::seed_from_u64(5))
            .expect("generation must succeed");
        let second = generator
            .generate(64, &mut SmallRng::seed_from_u64(5))
            .expect("generation must succeed");
        assert_eq!(first, second);
    }

    #[test]
    fn zero_edges_per_node_is_rejected() {
        let err = PreferentialAttachment::new(0)
            .generate(10, &mut SmallRng::seed_from_u64(1))
            .expect_err("m = 0 cannot attach vertices");
        assert!(matches!(err, ContagionError::InvalidGenerationParams { .. }));
    }

    #[test]
    fn oversized_edges_per_node_only_builds_the_core() {
        let edges = PreferentialAttachment::new(usize::MAX)
            .generate(3, &mut SmallRng::seed_from_u64(1))
            .expect("the core is complete for any m");
        assert_eq!(edges, vec![(0, 1), (0, 2), (1, 2)]);
    }
}
