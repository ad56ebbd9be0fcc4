//! Seed derivation for the run's random streams.
//!
//! Each active node draws its attempts from a private stream keyed by
//! `(run seed, timestep, node)`, so the outcome does not depend on how
//! evaluation is scheduled across threads.

use rand::{SeedableRng, rngs::SmallRng};

use crate::graph::NodeId;

const STREAM_SPACING: u64 = 0x9E37_79B9_7F4A_7C15;
const SPLITMIX_MULT_A: u64 = 0xBF58_476D_1CE4_E5B9;
const SPLITMIX_MULT_B: u64 = 0x94D0_49BB_1331_11EB;

#[inline]
const fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(STREAM_SPACING);
    state = (state ^ (state >> 30)).wrapping_mul(SPLITMIX_MULT_A);
    state = (state ^ (state >> 27)).wrapping_mul(SPLITMIX_MULT_B);
    state ^ (state >> 31)
}

const fn mix_stream(base_seed: u64, stream: u64) -> u64 {
    splitmix64(base_seed ^ stream.wrapping_add(1).wrapping_mul(STREAM_SPACING))
}

/// Generator used for graph construction and seeding.
pub(super) fn setup_rng(run_seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(run_seed)
}

/// Base seed shared by every attempt stream of one round.
pub(super) const fn step_seed(run_seed: u64, timestep: usize) -> u64 {
    // Offset keeps step streams disjoint from the setup stream.
    mix_stream(splitmix64(run_seed), timestep as u64)
}

/// Attempt stream for one active node within a round.
pub(super) fn attempt_rng(step_seed: u64, source: NodeId) -> SmallRng {
    SmallRng::seed_from_u64(mix_stream(step_seed, source.get() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::Rng;

    #[test]
    fn streams_are_reproducible() {
        let seed = step_seed(11, 3);
        let first: f64 = attempt_rng(seed, NodeId::new(4)).gen_range(0.0..1.0);
        let second: f64 = attempt_rng(seed, NodeId::new(4)).gen_range(0.0..1.0);
        assert_eq!(first, second);
    }

    #[test]
    fn step_seeds_are_pinned() {
        assert_eq!(step_seed(42, 0), 0xB18D_3448_88AE_5F83);
        assert_eq!(step_seed(42, 1), 0xD23E_60F1_BE42_FC23);
    }

    #[test]
    fn streams_differ_by_step_and_node() {
        assert_ne!(step_seed(11, 0), step_seed(11, 1));
        assert_ne!(step_seed(11, 0), step_seed(12, 0));
        let seed = step_seed(11, 0);
        let left: u64 = attempt_rng(seed, NodeId::new(0)).gen_range(0..u64::MAX);
        let right: u64 = attempt_rng(seed, NodeId::new(1)).gen_range(0..u64::MAX);
        assert_ne!(left, right);
    }
}
