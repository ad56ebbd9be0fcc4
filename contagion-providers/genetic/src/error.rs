use thiserror::Error;

/// Invalid genetic search configuration.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[non_exhaustive]
pub enum GeneticError {
    /// The population holds no individuals.
    #[error("population size must be positive")]
    EmptyPopulation,
    /// Parent count is zero or exceeds the population.
    #[error("parent count {parents} must be in 1..={population}")]
    InvalidParentCount {
        /// Requested parents.
        parents: usize,
        /// Population size.
        population: usize,
    },
    /// Mutation rate is outside `[0, 1]`.
    #[error("mutation rate {rate} must be in [0, 1]")]
    InvalidMutationRate {
        /// Requested rate.
        rate: f64,
    },
    /// A gene range is inverted, non-finite or exceeds the suppression range.
    #[error("gene space bounds are invalid")]
    InvalidGeneSpace,
}
