//! Seeded genetic search implementing `ParameterTuner`.
//!
//! Candidates are `[risk_weight, trust_weight, suppression]` genomes. Each
//! generation keeps the fittest parents, carries the best individual over
//! unchanged and fills the rest with single-point crossover children whose
//! genes are randomly reset within bounds at the configured mutation rate.

mod error;
mod objective;
mod space;
mod tuner;

pub use crate::{
    error::GeneticError,
    objective::{EngagementSafety, FitnessObjective},
    space::{GENE_COUNT, GeneBounds, GeneSpace, Genome, decode},
    tuner::{Evolution, GeneticConfig, GeneticTuner},
};
