//! Benchmark support crate for contagion.
//!
//! Provides parameter types and fixed collaborators used by Criterion
//! benchmarks of graph construction, structural scoring and the step loop.

pub mod fixtures;
pub mod params;
