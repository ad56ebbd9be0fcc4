//! Run configuration and its validating builder.
//!
//! Transport payloads carry signed counts; [`RunConfigBuilder::build`] is the
//! only place they are checked and narrowed, so an existing [`RunConfig`] is
//! always valid and immutable for the run that owns it.

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::{
    Result,
    error::ContagionError,
    graph::{BlockList, CustomGraph, GraphSpec, PreferentialAttachment},
};

/// Transmission strategy selected for a run.
///
/// # Examples
/// ```
/// use contagion_core::Strategy;
///
/// let strategy: Strategy = "genetic_optimized".parse().expect("known strategy");
/// assert_eq!(strategy, Strategy::GeneticOptimized);
/// assert_eq!(Strategy::default().as_str(), "fuzzy_adaptive");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Strategy {
    /// Fixed blend of structural and content signals.
    Naive,
    /// Same blend as [`Strategy::Naive`]; kept as a distinct label for reports.
    #[default]
    FuzzyAdaptive,
    /// Blend divided by a suppression factor proposed by the tuner.
    GeneticOptimized,
}

impl Strategy {
    /// All strategies in declaration order.
    pub const ALL: [Self; 3] = [Self::Naive, Self::FuzzyAdaptive, Self::GeneticOptimized];

    /// Stable snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Naive => "naive",
            Self::FuzzyAdaptive => "fuzzy_adaptive",
            Self::GeneticOptimized => "genetic_optimized",
        }
    }

    /// Whether this strategy consults the parameter tuner.
    #[must_use]
    pub const fn uses_tuner(self) -> bool {
        matches!(self, Self::GeneticOptimized)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a strategy name is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown strategy `{0}` (expected naive, fuzzy_adaptive or genetic_optimized)")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| ParseStrategyError(s.to_owned()))
    }
}

/// Validated, immutable configuration of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    content_text: String,
    seed_nodes: usize,
    strategy: Strategy,
    steps: usize,
    graph: GraphSpec,
    blocked: BlockList,
    rng_seed: u64,
}

impl RunConfig {
    /// Message whose risk is scored once per run.
    #[must_use]
    pub const fn content_text(&self) -> &str {
        self.content_text.as_str()
    }

    /// Requested number of initially infected nodes.
    #[must_use]
    pub const fn seed_nodes(&self) -> usize {
        self.seed_nodes
    }

    /// Selected transmission strategy.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Number of rounds to execute.
    #[must_use]
    pub const fn steps(&self) -> usize {
        self.steps
    }

    /// Graph source for the run.
    #[must_use]
    pub const fn graph_spec(&self) -> &GraphSpec {
        &self.graph
    }

    /// Identifiers excluded from the graph.
    #[must_use]
    pub const fn blocked(&self) -> &BlockList {
        &self.blocked
    }

    /// Seed of the run's random source.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }
}

/// Configures and validates a [`RunConfig`].
///
/// # Examples
/// ```
/// use contagion_core::{RunConfigBuilder, Strategy};
///
/// let config = RunConfigBuilder::new()
///     .with_content_text("Free crypto, click now")
///     .with_seed_nodes(3)
///     .with_strategy(Strategy::Naive)
///     .build()
///     .expect("configuration is valid");
/// assert_eq!(config.seed_nodes(), 3);
/// assert_eq!(config.steps(), 15);
///
/// let err = RunConfigBuilder::new().with_seed_nodes(-1).build().unwrap_err();
/// assert_eq!(err.code().as_str(), "CONTAGION_NEGATIVE_SEED_COUNT");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfigBuilder {
    content_text: String,
    seed_nodes: i64,
    num_nodes: i64,
    strategy: Strategy,
    steps: usize,
    custom_graph: Option<CustomGraph>,
    blocked_ids: Vec<String>,
    rng_seed: u64,
    generation: PreferentialAttachment,
}

impl Default for RunConfigBuilder {
    fn default() -> Self {
        Self {
            content_text: String::new(),
            seed_nodes: 5,
            num_nodes: 250,
            strategy: Strategy::default(),
            steps: 15,
            custom_graph: None,
            blocked_ids: Vec::new(),
            rng_seed: 0,
            generation: PreferentialAttachment::default(),
        }
    }
}

impl RunConfigBuilder {
    /// Creates a builder populated with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message to score.
    #[must_use]
    pub fn with_content_text(mut self, text: impl Into<String>) -> Self {
        self.content_text = text.into();
        self
    }

    /// Sets the requested seed count. Negative values fail in [`Self::build`].
    #[must_use]
    pub const fn with_seed_nodes(mut self, seeds: i64) -> Self {
        self.seed_nodes = seeds;
        self
    }

    /// Sets the generated node count. Negative values fail in [`Self::build`].
    #[must_use]
    pub const fn with_num_nodes(mut self, nodes: i64) -> Self {
        self.num_nodes = nodes;
        self
    }

    /// Sets the transmission strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the number of rounds.
    #[must_use]
    pub const fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Uses an imported graph instead of generating one.
    #[must_use]
    pub fn with_custom_graph(mut self, graph: CustomGraph) -> Self {
        self.custom_graph = Some(graph);
        self
    }

    /// Replaces the blocked identifier list.
    #[must_use]
    pub fn with_blocked_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the seed of the run's random source.
    #[must_use]
    pub const fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Overrides the generator parameters used when no custom graph is given.
    #[must_use]
    pub const fn with_generation(mut self, params: PreferentialAttachment) -> Self {
        self.generation = params;
        self
    }

    /// Returns the configured seed count.
    #[must_use]
    pub const fn seed_nodes(&self) -> i64 {
        self.seed_nodes
    }

    /// Returns the configured strategy.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Validates the configuration and constructs a [`RunConfig`].
    ///
    /// # Errors
    /// Returns [`ContagionError::NegativeSeedCount`] or
    /// [`ContagionError::NegativeNodeCount`] for negative counts.
    pub fn build(self) -> Result<RunConfig> {
        let seed_nodes = usize::try_from(self.seed_nodes).map_err(|_| {
            ContagionError::NegativeSeedCount {
                got: self.seed_nodes,
            }
        })?;
        let num_nodes = usize::try_from(self.num_nodes).map_err(|_| {
            ContagionError::NegativeNodeCount {
                got: self.num_nodes,
            }
        })?;

        let graph = self.custom_graph.map_or(
            GraphSpec::Generated {
                nodes: num_nodes,
                params: self.generation,
            },
            GraphSpec::Imported,
        );

        Ok(RunConfig {
            content_text: self.content_text,
            seed_nodes,
            strategy: self.strategy,
            steps: self.steps,
            graph,
            blocked: BlockList::new(self.blocked_ids),
            rng_seed: self.rng_seed,
        })
    }
}

#[cfg(feature = "serde")]
pub use self::request::RunRequest;

#[cfg(feature = "serde")]
mod request {
    use serde::{Deserialize, Serialize};

    use super::{RunConfigBuilder, Strategy};
    use crate::graph::CustomGraph;

    /// Transport form of a run request.
    ///
    /// Absent fields take the [`RunConfigBuilder`] defaults.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct RunRequest {
        /// Message to score.
        pub content_text: String,
        /// Requested seed count; may be negative on the wire.
        pub seed_nodes: i64,
        /// Requested generated node count; may be negative on the wire.
        pub num_nodes: i64,
        /// Transmission strategy.
        pub strategy: Strategy,
        /// Number of rounds.
        pub simulation_steps: usize,
        /// Optional imported graph.
        pub custom_graph: Option<CustomGraph>,
        /// Identifiers to exclude.
        pub blocked_node_ids: Vec<String>,
        /// Seed of the run's random source.
        pub rng_seed: u64,
    }

    impl Default for RunRequest {
        fn default() -> Self {
            let defaults = RunConfigBuilder::default();
            Self {
                content_text: defaults.content_text,
                seed_nodes: defaults.seed_nodes,
                num_nodes: defaults.num_nodes,
                strategy: defaults.strategy,
                simulation_steps: defaults.steps,
                custom_graph: defaults.custom_graph,
                blocked_node_ids: defaults.blocked_ids,
                rng_seed: defaults.rng_seed,
            }
        }
    }

    impl From<RunRequest> for RunConfigBuilder {
        fn from(request: RunRequest) -> Self {
            Self {
                custom_graph: request.custom_graph,
                ..Self::new()
                    .with_content_text(request.content_text)
                    .with_seed_nodes(request.seed_nodes)
                    .with_num_nodes(request.num_nodes)
                    .with_strategy(request.strategy)
                    .with_steps(request.simulation_steps)
                    .with_blocked_ids(request.blocked_node_ids)
                    .with_rng_seed(request.rng_seed)
            }
        }
    }
}
