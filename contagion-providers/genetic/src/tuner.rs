//! Generational search loop.

use contagion_core::{CollaboratorError, ParameterTuner, TunedParameters};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::{debug, instrument};

use crate::{
    error::GeneticError,
    objective::{EngagementSafety, FitnessObjective},
    space::{GENE_COUNT, GeneSpace, Genome, decode},
};

/// Search sizes and randomness for [`GeneticTuner`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneticConfig {
    /// Individuals per generation.
    pub population: usize,
    /// Generations bred after the initial population.
    pub generations: usize,
    /// Fittest individuals used as parents.
    pub parents: usize,
    /// Per-gene probability of a random reset in each child.
    pub mutation_rate: f64,
    /// Seed of the search random stream.
    pub seed: u64,
}

impl Default for GeneticConfig {
    #[expect(clippy::cast_precision_loss, reason = "the gene count is a small constant")]
    fn default() -> Self {
        Self {
            population: 5,
            generations: 5,
            parents: 2,
            mutation_rate: 1.0 / GENE_COUNT as f64,
            seed: 0,
        }
    }
}

impl GeneticConfig {
    /// Default sizes with the given seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), GeneticError> {
        if self.population == 0 {
            return Err(GeneticError::EmptyPopulation);
        }
        if self.parents == 0 || self.parents > self.population {
            return Err(GeneticError::InvalidParentCount {
                parents: self.parents,
                population: self.population,
            });
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(GeneticError::InvalidMutationRate {
                rate: self.mutation_rate,
            });
        }
        Ok(())
    }
}

/// Outcome of one search.
#[derive(Debug, Clone, PartialEq)]
pub struct Evolution {
    /// Fittest parameters found.
    pub best: TunedParameters,
    /// Fitness of [`Evolution::best`].
    pub fitness: f64,
    /// Best fitness of the initial population followed by each generation.
    pub history: Vec<f64>,
}

/// [`ParameterTuner`] running a small seeded genetic algorithm.
///
/// # Examples
/// ```
/// use contagion_core::ParameterTuner;
/// use contagion_providers_genetic::{GeneticConfig, GeneticTuner};
///
/// let tuner = GeneticTuner::new(GeneticConfig::seeded(3)).expect("valid config");
/// let params = tuner.optimize().expect("search succeeds");
/// assert!((0.5..=2.0).contains(&params.suppression));
/// ```
#[derive(Debug, Clone)]
pub struct GeneticTuner<O = EngagementSafety> {
    config: GeneticConfig,
    space: GeneSpace,
    objective: O,
}

impl GeneticTuner {
    /// Tuner over the default gene space with [`EngagementSafety`].
    ///
    /// # Errors
    /// Returns [`GeneticError`] when `config` is inconsistent.
    pub fn new(config: GeneticConfig) -> Result<Self, GeneticError> {
        Self::with_objective(config, GeneSpace::default(), EngagementSafety)
    }
}

impl<O: FitnessObjective> GeneticTuner<O> {
    /// Tuner with an explicit gene space and objective.
    ///
    /// # Errors
    /// Returns [`GeneticError`] when `config` or `space` is invalid.
    pub fn with_objective(
        config: GeneticConfig,
        space: GeneSpace,
        objective: O,
    ) -> Result<Self, GeneticError> {
        config.validate()?;
        if !space.is_valid() {
            return Err(GeneticError::InvalidGeneSpace);
        }
        Ok(Self {
            config,
            space,
            objective,
        })
    }

    /// The search configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneticConfig {
        &self.config
    }

    /// Runs the search. The same configuration always yields the same result.
    #[must_use]
    pub fn evolve(&self) -> Evolution {
        let mut rng = SmallRng::seed_from_u64(self.config.seed);
        let mut population: Vec<Genome> = (0..self.config.population)
            .map(|_| self.space.sample(&mut rng))
            .collect();
        let mut ranked = self.rank(&population);
        let mut history = Vec::new();
        history.push(ranked.first().map_or(f64::NEG_INFINITY, |entry| entry.1));

        for generation in 0..self.config.generations {
            population = self.breed(&ranked, &mut rng);
            ranked = self.rank(&population);
            let best = ranked.first().map_or(f64::NEG_INFINITY, |entry| entry.1);
            debug!(generation, best, "generation evaluated");
            history.push(best);
        }

        let (genome, fitness) = ranked
            .first()
            .copied()
            .unwrap_or_else(|| {
                let fallback = population.first().copied().unwrap_or_default();
                (fallback, f64::NEG_INFINITY)
            });
        Evolution {
            best: decode(&genome),
            fitness,
            history,
        }
    }

    /// Genomes paired with fitness, fittest first, ties in population order.
    fn rank(&self, population: &[Genome]) -> Vec<(Genome, f64)> {
        let mut ranked: Vec<(Genome, f64)> = population
            .iter()
            .map(|genome| {
                let fitness = self.objective.fitness(&decode(genome));
                (*genome, if fitness.is_nan() { f64::NEG_INFINITY } else { fitness })
            })
            .collect();
        ranked.sort_by(|left, right| right.1.total_cmp(&left.1));
        ranked
    }

    fn breed(&self, ranked: &[(Genome, f64)], rng: &mut SmallRng) -> Vec<Genome> {
        let parents: Vec<Genome> = ranked
            .iter()
            .take(self.config.parents)
            .map(|entry| entry.0)
            .collect();
        let Some(&elite) = parents.first() else {
            return Vec::new();
        };
        let mut next = Vec::with_capacity(self.config.population);
        next.push(elite);
        // Parents pair with their successor, wrapping round to the fittest.
        let pairs = parents.iter().cycle().zip(parents.iter().cycle().skip(1));
        for (first, second) in pairs.take(self.config.population.saturating_sub(1)) {
            let mut child = crossover(first, second, rng);
            self.mutate(&mut child, rng);
            next.push(child);
        }
        next
    }

    fn mutate(&self, child: &mut Genome, rng: &mut SmallRng) {
        for (gene, bounds) in child.iter_mut().zip(self.space.bounds()) {
            if rng.gen_bool(self.config.mutation_rate) {
                *gene = bounds.sample(rng);
            }
        }
    }
}

fn crossover(first: &Genome, second: &Genome, rng: &mut SmallRng) -> Genome {
    let point = rng.gen_range(1..GENE_COUNT);
    let mut child = *first;
    for (gene, &donor) in child.iter_mut().zip(second).skip(point) {
        *gene = donor;
    }
    child
}

impl<O: FitnessObjective> ParameterTuner for GeneticTuner<O> {
    fn name(&self) -> &str {
        "genetic"
    }

    #[instrument(
        name = "tuner.optimize",
        err,
        skip_all,
        fields(
            population = self.config.population,
            generations = self.config.generations,
            seed = self.config.seed,
        ),
    )]
    fn optimize(&self) -> Result<TunedParameters, CollaboratorError> {
        let evolution = self.evolve();
        if !evolution.fitness.is_finite() {
            return Err(CollaboratorError::malformed(format_args!(
                "objective produced non-finite fitness {}",
                evolution.fitness
            )));
        }
        debug!(
            fitness = evolution.fitness,
            suppression = evolution.best.suppression,
            "search finished"
        );
        Ok(evolution.best)
    }
}
