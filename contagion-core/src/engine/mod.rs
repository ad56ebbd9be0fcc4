//! Simulation engine: run lifecycle, seeding and the step loop.
//!
//! A [`Simulation`] moves through [`RunPhase`]s in one direction only:
//! `Initializing → Seeding → Stepping → Complete`. Each round snapshots the
//! infected set, evaluates candidate transmissions against that snapshot,
//! resolves conflicts in a fixed order and commits new infections in one
//! batch before emitting its [`StepRecord`].

mod rng;
mod step;

use std::fmt;

use rand::{rngs::SmallRng, seq::index::sample};
use tracing::{debug, info, instrument, warn};

pub use self::step::{CONTENT_WEIGHT, STRUCTURAL_WEIGHT, transmission_probability};
use self::step::{Round, resolve};
use crate::{
    Result,
    collaborator::{
        Collaborators, ParameterTuner, StructuralScores, TextRiskOracle, TunedParameters,
    },
    config::{RunConfig, Strategy},
    error::{CollaboratorError, ContagionError},
    graph::{Graph, InfectionState, NodeId, build_graph},
    leaderboard::{LEADERBOARD_SIZE, TransmissionLedger},
    record::{ActivationPath, RunMetadata, RunOutput, StepRecord},
};

/// Name reported when the genetic strategy runs without a tuner.
const MISSING_TUNER: &str = "parameter_tuner";

/// Lifecycle phase of a [`Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Graph and run-scoped collaborator values are being prepared.
    Initializing,
    /// Ready to infect the seed nodes.
    Seeding,
    /// Rounds remain to be executed.
    Stepping,
    /// All rounds have been executed.
    Complete,
}

impl RunPhase {
    /// Lower-case phase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Seeding => "seeding",
            Self::Stepping => "stepping",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry point for running simulations against a fixed set of collaborators.
///
/// The engine holds no run state, so one instance may start any number of
/// independent runs.
///
/// # Examples
/// ```
/// use contagion_core::{
///     CollaboratorError, Collaborators, Graph, InfectionOracle, RunConfigBuilder,
///     SimulationEngine, StructuralScores, Strategy, TextRiskOracle,
/// };
///
/// struct Flat;
/// impl InfectionOracle for Flat {
///     fn name(&self) -> &str { "flat" }
///     fn predict(&self, graph: &Graph, _: f64) -> Result<StructuralScores, CollaboratorError> {
///         Ok(graph.node_ids().map(|id| (id, 0.5)).collect())
///     }
/// }
/// struct Calm;
/// impl TextRiskOracle for Calm {
///     fn name(&self) -> &str { "calm" }
///     fn score(&self, _: &str) -> Result<f64, CollaboratorError> { Ok(0.0) }
/// }
///
/// let engine = SimulationEngine::new(Collaborators::new(&Flat, &Calm));
/// let config = RunConfigBuilder::new()
///     .with_num_nodes(40)
///     .with_seed_nodes(2)
///     .with_steps(4)
///     .with_strategy(Strategy::Naive)
///     .with_rng_seed(7)
///     .build()
///     .expect("configuration is valid");
/// let output = engine.run(&config).expect("run must succeed");
/// assert_eq!(output.results.len(), 4);
/// assert!(output.final_reach() >= 2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SimulationEngine<'a> {
    collaborators: Collaborators<'a>,
}

impl<'a> SimulationEngine<'a> {
    /// Creates an engine borrowing the process-wide collaborators.
    #[must_use]
    pub const fn new(collaborators: Collaborators<'a>) -> Self {
        Self { collaborators }
    }

    /// Collaborators consulted by every run.
    #[must_use]
    pub const fn collaborators(&self) -> Collaborators<'a> {
        self.collaborators
    }

    /// Builds the graph and obtains the run-scoped collaborator values.
    ///
    /// The returned run is in [`RunPhase::Seeding`].
    ///
    /// # Errors
    /// Returns configuration errors from graph construction, and
    /// [`ContagionError::Collaborator`] when the text risk or tuning call
    /// fails or returns an out-of-range value.
    #[instrument(
        name = "engine.initialize",
        err,
        skip_all,
        fields(
            strategy = %config.strategy(),
            seeds = config.seed_nodes(),
            steps = config.steps(),
        ),
    )]
    pub fn initialize(&self, config: &RunConfig) -> Result<Simulation<'a>> {
        let mut rng = rng::setup_rng(config.rng_seed());
        let graph = build_graph(
            config.graph_spec(),
            config.blocked(),
            config.seed_nodes(),
            &mut rng,
        )?;

        let text_risk = self.collaborators.text_risk();
        let tuner = self.collaborators.tuner();
        let strategy = config.strategy();
        let text = config.content_text();

        #[cfg(feature = "parallel")]
        let (risk_outcome, tuning_outcome) = {
            // Pool threads inherit neither the caller's dispatcher nor its span.
            let dispatch = tracing::dispatcher::get_default(tracing::Dispatch::clone);
            let span = tracing::Span::current();
            rayon::join(
                || {
                    tracing::dispatcher::with_default(&dispatch, || {
                        span.in_scope(|| score_content(text_risk, text))
                    })
                },
                || {
                    tracing::dispatcher::with_default(&dispatch, || {
                        span.in_scope(|| tune_parameters(strategy, tuner))
                    })
                },
            )
        };
        #[cfg(not(feature = "parallel"))]
        let (risk_outcome, tuning_outcome) = (
            score_content(text_risk, text),
            tune_parameters(strategy, tuner),
        );
        let content_risk = risk_outcome?;
        let tuned = tuning_outcome?;

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            content_risk,
            suppression = tuned.map(|params| params.suppression),
            "run initialised"
        );

        Ok(Simulation {
            collaborators: self.collaborators,
            graph,
            content_risk,
            tuned,
            strategy,
            seed_nodes: config.seed_nodes(),
            steps: config.steps(),
            rng_seed: config.rng_seed(),
            rng,
            ledger: TransmissionLedger::default(),
            records: Vec::new(),
            phase: RunPhase::Seeding,
        })
    }

    /// Runs `initialize`, `seed` and every step, returning the full output.
    ///
    /// # Errors
    /// Propagates any error from [`Self::initialize`].
    #[instrument(
        name = "engine.run",
        err,
        skip_all,
        fields(strategy = %config.strategy(), steps = config.steps()),
    )]
    pub fn run(&self, config: &RunConfig) -> Result<RunOutput> {
        let mut simulation = self.initialize(config)?;
        simulation.seed()?;
        while simulation.phase() == RunPhase::Stepping {
            simulation.step()?;
        }
        let output = simulation.finish()?;
        info!(
            reach = output.final_reach(),
            steps = output.results.len(),
            calculated_risk = output.metadata.calculated_risk,
            "simulation complete"
        );
        Ok(output)
    }
}

fn score_content(oracle: &dyn TextRiskOracle, text: &str) -> Result<f64> {
    let risk = oracle
        .score(text)
        .map_err(|error| ContagionError::collaborator(oracle.name(), error))?;
    if (0.0..=1.0).contains(&risk) {
        Ok(risk)
    } else {
        Err(ContagionError::collaborator(
            oracle.name(),
            CollaboratorError::OutOfRange {
                field: "content_risk",
                value: risk,
                min: 0.0,
                max: 1.0,
            },
        ))
    }
}

fn tune_parameters(
    strategy: Strategy,
    configured: Option<&dyn ParameterTuner>,
) -> Result<Option<TunedParameters>> {
    if !strategy.uses_tuner() {
        return Ok(None);
    }
    let Some(tuner) = configured else {
        return Err(ContagionError::collaborator(
            MISSING_TUNER,
            CollaboratorError::unavailable("no tuner is configured for genetic_optimized runs"),
        ));
    };
    let params = tuner
        .optimize()
        .and_then(|proposed| proposed.validate().map(|()| proposed))
        .map_err(|error| ContagionError::collaborator(tuner.name(), error))?;
    Ok(Some(params))
}

/// State of one single-use simulation run.
///
/// Owns its graph exclusively; nothing is shared with other runs.
#[derive(Debug)]
pub struct Simulation<'a> {
    collaborators: Collaborators<'a>,
    graph: Graph,
    content_risk: f64,
    tuned: Option<TunedParameters>,
    strategy: Strategy,
    seed_nodes: usize,
    steps: usize,
    rng_seed: u64,
    rng: SmallRng,
    ledger: TransmissionLedger,
    records: Vec<StepRecord>,
    phase: RunPhase,
}

impl Simulation<'_> {
    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    /// The run's graph in its current state.
    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Content risk scored for this run.
    #[must_use]
    pub const fn content_risk(&self) -> f64 {
        self.content_risk
    }

    /// Tuned parameters, if the strategy requested them.
    #[must_use]
    pub const fn tuned_parameters(&self) -> Option<&TunedParameters> {
        self.tuned.as_ref()
    }

    /// Records emitted so far.
    #[must_use]
    pub const fn records(&self) -> &[StepRecord] {
        self.records.as_slice()
    }

    /// Cumulative transmission counts so far.
    #[must_use]
    pub const fn ledger(&self) -> &TransmissionLedger {
        &self.ledger
    }

    fn require(&self, expected: RunPhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ContagionError::PhaseViolation {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Infects `min(seed_nodes, |nodes|)` distinct nodes chosen uniformly.
    ///
    /// Returns the number of nodes infected.
    ///
    /// # Errors
    /// Returns [`ContagionError::PhaseViolation`] unless the run is in
    /// [`RunPhase::Seeding`].
    #[instrument(name = "engine.seed", err, skip_all, fields(requested = self.seed_nodes))]
    pub fn seed(&mut self) -> Result<usize> {
        self.require(RunPhase::Seeding)?;
        let amount = self.seed_nodes.min(self.graph.node_count());
        let chosen = sample(&mut self.rng, self.graph.node_count(), amount);
        for index in chosen.iter() {
            self.graph
                .set_state(NodeId::new(index), InfectionState::Infected);
        }
        debug!(seeded = amount, "seed nodes infected");
        self.phase = if self.steps == 0 {
            RunPhase::Complete
        } else {
            RunPhase::Stepping
        };
        Ok(amount)
    }

    /// Executes one round and returns its record.
    ///
    /// # Errors
    /// Returns [`ContagionError::PhaseViolation`] unless the run is in
    /// [`RunPhase::Stepping`].
    #[instrument(name = "engine.step", err, skip_all, fields(timestep = self.records.len()))]
    pub fn step(&mut self) -> Result<StepRecord> {
        self.require(RunPhase::Stepping)?;
        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();

        let timestep = self.records.len();
        let active = self.graph.infected();
        let scores = self.structural_scores();
        let transmissions = {
            let round = Round {
                graph: &self.graph,
                scores: &scores,
                content_risk: self.content_risk,
                tuned: self.tuned.as_ref(),
                step_seed: rng::step_seed(self.rng_seed, timestep),
            };
            resolve(round.evaluate(&active))
        };

        let mut newly_activated = Vec::with_capacity(transmissions.len());
        let mut activation_paths = Vec::with_capacity(transmissions.len());
        for &(source, target) in &transmissions {
            let spreader = self.graph.display_name(source);
            let reached = self.graph.display_name(target);
            self.ledger.credit(&spreader);
            newly_activated.push(reached.clone());
            activation_paths.push(ActivationPath(spreader, reached));
        }
        for &(_, target) in &transmissions {
            self.graph.set_state(target, InfectionState::Infected);
        }

        let record = StepRecord {
            timestep,
            active_spreaders: active.len(),
            total_reach: self.graph.infected_count(),
            newly_activated,
            activation_paths,
            live_top_5: self.ledger.top(LEADERBOARD_SIZE),
        };
        debug!(
            active = record.active_spreaders,
            new = record.newly_activated.len(),
            reach = record.total_reach,
            "round committed"
        );
        #[cfg(feature = "metrics")]
        record_step_metrics(&record, started.elapsed());

        self.records.push(record.clone());
        if self.records.len() >= self.steps {
            self.phase = RunPhase::Complete;
        }
        Ok(record)
    }

    fn structural_scores(&self) -> StructuralScores {
        let oracle = self.collaborators.infection();
        oracle
            .predict(&self.graph, self.content_risk)
            .unwrap_or_else(|error| {
                warn!(
                    collaborator = oracle.name(),
                    code = %error.code(),
                    %error,
                    "structural oracle failed; every node uses the default probability"
                );
                StructuralScores::default()
            })
    }

    /// Consumes a completed run and returns its output.
    ///
    /// # Errors
    /// Returns [`ContagionError::PhaseViolation`] unless the run is in
    /// [`RunPhase::Complete`].
    pub fn finish(self) -> Result<RunOutput> {
        self.require(RunPhase::Complete)?;
        Ok(RunOutput {
            results: self.records,
            graph_topology: self.graph.topology(),
            metadata: RunMetadata {
                calculated_risk: self.content_risk,
                strategy_used: self.strategy,
                ga_params: self.tuned,
            },
        })
    }
}

#[cfg(feature = "metrics")]
#[expect(
    clippy::cast_precision_loss,
    reason = "gauge values are reported as f64 by the metrics facade"
)]
fn record_step_metrics(record: &StepRecord, elapsed: std::time::Duration) {
    metrics::counter!("contagion_transmissions_total")
        .increment(record.activation_paths.len() as u64);
    metrics::counter!("contagion_steps_total").increment(1);
    metrics::gauge!("contagion_reach").set(record.total_reach as f64);
    metrics::histogram!("contagion_step_duration_seconds").record(elapsed.as_secs_f64());
}
