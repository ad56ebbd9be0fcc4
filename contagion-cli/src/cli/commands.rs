//! Command implementations and argument parsing for the contagion CLI.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use contagion_core::{
    Collaborators, ContagionError, CustomGraph, RunConfigBuilder, RunOutput, RunRequest,
    SimulationEngine, Strategy,
};
use contagion_providers_genetic::{GeneticConfig, GeneticError, GeneticTuner};
use contagion_providers_structural::GraphConvolutionOracle;
use contagion_providers_text::LexiconRiskScorer;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{Span, field, info, instrument};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "contagion", about = "Simulate message spread over a social graph.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Execute one simulation run.
    Run(RunCommand),
}

/// Options accepted by the `run` command.
///
/// Flags given explicitly override the values read from `--request`.
#[derive(Debug, Args, Clone, Default)]
pub struct RunCommand {
    /// JSON run request supplying defaults for every other flag.
    #[arg(long)]
    pub request: Option<PathBuf>,

    /// Message whose risk is scored once for the run.
    #[arg(long)]
    pub content: Option<String>,

    /// Number of nodes in the generated graph.
    #[arg(long, allow_negative_numbers = true)]
    pub nodes: Option<i64>,

    /// Number of initially infected nodes.
    #[arg(long, allow_negative_numbers = true)]
    pub seeds: Option<i64>,

    /// Transmission strategy.
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Number of rounds to simulate.
    #[arg(long)]
    pub steps: Option<usize>,

    /// JSON file with `nodes` and `links` replacing the generated graph.
    #[arg(long)]
    pub graph: Option<PathBuf>,

    /// Identifier to exclude from the graph; repeatable.
    #[arg(long = "block", value_name = "ID")]
    pub blocked: Vec<String>,

    /// Seed of the run's random source.
    #[arg(long)]
    pub rng_seed: Option<u64>,

    /// Seed of the structural oracle's weights.
    #[arg(long, default_value_t = 0)]
    pub oracle_seed: u64,

    /// Output rendering.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

/// Strategy names accepted by `--strategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Blend structural and content scores only.
    Naive,
    /// Same formula as naive.
    #[value(name = "fuzzy_adaptive", alias = "fuzzy-adaptive")]
    FuzzyAdaptive,
    /// Divide by a tuned suppression factor.
    #[value(name = "genetic_optimized", alias = "genetic-optimized")]
    GeneticOptimized,
}

impl From<StrategyArg> for Strategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Naive => Self::Naive,
            StrategyArg::FuzzyAdaptive => Self::FuzzyAdaptive,
            StrategyArg::GeneticOptimized => Self::GeneticOptimized,
        }
    }
}

/// How run output is written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The full run output as pretty JSON.
    #[default]
    Json,
    /// Final reach, risk, strategy and leaderboard as text.
    Summary,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be opened.
    #[error("failed to open `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// A file did not hold the expected JSON document.
    #[error("failed to parse `{path}`: {source}")]
    Json {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// The bundled tuner rejected its configuration.
    #[error(transparent)]
    Tuner(#[from] GeneticError),
    /// Configuration or simulation failed.
    #[error(transparent)]
    Core(#[from] ContagionError),
}

/// Outcome of a `run` command together with its requested rendering.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Selected output rendering.
    pub format: OutputFormat,
    /// Complete run output.
    pub output: RunOutput,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when inputs cannot be read or the run fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use contagion_cli::cli::{Cli, Command, RunCommand, run_cli};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let cli = Cli {
///     command: Command::Run(RunCommand {
///         nodes: Some(30),
///         seeds: Some(2),
///         steps: Some(4),
///         ..RunCommand::default()
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.output.results.len(), 4);
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Run(run) => {
            Span::current().record("command", field::display("run"));
            run_command(run)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(strategy = field::Empty, imported = command.graph.is_some()),
)]
pub(super) fn run_command(command: RunCommand) -> Result<ExecutionSummary, CliError> {
    let format = command.format;
    let oracle_seed = command.oracle_seed;
    let request = assemble_request(command)?;
    let config = RunConfigBuilder::from(request).build()?;
    Span::current().record("strategy", field::display(config.strategy()));

    let oracle = GraphConvolutionOracle::new(oracle_seed);
    let scorer = LexiconRiskScorer::default();
    let tuner = GeneticTuner::new(GeneticConfig::seeded(config.rng_seed()))?;
    let engine = SimulationEngine::new(Collaborators::new(&oracle, &scorer).with_tuner(&tuner));
    let output = engine.run(&config)?;

    info!(
        reach = output.final_reach(),
        risk = output.metadata.calculated_risk,
        "command completed"
    );
    Ok(ExecutionSummary { format, output })
}

/// Reads `--request` and `--graph`, then overlays explicit flags.
pub(super) fn assemble_request(command: RunCommand) -> Result<RunRequest, CliError> {
    let mut request = command
        .request
        .as_deref()
        .map(read_json::<RunRequest>)
        .transpose()?
        .unwrap_or_default();
    if let Some(path) = &command.graph {
        request.custom_graph = Some(read_json::<CustomGraph>(path)?);
    }
    if let Some(content) = command.content {
        request.content_text = content;
    }
    if let Some(nodes) = command.nodes {
        request.num_nodes = nodes;
    }
    if let Some(seeds) = command.seeds {
        request.seed_nodes = seeds;
    }
    if let Some(strategy) = command.strategy {
        request.strategy = strategy.into();
    }
    if let Some(steps) = command.steps {
        request.simulation_steps = steps;
    }
    if !command.blocked.is_empty() {
        request.blocked_node_ids = command.blocked;
    }
    if let Some(seed) = command.rng_seed {
        request.rng_seed = seed;
    }
    Ok(request)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders `summary` to `writer` in its requested format.
///
/// # Errors
/// Returns [`io::Error`] if writing or serialisation fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use contagion_cli::cli::{Cli, Command, OutputFormat, RunCommand, render_summary, run_cli};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let cli = Cli {
///     command: Command::Run(RunCommand {
///         nodes: Some(20),
///         steps: Some(2),
///         format: OutputFormat::Summary,
///         ..RunCommand::default()
///     }),
/// };
/// let mut buffer = Vec::new();
/// render_summary(&run_cli(cli)?, &mut buffer)?;
/// assert!(String::from_utf8(buffer)?.starts_with("final reach: "));
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    let output = &summary.output;
    match summary.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, output)?;
            writeln!(writer)
        }
        OutputFormat::Summary => {
            writeln!(writer, "final reach: {}", output.final_reach())?;
            writeln!(writer, "rounds: {}", output.results.len())?;
            writeln!(writer, "content risk: {:.2}", output.metadata.calculated_risk)?;
            writeln!(writer, "strategy: {}", output.metadata.strategy_used)?;
            if let Some(params) = &output.metadata.ga_params {
                writeln!(writer, "suppression: {:.3}", params.suppression)?;
            }
            writeln!(writer, "top spreaders:")?;
            let leaders = output
                .last_step()
                .map(|record| record.live_top_5.as_slice())
                .unwrap_or_default();
            for (rank, entry) in leaders.iter().enumerate() {
                writeln!(writer, "{}\t{}\t{}", rank + 1, entry.id, entry.count)?;
            }
            Ok(())
        }
    }
}
