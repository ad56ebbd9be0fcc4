//! Command-line interface orchestration for contagion runs.
//!
//! The `run` command assembles a run request from an optional JSON file and
//! explicit flags, wires the bundled collaborators and renders the output.

mod commands;

pub use commands::{
    Cli, CliError, Command, ExecutionSummary, OutputFormat, RunCommand, StrategyArg,
    render_summary, run_cli,
};
