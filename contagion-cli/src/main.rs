//! CLI entry point for contagion simulation runs.
//!
//! Parses arguments with clap, executes the run, renders the output to stdout
//! and maps errors to the failure exit code. Logging is initialised first so
//! every later step can emit diagnostics through `tracing`.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use contagion_cli::{
    cli::{Cli, CliError, render_summary, run_cli},
    logging::{self, LoggingError},
};
use tracing::{error, field};

/// Parse arguments, execute the command, render the output and flush stdout.
fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let summary = run_cli(cli).context("failed to execute command")?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    render_summary(&summary, &mut writer).context("failed to render output")?;
    writer.flush().context("failed to flush output")?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main() {
        let (code, collaborator_code) = err
            .downcast_ref::<CliError>()
            .and_then(|cli_error| match cli_error {
                CliError::Core(core) => Some((Some(core.code()), core.collaborator_code())),
                _ => None,
            })
            .unwrap_or((None, None));

        let code_field = code.map(|value| field::display(value.as_str()));
        let collaborator_code_field =
            collaborator_code.map(|value| field::display(value.as_str()));

        error!(
            error = %format_args!("{err:#}"),
            code = code_field,
            collaborator_code = collaborator_code_field,
            "command execution failed"
        );
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialized"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialize logging: {err}");
}
