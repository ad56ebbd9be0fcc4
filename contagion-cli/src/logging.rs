//! Diagnostic output for the contagion CLI.
//!
//! Events and closing spans are written to `stderr` so the run output on
//! `stdout` stays machine-readable. `RUST_LOG` selects the filter (default
//! `info`) and `CONTAGION_LOG_FORMAT` selects `human` or `json` lines. Events
//! emitted through the `log` facade are forwarded into `tracing`.

use std::{env, ffi::OsString, io, str::FromStr, sync::OnceLock};

use thiserror::Error;
use tracing::debug;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Environment variable naming the diagnostic line format.
pub const FORMAT_VAR: &str = "CONTAGION_LOG_FORMAT";

static INSTALLED: OnceLock<LogFormat> = OnceLock::new();

/// Line format of diagnostic output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact text for terminals.
    #[default]
    Human,
    /// One JSON object per event, with the enclosing spans attached.
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::UnknownFormat(other.to_owned())),
        }
    }
}

impl LogFormat {
    /// Format requested through [`FORMAT_VAR`]; human-readable when unset.
    ///
    /// # Errors
    /// Returns [`LoggingError`] when the variable is not UTF-8 or names an
    /// unknown format.
    pub fn from_env() -> Result<Self, LoggingError> {
        env::var_os(FORMAT_VAR).map_or_else(|| Ok(Self::default()), Self::from_os)
    }

    fn from_os(raw: OsString) -> Result<Self, LoggingError> {
        raw.into_string()
            .map_err(|_| LoggingError::NotUnicode)?
            .parse()
    }
}

/// Logging could not be configured from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoggingError {
    /// [`FORMAT_VAR`] held bytes that are not UTF-8.
    #[error("`CONTAGION_LOG_FORMAT` is not valid UTF-8")]
    NotUnicode,
    /// [`FORMAT_VAR`] named a format other than `human` or `json`.
    #[error("unknown log format `{0}`; use `human` or `json`")]
    UnknownFormat(String),
}

/// Installs the process-wide subscriber on first use.
///
/// Later calls return the format chosen by the first successful call. When
/// another subscriber already owns the global slot it is left in place.
///
/// # Errors
/// Returns [`LoggingError`] when [`FORMAT_VAR`] cannot be interpreted.
pub fn init_logging() -> Result<LogFormat, LoggingError> {
    if let Some(&format) = INSTALLED.get() {
        return Ok(format);
    }
    let requested = LogFormat::from_env()?;
    Ok(*INSTALLED.get_or_init(|| {
        install(requested);
        requested
    }))
}

fn install(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let base = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    let lines = match format {
        LogFormat::Human => base.boxed(),
        LogFormat::Json => base
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
    };

    let bridged = LogTracer::init().is_ok();
    let owned = tracing_subscriber::registry()
        .with(filter)
        .with(lines)
        .try_init()
        .is_ok();
    debug!(?format, bridged, owned, "diagnostics configured");
}
