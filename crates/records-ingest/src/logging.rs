//! Process-wide log setup.
//!
//! Library code logs through the `log` macros and opens `tracing` spans
//! around job runs. [`init_logging`] installs one `tracing` subscriber and
//! forwards `log` records into it, so both end up in the same output.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::Error;

/// Builds the filter: `RUST_LOG` when set, the configured level otherwise.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, Error> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| Error::Logging(format!("invalid level '{}': {}", config.level, e))),
    }
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Error> {
    let filter = build_filter(config)?;
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    let installed = match config.format {
        LogFormat::Pretty => tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(filter).with(fmt_layer),
        ),
        LogFormat::Json => tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.json()),
        ),
    };
    installed.map_err(|e| Error::Logging(e.to_string()))?;

    tracing_log::LogTracer::init().map_err(|e| Error::Logging(e.to_string()))?;

    log::debug!("Logging initialized ({:?})", config.format);
    Ok(())
}
