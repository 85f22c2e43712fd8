//! Tracing subscriber setup.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use crate::settings::{LogFormat, LogSettings};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to bridge log records: {0}")]
    Bridge(#[from] log::SetLoggerError),

    #[error("Failed to install subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Filter from `RUST_LOG`, falling back to the configured level.
pub fn filter(settings: &LogSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level))
}

/// Installs the global subscriber and routes `log` records into it.
/// Call once, before anything logs.
pub fn init(settings: &LogSettings) -> Result<(), LoggingError> {
    tracing_log::LogTracer::init()?;

    let registry = tracing_subscriber::registry().with(filter(settings));
    match settings.format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().json()),
        )?,
        LogFormat::Text => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().with_target(false)),
        )?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_uses_configured_level() {
        let settings = LogSettings {
            format: LogFormat::Text,
            level: "debug".into(),
        };
        if std::env::var("RUST_LOG").is_err() {
            assert_eq!(filter(&settings).to_string(), "debug");
        }
    }
}
