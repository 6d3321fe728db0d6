//! Structured logging with environment variable configuration.
//!
//! Logs are written to stderr so they never interleave with formatter output
//! on stdout.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::LogLevel;

fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::new(level.as_filter_str())
}

/// Initialise the logging subsystem at `level`.
///
/// If a global subscriber is already set, this function silently ignores
/// the error; the first subscriber wins.
pub fn init_logging(level: LogLevel) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Initialise logging from `STEPBRIDGE_LOG_LEVEL`, falling back to `info`
/// with a warning when the variable holds an unknown level.
pub fn init_logging_from_env() {
    match LogLevel::from_env() {
        Ok(level) => init_logging(level),
        Err(error) => {
            init_logging(LogLevel::default());
            tracing::warn!(%error, "ignoring log level from environment");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn init_logging_is_idempotent() {
        init_logging(LogLevel::Warn);
        init_logging(LogLevel::Debug);
        init_logging_from_env();
    }

    #[test]
    fn filter_uses_log_level() {
        assert_eq!(filter_for(LogLevel::Debug).to_string(), "debug");
        assert_eq!(filter_for(LogLevel::Error).to_string(), "error");
    }
}
