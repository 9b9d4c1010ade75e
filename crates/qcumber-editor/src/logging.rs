//! Structured logging with environment variable configuration.
//!
//! Logs go to stderr so that command output on stdout stays machine
//! readable.

use std::env;

use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::EditorConfig;

/// Pick the `RUST_LOG` directives when present and valid, else the
/// configured level. The second value is a rejected directive string.
fn build_filter(config: &EditorConfig, directives: Option<&str>) -> (EnvFilter, Option<String>) {
    let Some(directives) = directives.map(str::trim).filter(|d| !d.is_empty()) else {
        return (EnvFilter::new(config.log_level.as_filter_str()), None);
    };
    match EnvFilter::try_new(directives) {
        Ok(filter) => (filter, None),
        Err(_) => (
            EnvFilter::new(config.log_level.as_filter_str()),
            Some(directives.to_string()),
        ),
    }
}

/// Initialise the logging subsystem based on configuration.
///
/// # Environment Variables
///
/// Log level precedence (highest to lowest):
///
/// 1. `RUST_LOG` directives, such as `qcumber_patterns=trace`
/// 2. CLI `--log-level` (parsed into `config.log_level`)
/// 3. `QCUMBER_LOG_LEVEL` (parsed into `config.log_level`)
/// 4. Default configuration value
///
/// Invalid `RUST_LOG` directives are reported once logging is up and the
/// configured level is used instead.
///
/// # Note
///
/// If a global subscriber is already set, this function silently ignores
/// the error; the first subscriber wins.
pub fn init_logging(config: &EditorConfig) {
    let directives = env::var(EnvFilter::DEFAULT_ENV).ok();
    let (filter, rejected) = build_filter(config, directives.as_deref());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return;
    }
    if let Some(directives) = rejected {
        warn!(
            directives,
            level = config.log_level.as_filter_str(),
            "ignoring invalid RUST_LOG"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use rstest::rstest;
    use serial_test::serial;

    #[test]
    #[serial]
    fn init_logging_is_idempotent() {
        let config = EditorConfig::default();
        init_logging(&config);
        init_logging(&config);
    }

    #[test]
    fn filter_uses_config_log_level() {
        let config = EditorConfig::default().with_log_level(LogLevel::Debug);
        let (filter, rejected) = build_filter(&config, None);
        assert_eq!(filter.to_string(), "debug");
        assert_eq!(rejected, None);
    }

    #[rstest]
    #[case(Some("qcumber_patterns=trace"), "qcumber_patterns=trace", None)]
    #[case(Some("   "), "error", None)]
    #[case(Some("qcumber_patterns=loudest"), "error", Some("qcumber_patterns=loudest"))]
    fn rust_log_overrides_configured_level(
        #[case] directives: Option<&str>,
        #[case] expected: &str,
        #[case] rejected: Option<&str>,
    ) {
        let config = EditorConfig::default().with_log_level(LogLevel::Error);
        let (filter, dropped) = build_filter(&config, directives);
        assert_eq!(filter.to_string(), expected);
        assert_eq!(dropped.as_deref(), rejected);
    }
}
