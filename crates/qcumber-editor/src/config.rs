//! Editor configuration parsed from environment variables.
//!
//! Every setting can be overridden via environment variables prefixed with
//! `QCUMBER_`, and command-line flags take precedence over both.

use std::env;
use std::str::FromStr;

use qcumber_document::{FeatureReader, FeatureWriter};
use qcumber_patterns::{DEFAULT_OVERRIDE_MARKER, DefinitionParser, Language};

use crate::error::EditorError;

/// Variable holding the log level.
pub const LOG_LEVEL_VAR: &str = "QCUMBER_LOG_LEVEL";
/// Variable holding the feature-file language code.
pub const LANGUAGE_VAR: &str = "QCUMBER_LANGUAGE";
/// Variable holding the parameter-override comment marker.
pub const OVERRIDE_MARKER_VAR: &str = "QCUMBER_OVERRIDE_MARKER";

/// Log level enumeration matching tracing crate levels.
///
/// Defaults to `Info` when not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Most verbose logging, includes per-line parser decisions.
    Trace,
    /// Debug-level information such as degraded pattern compilations.
    Debug,
    /// Import and export summaries.
    #[default]
    Info,
    /// Skipped files and tolerated lines.
    Warn,
    /// Error messages for failures.
    Error,
}

impl FromStr for LogLevel {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(EditorError::InvalidConfig(format!(
                "unknown log level '{s}', expected one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Configuration shared by the session and the command-line front end.
///
/// # Environment Variables
///
/// - `QCUMBER_LOG_LEVEL`: trace, debug, info, warn or error
/// - `QCUMBER_LANGUAGE`: keyword language of feature files (`en`, `da`)
/// - `QCUMBER_OVERRIDE_MARKER`: comment marker introducing parameter
///   overrides in step-definition files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Log level.
    pub log_level: LogLevel,
    /// Keyword language for reading, writing and definition parsing.
    pub language: Language,
    /// Marker word of parameter-override comments.
    pub override_marker: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            language: Language::default(),
            override_marker: DEFAULT_OVERRIDE_MARKER.to_string(),
        }
    }
}

impl EditorConfig {
    /// Load configuration from environment variables.
    ///
    /// Falls back to defaults for missing values.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::InvalidConfig` if an environment variable
    /// contains an invalid value.
    pub fn from_env() -> Result<Self, EditorError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::InvalidConfig` for unparsable values or a blank
    /// override marker.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EditorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level = match lookup(LOG_LEVEL_VAR) {
            Some(val) => val.parse()?,
            None => LogLevel::default(),
        };

        let language = match lookup(LANGUAGE_VAR) {
            Some(val) => val
                .parse::<Language>()
                .map_err(|err| EditorError::InvalidConfig(err.to_string()))?,
            None => Language::default(),
        };

        let override_marker = match lookup(OVERRIDE_MARKER_VAR) {
            Some(val) => {
                let marker = val.trim();
                if marker.is_empty() || marker.contains(char::is_whitespace) {
                    return Err(EditorError::InvalidConfig(format!(
                        "invalid override marker '{val}', expected a single word"
                    )));
                }
                marker.to_string()
            }
            None => DEFAULT_OVERRIDE_MARKER.to_string(),
        };

        Ok(Self {
            log_level,
            language,
            override_marker,
        })
    }

    /// Apply optional overrides to an existing configuration.
    ///
    /// This is intended for CLI overrides that should take precedence over
    /// environment-based defaults.
    #[must_use]
    pub fn apply_overrides(mut self, log_level: Option<LogLevel>, language: Option<Language>) -> Self {
        if let Some(level) = log_level {
            self.log_level = level;
        }

        if let Some(language) = language {
            self.language = language;
        }

        self
    }

    /// Create a new configuration with the specified log level.
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Create a new configuration with the specified language.
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// A step-definition parser for this configuration.
    #[must_use]
    pub fn definition_parser(&self) -> DefinitionParser {
        DefinitionParser::new(self.language).with_override_marker(self.override_marker.clone())
    }

    /// A feature-file reader for this configuration.
    #[must_use]
    pub fn reader(&self) -> FeatureReader {
        FeatureReader::new(self.language)
    }

    /// A feature-file writer for this configuration.
    #[must_use]
    pub fn writer(&self) -> FeatureWriter {
        FeatureWriter::new(self.language)
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| {
            vars.iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        }
    }

    #[rstest]
    #[case("trace", LogLevel::Trace)]
    #[case("debug", LogLevel::Debug)]
    #[case("info", LogLevel::Info)]
    #[case("warn", LogLevel::Warn)]
    #[case("warning", LogLevel::Warn)]
    #[case("error", LogLevel::Error)]
    #[case("DEBUG", LogLevel::Debug)]
    fn log_level_parses_valid_values(#[case] raw: &str, #[case] expected: LogLevel) {
        assert_eq!(raw.parse::<LogLevel>().ok(), Some(expected));
    }

    #[test]
    fn log_level_rejects_invalid_values() {
        let result = "invalid".parse::<LogLevel>();
        assert!(result.unwrap_err().to_string().contains("unknown log level"));
    }

    #[test]
    fn log_level_as_filter_str_returns_correct_strings() {
        assert_eq!(LogLevel::Trace.as_filter_str(), "trace");
        assert_eq!(LogLevel::Warn.as_filter_str(), "warn");
        assert_eq!(LogLevel::Error.as_filter_str(), "error");
    }

    #[test]
    fn missing_variables_fall_back_to_defaults() {
        let config = EditorConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.override_marker, "qcumber");
    }

    #[test]
    fn variables_are_read() {
        let config = EditorConfig::from_lookup(lookup_from(&[
            (LOG_LEVEL_VAR, "debug"),
            (LANGUAGE_VAR, "DA"),
            (OVERRIDE_MARKER_VAR, " cuke "),
        ]))
        .unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.language, Language::Danish);
        assert_eq!(config.override_marker, "cuke");
    }

    #[rstest]
    #[case(LANGUAGE_VAR, "klingon", "unsupported language")]
    #[case(OVERRIDE_MARKER_VAR, "two words", "invalid override marker")]
    #[case(LOG_LEVEL_VAR, "loud", "unknown log level")]
    fn invalid_variables_are_rejected(
        #[case] name: &str,
        #[case] value: &str,
        #[case] message: &str,
    ) {
        let err = EditorConfig::from_lookup(lookup_from(&[(name, value)])).unwrap_err();
        assert!(matches!(err, EditorError::InvalidConfig(_)));
        assert!(err.to_string().contains(message), "{err}");
    }

    #[test]
    fn apply_overrides_updates_selected_fields() {
        let config =
            EditorConfig::default().apply_overrides(Some(LogLevel::Error), Some(Language::Danish));
        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.language, Language::Danish);

        let config = EditorConfig::default().apply_overrides(None, None);
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn definition_parser_uses_configured_language() {
        let config = EditorConfig::default().with_language(Language::Danish);
        assert_eq!(config.definition_parser().language(), Language::Danish);
    }
}
