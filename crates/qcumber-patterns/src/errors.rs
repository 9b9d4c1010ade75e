//! Error types shared by the definition parser and the pattern compiler.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while turning a step-definition body into a regular
/// expression.
///
/// Malformed bodies never produce this error on their own: the compiler
/// falls back to a degraded, fully escaped expression first. Only a body whose
/// degraded form still cannot be compiled (for example because it exceeds the
/// regex size limit) is reported.
///
/// # Examples
/// ```
/// use qcumber_patterns::PatternError;
/// let err = PatternError::regex("I (.*)", regex::Error::Syntax("bad".into()));
/// assert!(err.to_string().contains("I (.*)"));
/// ```
#[derive(Debug, Error)]
pub enum PatternError {
    /// The regex engine rejected the generated expression.
    #[error("failed to compile step definition `{body}`: {source}")]
    Regex {
        /// The raw definition body the expression was built from.
        body: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },
}

impl PatternError {
    /// Build a [`PatternError::Regex`] for the given definition body.
    #[must_use]
    pub fn regex(body: impl Into<String>, source: regex::Error) -> Self {
        Self::Regex {
            body: body.into(),
            source,
        }
    }
}

/// A step-definition source file that could not be read.
///
/// The file contributes no patterns; the rest of the import continues.
#[derive(Debug, Error)]
#[error("failed to read step definition file {}: {source}", path.display())]
pub struct SourceReadError {
    /// Path of the unreadable file.
    pub path: PathBuf,
    /// The underlying I/O error.
    #[source]
    pub source: std::io::Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_regex_error_with_body() {
        let err = PatternError::regex("broken (", regex::Error::Syntax("bad".into()));
        assert_eq!(
            err.to_string(),
            format!(
                "failed to compile step definition `broken (`: {}",
                regex::Error::Syntax("bad".into())
            )
        );
    }

    #[test]
    fn formats_source_read_error_with_path() {
        let err = SourceReadError {
            path: PathBuf::from("features/step_definitions/steps.rb"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(
            err.to_string(),
            "failed to read step definition file features/step_definitions/steps.rb: missing"
        );
    }
}
