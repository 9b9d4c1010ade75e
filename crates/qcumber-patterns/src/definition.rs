//! Extraction of step definitions from automation sources.
//!
//! A recognised definition line has the shape
//! `Given /^I have (\d+) cucumbers$/ do |count|`. A comment line of the form
//! `# qcumber (red|green) (*)` immediately above a definition restricts the
//! values its groups accept. The older `# qcumberless (...)` spelling is
//! always recognised as well.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::SourceReadError;
use crate::keyword::Language;
use crate::matcher::PatternSet;
use crate::parameter::parse_override;
use crate::pattern::StepPattern;

/// Default marker word introducing a parameter override comment.
pub const DEFAULT_OVERRIDE_MARKER: &str = "qcumber";

/// Marker word used by step files written for earlier editors. Accepted
/// alongside the configured marker.
pub const LEGACY_OVERRIDE_MARKER: &str = "qcumberless";

/// Patterns and per-file failures from one import.
#[derive(Debug, Default)]
pub struct DefinitionImport {
    /// Patterns in file order, then line order.
    pub patterns: PatternSet,
    /// Files that could not be read.
    pub failures: Vec<SourceReadError>,
}

/// Line-oriented step-definition parser for one locale.
#[derive(Debug, Clone)]
pub struct DefinitionParser {
    language: Language,
    override_marker: String,
}

impl Default for DefinitionParser {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

impl DefinitionParser {
    /// Create a parser recognising the word keywords of `language`.
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self {
            language,
            override_marker: DEFAULT_OVERRIDE_MARKER.to_string(),
        }
    }

    /// Use a different marker word for override comments.
    ///
    /// [`LEGACY_OVERRIDE_MARKER`] keeps being recognised.
    #[must_use]
    pub fn with_override_marker(mut self, marker: impl Into<String>) -> Self {
        self.override_marker = marker.into();
        self
    }

    /// The active locale.
    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Extract every step pattern from `text`.
    ///
    /// Lines whose expression cannot be compiled at all are skipped with a
    /// warning; no line aborts the scan.
    ///
    /// # Examples
    /// ```
    /// use qcumber_patterns::DefinitionParser;
    ///
    /// let source = "# qcumber (on|off)\nGiven /^the light is (.*)$/ do |state|\nend\n";
    /// let patterns = DefinitionParser::default().parse_source("steps.rb", source);
    /// assert_eq!(patterns.len(), 1);
    /// assert_eq!(patterns[0].line(), 2);
    /// assert_eq!(patterns[0].group_parameters()[0].literals(), ["on", "off"]);
    /// ```
    #[must_use]
    pub fn parse_source(&self, path: impl AsRef<Path>, text: &str) -> Vec<StepPattern> {
        let path = path.as_ref();
        let mut patterns = Vec::new();
        let mut pending: Option<&str> = None;

        for (index, line) in text.lines().enumerate() {
            if let Some(spec) = self.override_spec(line) {
                pending = Some(spec);
                continue;
            }
            let overrides = pending.take();
            let Some(body) = self.definition_body(line) else {
                continue;
            };
            let specs = overrides.map(parse_override).unwrap_or_default();
            match StepPattern::compile(body, self.language, specs) {
                Ok(pattern) => {
                    debug!(path = %path.display(), line = index + 1, regex = pattern.regex().as_str(), "step definition");
                    patterns.push(pattern.with_origin(path, index + 1));
                }
                Err(err) => {
                    warn!(path = %path.display(), line = index + 1, error = %err, "skipping step definition");
                }
            }
        }
        patterns
    }

    /// Read and parse a single file.
    ///
    /// # Errors
    /// Returns [`SourceReadError`] when the file cannot be read as UTF-8 text.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Vec<StepPattern>, SourceReadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SourceReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.parse_source(path, &text))
    }

    /// Parse every file in order, collecting failures instead of stopping.
    pub fn parse_files<I, P>(&self, paths: I) -> DefinitionImport
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut patterns = Vec::new();
        let mut failures = Vec::new();
        let mut files = 0usize;
        for path in paths {
            let path = path.into();
            files += 1;
            match self.parse_file(&path) {
                Ok(found) => patterns.extend(found),
                Err(err) => {
                    warn!(error = %err, "step definition file skipped");
                    failures.push(err);
                }
            }
        }
        info!(
            files,
            patterns = patterns.len(),
            failures = failures.len(),
            "imported step definitions"
        );
        DefinitionImport {
            patterns: PatternSet::from(patterns),
            failures,
        }
    }

    fn override_spec<'a>(&self, line: &'a str) -> Option<&'a str> {
        let rest = line.trim_start().strip_prefix('#')?.trim_start();
        [self.override_marker.as_str(), LEGACY_OVERRIDE_MARKER]
            .into_iter()
            .find_map(|marker| {
                rest.strip_prefix(marker)
                    .filter(|tail| tail.starts_with(char::is_whitespace))
            })
            .map(str::trim)
            .filter(|spec| !spec.is_empty())
    }

    fn definition_body<'a>(&self, line: &'a str) -> Option<&'a str> {
        let line = line.trim_start();
        self.language.word_keywords().find_map(|keyword| {
            let rest = line.strip_prefix(keyword)?.strip_prefix(' ')?;
            let rest = rest.strip_prefix("/^")?;
            let end = rest.rfind("$/")?;
            rest.get(..end)
        })
    }
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    clippy::indexing_slicing,
    reason = "tests index known pattern lists and require fixtures"
)]
mod tests {
    use super::*;
    use crate::parameter::ParameterSpec;
    use rstest::rstest;

    fn parse(text: &str) -> Vec<StepPattern> {
        DefinitionParser::default().parse_source("steps.rb", text)
    }

    #[rstest]
    #[case("Given /^a step$/ do", Some("a step"))]
    #[case("  When /^I press (.*)$/ do |key|", Some("I press (.*)"))]
    #[case("Then /^it costs $5$/i do", Some("it costs $5"))]
    #[case("Given /a step/ do", None)]
    #[case("Given(/^a step$/) do", None)]
    #[case("* /^a step$/ do", None)]
    #[case("Givet /^a step$/ do", None)]
    fn recognises_definition_lines(#[case] line: &str, #[case] expected: Option<&str>) {
        assert_eq!(DefinitionParser::default().definition_body(line), expected);
    }

    #[test]
    fn danish_parser_uses_danish_keywords() {
        let parser = DefinitionParser::new(Language::Danish);
        assert_eq!(parser.definition_body("Givet /^et trin$/ do"), Some("et trin"));
        assert_eq!(parser.definition_body("Given /^a step$/ do"), None);
    }

    #[rstest]
    #[case("# qcumber (a|b)", Some("(a|b)"))]
    #[case("    #qcumber   (*) (x) ", Some("(*) (x)"))]
    #[case("# qcumber", None)]
    #[case("# qcumberless (a|b)", Some("(a|b)"))]
    #[case("# qcumberless", None)]
    #[case("# qcumberish (a|b)", None)]
    #[case("# a plain comment", None)]
    fn recognises_override_comments(#[case] line: &str, #[case] expected: Option<&str>) {
        assert_eq!(DefinitionParser::default().override_spec(line), expected);
    }

    #[test]
    fn custom_marker_replaces_default() {
        let parser = DefinitionParser::default().with_override_marker("params");
        assert_eq!(parser.override_spec("# params (a|b)"), Some("(a|b)"));
        assert_eq!(parser.override_spec("# qcumber (a|b)"), None);
        assert_eq!(parser.override_spec("# qcumberless (a|b)"), Some("(a|b)"));
    }

    #[test]
    fn one_pattern_per_definition_line() {
        let source = "\
Given /^I have (\\d+) cucumbers$/ do |n|
end

When /^I eat (\\d+) of (.*)$/ do |n, what|
end
Then /^I am full$/ do
end
";
        let patterns = parse(source);
        assert_eq!(patterns.len(), 3);
        assert_eq!(
            patterns.iter().map(|p| p.parameters().len()).collect::<Vec<_>>(),
            [2, 3, 1]
        );
        assert_eq!(
            patterns.iter().map(StepPattern::line).collect::<Vec<_>>(),
            [1, 4, 6]
        );
    }

    #[test]
    fn override_applies_to_next_line_only() {
        let source = "\
# qcumber (red|green)
Given /^the (.*) light$/ do |c|
end
# qcumber (on|off)

Given /^the switch is (.*)$/ do |s|
end
";
        let patterns = parse(source);
        assert_eq!(patterns.len(), 2);
        assert_eq!(
            patterns[0].group_parameters(),
            [ParameterSpec::from_literals(["red", "green"])]
        );
        assert_eq!(patterns[1].group_parameters(), [ParameterSpec::Any]);
    }

    #[test]
    fn legacy_override_comments_restrict_groups() {
        let patterns = parse("# qcumberless (on|off)\nGiven /^the light is (.*)$/ do |s|\nend\n");
        assert_eq!(
            patterns[0].group_parameters(),
            [ParameterSpec::from_literals(["on", "off"])]
        );
        assert_eq!(patterns[0].accepts(&["dimmed".to_string()]), Err(0));
    }

    #[test]
    fn unparseable_override_falls_back_to_wildcards() {
        let patterns = parse("# qcumber (broken\nGiven /^a (.*) b (.*)$/ do\n");
        assert_eq!(
            patterns[0].group_parameters(),
            [ParameterSpec::Any, ParameterSpec::Any]
        );
    }

    #[test]
    fn malformed_bodies_still_yield_patterns() {
        let patterns = parse("Given /^oops ) (x)$/ do\nGiven /^open (ended$/ do\n");
        assert_eq!(patterns.len(), 2);
        assert!(patterns[0].is_degraded());
        assert_eq!(patterns[0].parameters().len(), 2);
        assert_eq!(patterns[1].parameters().len(), 1);
        assert!(patterns[1].regex().is_match("Given open (ended"));
    }

    #[test]
    fn unreadable_files_are_reported_and_skipped() {
        let dir = tempfile::tempdir().expect("temp dir");
        let good = dir.path().join("steps.rb");
        fs::write(&good, "Given /^a step$/ do\nend\n").expect("write steps");
        let missing = dir.path().join("missing.rb");

        let import = DefinitionParser::default().parse_files([missing.clone(), good.clone()]);
        assert_eq!(import.patterns.len(), 1);
        assert_eq!(import.patterns[0].source(), good.as_path());
        assert_eq!(import.failures.len(), 1);
        assert_eq!(import.failures[0].path, missing);
    }
}
