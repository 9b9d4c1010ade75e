//! Step patterns compiled from definition bodies.

mod compiler;
mod lexer;

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::errors::PatternError;
use crate::keyword::Language;
use crate::parameter::ParameterSpec;

/// A compiled step definition.
///
/// The first parameter is the step prefix: the keyword a step line starts
/// with. The remaining parameters correspond one-to-one to the bracketed
/// groups of the definition body.
#[derive(Debug, Clone)]
pub struct StepPattern {
    regex: Regex,
    parameters: Vec<ParameterSpec>,
    body: String,
    source: PathBuf,
    line: usize,
    degraded: bool,
}

impl StepPattern {
    /// Compile `body` with the given explicit parameter specs.
    ///
    /// `overrides` lists specs for the body's groups in order; it is padded
    /// with wildcards or truncated so there is exactly one spec per group.
    ///
    /// # Errors
    /// Returns [`PatternError`] when neither the strict nor the degraded
    /// expression compiles.
    ///
    /// # Examples
    /// ```
    /// use qcumber_patterns::{Language, StepPattern};
    ///
    /// let pattern = StepPattern::compile(r"I have (\d+) cucumbers", Language::English, Vec::new())?;
    /// assert_eq!(pattern.parameters().len(), 2);
    /// assert_eq!(pattern.captures("Given I have 42 cucumbers"), Some(vec!["42".to_string()]));
    /// # Ok::<(), qcumber_patterns::PatternError>(())
    /// ```
    pub fn compile(
        body: &str,
        language: Language,
        overrides: Vec<ParameterSpec>,
    ) -> Result<Self, PatternError> {
        let compiled = compiler::compile_body(body)?;
        let mut group_specs = overrides;
        group_specs.resize(compiled.group_count, ParameterSpec::Any);

        let mut parameters = Vec::with_capacity(compiled.group_count + 1);
        parameters.push(ParameterSpec::OneOf(
            language.word_keywords().map(String::from).collect(),
        ));
        parameters.extend(group_specs);
        debug_assert_eq!(compiled.regex.captures_len() - 1, parameters.len());

        Ok(Self {
            regex: compiled.regex,
            parameters,
            body: body.to_string(),
            source: PathBuf::new(),
            line: 0,
            degraded: compiled.degraded,
        })
    }

    /// Attach the definition's origin.
    #[must_use]
    pub fn with_origin(mut self, source: impl Into<PathBuf>, line: usize) -> Self {
        self.source = source.into();
        self.line = line;
        self
    }

    /// The compiled expression.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Parameter specs, prefix first.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// Specs for the body's groups, excluding the prefix.
    #[must_use]
    pub fn group_parameters(&self) -> &[ParameterSpec] {
        self.parameters.get(1..).unwrap_or_default()
    }

    /// The raw definition body between `/^` and `$/`.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// File the definition was read from; empty when compiled directly.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// 1-based line of the definition; zero when compiled directly.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Whether the body only compiled after escaping it wholesale.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Match `text` and return the values bound to the body's groups.
    ///
    /// Groups that did not participate in the match bind the empty string.
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(text)?;
        Some(
            caps.iter()
                .skip(2)
                .map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
        )
    }

    /// Check bound group values against the literal parameter sets.
    ///
    /// Returns the index of the first rejected value.
    ///
    /// # Errors
    /// Returns the zero-based group index whose literal set does not contain
    /// the bound value.
    pub fn accepts(&self, values: &[String]) -> Result<(), usize> {
        self.group_parameters()
            .iter()
            .zip(values)
            .position(|(spec, value)| !spec.accepts(value))
            .map_or(Ok(()), Err)
    }
}

impl PartialEq for StepPattern {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str()
            && self.parameters == other.parameters
            && self.body == other.body
            && self.source == other.source
            && self.line == other.line
    }
}

impl Eq for StepPattern {}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests require successful compilation")]
mod tests {
    use super::*;
    use rstest::rstest;

    fn compile(body: &str) -> StepPattern {
        StepPattern::compile(body, Language::English, Vec::new()).expect("pattern should compile")
    }

    #[test]
    fn prefix_spec_lists_word_keywords() {
        let pattern = compile("a step");
        assert_eq!(
            pattern.parameters(),
            [ParameterSpec::from_literals(["Given", "When", "Then", "And", "But"])]
        );
        assert!(pattern.group_parameters().is_empty());
    }

    #[rstest]
    #[case("I have 42 cucumbers", true)]
    #[case("Given I have 42 cucumbers", true)]
    #[case("And I have 7 cucumbers", true)]
    #[case("I have no cucumbers", false)]
    #[case("I have 42 cucumbers today", false)]
    fn matches_cucumber_counts(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(compile(r"I have (\d+) cucumbers").regex().is_match(text), expected);
    }

    #[test]
    fn optional_groups_bind_empty_string() {
        let pattern = compile("the (big )?dog barks");
        assert_eq!(pattern.captures("the dog barks"), Some(vec![String::new()]));
        assert_eq!(
            pattern.captures("Then the big dog barks"),
            Some(vec!["big ".to_string()])
        );
    }

    #[test]
    fn overrides_are_normalised_to_group_count() {
        let colours = ParameterSpec::from_literals(["red", "green"]);
        let pattern = StepPattern::compile(
            "the (.*) light is (.*)",
            Language::English,
            vec![colours.clone()],
        )
        .expect("pattern should compile");
        assert_eq!(pattern.group_parameters(), [colours, ParameterSpec::Any]);

        let truncated = StepPattern::compile(
            "just (.*)",
            Language::English,
            vec![ParameterSpec::Any, ParameterSpec::Any, ParameterSpec::Any],
        )
        .expect("pattern should compile");
        assert_eq!(truncated.parameters().len(), 2);
    }

    #[test]
    fn accepts_reports_first_rejected_group() {
        let pattern = StepPattern::compile(
            "the (.*) light is (.*)",
            Language::English,
            vec![
                ParameterSpec::from_literals(["red", "green"]),
                ParameterSpec::from_literals(["on", "off"]),
            ],
        )
        .expect("pattern should compile");
        assert_eq!(pattern.accepts(&["red".into(), "on".into()]), Ok(()));
        assert_eq!(pattern.accepts(&["red".into(), "dim".into()]), Err(1));
    }

    #[test]
    fn origin_is_recorded() {
        let pattern = compile("a step").with_origin("steps.rb", 3);
        assert_eq!(pattern.source(), Path::new("steps.rb"));
        assert_eq!(pattern.line(), 3);
        assert_eq!(pattern.body(), "a step");
        assert!(!pattern.is_degraded());
    }
}
