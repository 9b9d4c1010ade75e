//! Matching step text against an imported pattern set.

use derive_more::{Deref, From, IntoIterator};

use crate::pattern::StepPattern;

/// Ordered patterns from one import.
///
/// A set is replaced as a whole when definitions are re-imported; it is never
/// patched in place, so a matcher holding a set always sees a complete import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, From, IntoIterator)]
#[into_iterator(owned, ref)]
pub struct PatternSet(Vec<StepPattern>);

/// Outcome of matching one step text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// Whether any pattern matched.
    pub matched: bool,
    /// Values bound to the matching pattern's groups, prefix excluded.
    pub bound_values: Vec<String>,
    /// Index of the matching pattern within its set.
    pub pattern_index: Option<usize>,
}

impl MatchResult {
    /// The result for text no pattern matches.
    #[must_use]
    pub fn unmatched() -> Self {
        Self::default()
    }
}

impl PatternSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Match `text` against the set; the first pattern in import order wins.
    ///
    /// # Examples
    /// ```
    /// use qcumber_patterns::DefinitionParser;
    ///
    /// let import = DefinitionParser::default()
    ///     .parse_source("steps.rb", "Given /^I have (\\d+) cucumbers$/ do\n");
    /// let set = qcumber_patterns::PatternSet::from(import);
    /// let result = set.match_step("Given I have 42 cucumbers");
    /// assert!(result.matched);
    /// assert_eq!(result.bound_values, ["42"]);
    /// assert!(!set.match_step("I have no cucumbers").matched);
    /// ```
    #[must_use]
    pub fn match_step(&self, text: &str) -> MatchResult {
        let text = text.trim();
        self.0
            .iter()
            .enumerate()
            .find_map(|(index, pattern)| {
                pattern.captures(text).map(|bound_values| MatchResult {
                    matched: true,
                    bound_values,
                    pattern_index: Some(index),
                })
            })
            .unwrap_or_default()
    }

    /// Indices of every pattern matching `text`, in import order.
    #[must_use]
    pub fn matching(&self, text: &str) -> Vec<usize> {
        let text = text.trim();
        self.0
            .iter()
            .enumerate()
            .filter(|(_, pattern)| pattern.regex().is_match(text))
            .map(|(index, _)| index)
            .collect()
    }

    /// The pattern at `index`, if any.
    #[must_use]
    pub fn pattern(&self, index: usize) -> Option<&StepPattern> {
        self.0.get(index)
    }
}

/// Match `text` against `patterns`.
///
/// Convenience wrapper around [`PatternSet::match_step`].
#[must_use]
pub fn match_step(text: &str, patterns: &PatternSet) -> MatchResult {
    patterns.match_step(text)
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests require successful compilation")]
mod tests {
    use super::*;
    use crate::keyword::Language;

    fn set(bodies: &[&str]) -> PatternSet {
        bodies
            .iter()
            .map(|body| {
                StepPattern::compile(body, Language::English, Vec::new())
                    .expect("pattern should compile")
            })
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn first_match_wins() {
        let patterns = set(&["I have (.*) cucumbers", r"I have (\d+) cucumbers"]);
        let result = match_step("Given I have 3 cucumbers", &patterns);
        assert_eq!(result.pattern_index, Some(0));
        assert_eq!(patterns.matching("I have 3 cucumbers"), [0, 1]);
    }

    #[test]
    fn unmatched_text_binds_nothing() {
        let patterns = set(&[r"I have (\d+) cucumbers"]);
        assert_eq!(
            patterns.match_step("I have no cucumbers"),
            MatchResult::unmatched()
        );
        assert!(patterns.matching("I have no cucumbers").is_empty());
    }

    #[test]
    fn empty_set_matches_nothing() {
        assert!(!PatternSet::new().match_step("anything").matched);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let patterns = set(&["a step"]);
        assert!(patterns.match_step("   And a step  ").matched);
    }

    #[test]
    fn bound_values_exclude_the_prefix() {
        let patterns = set(&["I eat (\\d+) of (.*)", "unused"]);
        let result = patterns.match_step("When I eat 2 of the pears");
        assert_eq!(result.bound_values, ["2", "the pears"]);
        assert_eq!(
            patterns.pattern(0).map(StepPattern::body),
            Some("I eat (\\d+) of (.*)")
        );
        assert!(patterns.pattern(2).is_none());
    }
}
