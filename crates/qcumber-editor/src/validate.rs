//! Cross-checks serialised text with the `gherkin` parser.
//!
//! The reader is deliberately tolerant; a runner is not. Validating written
//! text with an independent parser catches output the runner would reject.

use gherkin::GherkinEnv;
use qcumber_patterns::Language;

use crate::error::EditorError;

/// What the Gherkin parser found in a feature text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GherkinSummary {
    /// Scenarios outside rules.
    pub scenarios: usize,
    /// Steps in the background and every scenario.
    pub steps: usize,
    /// Whether a background is present.
    pub has_background: bool,
}

/// Parse `text` as a Gherkin feature in `language`.
///
/// # Errors
///
/// Returns `EditorError::Gherkin` when the parser rejects the text and
/// `EditorError::InvalidConfig` when it does not know the language.
pub fn validate_gherkin(text: &str, language: Language) -> Result<GherkinSummary, EditorError> {
    let env = GherkinEnv::new(language.code())
        .map_err(|err| EditorError::InvalidConfig(err.to_string()))?;
    let mut source = text.to_string();
    if !source.ends_with('\n') {
        source.push('\n');
    }
    let feature = gherkin::Feature::parse(source.as_str(), env)?;

    let background_steps = feature
        .background
        .as_ref()
        .map_or(0, |background| background.steps.len());
    let scenario_steps: usize = feature.scenarios.iter().map(|s| s.steps.len()).sum();
    Ok(GherkinSummary {
        scenarios: feature.scenarios.len(),
        steps: background_steps + scenario_steps,
        has_background: feature.background.is_some(),
    })
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests use fixed feature texts")]
mod tests {
    use super::*;

    #[test]
    fn counts_scenarios_and_steps() {
        let text = "\
@smoke
Feature: Basket

  Background:
    Given an empty basket

  Scenario: Adding
    When I add 3 cucumbers
    Then the basket holds
      | item     | count |
      | cucumber | 3     |
";
        let summary = validate_gherkin(text, Language::English).expect("valid");
        assert_eq!(
            summary,
            GherkinSummary {
                scenarios: 1,
                steps: 3,
                has_background: true,
            }
        );
    }

    #[test]
    fn danish_keywords_are_accepted() {
        let text = "Egenskab: Kurv\n\n  Scenarie: Spise\n    Givet jeg har 3 agurker\n";
        let summary = validate_gherkin(text, Language::Danish).expect("valid");
        assert_eq!(summary.steps, 1);
    }

    #[test]
    fn rejects_text_without_a_feature() {
        let err = validate_gherkin("Given nothing at all\n", Language::English)
            .expect_err("not gherkin");
        assert!(matches!(err, EditorError::Gherkin(_)));
    }
}
