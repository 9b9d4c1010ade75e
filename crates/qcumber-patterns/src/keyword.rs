//! Locale keyword tables.
//!
//! A [`Language`] supplies the section keywords (`Feature`, `Background`,
//! `Scenario`) written by the serialiser and the step keywords used both to
//! recognise step lines in feature files and to recognise step definitions in
//! automation sources.

use std::fmt;
use std::str::FromStr;

const ENGLISH_STEPS: &[&str] = &["Given", "When", "Then", "And", "But", "*"];
const DANISH_STEPS: &[&str] = &["Givet", "Når", "Så", "Og", "Men", "*"];

/// Language whose keywords are active for parsing and serialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    /// English keywords (`Feature`, `Given`, ...).
    #[default]
    English,
    /// Danish keywords (`Egenskab`, `Givet`, ...).
    Danish,
}

impl Language {
    /// ISO 639-1 code, as understood by Gherkin's `# language:` header.
    ///
    /// # Examples
    ///
    /// ```
    /// use qcumber_patterns::Language;
    ///
    /// assert_eq!(Language::English.code(), "en");
    /// assert_eq!(Language::Danish.code(), "da");
    /// ```
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Danish => "da",
        }
    }

    /// Keyword introducing a feature.
    #[must_use]
    pub const fn feature(&self) -> &'static str {
        match self {
            Self::English => "Feature",
            Self::Danish => "Egenskab",
        }
    }

    /// Keyword introducing a background block.
    #[must_use]
    pub const fn background(&self) -> &'static str {
        match self {
            Self::English => "Background",
            Self::Danish => "Baggrund",
        }
    }

    /// Keyword introducing a scenario.
    #[must_use]
    pub const fn scenario(&self) -> &'static str {
        match self {
            Self::English => "Scenario",
            Self::Danish => "Scenarie",
        }
    }

    /// Every step keyword of the language, including punctuation-only ones.
    #[must_use]
    pub const fn step_keywords(&self) -> &'static [&'static str] {
        match self {
            Self::English => ENGLISH_STEPS,
            Self::Danish => DANISH_STEPS,
        }
    }

    /// Step keywords that are plain words.
    ///
    /// Only these are tried when recognising step definitions; a keyword such
    /// as `*` would match far too many unrelated source lines.
    ///
    /// # Examples
    ///
    /// ```
    /// use qcumber_patterns::Language;
    ///
    /// let words: Vec<_> = Language::English.word_keywords().collect();
    /// assert_eq!(words, ["Given", "When", "Then", "And", "But"]);
    /// ```
    pub fn word_keywords(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.step_keywords()
            .iter()
            .copied()
            .filter(|keyword| is_word(keyword))
    }

    /// Split a step line into its keyword and the remaining text.
    ///
    /// Word keywords must be followed by whitespace; `*` may be followed by
    /// anything. Returns `None` when the line does not start with a step
    /// keyword.
    ///
    /// # Examples
    ///
    /// ```
    /// use qcumber_patterns::Language;
    ///
    /// assert_eq!(
    ///     Language::English.split_step("Given I have 3 cucumbers"),
    ///     Some(("Given", "I have 3 cucumbers"))
    /// );
    /// assert_eq!(Language::English.split_step("Givenchy"), None);
    /// ```
    #[must_use]
    pub fn split_step<'a>(&self, line: &'a str) -> Option<(&'static str, &'a str)> {
        let line = line.trim_start();
        self.step_keywords().iter().find_map(|keyword| {
            let rest = line.strip_prefix(keyword)?;
            if !is_word(keyword) {
                return Some((*keyword, rest.trim_start()));
            }
            if rest.is_empty() {
                return Some((*keyword, rest));
            }
            rest.starts_with(char::is_whitespace)
                .then(|| (*keyword, rest.trim_start()))
        })
    }
}

fn is_word(keyword: &str) -> bool {
    !keyword.is_empty() && keyword.chars().all(char::is_alphabetic)
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when parsing a [`Language`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageParseError(pub String);

impl fmt::Display for LanguageParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported language '{}', expected one of: en, da",
            self.0
        )
    }
}

impl std::error::Error for LanguageParseError {}

impl FromStr for Language {
    type Err = LanguageParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("en") || trimmed.eq_ignore_ascii_case("english") {
            Ok(Self::English)
        } else if trimmed.eq_ignore_ascii_case("da") || trimmed.eq_ignore_ascii_case("danish") {
            Ok(Self::Danish)
        } else {
            Err(LanguageParseError(trimmed.to_string()))
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests exercise parse failures")]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("en", Language::English)]
    #[case(" English ", Language::English)]
    #[case("DA", Language::Danish)]
    #[case("danish", Language::Danish)]
    fn parses_case_insensitively(#[case] input: &str, #[case] expected: Language) {
        assert_eq!(input.parse::<Language>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_language() {
        let err = "klingon".parse::<Language>().unwrap_err();
        assert_eq!(err.0, "klingon");
        assert!(err.to_string().contains("unsupported language"));
    }

    #[test]
    fn word_keywords_skip_punctuation() {
        let words: Vec<_> = Language::Danish.word_keywords().collect();
        assert_eq!(words, ["Givet", "Når", "Så", "Og", "Men"]);
    }

    #[rstest]
    #[case("  And the light is on", Some(("And", "the light is on")))]
    #[case("* a bullet step", Some(("*", "a bullet step")))]
    #[case("Then", Some(("Then", "")))]
    #[case("Thenceforth we walk", None)]
    #[case("| a | b |", None)]
    fn splits_step_keywords(#[case] line: &str, #[case] expected: Option<(&str, &str)>) {
        assert_eq!(Language::English.split_step(line), expected);
    }

    #[test]
    fn splits_danish_steps() {
        assert_eq!(
            Language::Danish.split_step("Så er lyset tændt"),
            Some(("Så", "er lyset tændt"))
        );
    }
}
