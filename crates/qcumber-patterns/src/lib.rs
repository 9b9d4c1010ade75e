//! Step-definition extraction and step-pattern matching for qcumber.
//!
//! Automation sources declare steps as Ruby-style definitions such as
//! `Given /^I have (\d+) cucumbers$/ do |n|`. [`DefinitionParser`] turns every
//! such line into a [`StepPattern`]: an anchored regular expression plus one
//! [`ParameterSpec`] per bracketed group, preceded by a spec for the step
//! keyword. A [`PatternSet`] matches free step text against the patterns in
//! import order.

mod definition;
mod errors;
mod keyword;
mod matcher;
mod parameter;
mod pattern;

pub use definition::{
    DEFAULT_OVERRIDE_MARKER, DefinitionImport, DefinitionParser, LEGACY_OVERRIDE_MARKER,
};
pub use errors::{PatternError, SourceReadError};
pub use keyword::{Language, LanguageParseError};
pub use matcher::{MatchResult, PatternSet, match_step};
pub use parameter::{ParameterSpec, WILDCARD};
pub use pattern::StepPattern;
