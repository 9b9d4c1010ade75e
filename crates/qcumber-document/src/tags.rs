//! Tag normalisation and run-tag selection.
//!
//! Tags on features and scenarios are kept in insertion order, always carry
//! a leading `@` and never repeat, so the tag line a node serialises to is
//! stable regardless of how the tags were typed.

use std::collections::BTreeMap;
use std::fmt;

/// Prefix marking a tag as excluded in a run selection.
pub const NEGATION_PREFIX: char = '~';

/// Normalise a raw tag to `@tag` form.
///
/// Returns `None` for blank input or text containing whitespace.
///
/// # Examples
/// ```
/// use qcumber_document::normalize_tag;
///
/// assert_eq!(normalize_tag(" smoke ").as_deref(), Some("@smoke"));
/// assert_eq!(normalize_tag("@wip").as_deref(), Some("@wip"));
/// assert_eq!(normalize_tag("@"), None);
/// ```
#[must_use]
pub fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let name = trimmed.strip_prefix('@').unwrap_or(trimmed);
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some(format!("@{name}"))
}

/// Add `tag` to `target` unless it is already present.
///
/// Returns `true` when the tag was added.
pub fn extend_tag_set(target: &mut Vec<String>, tag: &str) -> bool {
    let Some(formatted) = normalize_tag(tag) else {
        return false;
    };
    if target.contains(&formatted) {
        return false;
    }
    target.push(formatted);
    true
}

/// Normalise every tag, dropping blanks and repeats while keeping order.
#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalised = Vec::new();
    for tag in tags {
        extend_tag_set(&mut normalised, tag.as_ref());
    }
    normalised
}

/// Split a tag line such as `@smoke @slow` into normalised tags.
#[must_use]
pub fn parse_tag_line(line: &str) -> Vec<String> {
    normalize_tags(line.split_whitespace())
}

/// Whether a trimmed line is a tag line.
pub(crate) fn is_tag_line(line: &str) -> bool {
    let mut words = line.split_whitespace().peekable();
    words.peek().is_some() && words.all(|word| word.len() > 1 && word.starts_with('@'))
}

/// The excluded form of a tag: `~@tag`.
#[must_use]
pub fn negated_tag(tag: &str) -> String {
    let formatted = normalize_tag(tag).unwrap_or_else(|| tag.to_string());
    format!("{NEGATION_PREFIX}{formatted}")
}

/// How a tag takes part in a run selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunTagState {
    /// Scenarios carrying the tag are selected.
    Included,
    /// Scenarios carrying the tag are skipped.
    Excluded,
}

/// Tags chosen to filter a test run.
///
/// Toggling a tag cycles it through *absent*, *included* (`@tag`), *excluded*
/// (`~@tag`) and back to absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTagSelection {
    tags: BTreeMap<String, RunTagState>,
}

impl RunTagSelection {
    /// An empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `tag` to its next state and return it.
    ///
    /// # Examples
    /// ```
    /// use qcumber_document::{RunTagSelection, RunTagState};
    ///
    /// let mut selection = RunTagSelection::new();
    /// assert_eq!(selection.toggle("smoke"), Some(RunTagState::Included));
    /// assert_eq!(selection.toggle("@smoke"), Some(RunTagState::Excluded));
    /// assert_eq!(selection.toggle("@smoke"), None);
    /// ```
    pub fn toggle(&mut self, tag: &str) -> Option<RunTagState> {
        let key = normalize_tag(tag)?;
        let next = match self.tags.get(&key) {
            None => Some(RunTagState::Included),
            Some(RunTagState::Included) => Some(RunTagState::Excluded),
            Some(RunTagState::Excluded) => None,
        };
        match next {
            Some(state) => {
                self.tags.insert(key, state);
            }
            None => {
                self.tags.remove(&key);
            }
        }
        next
    }

    /// Current state of `tag`, `None` when absent.
    #[must_use]
    pub fn state(&self, tag: &str) -> Option<RunTagState> {
        normalize_tag(tag).and_then(|key| self.tags.get(&key).copied())
    }

    /// Whether `tag` is currently included.
    #[must_use]
    pub fn is_enabled(&self, tag: &str) -> bool {
        self.state(tag) == Some(RunTagState::Included)
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Selected tags in runner form (`@a`, `~@b`), sorted by tag name.
    pub fn expressions(&self) -> impl Iterator<Item = String> + '_ {
        self.tags.iter().map(|(tag, state)| match state {
            RunTagState::Included => tag.clone(),
            RunTagState::Excluded => negated_tag(tag),
        })
    }
}

impl fmt::Display for RunTagSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expressions: Vec<String> = self.expressions().collect();
        f.write_str(&expressions.join(" "))
    }
}
