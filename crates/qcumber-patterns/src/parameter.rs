//! Parameter value sets attached to step patterns.

use std::fmt;

/// Textual form of the "any value" sentinel.
pub const WILDCARD: &str = "*";

/// Accepted values for one step-pattern parameter.
///
/// A parameter either accepts anything ([`ParameterSpec::Any`]) or one of an
/// ordered list of literal strings. Specs are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParameterSpec {
    /// Any value is accepted.
    Any,
    /// Only the listed literals are accepted, in presentation order.
    OneOf(Vec<String>),
}

impl ParameterSpec {
    /// Build a spec from a literal list.
    ///
    /// A list consisting of the single literal `*` is the wildcard.
    ///
    /// # Examples
    ///
    /// ```
    /// use qcumber_patterns::ParameterSpec;
    ///
    /// assert_eq!(ParameterSpec::from_literals(["*"]), ParameterSpec::Any);
    /// assert!(ParameterSpec::from_literals(["on", "off"]).accepts("off"));
    /// ```
    #[must_use]
    pub fn from_literals<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let literals: Vec<String> = literals.into_iter().map(Into::into).collect();
        match literals.as_slice() {
            [only] if only == WILDCARD => Self::Any,
            _ => Self::OneOf(literals),
        }
    }

    /// Return `true` when the spec is the wildcard.
    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// The accepted literals; empty for the wildcard.
    #[must_use]
    pub fn literals(&self) -> &[String] {
        match self {
            Self::Any => &[],
            Self::OneOf(literals) => literals,
        }
    }

    /// Check whether `value` is accepted.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::OneOf(literals) => literals.iter().any(|literal| literal == value),
        }
    }
}

impl fmt::Display for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(WILDCARD),
            Self::OneOf(literals) => write!(f, "({})", literals.join("|")),
        }
    }
}

/// Read a parameter override block such as `(red|green) (*) (on|off)`.
///
/// Each parenthesised group yields one spec holding the `|`-separated
/// literals. Text outside groups is ignored and reading stops at the first
/// group without a closing parenthesis, so unparseable input degrades to a
/// shorter (possibly empty) list instead of failing.
pub(crate) fn parse_override(block: &str) -> Vec<ParameterSpec> {
    let mut specs = Vec::new();
    let mut rest = block;
    while let Some(start) = rest.find('(') {
        let Some(after_open) = rest.get(start + 1..) else {
            break;
        };
        let Some(end) = after_open.find(')') else {
            break;
        };
        let Some(group) = after_open.get(..end) else {
            break;
        };
        specs.push(ParameterSpec::from_literals(group.split('|')));
        rest = after_open.get(end + 1..).unwrap_or_default();
    }
    specs
}
