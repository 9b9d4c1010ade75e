//! Convert lexed definition bodies into anchored regular expressions.

use regex::Regex;
use tracing::debug;

use crate::errors::PatternError;

use super::lexer::{Token, lex_body};

/// Optional leading capture absorbing the step keyword ("Given", "And", ...).
pub(crate) const PREFIX_CAPTURE: &str = "(?:(.*) )?";

const WILDCARD_CAPTURE: &str = "(.*)";

/// A compiled definition body.
#[derive(Debug, Clone)]
pub(crate) struct CompiledBody {
    pub regex: Regex,
    /// Number of captures created from the body's groups.
    pub group_count: usize,
    /// Whether the fully escaped fallback had to be used.
    pub degraded: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Strict,
    Degraded,
}

/// Build the regex source for `body` in strict mode.
///
/// Fragments between groups are passed through as regex source and each group
/// keeps its own expression when that expression stands on its own.
#[cfg(test)]
pub(crate) fn build_regex_source(body: &str) -> String {
    assemble(&lex_body(body), Mode::Strict)
}

/// Compile `body`, falling back to the degraded form when the strict
/// expression is rejected.
///
/// # Errors
/// Returns [`PatternError`] only when the degraded expression cannot be
/// compiled either.
pub(crate) fn compile_body(body: &str) -> Result<CompiledBody, PatternError> {
    let tokens = lex_body(body);
    let group_count = tokens
        .iter()
        .filter(|token| matches!(token, Token::Group { .. }))
        .count();

    let strict = assemble(&tokens, Mode::Strict);
    match Regex::new(&strict) {
        Ok(regex) => Ok(CompiledBody {
            regex,
            group_count,
            degraded: false,
        }),
        Err(err) => {
            debug!(body, error = %err, "step definition rejected, escaping literal text");
            let degraded = assemble(&tokens, Mode::Degraded);
            let regex = Regex::new(&degraded).map_err(|source| PatternError::regex(body, source))?;
            Ok(CompiledBody {
                regex,
                group_count,
                degraded: true,
            })
        }
    }
}

fn assemble(tokens: &[Token], mode: Mode) -> String {
    let mut regex = String::from("^");
    regex.push_str(PREFIX_CAPTURE);
    regex.push_str("(?:");
    for token in tokens {
        match token {
            Token::Fragment(text) => match mode {
                Mode::Strict => regex.push_str(text),
                Mode::Degraded => regex.push_str(&regex::escape(&unescape_punctuation(text))),
            },
            Token::Group { body, quantifier } => match mode {
                Mode::Strict => push_group(&mut regex, body, *quantifier),
                Mode::Degraded => regex.push_str(WILDCARD_CAPTURE),
            },
            Token::Unbalanced(text) => regex.push_str(&regex::escape(text)),
        }
    }
    regex.push_str(")$");
    regex
}

fn push_group(regex: &mut String, body: &str, quantifier: Option<char>) {
    let Some(inner) = standalone_expression(body) else {
        debug!(group = body, "group replaced by wildcard capture");
        regex.push_str(WILDCARD_CAPTURE);
        return;
    };
    regex.push_str(if inner.starts_with('?') { "((" } else { "((?:" });
    regex.push_str(inner);
    regex.push(')');
    if let Some(q) = quantifier {
        regex.push(q);
    }
    regex.push(')');
}

/// Return the expression a group matches when it compiles by itself and
/// contains no captures of its own.
///
/// Group syntax prefixes (`?:`, `?P<name>`, `?<name>`) are stripped; other
/// `?` forms such as inline flags are kept and wrapped as written.
fn standalone_expression(body: &str) -> Option<&str> {
    let inner = strip_group_syntax(body);
    let probe = if inner.starts_with('?') {
        format!("^({inner})$")
    } else {
        format!("^(?:{inner})$")
    };
    let regex = Regex::new(&probe).ok()?;
    (regex.captures_len() == 1).then_some(inner)
}

fn strip_group_syntax(body: &str) -> &str {
    if let Some(rest) = body.strip_prefix("?:") {
        return rest;
    }
    let named = body
        .strip_prefix("?P<")
        .or_else(|| body.strip_prefix("?<").filter(|rest| !rest.starts_with(['=', '!'])));
    named
        .and_then(|rest| rest.split_once('>'))
        .map_or(body, |(_, rest)| rest)
}

/// Drop backslashes that only escape punctuation so the text can be escaped
/// afresh as a literal.
fn unescape_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if c == '\\' && !next.is_alphanumeric() => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests exercise compilation fallibility")]
mod tests {
    use super::*;

    #[test]
    fn keeps_standalone_group_expressions() {
        assert_eq!(
            build_regex_source(r"I have (\d+) cucumbers"),
            r"^(?:(.*) )?(?:I have ((?:\d+)) cucumbers)$"
        );
    }

    #[test]
    fn wraps_quantifier_inside_capture() {
        assert_eq!(
            build_regex_source("the (big )?dog"),
            "^(?:(.*) )?(?:the ((?:big )?)dog)$"
        );
    }

    #[test]
    fn strips_non_capturing_and_named_syntax() {
        assert_eq!(
            build_regex_source("(?:a|b) (?P<colour>red|blue)"),
            "^(?:(.*) )?(?:((?:a|b)) ((?:red|blue)))$"
        );
    }

    #[test]
    fn keeps_inline_flag_groups_as_written() {
        assert_eq!(
            build_regex_source("(?i:yes|no) please"),
            "^(?:(.*) )?(?:((?i:yes|no)) please)$"
        );
    }

    #[test]
    fn replaces_groups_with_inner_captures_by_wildcard() {
        assert_eq!(
            build_regex_source("a (b(c)d) e"),
            "^(?:(.*) )?(?:a (.*) e)$"
        );
    }

    #[test]
    fn escapes_unbalanced_remainder() {
        assert_eq!(
            build_regex_source("one (1) two (2 three"),
            r"^(?:(.*) )?(?:one ((?:1)) two \(2 three)$"
        );
    }

    #[test]
    fn degrades_when_strict_expression_is_rejected() {
        let compiled = compile_body("broken ) (x+) here").unwrap();
        assert!(compiled.degraded);
        assert_eq!(compiled.group_count, 1);
        assert_eq!(compiled.regex.as_str(), r"^(?:(.*) )?(?:broken \) (.*) here)$");
        assert!(compiled.regex.is_match("Given broken ) anything here"));
    }

    #[test]
    fn strict_compilation_counts_groups() {
        let compiled = compile_body(r#"the "([^"]*)" page shows (\d+) items?"#).unwrap();
        assert!(!compiled.degraded);
        assert_eq!(compiled.group_count, 2);
        assert_eq!(compiled.regex.captures_len(), 4);
    }

    #[test]
    fn top_level_alternation_stays_anchored() {
        assert_eq!(
            build_regex_source("the light is on|off"),
            "^(?:(.*) )?(?:the light is on|off)$"
        );
        let compiled = compile_body("the light is on|off").unwrap();
        assert!(compiled.regex.is_match("Given the light is on"));
        assert!(compiled.regex.is_match("off"));
        assert!(!compiled.regex.is_match("Given the light is on and the house burns down"));
        assert!(!compiled.regex.is_match("Given the light is offline"));
    }

    #[test]
    fn unescapes_punctuation_only() {
        assert_eq!(unescape_punctuation(r"foo\(\)\d"), r"foo()\d");
    }
}
