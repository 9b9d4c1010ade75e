//! Lexer splitting a definition body into regex fragments and groups.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// Regex source between groups, passed through verbatim.
    Fragment(String),
    /// A top-level parenthesised group and its trailing quantifier.
    Group {
        body: String,
        quantifier: Option<char>,
    },
    /// Everything from an unbalanced `(` onwards, matched literally.
    Unbalanced(String),
}

pub(crate) fn lex_body(body: &str) -> Vec<Token> {
    let chars: Vec<char> = body.chars().collect();
    let mut tokens = Vec::new();
    let mut fragment = String::new();
    let mut in_class = false;
    let mut pos = 0;

    let flush = |fragment: &mut String, tokens: &mut Vec<Token>| {
        if !fragment.is_empty() {
            tokens.push(Token::Fragment(std::mem::take(fragment)));
        }
    };

    while let Some(&c) = chars.get(pos) {
        match c {
            '\\' => {
                fragment.push(c);
                if let Some(&next) = chars.get(pos + 1) {
                    fragment.push(next);
                }
                pos += 2;
            }
            '[' if !in_class => {
                in_class = true;
                fragment.push(c);
                pos += 1;
            }
            ']' if in_class => {
                in_class = false;
                fragment.push(c);
                pos += 1;
            }
            '(' if !in_class => {
                let Some(end) = find_group_end(&chars, pos) else {
                    flush(&mut fragment, &mut tokens);
                    tokens.push(Token::Unbalanced(collect(&chars, pos, chars.len())));
                    return tokens;
                };
                flush(&mut fragment, &mut tokens);
                let quantifier = chars
                    .get(end + 1)
                    .copied()
                    .filter(|q| matches!(q, '?' | '+' | '*'));
                tokens.push(Token::Group {
                    body: collect(&chars, pos + 1, end),
                    quantifier,
                });
                pos = end + 1 + usize::from(quantifier.is_some());
            }
            _ => {
                fragment.push(c);
                pos += 1;
            }
        }
    }

    flush(&mut fragment, &mut tokens);
    tokens
}

/// Index of the `)` balancing the `(` at `open`, honouring escapes and
/// character classes.
fn find_group_end(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_class = false;
    let mut pos = open;
    while let Some(&c) = chars.get(pos) {
        match c {
            '\\' => {
                pos += 2;
                continue;
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(pos);
                }
            }
            _ => {}
        }
        pos += 1;
    }
    None
}

fn collect(chars: &[char], start: usize, end: usize) -> String {
    chars.get(start..end).unwrap_or_default().iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(body: &str, quantifier: Option<char>) -> Token {
        Token::Group {
            body: body.into(),
            quantifier,
        }
    }

    #[test]
    fn splits_fragments_and_groups() {
        assert_eq!(
            lex_body(r"I have (\d+) cucumbers"),
            vec![
                Token::Fragment("I have ".into()),
                group(r"\d+", None),
                Token::Fragment(" cucumbers".into()),
            ]
        );
    }

    #[test]
    fn captures_trailing_quantifier() {
        assert_eq!(
            lex_body("I (?:really )?(like|love)+ it"),
            vec![
                Token::Fragment("I ".into()),
                group("?:really ", Some('?')),
                group("like|love", Some('+')),
                Token::Fragment(" it".into()),
            ]
        );
    }

    #[test]
    fn nested_groups_belong_to_outer_group() {
        assert_eq!(
            lex_body("a (b(c)d) e"),
            vec![
                Token::Fragment("a ".into()),
                group("b(c)d", None),
                Token::Fragment(" e".into()),
            ]
        );
    }

    #[test]
    fn escaped_and_classed_parentheses_are_literal() {
        assert_eq!(
            lex_body(r"call foo\(\) with [()] (.*)"),
            vec![
                Token::Fragment(r"call foo\(\) with [()] ".into()),
                group(".*", None),
            ]
        );
    }

    #[test]
    fn unbalanced_group_stops_scanning() {
        assert_eq!(
            lex_body("one (1) two (2 three"),
            vec![
                Token::Fragment("one ".into()),
                group("1", None),
                Token::Fragment(" two ".into()),
                Token::Unbalanced("(2 three".into()),
            ]
        );
    }
}
