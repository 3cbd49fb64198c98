//! Token scanner for binding expressions.
//!
//! Hand-rolled char-level scanner. Any malformed input (unterminated string,
//! stray character, unknown `$` receiver) is an authoring error raised at
//! compile time, never deferred to evaluation.

use crate::error::BindError;

/// One lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// The view-model receiver, `this`.
    This,
    /// The event receiver, `$event`.
    Event,
    Ident(String),
    Number(f64),
    Str(String),
    True,
    False,
    Null,
    Dot,
    LParen,
    RParen,
    Bang,
    Assign,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    AndAnd,
    OrOr,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Scan `text` into tokens.
pub fn scan(text: &str) -> Result<Vec<Token>, BindError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if is_ident_start(c) {
            let start = i;
            while i < chars.len() && is_ident_continue(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            tokens.push(match word.as_str() {
                "this" => Token::This,
                "true" => Token::True,
                "false" => Token::False,
                "null" => Token::Null,
                _ => Token::Ident(word),
            });
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            // Fractional part, but not a member-access dot.
            if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let literal: String = chars[start..i].iter().collect();
            let number = literal
                .parse::<f64>()
                .map_err(|_| BindError::authoring(text, format!("invalid number `{literal}`")))?;
            tokens.push(Token::Number(number));
            continue;
        }

        if c == '\'' || c == '"' {
            let quote = c;
            let start = i + 1;
            i += 1;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            if i >= chars.len() {
                return Err(BindError::authoring(text, "unterminated string literal"));
            }
            tokens.push(Token::Str(chars[start..i].iter().collect()));
            i += 1;
            continue;
        }

        if c == '$' {
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && is_ident_continue(chars[end]) {
                end += 1;
            }
            let name: String = chars[start..end].iter().collect();
            if name != "event" {
                return Err(BindError::authoring(text, format!("unknown receiver `${name}`")));
            }
            tokens.push(Token::Event);
            i = end;
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (token, width) = match (c, next) {
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) => (Token::NotEq, 2),
            ('<', Some('=')) => (Token::Le, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('=', _) => (Token::Assign, 1),
            ('!', _) => (Token::Bang, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('.', _) => (Token::Dot, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            _ => {
                return Err(BindError::authoring(text, format!("unexpected character `{c}`")));
            }
        };
        tokens.push(token);
        i += width;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_chain() {
        let tokens = scan("this.user.name").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::This,
                Token::Dot,
                Token::Ident("user".into()),
                Token::Dot,
                Token::Ident("name".into()),
            ]
        );
    }

    #[test]
    fn test_event_receiver() {
        let tokens = scan("$event.target.value").unwrap();
        assert_eq!(tokens[0], Token::Event);
        assert!(scan("$evt.x").is_err());
    }

    #[test]
    fn test_numbers_and_dots() {
        assert_eq!(scan("1.5").unwrap(), vec![Token::Number(1.5)]);
        // A trailing dot is member access, not a fraction.
        assert_eq!(
            scan("1.foo").unwrap(),
            vec![Token::Number(1.0), Token::Dot, Token::Ident("foo".into())]
        );
    }

    #[test]
    fn test_two_char_operators() {
        let tokens = scan("a == b != c <= d >= e && f || g").unwrap();
        assert!(tokens.contains(&Token::EqEq));
        assert!(tokens.contains(&Token::NotEq));
        assert!(tokens.contains(&Token::Le));
        assert!(tokens.contains(&Token::Ge));
        assert!(tokens.contains(&Token::AndAnd));
        assert!(tokens.contains(&Token::OrOr));
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(scan("'hi'").unwrap(), vec![Token::Str("hi".into())]);
        assert_eq!(scan("\"hi\"").unwrap(), vec![Token::Str("hi".into())]);
        assert!(scan("'open").is_err());
    }

    #[test]
    fn test_stray_character_is_authoring_error() {
        let err = scan("this.a @ 1").unwrap_err();
        assert!(matches!(err, BindError::Authoring { .. }));
    }
}
