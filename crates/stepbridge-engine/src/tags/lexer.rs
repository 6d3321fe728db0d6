//! Splits a tag expression into tokens.
//!
//! Tags start with `@` and run until whitespace or a parenthesis. Bare words
//! must be one of the keywords `and`, `or` or `not`, in any case.

use std::fmt;

use super::ast::TagExpressionError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum Kind {
    Tag(String),
    And,
    Or,
    Not,
    Open,
    Close,
    End,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(tag),
            Self::And => f.write_str("'and'"),
            Self::Or => f.write_str("'or'"),
            Self::Not => f.write_str("'not'"),
            Self::Open => f.write_str("'('"),
            Self::Close => f.write_str("')'"),
            Self::End => f.write_str("<end>"),
        }
    }
}

#[derive(Clone, Debug)]
pub(super) struct Token {
    pub(super) kind: Kind,
    pub(super) offset: usize,
}

fn ends_word(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')')
}

/// Tokenise the whole input, terminated by a single [`Kind::End`].
pub(super) fn tokenize(input: &str) -> Result<Vec<Token>, TagExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        let kind = match ch {
            c if c.is_whitespace() => continue,
            '(' => Kind::Open,
            ')' => Kind::Close,
            _ => {
                let mut end = offset + ch.len_utf8();
                while let Some(&(next_offset, next)) = chars.peek() {
                    if ends_word(next) {
                        break;
                    }
                    end = next_offset + next.len_utf8();
                    chars.next();
                }
                let word = input
                    .get(offset..end)
                    .ok_or_else(|| TagExpressionError::new(offset, "invalid word boundaries"))?;
                word_kind(word, offset)?
            }
        };
        tokens.push(Token { kind, offset });
    }

    tokens.push(Token {
        kind: Kind::End,
        offset: input.len(),
    });
    Ok(tokens)
}

fn word_kind(word: &str, offset: usize) -> Result<Kind, TagExpressionError> {
    if let Some(name) = word.strip_prefix('@') {
        if name.is_empty() {
            return Err(TagExpressionError::new(offset + 1, "expected tag name after '@'"));
        }
        return Ok(Kind::Tag(word.to_owned()));
    }
    match word.to_ascii_lowercase().as_str() {
        "and" => Ok(Kind::And),
        "or" => Ok(Kind::Or),
        "not" => Ok(Kind::Not),
        _ => Err(TagExpressionError::new(
            offset,
            format!("unexpected identifier '{word}'"),
        )),
    }
}
