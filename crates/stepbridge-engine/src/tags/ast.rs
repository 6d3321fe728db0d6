//! Expression tree and evaluation.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use super::parser::Parser;

/// Parsed tag expression.
///
/// # Examples
///
/// ```
/// use stepbridge_engine::tags::TagExpression;
///
/// let expr = TagExpression::parse("@fast and not @wip").unwrap();
/// assert!(expr.matches(["@fast"]));
/// assert!(!expr.matches(["@fast", "@wip"]));
/// assert_eq!(expr.to_string(), "(@fast and (not @wip))");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagExpression {
    root: Expr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// Syntax error with the byte offset it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tag expression at byte {offset}: {reason}")]
pub struct TagExpressionError {
    offset: usize,
    reason: String,
}

impl TagExpressionError {
    pub(super) fn new(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }

    /// Byte offset of the offending input.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl TagExpression {
    /// Parse `input`.
    ///
    /// # Errors
    ///
    /// Returns [`TagExpressionError`] for empty input, unknown keywords,
    /// dangling operators and unbalanced parentheses.
    pub fn parse(input: &str) -> Result<Self, TagExpressionError> {
        let mut parser = Parser::new(input)?;
        let root = parser.expression()?;
        parser.finish()?;
        Ok(Self { root })
    }

    /// Evaluate against a set of tags, each carrying its leading `@`.
    pub fn matches<'a, I>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let set: HashSet<&str> = tags.into_iter().collect();
        self.root.eval(&set)
    }
}

impl fmt::Display for TagExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.fmt(f)
    }
}

impl Expr {
    fn eval(&self, tags: &HashSet<&str>) -> bool {
        match self {
            Self::Tag(tag) => tags.contains(tag.as_str()),
            Self::Not(inner) => !inner.eval(tags),
            Self::And(lhs, rhs) => lhs.eval(tags) && rhs.eval(tags),
            Self::Or(lhs, rhs) => lhs.eval(tags) || rhs.eval(tags),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(tag),
            Self::Not(inner) => write!(f, "(not {inner})"),
            Self::And(lhs, rhs) => write!(f, "({lhs} and {rhs})"),
            Self::Or(lhs, rhs) => write!(f, "({lhs} or {rhs})"),
        }
    }
}
