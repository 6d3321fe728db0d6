//! Recursive-descent parser producing an [`Expr`] tree.

use super::ast::{Expr, TagExpressionError};
use super::lexer::{Kind, Token, tokenize};

pub(super) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub(super) fn new(input: &str) -> Result<Self, TagExpressionError> {
        Ok(Self {
            tokens: tokenize(input)?,
            pos: 0,
        })
    }

    fn peek(&self) -> (&Kind, usize) {
        self.tokens
            .get(self.pos)
            .map_or((&Kind::End, 0), |token| (&token.kind, token.offset))
    }

    fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub(super) fn expression(&mut self) -> Result<Expr, TagExpressionError> {
        let mut node = self.conjunction()?;
        while matches!(self.peek().0, Kind::Or) {
            self.bump();
            self.require_operand("or")?;
            let rhs = self.conjunction()?;
            node = Expr::Or(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn conjunction(&mut self) -> Result<Expr, TagExpressionError> {
        let mut node = self.negation()?;
        while matches!(self.peek().0, Kind::And) {
            self.bump();
            self.require_operand("and")?;
            let rhs = self.negation()?;
            node = Expr::And(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn negation(&mut self) -> Result<Expr, TagExpressionError> {
        if matches!(self.peek().0, Kind::Not) {
            self.bump();
            self.require_operand("not")?;
            return Ok(Expr::Not(Box::new(self.negation()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, TagExpressionError> {
        let (kind, offset) = self.peek();
        match kind.clone() {
            Kind::Tag(tag) => {
                self.bump();
                Ok(Expr::Tag(tag))
            }
            Kind::Open => {
                self.bump();
                let inner = self.expression()?;
                if matches!(self.peek().0, Kind::Close) {
                    self.bump();
                    Ok(inner)
                } else {
                    Err(TagExpressionError::new(offset, "missing ')'"))
                }
            }
            Kind::End => Err(TagExpressionError::new(offset, "expected tag or '('")),
            other => Err(TagExpressionError::new(
                offset,
                format!("expected tag or '(' but found {other}"),
            )),
        }
    }

    fn require_operand(&self, operator: &str) -> Result<(), TagExpressionError> {
        let (kind, offset) = self.peek();
        match kind {
            Kind::And | Kind::Or | Kind::Close | Kind::End => Err(TagExpressionError::new(
                offset,
                format!("expected tag or '(' after '{operator}'"),
            )),
            Kind::Tag(_) | Kind::Not | Kind::Open => Ok(()),
        }
    }

    pub(super) fn finish(&self) -> Result<(), TagExpressionError> {
        let (kind, offset) = self.peek();
        if matches!(kind, Kind::End) {
            Ok(())
        } else {
            Err(TagExpressionError::new(offset, format!("unexpected token {kind}")))
        }
    }
}
