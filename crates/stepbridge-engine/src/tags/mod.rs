//! Tag expressions used to select scenarios.
//!
//! Supported syntax: tags (`@tag`), unary `not`, binary `and` and `or`, and
//! parentheses. `not` binds tighter than `and`, which binds tighter than
//! `or`; binary operators associate to the left. Keywords are case
//! insensitive.

mod ast;
mod lexer;
mod parser;

pub use ast::{TagExpression, TagExpressionError};

/// Normalise `tag` to carry exactly one leading `@`.
#[must_use]
pub fn normalise_tag(tag: &str) -> String {
    let trimmed = tag.trim();
    if trimmed.starts_with('@') {
        trimmed.to_owned()
    } else {
        format!("@{trimmed}")
    }
}

/// Append `additions` to `target`, normalising every entry and dropping
/// duplicates while preserving first occurrence order.
pub fn extend_tags(target: &mut Vec<String>, additions: &[String]) {
    for tag in additions {
        let tag = normalise_tag(tag);
        if !target.contains(&tag) {
            target.push(tag);
        }
    }
}

#[cfg(test)]
mod tests;
