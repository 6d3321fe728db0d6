//! Parsing, precedence and error coverage for tag expressions.

use rstest::rstest;

use super::{TagExpression, extend_tags, normalise_tag};

fn parse(input: &str) -> TagExpression {
    TagExpression::parse(input).unwrap_or_else(|err| panic!("parse `{input}`: {err}"))
}

fn parse_error(input: &str) -> String {
    let Err(err) = TagExpression::parse(input) else {
        panic!("expected parse error for `{input}`");
    };
    err.to_string()
}

#[rstest]
#[case("@fast", &["@fast"], true)]
#[case("@fast", &["@slow"], false)]
#[case("@smoke-tests", &["@smoke-tests"], true)]
#[case("@123", &["@123"], true)]
#[case("@a or @b and @c", &["@a"], true)]
#[case("@a or @b and @c", &["@b", "@c"], true)]
#[case("@a or @b and @c", &["@b"], false)]
#[case("not (@a or @b)", &["@a"], false)]
#[case("not (@a or @b)", &["@c"], true)]
#[case("not not @a", &["@a"], true)]
#[case("@a Or nOt @b", &["@c"], true)]
#[case("@a Or nOt @b", &["@b"], false)]
#[case("(@a)and(@b)", &["@a", "@b"], true)]
#[case("@ns:tag", &["@ns:tag"], true)]
fn evaluates_expressions(#[case] input: &str, #[case] tags: &[&str], #[case] expected: bool) {
    assert_eq!(parse(input).matches(tags.iter().copied()), expected);
}

#[test]
fn and_chains_group_to_the_left() {
    assert_eq!(parse("@a and @b and @c").to_string(), "((@a and @b) and @c)");
    assert_eq!(parse("@a or @b and @c").to_string(), "(@a or (@b and @c))");
}

#[rstest]
#[case("@a and", "expected tag or '(' after 'and'")]
#[case("not", "expected tag or '(' after 'not'")]
#[case("@a && @b", "unexpected identifier '&&'")]
#[case("", "expected tag or '('")]
#[case("(@a or @b", "missing ')'")]
#[case("@a @b", "unexpected token @b")]
#[case("@", "expected tag name after '@'")]
#[case("fast", "unexpected identifier 'fast'")]
fn reports_parse_errors(#[case] input: &str, #[case] expected: &str) {
    let err = parse_error(input);
    assert!(err.contains(expected), "unexpected error message: {err}");
}

#[test]
fn error_offset_points_at_the_problem() {
    let Err(err) = TagExpression::parse("@a and )") else {
        panic!("expected parse error");
    };
    assert_eq!(err.offset(), 7);
}

#[test]
fn extend_tags_normalises_and_deduplicates() {
    let mut tags = vec!["@fast".to_owned()];
    extend_tags(
        &mut tags,
        &["fast".to_owned(), " web ".to_owned(), "@web".to_owned()],
    );
    assert_eq!(tags, vec!["@fast".to_owned(), "@web".to_owned()]);
    assert_eq!(normalise_tag("@already"), "@already");
}
