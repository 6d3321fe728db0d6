//! Matching step text against the announced step definitions.

use regex::Regex;
use stepbridge_protocol::{StepDefinitionConfig, StepDefinitionId};

use crate::error::EngineError;

/// Result of matching one step's text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepMatch {
    /// No definition matched.
    Undefined,
    /// More than one definition matched.
    Ambiguous(Vec<StepDefinitionId>),
    /// Exactly one definition matched.
    Matched {
        /// The matching definition.
        id: StepDefinitionId,
        /// Capture groups in order; unmatched optional groups are empty.
        captures: Vec<String>,
    },
}

/// Compiled step definitions in registration order.
#[derive(Debug, Default)]
pub struct StepMatcher {
    definitions: Vec<(StepDefinitionId, Regex)>,
}

impl StepMatcher {
    /// Compile every definition's pattern.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StepPattern`] for the first invalid pattern.
    pub fn new(configs: &[StepDefinitionConfig]) -> Result<Self, EngineError> {
        let definitions = configs
            .iter()
            .map(|config| {
                let source = &config.pattern.source;
                Regex::new(source)
                    .map(|regex| (config.id.clone(), regex))
                    .map_err(|source_err| EngineError::StepPattern {
                        pattern: source.clone(),
                        source: source_err,
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { definitions })
    }

    /// Match `text` against every definition.
    #[must_use]
    pub fn find(&self, text: &str) -> StepMatch {
        let mut hits = self
            .definitions
            .iter()
            .filter_map(|(id, regex)| regex.captures(text).map(|caps| (id, caps)));
        let Some((id, caps)) = hits.next() else {
            return StepMatch::Undefined;
        };
        let rest: Vec<StepDefinitionId> = hits.map(|(other, _)| other.clone()).collect();
        if !rest.is_empty() {
            let mut ids = vec![id.clone()];
            ids.extend(rest);
            return StepMatch::Ambiguous(ids);
        }
        StepMatch::Matched {
            id: id.clone(),
            captures: caps
                .iter()
                .skip(1)
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_owned()))
                .collect(),
        }
    }

    /// Number of compiled definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no definitions were announced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use stepbridge_protocol::{PatternKind, StepDefinitionPattern};

    use super::*;

    fn config(index: usize, source: &str) -> StepDefinitionConfig {
        StepDefinitionConfig {
            id: StepDefinitionId::from_index(index),
            pattern: StepDefinitionPattern {
                source: source.to_owned(),
                kind: PatternKind::RegularExpression,
            },
        }
    }

    fn matcher(sources: &[&str]) -> StepMatcher {
        let configs: Vec<_> = sources
            .iter()
            .enumerate()
            .map(|(index, source)| config(index, source))
            .collect();
        StepMatcher::new(&configs).unwrap_or_else(|e| panic!("compile matcher: {e}"))
    }

    #[rstest]
    #[case("I have 3 cukes", StepMatch::Matched { id: StepDefinitionId::from("0"), captures: vec!["3".into()] })]
    #[case("I eat it", StepMatch::Undefined)]
    #[case("I see it", StepMatch::Ambiguous(vec![StepDefinitionId::from("1"), StepDefinitionId::from("2")]))]
    fn classifies_step_text(#[case] text: &str, #[case] expected: StepMatch) {
        let matcher = matcher(&[r"^I have (\d+) cukes$", r"^I see (\w+)$", r"^I see it$"]);
        assert_eq!(matcher.find(text), expected);
    }

    #[test]
    fn unmatched_optional_groups_become_empty() {
        let matcher = matcher(&[r"^I (really )?like (\w+)$"]);
        assert_eq!(
            matcher.find("I like tea"),
            StepMatch::Matched {
                id: StepDefinitionId::from("0"),
                captures: vec![String::new(), "tea".to_owned()],
            }
        );
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let Err(err) = StepMatcher::new(&[config(0, "(unclosed")]) else {
            panic!("expected invalid pattern error");
        };
        assert!(err.to_string().contains("(unclosed"));
    }
}
