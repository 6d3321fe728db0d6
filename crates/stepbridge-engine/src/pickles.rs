//! Compilation of parsed features into pickles.
//!
//! A plain scenario yields one pickle. An outline yields one pickle per
//! examples row, with `<column>` placeholders in the name and step text
//! replaced by the row's values. Background steps (feature first, then
//! rule) precede the scenario's own steps.

use std::sync::LazyLock;

use gherkin::{Background, Examples, Feature, LineCol, Scenario, Step};
use regex::{Captures, Regex};
use stepbridge_protocol::{Location, Pickle, PickleStep, ScenarioId};

use crate::tags::extend_tags;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([^>\s][^>]*)>").unwrap_or_else(|_| unreachable!("placeholder regex is valid"))
});

fn location(position: &LineCol) -> Location {
    Location::new(
        u32::try_from(position.line).unwrap_or(u32::MAX),
        u32::try_from(position.col).unwrap_or(u32::MAX),
    )
}

/// One examples row with its header, values and source position.
struct Row<'a> {
    headers: &'a [String],
    values: &'a [String],
    location: Location,
}

impl Row<'_> {
    fn substitute(&self, text: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let name = caps.get(1).map_or("", |m| m.as_str());
                self.headers
                    .iter()
                    .position(|header| header == name)
                    .and_then(|index| self.values.get(index))
                    .map_or_else(
                        || caps.get(0).map_or_else(String::new, |m| m.as_str().to_owned()),
                        Clone::clone,
                    )
            })
            .into_owned()
    }
}

/// Assigns sequential pickle identifiers across every compiled feature.
#[derive(Debug, Default)]
pub struct PickleCompiler {
    language: String,
    next_id: usize,
}

impl PickleCompiler {
    /// Create a compiler tagging every pickle with `language`.
    #[must_use]
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            next_id: 0,
        }
    }

    /// Compile every scenario of `feature`, in source order.
    pub fn compile(&mut self, feature: &Feature, uri: &str) -> Vec<Pickle> {
        let mut tags = Vec::new();
        extend_tags(&mut tags, &feature.tags);
        let mut backgrounds: Vec<&Background> = feature.background.iter().collect();

        let mut pickles = Vec::new();
        for scenario in &feature.scenarios {
            self.compile_scenario(scenario, uri, &tags, &backgrounds, &mut pickles);
        }
        for rule in &feature.rules {
            let mut rule_tags = tags.clone();
            extend_tags(&mut rule_tags, &rule.tags);
            backgrounds.truncate(usize::from(feature.background.is_some()));
            backgrounds.extend(rule.background.iter());
            for scenario in &rule.scenarios {
                self.compile_scenario(scenario, uri, &rule_tags, &backgrounds, &mut pickles);
            }
        }
        pickles
    }

    fn compile_scenario(
        &mut self,
        scenario: &Scenario,
        uri: &str,
        inherited_tags: &[String],
        backgrounds: &[&Background],
        out: &mut Vec<Pickle>,
    ) {
        let mut tags = inherited_tags.to_vec();
        extend_tags(&mut tags, &scenario.tags);

        if scenario.examples.is_empty() {
            let pickle = self.pickle(scenario, uri, tags, backgrounds, None);
            out.push(pickle);
            return;
        }

        for examples in &scenario.examples {
            let Some(table) = examples.table.as_ref() else {
                continue;
            };
            let Some((headers, rows)) = table.rows.split_first() else {
                continue;
            };
            let row_tags = examples_tags(&tags, examples);
            let header_line = location(&table.position);
            for (offset, values) in (1_u32..).zip(rows) {
                let row = Row {
                    headers,
                    values,
                    location: Location::new(
                        header_line.line.saturating_add(offset),
                        header_line.column,
                    ),
                };
                let pickle = self.pickle(scenario, uri, row_tags.clone(), backgrounds, Some(&row));
                out.push(pickle);
            }
        }
    }

    fn pickle(
        &mut self,
        scenario: &Scenario,
        uri: &str,
        tags: Vec<String>,
        backgrounds: &[&Background],
        row: Option<&Row<'_>>,
    ) -> Pickle {
        let id = ScenarioId::new(format!("pickle-{}", self.next_id));
        self.next_id += 1;

        let mut locations = vec![location(&scenario.position)];
        locations.extend(row.map(|row| row.location));

        let background_steps = backgrounds
            .iter()
            .flat_map(|background| background.steps.iter())
            .map(|step| pickle_step(step, None));
        let scenario_steps = scenario.steps.iter().map(|step| pickle_step(step, row));

        Pickle {
            id,
            uri: uri.to_owned(),
            name: row.map_or_else(|| scenario.name.clone(), |row| row.substitute(&scenario.name)),
            language: self.language.clone(),
            tags,
            locations,
            steps: background_steps.chain(scenario_steps).collect(),
        }
    }
}

fn examples_tags(base: &[String], examples: &Examples) -> Vec<String> {
    let mut tags = base.to_vec();
    extend_tags(&mut tags, &examples.tags);
    tags
}

fn pickle_step(step: &Step, row: Option<&Row<'_>>) -> PickleStep {
    let mut locations = vec![location(&step.position)];
    locations.extend(row.map(|row| row.location));
    PickleStep {
        text: row.map_or_else(|| step.value.clone(), |row| row.substitute(&step.value)),
        locations,
    }
}

#[cfg(test)]
mod tests {
    //! Pickle compilation from inline feature text.

    use gherkin::{Feature, GherkinEnv};
    use rstest::{fixture, rstest};

    use super::PickleCompiler;

    const OUTLINE: &str = "\
@feature
Feature: Baskets

  Background:
    Given an empty basket

  Scenario: Plain
    When I add 1 apple

  @outline
  Scenario Outline: Add <count> <fruit>
    When I add <count> <fruit>
    Then the basket holds <count> <unknown>

    @first
    Examples:
      | count | fruit  |
      | 2     | pears  |
      | 3     | plums  |
";

    #[fixture]
    fn feature() -> Feature {
        Feature::parse(OUTLINE, GherkinEnv::default())
            .unwrap_or_else(|e| panic!("parse feature: {e}"))
    }

    #[rstest]
    fn expands_outlines_per_row(feature: Feature) {
        let pickles = PickleCompiler::new("en").compile(&feature, "features/basket.feature");
        let names: Vec<&str> = pickles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Plain", "Add 2 pears", "Add 3 plums"]);
        let ids: Vec<&str> = pickles.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["pickle-0", "pickle-1", "pickle-2"]);
    }

    #[rstest]
    fn background_steps_come_first(feature: Feature) {
        let pickles = PickleCompiler::new("en").compile(&feature, "basket.feature");
        let Some(outline) = pickles.get(1) else {
            panic!("expected outline pickle");
        };
        let texts: Vec<&str> = outline.steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            [
                "an empty basket",
                "I add 2 pears",
                "the basket holds 2 <unknown>",
            ]
        );
    }

    #[rstest]
    fn merges_tags_from_every_level(feature: Feature) {
        let pickles = PickleCompiler::new("en").compile(&feature, "basket.feature");
        let tags: Vec<Vec<String>> = pickles.into_iter().map(|p| p.tags).collect();
        assert_eq!(tags.first(), Some(&vec!["@feature".to_owned()]));
        assert_eq!(
            tags.get(1),
            Some(&vec![
                "@feature".to_owned(),
                "@outline".to_owned(),
                "@first".to_owned(),
            ])
        );
    }

    #[rstest]
    fn outline_rows_carry_their_own_line(feature: Feature) {
        let pickles = PickleCompiler::new("en").compile(&feature, "basket.feature");
        let lines: Vec<Option<u32>> = pickles.iter().map(|p| p.line()).collect();
        assert_eq!(lines, [Some(7), Some(18), Some(19)]);
        let Some(first_row) = pickles.get(1) else {
            panic!("expected outline pickle");
        };
        assert_eq!(first_row.locations.first().map(|l| l.line), Some(11));
    }

    #[test]
    fn rules_inherit_feature_background() {
        let text = "\
Feature: Rules
  Background:
    Given a shared step

  Rule: first
    Background:
      Given a rule step

    Scenario: Inside
      Then it runs
";
        let feature = Feature::parse(text, GherkinEnv::default())
            .unwrap_or_else(|e| panic!("parse feature: {e}"));
        let pickles = PickleCompiler::new("en").compile(&feature, "rules.feature");
        let [pickle] = pickles.as_slice() else {
            panic!("expected one pickle, got {}", pickles.len());
        };
        let texts: Vec<&str> = pickle.steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["a shared step", "a rule step", "it runs"]);
    }
}
