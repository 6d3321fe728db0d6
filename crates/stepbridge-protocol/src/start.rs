//! Payload of the start command that opens a run.

use serde::{Deserialize, Serialize};

use crate::StepDefinitionId;

/// Everything the engine needs to begin a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartCommand {
    /// Directory relative paths in reports are resolved against.
    pub base_directory: String,
    /// Execution switches.
    pub runtime_config: RuntimeConfig,
    /// Registered step definition patterns.
    pub support_code_config: SupportCodeConfig,
    /// Feature sources, filters and ordering.
    pub sources_config: SourcesConfig,
}

/// Execution switches forwarded verbatim to the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Stop starting new scenarios after the first failure.
    pub fail_fast: bool,
    /// Resolve steps without executing them.
    pub dry_run: bool,
    /// Treat pending steps as failures.
    pub strict: bool,
    /// Upper bound on concurrently executing scenarios; zero means unbounded.
    pub max_parallel: u64,
}

/// Step definitions known to the application side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportCodeConfig {
    /// Definitions in registration order.
    pub step_definitions: Vec<StepDefinitionConfig>,
}

/// A single step definition as announced to the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinitionConfig {
    /// Identifier the engine echoes back when requesting execution.
    pub id: StepDefinitionId,
    /// Pattern the engine matches step text against.
    pub pattern: StepDefinitionPattern,
}

/// Pattern source and syntax.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinitionPattern {
    /// Pattern text.
    pub source: String,
    /// Pattern syntax.
    pub kind: PatternKind,
}

/// Supported step pattern syntaxes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// A regular expression.
    #[default]
    RegularExpression,
}

/// Feature sources and selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Gherkin dialect, for example `en`.
    pub language: String,
    /// Absolute feature paths, optionally suffixed with `:line` selectors.
    pub absolute_paths: Vec<String>,
    /// Scenario filters.
    pub filters: SourcesFilter,
    /// Execution order.
    pub order: SourcesOrder,
}

/// Scenario filters applied by the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesFilter {
    /// Tag expression; empty selects everything.
    pub tag_expression: String,
}

/// Ordering requested for the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesOrder {
    /// Ordering mode.
    pub kind: OrderKind,
    /// Seed for [`OrderKind::Random`].
    pub seed: u64,
}

/// Scenario ordering modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Shuffle with the configured seed.
    #[default]
    Random,
    /// Keep the order in which scenarios appear in the sources.
    Definition,
}
