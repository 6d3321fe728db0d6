//! Compiled, fully resolved scenarios as handed to the application side.

use serde::{Deserialize, Serialize};

use crate::ScenarioId;

/// One-based position inside a feature source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// One-based line number.
    pub line: u32,
    /// One-based column number.
    pub column: u32,
}

impl Location {
    /// Create a location from line and column.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// One executable scenario instance.
///
/// Outline scenarios produce one pickle per examples row; their `locations`
/// list the outline position followed by the row position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pickle {
    /// Engine-assigned identifier.
    pub id: ScenarioId,
    /// Feature source the scenario was compiled from.
    pub uri: String,
    /// Scenario name with outline placeholders substituted.
    pub name: String,
    /// Gherkin dialect of the source.
    pub language: String,
    /// Effective tags, each with a leading `@`.
    pub tags: Vec<String>,
    /// Source positions, most specific last.
    pub locations: Vec<Location>,
    /// Steps in execution order, background steps first.
    pub steps: Vec<PickleStep>,
}

impl Pickle {
    /// The most specific source line of the scenario.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        self.locations.last().map(|location| location.line)
    }
}

/// One step of a [`Pickle`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickleStep {
    /// Step text without its keyword.
    pub text: String,
    /// Source positions, most specific last.
    pub locations: Vec<Location>,
}

impl PickleStep {
    /// The most specific source line of the step.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        self.locations.last().map(|location| location.line)
    }
}
