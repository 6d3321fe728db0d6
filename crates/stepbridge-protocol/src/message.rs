//! Messages flowing from the engine and commands flowing back.

use serde::{Deserialize, Serialize};

use crate::{ActionId, Pickle, ScenarioId, StartCommand, StepDefinitionId, TestResult};

/// Notification or request sent by the engine.
///
/// Variants carrying an [`ActionId`] expect exactly one
/// [`Command::ActionComplete`] in return.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// The engine accepted the start command and began the run.
    RunStarted,
    /// The run is over.
    RunFinished {
        /// Whether the run as a whole succeeded.
        success: bool,
    },
    /// The engine requests the run-level before hooks.
    RunBeforeHooksRequested {
        /// Correlation token for the reply.
        action_id: ActionId,
    },
    /// The engine requests the run-level after hooks.
    RunAfterHooksRequested {
        /// Correlation token for the reply.
        action_id: ActionId,
    },
    /// The engine asks for a code snippet for an undefined step.
    GenerateSnippetRequested {
        /// Correlation token for the reply.
        action_id: ActionId,
        /// Text of the undefined step.
        step_text: String,
    },
    /// The engine asks for fresh state for a scenario.
    InitializeScenarioRequested {
        /// Correlation token for the reply.
        action_id: ActionId,
        /// The scenario about to run.
        pickle: Pickle,
    },
    /// The engine asks for one step to be executed.
    RunStepRequested {
        /// Correlation token for the reply.
        action_id: ActionId,
        /// Scenario the step belongs to.
        scenario_id: ScenarioId,
        /// Step definition chosen by the engine.
        step_definition_id: StepDefinitionId,
        /// Capture groups, one entry per matched pattern.
        pattern_matches: Vec<PatternMatch>,
    },
    /// A scenario completed.
    ScenarioFinished {
        /// The finished scenario.
        scenario_id: ScenarioId,
        /// Folded scenario result.
        result: TestResult,
    },
    /// A step completed.
    StepFinished {
        /// Scenario the step belongs to.
        scenario_id: ScenarioId,
        /// Zero-based step position inside the pickle.
        step_index: usize,
        /// Step result.
        result: TestResult,
    },
    /// The engine hit an unrecoverable problem; no further messages follow.
    EngineError {
        /// Human-readable description.
        message: String,
    },
}

impl Message {
    /// The action identifier a reply must quote, if the message expects one.
    #[must_use]
    pub const fn action_id(&self) -> Option<&ActionId> {
        match self {
            Self::RunBeforeHooksRequested { action_id }
            | Self::RunAfterHooksRequested { action_id }
            | Self::GenerateSnippetRequested { action_id, .. }
            | Self::InitializeScenarioRequested { action_id, .. }
            | Self::RunStepRequested { action_id, .. } => Some(action_id),
            Self::RunStarted
            | Self::RunFinished { .. }
            | Self::ScenarioFinished { .. }
            | Self::StepFinished { .. }
            | Self::EngineError { .. } => None,
        }
    }
}

/// Capture groups produced by one pattern match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternMatch {
    /// Captured substrings in group order.
    pub captures: Vec<String>,
}

impl PatternMatch {
    /// Wrap a list of captures.
    #[must_use]
    pub const fn new(captures: Vec<String>) -> Self {
        Self { captures }
    }
}

/// Command sent from the application side to the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Begin a run. Sent exactly once.
    Start(StartCommand),
    /// Reply to an action-bearing message.
    ActionComplete(ActionComplete),
}

/// Reply quoting the action it completes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionComplete {
    /// Identifier of the message being answered.
    pub completed_id: ActionId,
    /// Reply payload.
    pub result: ActionResult,
}

impl ActionComplete {
    /// Reply with a test result.
    #[must_use]
    pub const fn test_result(completed_id: ActionId, result: TestResult) -> Self {
        Self {
            completed_id,
            result: ActionResult::TestResult(result),
        }
    }

    /// Reply with a snippet.
    #[must_use]
    pub const fn snippet(completed_id: ActionId, snippet: String) -> Self {
        Self {
            completed_id,
            result: ActionResult::Snippet(snippet),
        }
    }
}

/// Payload of an [`ActionComplete`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionResult {
    /// Outcome of hooks, initialization or step execution.
    TestResult(TestResult),
    /// Generated snippet text.
    Snippet(String),
}
