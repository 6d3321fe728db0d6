//! Plain-text summary with failed step details.

use std::collections::HashMap;
use std::io::{self, Write};

use stepbridge_protocol::{Message, Pickle, ScenarioId, TestStatus};

use super::Formatter;
use crate::Summary;

/// Description of one failed step, collected while the run progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedStep {
    /// Name of the scenario.
    pub scenario_name: String,
    /// `uri:line` of the scenario.
    pub scenario_location: String,
    /// Step text.
    pub step_text: String,
    /// `uri:line` of the step.
    pub step_location: String,
    /// Failure message reported for the step.
    pub error: String,
}

fn location(uri: &str, line: Option<u32>) -> String {
    line.map_or_else(|| uri.to_owned(), |line| format!("{uri}:{line}"))
}

/// Writes failed steps, scenario and step counts, and the run duration.
///
/// # Examples
///
/// ```
/// use stepbridge::Summary;
/// use stepbridge::formatter::{Formatter, SummaryFormatter};
///
/// let mut formatter = SummaryFormatter::new(Vec::new());
/// let mut summary = Summary::default();
/// summary.scenarios_total = 1;
/// summary.scenarios_passed = 1;
/// formatter.display_summary(&summary).unwrap();
/// let text = String::from_utf8(formatter.into_inner()).unwrap();
/// assert!(text.contains("1 scenarios (1 passed)"));
/// ```
#[derive(Debug)]
pub struct SummaryFormatter<W> {
    out: W,
    pickles: HashMap<ScenarioId, Pickle>,
    failed_steps: Vec<FailedStep>,
}

impl<W: Write> SummaryFormatter<W> {
    /// Create a formatter writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            pickles: HashMap::new(),
            failed_steps: Vec::new(),
        }
    }

    /// Failed steps collected so far.
    #[must_use]
    pub fn failed_steps(&self) -> &[FailedStep] {
        &self.failed_steps
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    pub(super) fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    fn record_failure(&mut self, scenario_id: &ScenarioId, step_index: usize, error: String) {
        let Some(pickle) = self.pickles.get(scenario_id) else {
            tracing::debug!(%scenario_id, "failed step for unknown scenario");
            return;
        };
        let Some(step) = pickle.steps.get(step_index) else {
            tracing::debug!(%scenario_id, step_index, "failed step index out of range");
            return;
        };
        self.failed_steps.push(FailedStep {
            scenario_name: pickle.name.clone(),
            scenario_location: location(&pickle.uri, pickle.line()),
            step_text: step.text.clone(),
            step_location: location(&pickle.uri, step.line()),
            error,
        });
    }
}

impl<W: Write + Send> Formatter for SummaryFormatter<W> {
    fn process_message(&mut self, message: &Message) -> io::Result<()> {
        match message {
            Message::InitializeScenarioRequested { pickle, .. } => {
                self.pickles.insert(pickle.id.clone(), pickle.clone());
            }
            Message::StepFinished {
                scenario_id,
                step_index,
                result,
            } if result.status == TestStatus::Failed => {
                let error = result.message.clone().unwrap_or_default();
                self.record_failure(scenario_id, *step_index, error);
            }
            Message::ScenarioFinished { scenario_id, .. } => {
                self.pickles.remove(scenario_id);
            }
            _ => {}
        }
        Ok(())
    }

    fn display_summary(&mut self, summary: &Summary) -> io::Result<()> {
        if !self.failed_steps.is_empty() {
            write!(self.out, "\n\nFailed steps:\n")?;
            for failed in &self.failed_steps {
                writeln!(
                    self.out,
                    "\n  Scenario: {} # {}",
                    failed.scenario_name, failed.scenario_location
                )?;
                writeln!(self.out, "    {} # {}", failed.step_text, failed.step_location)?;
                writeln!(self.out, "      Error: {}", failed.error)?;
            }
        }
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{} scenarios ({})",
            summary.scenarios_total,
            summary.scenario_breakdown()
        )?;
        writeln!(
            self.out,
            "{} steps ({})",
            summary.steps_total,
            summary.step_breakdown()
        )?;
        writeln!(self.out, "{:?}", summary.duration)?;
        self.out.flush()
    }
}
