//! Run coordinator: the single consumer of the engine stream.
//!
//! The coordinator sends one start command, then reacts to every engine
//! message in arrival order. Hook and snippet requests are answered inline;
//! scenario initialization and step execution are spawned as independent
//! units that reply through a clone of the command sender. Summary counters
//! are only ever touched here, so they need no synchronization.
//!
//! ```text
//! NotStarted --start sent--> Running --RunFinished--> Finished
//! ```

mod units;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::task::TaskTracker;

use stepbridge_protocol::{
    ActionComplete, BridgeEndpoint, Command, Message, StartCommand, TestResult,
};

use crate::{
    ScenarioInitializer, StepRegistry, Summary, error::RunError, formatter::Formatter,
    state::ScenarioStates,
};

use units::UnitContext;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunPhase {
    NotStarted,
    Running,
    Finished,
}

/// Drives one run against an engine endpoint.
///
/// The coordinator owns the step registry for the duration of the run and
/// shares the scenario state registry with the units it spawns.
pub struct Coordinator {
    registry: Arc<StepRegistry>,
    states: Arc<ScenarioStates>,
    initializer: Option<ScenarioInitializer>,
}

impl Coordinator {
    /// Create a coordinator for `registry` and the optional initializer.
    #[must_use]
    pub fn new(registry: StepRegistry, initializer: Option<ScenarioInitializer>) -> Self {
        Self {
            registry: Arc::new(registry),
            states: Arc::new(ScenarioStates::new()),
            initializer,
        }
    }

    /// Registry of live scenario contexts.
    #[must_use]
    pub fn states(&self) -> Arc<ScenarioStates> {
        Arc::clone(&self.states)
    }

    /// Execute a whole run and return its summary.
    ///
    /// # Errors
    ///
    /// Returns a [`RunError`] when the engine cannot be reached, disconnects,
    /// reports a fatal error, or `deadline` elapses first.
    pub async fn run(
        self,
        endpoint: BridgeEndpoint,
        start: StartCommand,
        formatter: &mut dyn Formatter,
        deadline: Option<Duration>,
    ) -> Result<Summary, RunError> {
        let BridgeEndpoint { commands, messages } = endpoint;
        let run = ActiveRun {
            phase: RunPhase::NotStarted,
            unit: UnitContext {
                registry: self.registry,
                states: self.states,
                initializer: self.initializer,
                replies: commands,
            },
            tracker: TaskTracker::new(),
            summary: Summary::default(),
            run_started: None,
        };
        run.execute(messages, start, formatter, deadline).await
    }
}

struct ActiveRun {
    phase: RunPhase,
    unit: UnitContext,
    tracker: TaskTracker,
    summary: Summary,
    run_started: Option<Instant>,
}

impl ActiveRun {
    fn transition(&mut self, next: RunPhase) {
        tracing::debug!(from = ?self.phase, to = ?next, "run phase changed");
        self.phase = next;
    }

    async fn execute(
        mut self,
        mut messages: UnboundedReceiver<Message>,
        start: StartCommand,
        formatter: &mut dyn Formatter,
        deadline: Option<Duration>,
    ) -> Result<Summary, RunError> {
        let sent_at = Instant::now();
        self.unit
            .replies
            .send(Command::Start(start))
            .map_err(|_| RunError::EngineClosed)?;
        self.transition(RunPhase::Running);

        let drained = match deadline {
            Some(limit) => tokio::time::timeout(limit, self.drain(&mut messages, formatter))
                .await
                .unwrap_or(Err(RunError::DeadlineExceeded)),
            None => self.drain(&mut messages, formatter).await,
        };
        let success = match drained {
            Ok(success) => success,
            Err(error) => {
                self.tracker.close();
                tracing::error!(%error, in_flight = self.tracker.len(), "run aborted");
                return Err(error);
            }
        };

        self.tracker.close();
        self.tracker.wait().await;
        let leaked = self.unit.states.drain();
        if !leaked.is_empty() {
            tracing::warn!(?leaked, "scenario contexts left after the run finished");
        }

        self.transition(RunPhase::Finished);
        let elapsed = self.run_started.unwrap_or(sent_at).elapsed();
        let mut summary = self.summary;
        summary.finish(success, elapsed);
        tracing::info!(success, exit_code = summary.exit_code, ?elapsed, "run finished");
        if let Err(error) = formatter.display_summary(&summary) {
            tracing::warn!(%error, "formatter failed to display summary");
        }
        Ok(summary)
    }

    async fn drain(
        &mut self,
        messages: &mut UnboundedReceiver<Message>,
        formatter: &mut dyn Formatter,
    ) -> Result<bool, RunError> {
        while let Some(message) = messages.recv().await {
            if let Err(error) = formatter.process_message(&message) {
                tracing::warn!(%error, "formatter failed to process message");
            }
            if let Some(success) = self.handle(message)? {
                return Ok(success);
            }
        }
        Err(RunError::EngineDisconnected)
    }

    /// React to one message. Returns the run verdict once the run finishes.
    fn handle(&mut self, message: Message) -> Result<Option<bool>, RunError> {
        match message {
            Message::RunStarted => self.run_started = Some(Instant::now()),
            Message::RunFinished { success } => return Ok(Some(success)),
            Message::RunBeforeHooksRequested { action_id }
            | Message::RunAfterHooksRequested { action_id } => {
                self.unit.reply(action_id, TestResult::passed());
            }
            Message::GenerateSnippetRequested { action_id, .. } => {
                let completion = ActionComplete::snippet(action_id, String::new());
                if self.unit.replies.send(Command::ActionComplete(completion)).is_err() {
                    tracing::warn!("engine closed before snippet reply could be delivered");
                }
            }
            Message::InitializeScenarioRequested { action_id, pickle } => {
                self.summary.record_scenario_started();
                self.tracker
                    .spawn(units::initialize_scenario(self.unit.clone(), action_id, pickle));
            }
            Message::RunStepRequested {
                action_id,
                scenario_id,
                step_definition_id,
                pattern_matches,
            } => {
                self.tracker.spawn(units::run_step(
                    self.unit.clone(),
                    action_id,
                    scenario_id,
                    step_definition_id,
                    pattern_matches,
                ));
            }
            Message::ScenarioFinished {
                scenario_id,
                result,
            } => {
                self.unit.states.remove(&scenario_id);
                tracing::debug!(%scenario_id, status = result.status.label(), "scenario finished");
                self.summary.record_scenario_finished(&result);
            }
            Message::StepFinished { result, .. } => self.summary.record_step_finished(&result),
            Message::EngineError { message } => return Err(RunError::Engine(message)),
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests;
