//! Engine side of a run: waits for the start command, then drives the
//! bridge through hooks, scenario initialization and step execution.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Semaphore;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info_span, warn};

use stepbridge_protocol::{
    ActionResult, Command, EngineEndpoint, Message, PatternMatch, Pickle, RuntimeConfig,
    ScenarioId, StartCommand, StepDefinitionId, TestResult, TestStatus,
};

use crate::actions::ActionBroker;
use crate::error::EngineError;
use crate::matching::{StepMatch, StepMatcher};
use crate::plan::RunPlan;

/// Serve one run over `endpoint`. Returns once `RunFinished` or
/// `EngineError` has been emitted, or the bridge went away.
pub(crate) async fn serve(endpoint: EngineEndpoint) {
    let EngineEndpoint {
        mut commands,
        messages,
    } = endpoint;

    let start = loop {
        match commands.recv().await {
            Some(Command::Start(start)) => break start,
            Some(Command::ActionComplete(reply)) => {
                warn!(action_id = %reply.completed_id, "reply received before start");
            }
            None => {
                debug!("bridge closed before start");
                return;
            }
        }
    };

    let broker = Arc::new(ActionBroker::new(messages));
    let pump = tokio::spawn(pump(commands, Arc::clone(&broker)));

    if let Err(err) = execute(&start, &broker).await {
        error!(error = %err, "run aborted");
        if broker
            .emit(Message::EngineError {
                message: err.to_string(),
            })
            .is_err()
        {
            debug!("bridge gone; engine error not delivered");
        }
    }
    pump.abort();
}

async fn pump(mut commands: UnboundedReceiver<Command>, broker: Arc<ActionBroker>) {
    while let Some(command) = commands.recv().await {
        match command {
            Command::ActionComplete(reply) => {
                broker.complete(reply);
            }
            Command::Start(_) => warn!("ignoring repeated start command"),
        }
    }
    broker.abandon_all();
}

async fn execute(start: &StartCommand, broker: &Arc<ActionBroker>) -> Result<(), EngineError> {
    let plan = RunPlan::prepare(start)?;
    broker.emit(Message::RunStarted)?;

    let before = broker
        .request_result(|action_id| Message::RunBeforeHooksRequested { action_id })
        .await?;
    log_hook_result("before", &before);

    let success = run_pickles(plan, broker).await?;

    let after = broker
        .request_result(|action_id| Message::RunAfterHooksRequested { action_id })
        .await?;
    log_hook_result("after", &after);

    broker.emit(Message::RunFinished { success })
}

fn log_hook_result(phase: &str, result: &TestResult) {
    if result.status != TestStatus::Passed {
        warn!(phase, status = result.status.label(), "run hooks did not pass");
    }
}

fn parallelism(max_parallel: u64) -> usize {
    match usize::try_from(max_parallel) {
        Ok(0) | Err(_) => Semaphore::MAX_PERMITS,
        Ok(n) => n.min(Semaphore::MAX_PERMITS),
    }
}

async fn run_pickles(plan: RunPlan, broker: &Arc<ActionBroker>) -> Result<bool, EngineError> {
    let RunPlan {
        pickles,
        matcher,
        runtime,
    } = plan;
    let runner = Arc::new(ScenarioRunner {
        broker: Arc::clone(broker),
        matcher,
        runtime,
    });
    let permits = Arc::new(Semaphore::new(parallelism(runtime.max_parallel)));
    let halt = Arc::new(AtomicBool::new(false));
    let mut tasks = JoinSet::new();

    for pickle in pickles {
        let permit = Arc::clone(&permits)
            .acquire_owned()
            .await
            .map_err(|err| EngineError::Task(err.to_string()))?;
        if halt.load(Ordering::Acquire) {
            debug!("fail-fast triggered; not starting further scenarios");
            break;
        }
        let runner = Arc::clone(&runner);
        let halt = Arc::clone(&halt);
        let span = info_span!("scenario", scenario_id = %pickle.id, name = %pickle.name);
        tasks.spawn(
            async move {
                let _permit = permit;
                let outcome = runner.run(pickle).await;
                let stop = match &outcome {
                    Ok(status) => runner.runtime.fail_fast && status.is_failure(runner.runtime.strict),
                    Err(_) => true,
                };
                if stop {
                    halt.store(true, Ordering::Release);
                }
                outcome
            }
            .instrument(span),
        );
    }

    let mut success = true;
    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(|err| EngineError::Task(err.to_string())) {
            Ok(Ok(status)) => success &= !status.is_failure(runtime.strict),
            Ok(Err(err)) | Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    first_error.map_or(Ok(success), Err)
}

struct ScenarioRunner {
    broker: Arc<ActionBroker>,
    matcher: StepMatcher,
    runtime: RuntimeConfig,
}

impl ScenarioRunner {
    async fn run(&self, pickle: Pickle) -> Result<TestStatus, EngineError> {
        let scenario_id = pickle.id.clone();
        let texts: Vec<String> = pickle.steps.iter().map(|step| step.text.clone()).collect();

        let init = self
            .broker
            .request_result(|action_id| Message::InitializeScenarioRequested { action_id, pickle })
            .await?;
        let mut halted = init.status != TestStatus::Passed;
        let mut verdict = if halted { init } else { TestResult::passed() };

        for (step_index, text) in texts.iter().enumerate() {
            let result = if halted {
                TestResult::new(TestStatus::Skipped)
            } else {
                self.step(&scenario_id, text).await?
            };
            let dry_skip = self.runtime.dry_run && result.status == TestStatus::Skipped;
            if result.status != TestStatus::Passed && !dry_skip {
                halted = true;
            }
            if result.status.severity() > verdict.status.severity() {
                verdict = TestResult {
                    status: result.status,
                    message: result.message.clone(),
                    duration_nanos: None,
                };
            }
            self.broker.emit(Message::StepFinished {
                scenario_id: scenario_id.clone(),
                step_index,
                result,
            })?;
        }

        let status = verdict.status;
        self.broker.emit(Message::ScenarioFinished {
            scenario_id,
            result: verdict,
        })?;
        Ok(status)
    }

    async fn step(&self, scenario_id: &ScenarioId, text: &str) -> Result<TestResult, EngineError> {
        match self.matcher.find(text) {
            StepMatch::Undefined => {
                let reply = self
                    .broker
                    .request(|action_id| Message::GenerateSnippetRequested {
                        action_id,
                        step_text: text.to_owned(),
                    })
                    .await?;
                let result = TestResult::new(TestStatus::Undefined);
                Ok(match reply {
                    ActionResult::Snippet(snippet) if !snippet.is_empty() => {
                        result.with_message(snippet)
                    }
                    ActionResult::Snippet(_) | ActionResult::TestResult(_) => result,
                })
            }
            StepMatch::Ambiguous(ids) => Ok(TestResult::new(TestStatus::Ambiguous)
                .with_message(ambiguity_message(text, &ids))),
            StepMatch::Matched { .. } if self.runtime.dry_run => {
                Ok(TestResult::new(TestStatus::Skipped))
            }
            StepMatch::Matched { id, captures } => {
                self.broker
                    .request_result(|action_id| Message::RunStepRequested {
                        action_id,
                        scenario_id: scenario_id.clone(),
                        step_definition_id: id,
                        pattern_matches: vec![PatternMatch::new(captures)],
                    })
                    .await
            }
        }
    }
}

fn ambiguity_message(text: &str, ids: &[StepDefinitionId]) -> String {
    let list: Vec<&str> = ids.iter().map(StepDefinitionId::as_str).collect();
    format!(
        "step '{text}' matches {} definitions: {}",
        ids.len(),
        list.join(", ")
    )
}
