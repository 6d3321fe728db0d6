//! Coordinator tests driven by a scripted in-memory engine.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use rstest::{fixture, rstest};
use stepbridge_protocol::{
    ActionComplete, ActionId, ActionResult, EngineEndpoint, Location, PatternMatch, Pickle,
    PickleStep, ScenarioId, StartCommand, StepDefinitionId, TestStatus, endpoints,
};
use tokio::task::JoinHandle;

use super::*;
use crate::{StepError, formatter::NopFormatter};

fn start_command() -> StartCommand {
    StartCommand {
        base_directory: "/tmp".into(),
        runtime_config: stepbridge_protocol::RuntimeConfig::default(),
        support_code_config: stepbridge_protocol::SupportCodeConfig::default(),
        sources_config: stepbridge_protocol::SourcesConfig::default(),
    }
}

fn pickle(id: &str) -> Pickle {
    Pickle {
        id: ScenarioId::from(id),
        uri: "features/x.feature".into(),
        name: format!("scenario {id}"),
        language: "en".into(),
        tags: Vec::new(),
        locations: vec![Location::new(2, 3)],
        steps: vec![PickleStep {
            text: "a step".into(),
            locations: vec![Location::new(3, 5)],
        }],
    }
}

#[fixture]
fn registry() -> StepRegistry {
    let mut registry = StepRegistry::new();
    registry
        .register("^store (.*)$", |ctx, args| {
            ctx.set("stored", args.concat());
            Ok(())
        })
        .unwrap_or_else(|e| panic!("register store: {e}"));
    registry
        .register("^not yet$", |_, _| Err(StepError::Pending))
        .unwrap_or_else(|e| panic!("register pending: {e}"));
    registry
        .register("^stored is (.*)$", |ctx, args| {
            let stored = ctx.get::<String>("stored").cloned().unwrap_or_default();
            if Some(&stored) == args.first() {
                Ok(())
            } else {
                Err(StepError::failed(format!("stored {stored}")))
            }
        })
        .unwrap_or_else(|e| panic!("register check: {e}"));
    registry
}

struct Harness {
    engine: EngineEndpoint,
    states: Arc<ScenarioStates>,
    run: JoinHandle<Result<Summary, RunError>>,
}

impl Harness {
    async fn start(registry: StepRegistry, deadline: Option<Duration>) -> Self {
        let (bridge, mut engine) = endpoints();
        let coordinator = Coordinator::new(registry, None);
        let states = coordinator.states();
        let run = tokio::spawn(async move {
            let mut formatter = NopFormatter;
            coordinator
                .run(bridge, start_command(), &mut formatter, deadline)
                .await
        });
        match engine.commands.recv().await {
            Some(Command::Start(_)) => {}
            other => panic!("expected start command, got {other:?}"),
        }
        Self { engine, states, run }
    }

    fn send(&self, message: Message) {
        self.engine
            .messages
            .send(message)
            .unwrap_or_else(|e| panic!("send to coordinator: {e}"));
    }

    async fn reply(&mut self) -> ActionComplete {
        match self.engine.commands.recv().await {
            Some(Command::ActionComplete(completion)) => completion,
            other => panic!("expected action completion, got {other:?}"),
        }
    }

    async fn test_result(&mut self, expected_id: &str) -> TestResult {
        let completion = self.reply().await;
        assert_eq!(completion.completed_id, ActionId::from(expected_id));
        match completion.result {
            ActionResult::TestResult(result) => result,
            ActionResult::Snippet(snippet) => panic!("unexpected snippet {snippet:?}"),
        }
    }

    async fn initialize(&mut self, action: &str, scenario: &str) {
        self.send(Message::InitializeScenarioRequested {
            action_id: ActionId::from(action),
            pickle: pickle(scenario),
        });
        let result = self.test_result(action).await;
        assert_eq!(result.status, TestStatus::Passed);
    }

    fn run_step(&self, action: &str, scenario: &str, definition: &str, captures: &[&str]) {
        self.run_step_matches(action, scenario, definition, &[captures]);
    }

    fn run_step_matches(
        &self,
        action: &str,
        scenario: &str,
        definition: &str,
        matches: &[&[&str]],
    ) {
        self.send(Message::RunStepRequested {
            action_id: ActionId::from(action),
            scenario_id: ScenarioId::from(scenario),
            step_definition_id: StepDefinitionId::from(definition),
            pattern_matches: matches
                .iter()
                .map(|captures| {
                    PatternMatch::new(captures.iter().map(|c| (*c).to_owned()).collect())
                })
                .collect(),
        });
    }

    async fn finish(self, success: bool) -> (Result<Summary, RunError>, Arc<ScenarioStates>) {
        self.send(Message::RunFinished { success });
        let result = self.run.await.unwrap_or_else(|e| panic!("coordinator task: {e}"));
        (result, self.states)
    }
}

#[rstest]
#[tokio::test]
async fn hooks_and_snippets_are_acknowledged(registry: StepRegistry) {
    let mut harness = Harness::start(registry, None).await;
    harness.send(Message::RunStarted);
    harness.send(Message::RunBeforeHooksRequested {
        action_id: ActionId::from("before"),
    });
    assert_eq!(harness.test_result("before").await, TestResult::passed());

    harness.send(Message::GenerateSnippetRequested {
        action_id: ActionId::from("snippet"),
        step_text: "an undefined step".into(),
    });
    let completion = harness.reply().await;
    assert_eq!(
        completion,
        ActionComplete::snippet(ActionId::from("snippet"), String::new())
    );

    harness.send(Message::RunAfterHooksRequested {
        action_id: ActionId::from("after"),
    });
    assert_eq!(harness.test_result("after").await, TestResult::passed());

    let (result, _) = harness.finish(true).await;
    let summary = result.unwrap_or_else(|e| panic!("run failed: {e}"));
    assert!(summary.success);
    assert_eq!(summary.exit_code, 0);
}

#[rstest]
#[tokio::test]
async fn steps_share_state_within_a_scenario(registry: StepRegistry) {
    let mut harness = Harness::start(registry, None).await;
    harness.initialize("init-1", "s1").await;

    harness.run_step("step-1", "s1", "0", &["foobar"]);
    assert_eq!(harness.test_result("step-1").await.status, TestStatus::Passed);
    harness.run_step("step-2", "s1", "2", &["foobar"]);
    assert_eq!(harness.test_result("step-2").await.status, TestStatus::Passed);
    harness.run_step("step-3", "s1", "2", &["other"]);
    let failed = harness.test_result("step-3").await;
    assert_eq!(failed.status, TestStatus::Failed);
    assert_eq!(failed.message.as_deref(), Some("stored foobar"));
}

#[rstest]
#[case("9", "unknown step definition id '9' (3 registered)")]
#[case("x", "malformed step definition id 'x'")]
#[tokio::test]
async fn bad_step_definition_yields_failed_reply(
    registry: StepRegistry,
    #[case] definition: &str,
    #[case] message: &str,
) {
    let mut harness = Harness::start(registry, None).await;
    harness.initialize("init-1", "s1").await;
    harness.run_step("step-1", "s1", definition, &[]);
    let result = harness.test_result("step-1").await;
    assert_eq!(result.status, TestStatus::Failed);
    assert_eq!(result.message.as_deref(), Some(message));
}

#[rstest]
#[tokio::test]
async fn unknown_scenario_yields_failed_reply(registry: StepRegistry) {
    let mut harness = Harness::start(registry, None).await;
    harness.run_step("step-1", "ghost", "0", &["x"]);
    let result = harness.test_result("step-1").await;
    assert_eq!(result.status, TestStatus::Failed);
    assert_eq!(result.message.as_deref(), Some("unknown scenario 'ghost'"));

    let (result, _) = harness.finish(true).await;
    assert!(result.is_ok());
}

#[rstest]
#[tokio::test]
async fn duplicate_initialization_is_rejected(registry: StepRegistry) {
    let mut harness = Harness::start(registry, None).await;
    harness.initialize("init-1", "s1").await;
    harness.send(Message::InitializeScenarioRequested {
        action_id: ActionId::from("init-2"),
        pickle: pickle("s1"),
    });
    let result = harness.test_result("init-2").await;
    assert_eq!(result.status, TestStatus::Failed);
    assert_eq!(
        result.message.as_deref(),
        Some("scenario 's1' is already initialized")
    );
}

#[rstest]
#[tokio::test]
async fn pending_handler_yields_pending_reply(registry: StepRegistry) {
    let mut harness = Harness::start(registry, None).await;
    harness.initialize("init-1", "s1").await;
    harness.run_step("step-1", "s1", "1", &[]);
    assert_eq!(harness.test_result("step-1").await.status, TestStatus::Pending);
}

#[rstest]
#[tokio::test]
async fn counters_fold_finished_events(registry: StepRegistry) {
    let mut harness = Harness::start(registry, None).await;
    harness.initialize("init-1", "s1").await;
    harness.initialize("init-2", "s2").await;
    assert_eq!(harness.states.len(), 2);

    for (scenario, status) in [("s1", TestStatus::Passed), ("s2", TestStatus::Undefined)] {
        harness.send(Message::StepFinished {
            scenario_id: ScenarioId::from(scenario),
            step_index: 0,
            result: TestResult::new(status),
        });
        harness.send(Message::ScenarioFinished {
            scenario_id: ScenarioId::from(scenario),
            result: TestResult::new(status),
        });
    }

    let (result, states) = harness.finish(false).await;
    let summary = result.unwrap_or_else(|e| panic!("run failed: {e}"));
    assert_eq!(summary.scenarios_total, 2);
    assert_eq!(summary.scenarios_passed, 1);
    assert_eq!(summary.scenarios_undefined, 1);
    assert_eq!(summary.steps_total, 2);
    assert_eq!(summary.steps_passed, 1);
    assert_eq!(summary.steps_undefined, 1);
    assert!(!summary.success);
    assert_eq!(summary.exit_code, 1);
    assert!(states.is_empty());
}

#[rstest]
#[tokio::test]
async fn leftover_contexts_are_cleared_on_finish(registry: StepRegistry) {
    let mut harness = Harness::start(registry, None).await;
    harness.initialize("init-1", "s1").await;
    let (result, states) = harness.finish(true).await;
    assert!(result.is_ok());
    assert!(states.is_empty());
}

#[rstest]
#[tokio::test]
async fn engine_error_aborts_the_run(registry: StepRegistry) {
    let harness = Harness::start(registry, None).await;
    harness.send(Message::EngineError {
        message: "cannot parse x.feature".into(),
    });
    let result = harness.run.await.unwrap_or_else(|e| panic!("coordinator task: {e}"));
    assert_eq!(
        result,
        Err(RunError::Engine("cannot parse x.feature".into()))
    );
}

#[rstest]
#[tokio::test]
async fn disconnect_before_finish_is_fatal(registry: StepRegistry) {
    let Harness { engine, run, .. } = Harness::start(registry, None).await;
    drop(engine);
    let result = run.await.unwrap_or_else(|e| panic!("coordinator task: {e}"));
    assert_eq!(result, Err(RunError::EngineDisconnected));
}

#[rstest]
#[tokio::test]
async fn deadline_bounds_the_run(registry: StepRegistry) {
    let harness = Harness::start(registry, Some(Duration::from_millis(20))).await;
    let result = harness.run.await.unwrap_or_else(|e| panic!("coordinator task: {e}"));
    assert_eq!(result, Err(RunError::DeadlineExceeded));
    drop(harness.engine);
}

#[rstest]
#[tokio::test]
async fn closed_engine_rejects_start(registry: StepRegistry) {
    let (bridge, engine) = endpoints();
    drop(engine);
    let mut formatter = NopFormatter;
    let result = Coordinator::new(registry, None)
        .run(bridge, start_command(), &mut formatter, None)
        .await;
    assert_eq!(result, Err(RunError::EngineClosed));
}

#[rstest]
#[tokio::test]
async fn failing_initializer_still_registers_the_scenario(registry: StepRegistry) {
    let (bridge, mut engine) = endpoints();
    let init: ScenarioInitializer = Arc::new(|_| Err(StepError::failed("no database")));
    let coordinator = Coordinator::new(registry, Some(init));
    let states = coordinator.states();
    let run = tokio::spawn(async move {
        let mut formatter = NopFormatter;
        coordinator
            .run(bridge, start_command(), &mut formatter, None)
            .await
    });
    let _start = engine.commands.recv().await;
    engine
        .messages
        .send(Message::InitializeScenarioRequested {
            action_id: ActionId::from("init-1"),
            pickle: pickle("s1"),
        })
        .unwrap_or_else(|e| panic!("send: {e}"));
    let Some(Command::ActionComplete(completion)) = engine.commands.recv().await else {
        panic!("expected initialization reply");
    };
    let ActionResult::TestResult(result) = completion.result else {
        panic!("expected a test result");
    };
    assert_eq!(completion.completed_id, ActionId::from("init-1"));
    assert_eq!(result.status, TestStatus::Failed);
    assert_eq!(result.message.as_deref(), Some("no database"));
    assert_eq!(states.len(), 1);
    drop(engine);
    let result = run.await.unwrap_or_else(|e| panic!("coordinator task: {e}"));
    assert_eq!(result, Err(RunError::EngineDisconnected));
}

#[tokio::test]
async fn captures_from_several_matches_are_joined_in_order() {
    let mut registry = StepRegistry::new();
    registry
        .register("^record$", |ctx, args| {
            ctx.set("args", args.to_vec());
            Ok(())
        })
        .unwrap_or_else(|e| panic!("register record: {e}"));
    registry
        .register("^check$", |ctx, _| {
            let seen = ctx.get::<Vec<String>>("args").cloned().unwrap_or_default();
            if seen == ["a", "b", "c"] {
                Ok(())
            } else {
                Err(StepError::failed(format!("saw {seen:?}")))
            }
        })
        .unwrap_or_else(|e| panic!("register check: {e}"));

    let mut harness = Harness::start(registry, None).await;
    harness.initialize("init-1", "s1").await;
    harness.run_step_matches("record-1", "s1", "0", &[&["a", "b"], &["c"]]);
    assert_eq!(harness.test_result("record-1").await.status, TestStatus::Passed);
    harness.run_step("check-1", "s1", "1", &[]);
    let checked = harness.test_result("check-1").await;
    assert_eq!(checked.status, TestStatus::Passed, "{:?}", checked.message);
}

#[derive(Default)]
struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    fn open(&self) {
        if let Ok(mut open) = self.open.lock() {
            *open = true;
        }
        self.opened.notify_all();
    }

    fn wait(&self, limit: Duration) -> bool {
        let Ok(guard) = self.open.lock() else {
            return false;
        };
        self.opened
            .wait_timeout_while(guard, limit, |open| !*open)
            .is_ok_and(|(open, _)| *open)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocked_step_does_not_stall_other_scenarios() {
    let gate = Arc::new(Gate::default());
    let mut registry = StepRegistry::new();
    let waiting = Arc::clone(&gate);
    registry
        .register("^wait for the gate$", move |_, _| {
            if waiting.wait(Duration::from_secs(5)) {
                Ok(())
            } else {
                Err(StepError::failed("gate never opened"))
            }
        })
        .unwrap_or_else(|e| panic!("register wait: {e}"));
    let opening = Arc::clone(&gate);
    registry
        .register("^open the gate$", move |_, _| {
            opening.open();
            Ok(())
        })
        .unwrap_or_else(|e| panic!("register open: {e}"));

    let mut harness = Harness::start(registry, None).await;
    harness.initialize("init-1", "s1").await;
    harness.initialize("init-2", "s2").await;

    harness.run_step("slow-1", "s1", "0", &[]);
    harness.run_step("open-1", "s2", "1", &[]);

    let first = harness.test_result("open-1").await;
    assert_eq!(first.status, TestStatus::Passed);
    let second = harness.test_result("slow-1").await;
    assert_eq!(second.status, TestStatus::Passed, "{:?}", second.message);
}
