//! Units of work spawned by the coordinator for action-bearing messages.
//!
//! Each unit produces exactly one reply carrying the action identifier it
//! was spawned for, whatever happens while it runs.

use std::sync::{Arc, PoisonError};

use tokio::sync::mpsc::UnboundedSender;

use stepbridge_protocol::{
    ActionComplete, ActionId, Command, PatternMatch, Pickle, ScenarioId, StepDefinitionId,
    TestResult,
};

use crate::{
    ScenarioContext, ScenarioInitializer, StepRegistry,
    execution::{self, ExecutionError, StepReport},
    state::ScenarioStates,
};

/// Shared handles every unit needs.
#[derive(Clone)]
pub(super) struct UnitContext {
    pub(super) registry: Arc<StepRegistry>,
    pub(super) states: Arc<ScenarioStates>,
    pub(super) initializer: Option<ScenarioInitializer>,
    pub(super) replies: UnboundedSender<Command>,
}

impl UnitContext {
    pub(super) fn reply(&self, action_id: ActionId, result: TestResult) {
        let completion = ActionComplete::test_result(action_id, result);
        let action_id = completion.completed_id.clone();
        if self.replies.send(Command::ActionComplete(completion)).is_err() {
            tracing::warn!(%action_id, "engine closed before reply could be delivered");
        }
    }
}

/// Register a fresh context for `pickle` and run the scenario initializer.
pub(super) async fn initialize_scenario(unit: UnitContext, action_id: ActionId, pickle: Pickle) {
    let scenario_id = pickle.id.clone();
    tracing::debug!(%action_id, %scenario_id, name = %pickle.name, "initializing scenario");

    let report = match unit
        .states
        .create(scenario_id.clone(), ScenarioContext::for_pickle(pickle))
    {
        Err(error) => StepReport::rejected(error.into()),
        Ok(shared) => match unit.initializer.clone() {
            None => StepReport::passed(),
            Some(init) => tokio::task::spawn_blocking(move || {
                let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
                execution::initialize_scenario(&mut guard, Some(&init))
            })
            .await
            .unwrap_or_else(|_| StepReport::rejected(ExecutionError::Cancelled)),
        },
    };

    unit.reply(action_id, report.into_test_result());
}

/// Resolve and execute one step, replying with its result.
pub(super) async fn run_step(
    unit: UnitContext,
    action_id: ActionId,
    scenario_id: ScenarioId,
    step_definition_id: StepDefinitionId,
    pattern_matches: Vec<PatternMatch>,
) {
    let args: Vec<String> = pattern_matches
        .into_iter()
        .flat_map(|pattern_match| pattern_match.captures)
        .collect();
    tracing::debug!(
        %action_id,
        %scenario_id,
        step_definition = %step_definition_id,
        args = args.len(),
        "running step"
    );

    let prepared = unit
        .registry
        .resolve(&step_definition_id, args)
        .map_err(ExecutionError::from)
        .and_then(|step| {
            let context = unit.states.get(&scenario_id)?;
            Ok((context, step))
        });

    let report = match prepared {
        Ok((context, step)) => execution::dispatch_step(context, step).await,
        Err(error) => {
            tracing::warn!(%action_id, %scenario_id, %error, "step request rejected");
            StepReport::rejected(error)
        }
    };

    unit.reply(action_id, report.into_test_result());
}
