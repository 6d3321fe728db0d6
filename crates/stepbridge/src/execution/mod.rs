//! Step dispatch: run one handler against its scenario context.
//!
//! Handlers are synchronous closures. The dispatcher runs them on the Tokio
//! blocking pool inside a panic boundary, measures how long they took and
//! classifies the result as passed, failed or pending. Lookup failures and
//! missing scenarios surface as failed outcomes too, so every request yields
//! exactly one [`StepReport`].

mod error;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::PoisonError;
use std::time::{Duration, Instant};

use stepbridge_protocol::TestResult;

use crate::{
    ScenarioContext, ScenarioInitializer, StepError, panic_message, registry::ResolvedStep,
    state::SharedContext,
};

pub use error::ExecutionError;

/// Classification of one handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The handler returned successfully.
    Passed,
    /// The handler failed, panicked, or could not be dispatched.
    Failed(String),
    /// The handler reported a pending implementation.
    Pending,
}

impl From<ExecutionError> for Outcome {
    fn from(error: ExecutionError) -> Self {
        Self::Failed(error.to_string())
    }
}

/// Outcome plus the time spent producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Result classification.
    pub outcome: Outcome,
    /// Wall-clock execution time.
    pub duration: Duration,
}

impl StepReport {
    /// A passed report that took no measurable time.
    #[must_use]
    pub const fn passed() -> Self {
        Self {
            outcome: Outcome::Passed,
            duration: Duration::ZERO,
        }
    }

    /// A failed report for an error raised before any handler ran.
    #[must_use]
    pub fn rejected(error: ExecutionError) -> Self {
        Self {
            outcome: error.into(),
            duration: Duration::ZERO,
        }
    }

    /// Convert into the protocol result carried by an action reply.
    #[must_use]
    pub fn into_test_result(self) -> TestResult {
        let result = match self.outcome {
            Outcome::Passed => TestResult::passed(),
            Outcome::Pending => TestResult::pending(),
            Outcome::Failed(message) => TestResult::failed(message),
        };
        result.with_duration(self.duration)
    }
}

/// Run `invoke` inside a panic boundary and classify its result.
fn guarded<F>(invoke: F) -> StepReport
where
    F: FnOnce() -> Result<(), StepError>,
{
    let start = Instant::now();
    let outcome = match catch_unwind(AssertUnwindSafe(invoke)) {
        Ok(Ok(())) => Outcome::Passed,
        Ok(Err(StepError::Pending)) => Outcome::Pending,
        Ok(Err(StepError::Failed(message))) => ExecutionError::HandlerFailed { message }.into(),
        Err(payload) => ExecutionError::AbnormalTermination {
            message: panic_message(payload.as_ref()),
        }
        .into(),
    };
    StepReport {
        outcome,
        duration: start.elapsed(),
    }
}

/// Execute a resolved step against its scenario context.
///
/// The context lock is held for the whole invocation, so steps of one
/// scenario never overlap. A panic inside the handler is caught before the
/// guard unwinds, which keeps the context usable for later steps.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use stepbridge::{ScenarioContext, StepRegistry, StepDefinitionId};
/// use stepbridge::execution::{Outcome, execute_step};
///
/// let mut registry = StepRegistry::new();
/// registry.register("^boom$", |_, _| panic!("boom")).unwrap();
/// let step = registry.resolve(&StepDefinitionId::from_index(0), vec![]).unwrap();
/// let context = Arc::new(Mutex::new(ScenarioContext::default()));
///
/// let report = execute_step(&context, &step);
/// assert_eq!(report.outcome, Outcome::Failed("step panicked: boom".into()));
/// ```
#[must_use]
pub fn execute_step(context: &SharedContext, step: &ResolvedStep) -> StepReport {
    let mut guard = context.lock().unwrap_or_else(PoisonError::into_inner);
    let handler = step.definition.handler();
    guarded(|| handler(&mut *guard, step.args.as_slice()))
}

/// Prepare a fresh context with the optional scenario initializer.
#[must_use]
pub fn initialize_scenario(
    context: &mut ScenarioContext,
    initializer: Option<&ScenarioInitializer>,
) -> StepReport {
    match initializer {
        Some(init) => guarded(|| init(context)),
        None => StepReport::passed(),
    }
}

/// Run [`execute_step`] on the blocking pool.
///
/// A cancelled blocking task is reported as a failure.
pub async fn dispatch_step(context: SharedContext, step: ResolvedStep) -> StepReport {
    let start = Instant::now();
    tokio::task::spawn_blocking(move || execute_step(&context, &step))
        .await
        .unwrap_or_else(|_| StepReport {
            outcome: ExecutionError::Cancelled.into(),
            duration: start.elapsed(),
        })
}
