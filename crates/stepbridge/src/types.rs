//! Handler signatures and the error type step handlers return.

use std::sync::Arc;

use thiserror::Error;

use crate::ScenarioContext;

/// Error returned by step handlers and scenario initializers.
///
/// # Examples
///
/// ```
/// use stepbridge::StepError;
///
/// let err = StepError::failed("expected 3, got 4");
/// assert_eq!(err.to_string(), "expected 3, got 4");
/// assert!(StepError::Pending.is_pending());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// The step is not implemented yet.
    #[error("step implementation is pending")]
    Pending,
    /// The step failed with a message.
    #[error("{0}")]
    Failed(String),
}

impl StepError {
    /// Build a [`StepError::Failed`] from any displayable message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Whether this error marks the step as pending.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Shared step handler: receives the scenario context and the captured
/// arguments in match order.
pub type StepHandler =
    Arc<dyn Fn(&mut ScenarioContext, &[String]) -> Result<(), StepError> + Send + Sync>;

/// Callback that prepares a fresh scenario context before its first step.
pub type ScenarioInitializer =
    Arc<dyn Fn(&mut ScenarioContext) -> Result<(), StepError> + Send + Sync>;
