//! Error types for step execution failures.

use thiserror::Error;

use crate::error::{LookupError, ScenarioStateError};

/// Every way a dispatched unit can fail short of a pending marker.
///
/// All variants are recoverable: they render into the message of a failed
/// action reply and never end the run.
///
/// # Examples
///
/// ```
/// use stepbridge::execution::ExecutionError;
///
/// let error = ExecutionError::AbnormalTermination { message: "boom".into() };
/// assert_eq!(error.to_string(), "step panicked: boom");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ExecutionError {
    /// The requested step definition could not be resolved.
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// The scenario has no registered context.
    #[error(transparent)]
    Scenario(#[from] ScenarioStateError),
    /// The handler returned a failure.
    #[error("{message}")]
    HandlerFailed {
        /// Message returned by the handler.
        message: String,
    },
    /// The handler panicked.
    #[error("step panicked: {message}")]
    AbnormalTermination {
        /// Rendered panic payload.
        message: String,
    },
    /// The blocking task running the handler was cancelled.
    #[error("step execution was cancelled")]
    Cancelled,
}
