//! Test-result statuses and the result record attached to replies and
//! finished events.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Classification of one step or scenario execution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// The step or scenario ran to completion.
    #[default]
    Passed,
    /// The step or scenario failed.
    Failed,
    /// The handler signalled that its implementation is pending.
    Pending,
    /// No step definition matched the step text.
    Undefined,
    /// More than one step definition matched the step text.
    Ambiguous,
    /// The engine decided not to execute the step.
    Skipped,
}

impl TestStatus {
    /// Retrieve the lowercase label for the status.
    ///
    /// # Examples
    /// ```
    /// use stepbridge_protocol::TestStatus;
    ///
    /// assert_eq!(TestStatus::Undefined.label(), "undefined");
    /// ```
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Pending => "pending",
            Self::Undefined => "undefined",
            Self::Ambiguous => "ambiguous",
            Self::Skipped => "skipped",
        }
    }

    /// Relative severity used when folding step statuses into a scenario
    /// status. Higher values dominate.
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::Passed => 0,
            Self::Skipped => 1,
            Self::Pending => 2,
            Self::Undefined => 3,
            Self::Ambiguous => 4,
            Self::Failed => 5,
        }
    }

    /// Whether a scenario ending in this status fails the run.
    ///
    /// Failed, ambiguous and undefined results always fail; pending results
    /// only fail in strict mode.
    ///
    /// # Examples
    /// ```
    /// use stepbridge_protocol::TestStatus;
    ///
    /// assert!(TestStatus::Undefined.is_failure(false));
    /// assert!(!TestStatus::Pending.is_failure(false));
    /// assert!(TestStatus::Pending.is_failure(true));
    /// ```
    #[must_use]
    pub const fn is_failure(self, strict: bool) -> bool {
        match self {
            Self::Failed | Self::Ambiguous | Self::Undefined => true,
            Self::Pending => strict,
            Self::Passed | Self::Skipped => false,
        }
    }
}

/// Outcome record carried by replies and finished events.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Result classification.
    pub status: TestStatus,
    /// Diagnostic message, present for failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Measured execution time in nanoseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_nanos: Option<u64>,
}

impl TestResult {
    /// Build a result with the given status and no message.
    #[must_use]
    pub const fn new(status: TestStatus) -> Self {
        Self {
            status,
            message: None,
            duration_nanos: None,
        }
    }

    /// A passed result.
    #[must_use]
    pub const fn passed() -> Self {
        Self::new(TestStatus::Passed)
    }

    /// A pending result.
    #[must_use]
    pub const fn pending() -> Self {
        Self::new(TestStatus::Pending)
    }

    /// A failed result carrying a diagnostic message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: TestStatus::Failed,
            message: Some(message.into()),
            duration_nanos: None,
        }
    }

    /// Attach a diagnostic message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach a measured duration, saturating at `u64::MAX` nanoseconds.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use stepbridge_protocol::TestResult;
    ///
    /// let result = TestResult::passed().with_duration(Duration::from_micros(5));
    /// assert_eq!(result.duration_nanos, Some(5_000));
    /// assert_eq!(result.duration(), Some(Duration::from_micros(5)));
    /// ```
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_nanos = Some(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX));
        self
    }

    /// The measured duration, when one was attached.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.duration_nanos.map(Duration::from_nanos)
    }
}
