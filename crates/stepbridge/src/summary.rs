//! Run summary and the counters folded from engine events.

use std::process::ExitCode;
use std::time::Duration;

use serde::Serialize;

use stepbridge_protocol::{TestResult, TestStatus};

/// Aggregated outcome of a run.
///
/// Scenario totals count initialization requests, so a scenario that never
/// reports completion still shows up in `scenarios_total`. Ambiguous and
/// skipped scenarios only contribute to the total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Whether the engine reported success.
    pub success: bool,
    /// Process exit status derived from `success`.
    pub exit_code: u8,
    /// Time from run start to run finish.
    pub duration: Duration,

    /// Scenarios the engine asked to initialize.
    pub scenarios_total: usize,
    /// Scenarios that finished as passed.
    pub scenarios_passed: usize,
    /// Scenarios that finished as failed.
    pub scenarios_failed: usize,
    /// Scenarios that finished as pending.
    pub scenarios_pending: usize,
    /// Scenarios that finished as undefined.
    pub scenarios_undefined: usize,

    /// Steps that finished, whatever their status.
    pub steps_total: usize,
    /// Steps that passed.
    pub steps_passed: usize,
    /// Steps that failed.
    pub steps_failed: usize,
    /// Steps that were pending.
    pub steps_pending: usize,
    /// Steps with no matching definition.
    pub steps_undefined: usize,
    /// Steps the engine skipped.
    pub steps_skipped: usize,
}

impl Summary {
    /// Count a scenario as soon as its initialization is requested.
    pub fn record_scenario_started(&mut self) {
        self.scenarios_total += 1;
    }

    /// Fold a finished scenario into the counters.
    pub fn record_scenario_finished(&mut self, result: &TestResult) {
        match result.status {
            TestStatus::Passed => self.scenarios_passed += 1,
            TestStatus::Failed => self.scenarios_failed += 1,
            TestStatus::Pending => self.scenarios_pending += 1,
            TestStatus::Undefined => self.scenarios_undefined += 1,
            TestStatus::Ambiguous | TestStatus::Skipped => {}
        }
    }

    /// Fold a finished step into the counters.
    pub fn record_step_finished(&mut self, result: &TestResult) {
        self.steps_total += 1;
        match result.status {
            TestStatus::Passed => self.steps_passed += 1,
            TestStatus::Failed => self.steps_failed += 1,
            TestStatus::Pending => self.steps_pending += 1,
            TestStatus::Undefined => self.steps_undefined += 1,
            TestStatus::Skipped => self.steps_skipped += 1,
            TestStatus::Ambiguous => {}
        }
    }

    /// Record the final verdict and the elapsed time.
    pub fn finish(&mut self, success: bool, duration: Duration) {
        self.success = success;
        self.exit_code = u8::from(!success);
        self.duration = duration;
    }

    /// Render the non-zero scenario counters, for example `1 passed, 1 failed`.
    #[must_use]
    pub fn scenario_breakdown(&self) -> String {
        breakdown(&[
            (self.scenarios_passed, "passed"),
            (self.scenarios_failed, "failed"),
            (self.scenarios_pending, "pending"),
            (self.scenarios_undefined, "undefined"),
        ])
    }

    /// Render the non-zero step counters.
    #[must_use]
    pub fn step_breakdown(&self) -> String {
        breakdown(&[
            (self.steps_passed, "passed"),
            (self.steps_failed, "failed"),
            (self.steps_pending, "pending"),
            (self.steps_undefined, "undefined"),
            (self.steps_skipped, "skipped"),
        ])
    }
}

fn breakdown(counts: &[(usize, &str)]) -> String {
    counts
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{count} {label}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<&Summary> for ExitCode {
    fn from(summary: &Summary) -> Self {
        Self::from(summary.exit_code)
    }
}

impl From<Summary> for ExitCode {
    fn from(summary: Summary) -> Self {
        Self::from(&summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(true, 0)]
    #[case(false, 1)]
    fn exit_code_follows_success(#[case] success: bool, #[case] expected: u8) {
        let mut summary = Summary::default();
        summary.finish(success, Duration::from_millis(3));
        assert_eq!(summary.exit_code, expected);
        assert_eq!(summary.duration, Duration::from_millis(3));
    }

    #[test]
    fn step_counters_follow_status() {
        let mut summary = Summary::default();
        for result in [
            TestResult::passed(),
            TestResult::failed("x"),
            TestResult::pending(),
            TestResult::new(TestStatus::Undefined),
            TestResult::new(TestStatus::Skipped),
            TestResult::new(TestStatus::Ambiguous),
        ] {
            summary.record_step_finished(&result);
        }
        assert_eq!(summary.steps_total, 6);
        assert_eq!(
            summary.step_breakdown(),
            "1 passed, 1 failed, 1 pending, 1 undefined, 1 skipped"
        );
    }

    #[test]
    fn scenario_breakdown_omits_zero_counts() {
        let mut summary = Summary::default();
        summary.record_scenario_started();
        summary.record_scenario_started();
        summary.record_scenario_finished(&TestResult::passed());
        summary.record_scenario_finished(&TestResult::new(TestStatus::Undefined));
        assert_eq!(summary.scenarios_total, 2);
        assert_eq!(summary.scenario_breakdown(), "1 passed, 1 undefined");
    }

    #[test]
    fn summary_serializes_counters() {
        let mut summary = Summary::default();
        summary.record_scenario_started();
        let json = serde_json::to_value(&summary)
            .unwrap_or_else(|e| panic!("serialize summary: {e}"));
        assert_eq!(json["scenarios_total"], 1);
        assert_eq!(json["success"], false);
    }
}
