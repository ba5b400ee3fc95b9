use std::time::Duration;

use timed_trial_core::prelude::CaseId;
use timed_trial_summary_model::ResultTable;

use crate::case::TimedCase;
use crate::definition::TestSuite;

/// Receives state snapshots from the [crate::sequencer::RunSequencer] so they can be shown to the
/// operator.
///
/// Notifications are delivered synchronously, in the order the state changed.
pub trait RunObserver {
    /// A case is now being presented. `position` counts from 0.
    fn on_present(&mut self, _case: &TimedCase, _position: usize, _total: usize) {}

    /// The countdown changed, either from a tick or because the case was reset.
    fn on_display_update(&mut self, case_id: &CaseId, remaining: i64);

    /// A phase of a multi-trigger case ended. `phase` counts from 1.
    fn on_split(&mut self, _case_id: &CaseId, _phase: usize, _at: Duration) {}

    /// The case stopped. Sent once per completed case.
    fn on_elapsed_update(&mut self, case_id: &CaseId, elapsed: Duration);

    /// Every case in the run has been presented.
    fn on_run_complete(&mut self, results: &ResultTable);

    /// No run is active and the operator can choose the next one.
    fn on_menu(&mut self, _suites: &[TestSuite]) {}
}

/// An observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn on_display_update(&mut self, _case_id: &CaseId, _remaining: i64) {}

    fn on_elapsed_update(&mut self, _case_id: &CaseId, _elapsed: Duration) {}

    fn on_run_complete(&mut self, _results: &ResultTable) {}
}
