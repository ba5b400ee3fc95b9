use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use timed_trial_runner::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Present(String, usize, usize),
    Display(String, i64),
    Split(String, usize, Duration),
    Elapsed(String, Duration),
    Complete(usize),
    Menu(Vec<String>),
}

#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl RecordingObserver {
    pub fn take(&self) -> Vec<Seen> {
        std::mem::take(&mut *self.seen.lock())
    }
}

impl RunObserver for RecordingObserver {
    fn on_present(&mut self, case: &TimedCase, position: usize, total: usize) {
        self.seen
            .lock()
            .push(Seen::Present(case.id().to_string(), position, total));
    }

    fn on_display_update(&mut self, case_id: &CaseId, remaining: i64) {
        self.seen
            .lock()
            .push(Seen::Display(case_id.to_string(), remaining));
    }

    fn on_split(&mut self, case_id: &CaseId, phase: usize, at: Duration) {
        self.seen
            .lock()
            .push(Seen::Split(case_id.to_string(), phase, at));
    }

    fn on_elapsed_update(&mut self, case_id: &CaseId, elapsed: Duration) {
        self.seen
            .lock()
            .push(Seen::Elapsed(case_id.to_string(), elapsed));
    }

    fn on_run_complete(&mut self, results: &ResultTable) {
        self.seen.lock().push(Seen::Complete(results.len()));
    }

    fn on_menu(&mut self, suites: &[TestSuite]) {
        self.seen.lock().push(Seen::Menu(
            suites.iter().map(|s| s.name().to_string()).collect(),
        ));
    }
}
