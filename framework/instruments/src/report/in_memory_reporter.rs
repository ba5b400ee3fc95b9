use std::sync::Arc;

use parking_lot::Mutex;
use timed_trial_summary_model::RunSummary;

use crate::report::ReportCollector;

/// Keeps every reported summary in memory. Clones share the same storage, so keep a clone to read
/// back what was reported.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReporter {
    summaries: Arc<Mutex<Vec<RunSummary>>>,
}

impl InMemoryReporter {
    pub fn summaries(&self) -> Vec<RunSummary> {
        self.summaries.lock().clone()
    }
}

impl ReportCollector for InMemoryReporter {
    fn finalize(&self, summary: &RunSummary) -> anyhow::Result<()> {
        self.summaries.lock().push(summary.clone());
        Ok(())
    }
}
