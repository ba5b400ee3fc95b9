use std::path::PathBuf;

use timed_trial_summary_model::{append_run_summary, RunSummary};

use crate::report::ReportCollector;

/// Appends each summary as one line of JSON.
#[derive(Debug)]
pub struct JsonlReporter {
    path: PathBuf,
}

impl JsonlReporter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ReportCollector for JsonlReporter {
    fn finalize(&self, summary: &RunSummary) -> anyhow::Result<()> {
        append_run_summary(summary, &self.path)?;
        log::info!("Appended run summary to {}", self.path.display());
        Ok(())
    }
}
