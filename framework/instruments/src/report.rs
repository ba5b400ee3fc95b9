mod in_memory_reporter;
mod jsonl_reporter;
mod summary_table;

use std::path::PathBuf;

use timed_trial_summary_model::RunSummary;

pub use in_memory_reporter::InMemoryReporter;
pub use jsonl_reporter::JsonlReporter;
pub use summary_table::SummaryTableReporter;

/// A sink for completed runs.
pub trait ReportCollector: Send {
    /// Called once with the summary of a run that reached the end of its cases.
    fn finalize(&self, summary: &RunSummary) -> anyhow::Result<()>;
}

/// Choose which reporters receive the summary at the end of a run.
#[derive(Debug, Default)]
pub struct ReportConfig {
    summary: bool,
    jsonl_path: Option<PathBuf>,
    in_memory: Option<InMemoryReporter>,
}

impl ReportConfig {
    /// Print a summary table to the terminal.
    pub fn enable_summary(mut self) -> Self {
        self.summary = true;
        self
    }

    /// Append the summary as a JSON line to the given file.
    pub fn enable_jsonl(mut self, path: PathBuf) -> Self {
        self.jsonl_path = Some(path);
        self
    }

    /// Keep summaries in memory, readable through the given reporter.
    pub fn enable_in_memory(mut self, reporter: InMemoryReporter) -> Self {
        self.in_memory = Some(reporter);
        self
    }

    pub fn init(self) -> Reporter {
        let mut collectors: Vec<Box<dyn ReportCollector>> = Vec::new();

        if self.summary {
            collectors.push(Box::new(SummaryTableReporter));
        }
        if let Some(path) = self.jsonl_path {
            collectors.push(Box::new(JsonlReporter::new(path)));
        }
        if let Some(reporter) = self.in_memory {
            collectors.push(Box::new(reporter));
        }

        Reporter { collectors }
    }
}

/// Fans a run summary out to every configured collector.
pub struct Reporter {
    collectors: Vec<Box<dyn ReportCollector>>,
}

impl Reporter {
    /// Hand the summary to each collector.
    ///
    /// A failing collector does not stop the others. Returns the number of collectors that failed.
    pub fn finalize(&self, summary: &RunSummary) -> usize {
        let mut failed = 0;
        for collector in &self.collectors {
            if let Err(e) = collector.finalize(summary) {
                log::error!("Failed to report run {}: {:?}", summary.run_id, e);
                failed += 1;
            }
        }
        failed
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timed_trial_summary_model::ResultTable;

    fn empty_summary() -> RunSummary {
        RunSummary::new(
            "run".to_string(),
            "suite".to_string(),
            0,
            1,
            1,
            ResultTable::new(),
            "0.1.0".to_string(),
        )
    }

    #[test]
    fn failing_collector_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let in_memory = InMemoryReporter::default();
        let reporter = ReportConfig::default()
            .enable_jsonl(dir.path().to_path_buf())
            .enable_in_memory(in_memory.clone())
            .init();

        assert_eq!(1, reporter.finalize(&empty_summary()));
        assert_eq!(1, in_memory.summaries().len());
    }

    #[test]
    fn default_config_has_no_collectors() {
        assert!(ReportConfig::default().init().is_empty());
    }
}
