mod record;
mod table;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::io::{BufRead, Read, Write};
use std::path::Path;

pub use record::{ResultRecord, Thresholds};
pub use table::ResultTable;

/// Summary of a completed run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// The unique run id
    ///
    /// Chosen by the runner. Unique for each run.
    pub run_id: String,
    /// The name of the suite that was run
    pub suite_name: String,
    /// The time the run started
    ///
    /// This is a Unix timestamp in seconds.
    pub started_at: i64,
    /// The number of cases the operator asked for, before clamping
    pub requested_count: usize,
    /// The number of cases that were presented in the run
    ///
    /// This is the requested count clamped to the size of the suite.
    pub case_count: usize,
    /// One record per completed case, in completion order
    ///
    /// May hold fewer than [RunSummary::case_count] records if the operator moved on from a case
    /// without stopping it.
    pub results: ResultTable,
    /// The version of Timed Trial that was used for this run
    pub timed_trial_version: String,
}

impl RunSummary {
    /// Create a new run summary
    pub fn new(
        run_id: String,
        suite_name: String,
        started_at: i64,
        requested_count: usize,
        case_count: usize,
        results: ResultTable,
        timed_trial_version: String,
    ) -> Self {
        Self {
            run_id,
            suite_name,
            started_at,
            requested_count,
            case_count,
            results,
            timed_trial_version,
        }
    }

    /// Compute a fingerprint for this run summary
    ///
    /// The fingerprint is intended to identify the configuration used for the run so that runs of
    /// the same configuration can be compared. It uses the
    ///     - Suite name
    ///     - Case count
    ///     - Recorded case ids and their thresholds
    ///     - Timed Trial version
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.suite_name.as_bytes());
        Digest::update(&mut hasher, self.case_count.to_le_bytes());
        self.results
            .iter()
            .sorted_by_key(|r| r.case_id().clone())
            .for_each(|r| {
                Digest::update(&mut hasher, r.case_id().as_str().as_bytes());
                Digest::update(&mut hasher, r.thresholds().overall_s().to_le_bytes());
                for phase_s in r.thresholds().phases_s() {
                    Digest::update(&mut hasher, phase_s.to_le_bytes());
                }
            });
        Digest::update(&mut hasher, self.timed_trial_version.as_bytes());

        format!("{:x}", hasher.finalize())
    }
}

/// Append the run summary to a file
///
/// The summary will be serialized to JSON and output as a single line followed by a newline. The
/// recommended file extension is `.jsonl`.
pub fn append_run_summary(run_summary: &RunSummary, path: &Path) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_run_summary(run_summary, &mut file)?;
    file.write_all("\n".as_bytes())?;
    Ok(())
}

/// Serialize the run summary to a writer
pub fn store_run_summary<W: Write>(run_summary: &RunSummary, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, run_summary)?;
    Ok(())
}

/// Load a run summary from a reader
pub fn load_run_summary<R: Read>(reader: R) -> anyhow::Result<RunSummary> {
    let reader = std::io::BufReader::new(reader);
    let run_summary: RunSummary = serde_json::from_reader(reader)?;
    Ok(run_summary)
}

/// Load run summaries from a file
///
/// The file should contain one JSON object per line. This is the format produced by
/// [append_run_summary].
pub fn load_summary_runs(path: &Path) -> anyhow::Result<Vec<RunSummary>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let run: RunSummary = serde_json::from_str(&line)?;
        runs.push(run);
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use timed_trial_core::prelude::CaseId;

    fn sample_summary(run_id: &str) -> RunSummary {
        let mut results = ResultTable::new();
        results.append(ResultRecord::single(CaseId::from("1"), Duration::from_millis(4_500), 5));
        results.append(ResultRecord::phased(
            CaseId::from("6"),
            Duration::from_secs(15),
            vec![
                Duration::from_secs(3),
                Duration::from_secs(10),
                Duration::from_secs(15),
            ],
            100,
            vec![3, 3, 4],
        ));

        RunSummary::new(
            run_id.to_string(),
            "Sample Quiz".to_string(),
            1_700_000_000,
            3,
            2,
            results,
            "0.1.0".to_string(),
        )
    }

    #[test]
    fn fingerprint_ignores_run_identity() {
        let first = sample_summary("run-a");
        let mut second = sample_summary("run-b");
        second.started_at += 60;

        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_configuration() {
        let first = sample_summary("run-a");
        let mut second = sample_summary("run-a");
        second.case_count = 3;

        assert_ne!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn appended_summaries_load_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_summary.jsonl");

        append_run_summary(&sample_summary("run-a"), &path).unwrap();
        append_run_summary(&sample_summary("run-b"), &path).unwrap();

        let runs = load_summary_runs(&path).unwrap();
        assert_eq!(
            vec!["run-a", "run-b"],
            runs.iter().map(|r| r.run_id.as_str()).collect::<Vec<_>>()
        );
        assert_eq!(sample_summary("run-a"), runs[0]);
    }

    #[test]
    fn load_single_summary_from_reader() {
        let mut buf = Vec::new();
        store_run_summary(&sample_summary("run-a"), &mut buf).unwrap();

        let loaded = load_run_summary(buf.as_slice()).unwrap();
        assert_eq!(2, loaded.results.len());
        assert!(loaded.results.records()[1].is_phased());
    }
}
