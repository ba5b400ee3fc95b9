mod case_table;

use std::fmt::Write;

use itertools::Itertools;
use tabled::settings::Style;
use tabled::Table;
use timed_trial_summary_model::{ResultRecord, RunSummary};

use crate::report::summary_table::case_table::{PhasedCaseRow, SingleCaseRow};
use crate::report::ReportCollector;

/// Prints a table of the run's results to the terminal.
#[derive(Debug, Default)]
pub struct SummaryTableReporter;

impl SummaryTableReporter {
    pub fn render(summary: &RunSummary) -> String {
        let results = &summary.results;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "\nSummary of {} ({} of {} cases recorded)",
            summary.suite_name,
            results.len(),
            summary.case_count
        );

        let (phased, single): (Vec<&ResultRecord>, Vec<&ResultRecord>) =
            results.iter().partition(|r| r.is_phased());

        if !single.is_empty() {
            let rows = single
                .into_iter()
                .map(|r| SingleCaseRow {
                    case_id: r.case_id().to_string(),
                    elapsed_s: r.elapsed().as_secs_f64(),
                    alert_s: r.thresholds().overall_s(),
                    over_budget: r.is_over_budget(),
                })
                .collect::<Vec<_>>();
            let mut table = Table::new(rows);
            table.with(Style::modern());
            let _ = writeln!(out, "{table}");
        }

        if !phased.is_empty() {
            let rows = phased
                .into_iter()
                .map(|r| PhasedCaseRow {
                    case_id: r.case_id().to_string(),
                    elapsed_s: r.elapsed().as_secs_f64(),
                    overall_s: r.thresholds().overall_s(),
                    phases: join_phases(r),
                    over_budget: r.is_over_budget(),
                })
                .collect::<Vec<_>>();
            let mut table = Table::new(rows);
            table.with(Style::modern());
            let _ = writeln!(out, "{table}");
        }

        match results.average_elapsed() {
            Some(avg) => {
                let _ = writeln!(out, "Average elapsed: {:.2}s", avg.as_secs_f64());
                let _ = writeln!(out, "Over budget: {}", results.over_budget().count());
            }
            None => {
                let _ = writeln!(out, "No results recorded");
            }
        }

        out
    }
}

fn join_phases(record: &ResultRecord) -> String {
    record
        .phase_durations()
        .into_iter()
        .zip(record.phase_overruns())
        .map(|(phase, over)| {
            let marker = if over { "!" } else { "" };
            format!("{:.2}{marker}", phase.as_secs_f64())
        })
        .join(" / ")
}

impl ReportCollector for SummaryTableReporter {
    fn finalize(&self, summary: &RunSummary) -> anyhow::Result<()> {
        println!("{}", Self::render(summary));
        Ok(())
    }
}
