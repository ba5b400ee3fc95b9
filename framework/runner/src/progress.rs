use std::fmt::Write;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use timed_trial_core::prelude::CaseId;
use timed_trial_summary_model::ResultTable;

use crate::case::TimedCase;
use crate::definition::TestSuite;
use crate::input::OperatorInput;
use crate::observer::RunObserver;
use crate::policy::CasePolicy;

/// Shows the presented case on the terminal, with a countdown bar unless it is disabled.
pub(crate) struct TerminalObserver {
    no_progress: bool,
    countdown_s: u64,
    bar: Option<ProgressBar>,
}

impl TerminalObserver {
    pub(crate) fn new(no_progress: bool) -> Self {
        Self {
            no_progress,
            countdown_s: 0,
            bar: None,
        }
    }

    fn print(&self, msg: &str) {
        match &self.bar {
            Some(bar) => bar.println(msg),
            None => println!("{msg}"),
        }
    }

    fn finish_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}

impl RunObserver for TerminalObserver {
    fn on_present(&mut self, case: &TimedCase, position: usize, total: usize) {
        self.finish_bar();

        if position == 0 {
            println!("\n{}", introduction(case.policy()));
        }

        println!("\nTest case {} of {}", position + 1, total);
        println!("TestCase ID: {}", case.id());
        if !case.images().is_empty() {
            println!("Images: {}", case.images().join(", "));
        }
        println!("{}", OperatorInput::HELP);

        self.countdown_s = case.countdown_s();
        if !self.no_progress {
            self.bar = Some(countdown_bar(case.countdown_s()));
        }
    }

    fn on_display_update(&mut self, _case_id: &CaseId, remaining: i64) {
        let msg = format!("Countdown: {remaining} seconds");
        match &self.bar {
            Some(bar) => {
                let counted = self.countdown_s as i64 - remaining;
                bar.set_position(counted.clamp(0, self.countdown_s as i64) as u64);
                bar.set_message(msg);
            }
            None => println!("{msg}"),
        }
    }

    fn on_split(&mut self, _case_id: &CaseId, phase: usize, at: Duration) {
        self.print(&format!("Phase {phase} ended at {:.2} seconds", at.as_secs_f64()));
    }

    fn on_elapsed_update(&mut self, _case_id: &CaseId, elapsed: Duration) {
        self.finish_bar();
        println!("Elapsed time: {:.2} seconds", elapsed.as_secs_f64());
        println!("Press [n] for the next case");
    }

    fn on_run_complete(&mut self, results: &ResultTable) {
        self.finish_bar();
        println!("\nRun complete, {} results recorded", results.len());
    }

    fn on_menu(&mut self, suites: &[TestSuite]) {
        self.finish_bar();

        println!("\nSuites:");
        for suite in suites {
            println!("  {} ({} cases)", suite.name(), suite.len());
        }
        println!("{}", OperatorInput::MENU_HELP);
    }
}

/// What the operator is about to do, shown before the first case of a run.
fn introduction(policy: &CasePolicy) -> String {
    match policy {
        CasePolicy::Single { .. } => {
            "Single countdown: press [Enter] to start timing and again when you are done."
                .to_string()
        }
        CasePolicy::Multi { phases_s, .. } => format!(
            "Phased countdown: press [Enter] to start, then at the end of each of the {} phases.",
            phases_s.len()
        ),
    }
}

/// A bar that fills as the countdown runs down. It stays full once the countdown is overrun.
fn countdown_bar(countdown_s: u64) -> ProgressBar {
    let pb = ProgressBar::new(countdown_s);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{wide_bar:.cyan/blue}] [{pos}s / {planned}] {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .with_key("planned", {
        let minutes = countdown_s / 60;
        let seconds = countdown_s % 60;
        move |_state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{:02}:{:02}", minutes, seconds);
        }
    })
    .progress_chars("#>-");
    pb.set_style(style);
    pb
}
