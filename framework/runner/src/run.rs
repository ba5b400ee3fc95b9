use anyhow::Context;
use timed_trial_core::prelude::{ClockTicker, Tick, TickSource};
use timed_trial_instruments::{ReportConfig, Reporter};
use timed_trial_summary_model::RunSummary;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::definition::{SuiteDefinitionBuilder, TrialDefinition};
use crate::error::TrialError;
use crate::input::{start_operator_input, OperatorInput};
use crate::observer::RunObserver;
use crate::progress::TerminalObserver;
use crate::sequencer::{Advance, RunOutcome, RunSequencer};
use crate::types::TimedTrialResult;

/// Everything the session loop reacts to, delivered through a single queue so that ticks and
/// operator input are handled one at a time.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::From)]
pub enum SessionEvent {
    Tick(Tick),
    Operator(OperatorInput),
}

/// Run a timed trial from the command line.
///
/// Returns the summary of every run that was completed before the operator quit.
pub fn run(definition: SuiteDefinitionBuilder) -> TimedTrialResult<Vec<RunSummary>> {
    let definition = definition.build()?;

    log::info!("Running timed trial: {}", definition.name);

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;

    let mut report_config = ReportConfig::default().enable_summary();
    if let Some(path) = &definition.cli.summary_path {
        log::info!("Run summaries will be appended to {}", path.display());
        report_config = report_config.enable_jsonl(path.clone());
    }
    let reporter = report_config.init();

    let (sender, receiver) = mpsc::unbounded_channel();
    start_operator_input(sender.clone())?;
    start_interrupt_listener(&runtime, sender.clone());

    let observer = TerminalObserver::new(definition.cli.no_progress);
    runtime.block_on(run_session(
        definition,
        (sender, receiver),
        observer,
        &reporter,
    ))
}

/// Drive an operator session until the operator quits.
///
/// The suite selected on the command line is started straight away. Once a run completes, or the
/// operator goes back to the menu, further runs can be started from the same session. Each
/// completed run is summarised and handed to the reporters.
///
/// The sender half of `channel` is handed to the clock ticker, so the caller can use clones of it
/// to deliver operator input. Must be called from within a Tokio runtime.
pub async fn run_session(
    definition: TrialDefinition,
    channel: (UnboundedSender<SessionEvent>, UnboundedReceiver<SessionEvent>),
    observer: impl RunObserver + Send + 'static,
    reporter: &Reporter,
) -> TimedTrialResult<Vec<RunSummary>> {
    let mut last_suite = definition.selected_suite()?.name.clone();
    let default_count = definition.cli.count as usize;

    let (sender, mut events) = channel;
    let ticker = ClockTicker::new(tokio::runtime::Handle::current(), sender);
    let mut sequencer = RunSequencer::new(ticker).with_observer(observer);
    for suite in definition.suites {
        sequencer.add_suite(suite.into());
    }

    sequencer.request_start_run(&last_suite, default_count)?;
    let mut started_at = chrono::Utc::now().timestamp();
    let mut summaries = Vec::new();

    while let Some(event) = events.recv().await {
        let input = match event {
            SessionEvent::Tick(tick) => {
                sequencer.handle_tick(&tick);
                continue;
            }
            SessionEvent::Operator(input) => input,
        };

        log::trace!("Operator input: {input}");

        match input {
            OperatorInput::Toggle => trigger_presented(&mut sequencer, Trigger::Toggle),
            OperatorInput::Reset => trigger_presented(&mut sequencer, Trigger::Reset),
            OperatorInput::Next => match sequencer.request_advance() {
                Ok(Advance::Presented { .. }) => {}
                Ok(Advance::Completed(outcome)) => {
                    summaries.push(report_run(&sequencer, outcome, started_at, reporter));
                    sequencer.show_menu();
                }
                Err(e) => log::warn!("{e}. {}", OperatorInput::MENU_HELP),
            },
            OperatorInput::Menu => {
                if sequencer.abort() {
                    log::info!("Run abandoned, returning to suite selection");
                }
                sequencer.show_menu();
            }
            OperatorInput::Start { suite, count } => {
                let suite = suite.unwrap_or_else(|| last_suite.clone());
                match sequencer.request_start_run(&suite, count.unwrap_or(default_count)) {
                    Ok(_) => {
                        started_at = chrono::Utc::now().timestamp();
                        last_suite = suite;
                    }
                    Err(e) => log::warn!("{e}"),
                }
            }
            OperatorInput::Quit => break,
        }
    }

    if sequencer.abort() {
        log::info!("Session ended during a run of suite [{last_suite}]");
    }

    Ok(summaries)
}

enum Trigger {
    Toggle,
    Reset,
}

/// Apply an operator trigger to the presented case. Triggers that do not apply are only logged.
fn trigger_presented<T: TickSource>(sequencer: &mut RunSequencer<T>, trigger: Trigger) {
    let Some(case_id) = sequencer.current_case().map(|c| c.id().clone()) else {
        log::warn!("No run is active. {}", OperatorInput::MENU_HELP);
        return;
    };

    let result = match trigger {
        Trigger::Toggle => sequencer.trigger_toggle(&case_id).map(|_| ()),
        Trigger::Reset => sequencer.trigger_reset(&case_id).map(|_| ()),
    };
    match result {
        Ok(()) => {}
        Err(TrialError::CaseStopped(id)) => {
            log::warn!("Case {id} has stopped, press [r] to reset it or [n] to move on");
        }
        Err(e) => log::warn!("{e}"),
    }
}

fn report_run<T: TickSource>(
    sequencer: &RunSequencer<T>,
    outcome: RunOutcome,
    started_at: i64,
    reporter: &Reporter,
) -> RunSummary {
    let summary = RunSummary::new(
        nanoid::nanoid!(),
        outcome.suite_name,
        started_at,
        outcome.requested_count,
        outcome.case_count,
        sequencer.results().clone(),
        env!("CARGO_PKG_VERSION").to_string(),
    );

    let failed = reporter.finalize(&summary);
    if failed > 0 {
        log::warn!("{failed} reporters failed to record the run summary");
    }

    summary
}

/// Turn Ctrl+C into a quit request so the presented case is detached from its ticker before exit.
fn start_interrupt_listener(
    runtime: &tokio::runtime::Runtime,
    sender: UnboundedSender<SessionEvent>,
) {
    runtime.spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Received Ctrl+C, quitting");
                let _ = sender.send(OperatorInput::Quit.into());
            }
            Err(e) => log::error!("Failed to listen for Ctrl+C: {e:?}"),
        }
    });
}
