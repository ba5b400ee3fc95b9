use timed_trial_core::prelude::{CaseId, Tick, TickSource};
use timed_trial_summary_model::ResultTable;
use tokio::time::Instant;

use crate::case::{CaseState, TimedCase, Transition};
use crate::cli::MAX_CASE_COUNT;
use crate::definition::TestSuite;
use crate::error::TrialError;
use crate::observer::{NoopObserver, RunObserver};

/// How a run ended, once every case has been presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub suite_name: String,
    /// The number of cases the operator asked for
    pub requested_count: usize,
    /// The number of cases that were presented
    pub case_count: usize,
}

/// The result of moving on from the presented case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The next case has been reset and presented. `position` counts from 0.
    Presented { position: usize, total: usize },
    /// There are no more cases, the results are ready to be summarised.
    Completed(RunOutcome),
}

#[derive(Debug)]
struct ActiveRun {
    suite: usize,
    requested: usize,
    /// The number of cases from the start of the suite that take part in the run
    len: usize,
    cursor: usize,
}

/// Clamp a requested case count to `1..=MAX_CASE_COUNT` and to the size of the suite.
pub fn clamp_case_count(requested: usize, suite_len: usize) -> usize {
    requested.clamp(1, MAX_CASE_COUNT).min(suite_len)
}

/// Presents the cases of a suite one after another and collects their results.
///
/// This is the single owner of the suites, the active run and the result table. Ticks and operator
/// triggers must be delivered to it one at a time, which is what keeps case state consistent
/// without locking.
pub struct RunSequencer<T: TickSource> {
    ticker: T,
    observer: Box<dyn RunObserver + Send>,
    suites: Vec<TestSuite>,
    run: Option<ActiveRun>,
    results: ResultTable,
}

impl<T: TickSource> RunSequencer<T> {
    pub fn new(ticker: T) -> Self {
        Self {
            ticker,
            observer: Box::new(NoopObserver),
            suites: Vec::new(),
            run: None,
            results: ResultTable::new(),
        }
    }

    pub fn with_observer(mut self, observer: impl RunObserver + Send + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn add_suite(&mut self, suite: TestSuite) {
        self.suites.push(suite);
    }

    pub fn suites(&self) -> &[TestSuite] {
        &self.suites
    }

    pub fn ticker(&self) -> &T {
        &self.ticker
    }

    /// The results of the current run, or of the last run if none is active.
    pub fn results(&self) -> &ResultTable {
        &self.results
    }

    pub fn is_active(&self) -> bool {
        self.run.is_some()
    }

    /// The case being presented.
    pub fn current_case(&self) -> Option<&TimedCase> {
        let run = self.run.as_ref()?;
        self.suites[run.suite].cases().get(run.cursor)
    }

    /// The position of the presented case and the number of cases in the run.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.run.as_ref().map(|run| (run.cursor, run.len))
    }

    /// The cases taking part in the active run, in order.
    pub fn active_cases(&self) -> &[TimedCase] {
        match &self.run {
            Some(run) => &self.suites[run.suite].cases()[..run.len],
            None => &[],
        }
    }

    /// Start a run of the first `count` cases of a suite and present the first case.
    ///
    /// The count is clamped rather than rejected. Any run that is already active is aborted first.
    /// Returns the number of cases in the run.
    pub fn request_start_run(&mut self, suite_id: &str, count: usize) -> Result<usize, TrialError> {
        let suite = self
            .suites
            .iter()
            .position(|s| s.name() == suite_id)
            .ok_or_else(|| TrialError::UnknownSuite(suite_id.to_string()))?;

        let suite_len = self.suites[suite].len();
        if suite_len == 0 {
            log::warn!("Cannot start suite [{suite_id}], it has no test cases");
            return Err(TrialError::EmptySuite(suite_id.to_string()));
        }

        if self.abort() {
            log::warn!("Starting suite [{suite_id}] replaced a run that was still active");
        }

        let len = clamp_case_count(count, suite_len);
        if len != count {
            log::warn!("Requested {count} test cases from suite [{suite_id}], running {len}");
        }

        self.results.clear();
        self.run = Some(ActiveRun {
            suite,
            requested: count,
            len,
            cursor: 0,
        });
        log::info!("Starting suite [{suite_id}] with {len} test cases");

        self.present();
        Ok(len)
    }

    /// The operator trigger for the presented case, at the current time.
    pub fn trigger_toggle(&mut self, case_id: &CaseId) -> Result<Transition, TrialError> {
        self.trigger_toggle_at(case_id, Instant::now())
    }

    /// The operator trigger for the presented case, at the given time.
    pub fn trigger_toggle_at(
        &mut self,
        case_id: &CaseId,
        now: Instant,
    ) -> Result<Transition, TrialError> {
        let case = presented_case(&mut self.suites, self.run.as_ref(), case_id)?;
        let transition = case.toggle(now, &self.ticker)?;

        match &transition {
            Transition::Started => {}
            Transition::Split { phase, at } => self.observer.on_split(case.id(), *phase, *at),
            Transition::Stopped(record) => {
                log::info!(
                    "Recorded time for case {}: {:.2} seconds",
                    record.case_id(),
                    record.elapsed().as_secs_f64()
                );
                self.observer
                    .on_elapsed_update(record.case_id(), record.elapsed());
                self.results.append(record.clone());
            }
        }

        Ok(transition)
    }

    /// Reset the presented case. Returns the restored countdown.
    ///
    /// A result that the case already recorded stays in the table.
    pub fn trigger_reset(&mut self, case_id: &CaseId) -> Result<i64, TrialError> {
        let case = presented_case(&mut self.suites, self.run.as_ref(), case_id)?;
        let remaining = case.reset();
        self.observer.on_display_update(case.id(), remaining);
        Ok(remaining)
    }

    /// Apply a countdown tick to the presented case.
    ///
    /// Returns the new countdown, or `None` if the tick was stale and discarded.
    pub fn handle_tick(&mut self, tick: &Tick) -> Option<i64> {
        let run = self.run.as_ref()?;
        let case = &mut self.suites[run.suite].cases_mut()[run.cursor];
        let remaining = case.tick(tick)?;
        self.observer.on_display_update(case.id(), remaining);
        Some(remaining)
    }

    /// Move on from the presented case.
    ///
    /// This is expected once the case has stopped. Moving on from a case that has not stopped
    /// resets it and records nothing for it.
    pub fn request_advance(&mut self) -> Result<Advance, TrialError> {
        let run = self.run.as_mut().ok_or(TrialError::NoActiveRun)?;

        let case = &mut self.suites[run.suite].cases_mut()[run.cursor];
        if case.state() != CaseState::Stopped {
            log::warn!(
                "Moving on from case {} while it is {}, no result is recorded for it",
                case.id(),
                case.state()
            );
            case.reset();
        }

        run.cursor += 1;
        if run.cursor < run.len {
            let (position, total) = (run.cursor, run.len);
            self.present();
            return Ok(Advance::Presented { position, total });
        }

        let outcome = RunOutcome {
            suite_name: self.suites[run.suite].name().to_string(),
            requested_count: run.requested,
            case_count: run.len,
        };
        self.run = None;

        log::info!(
            "Run of suite [{}] complete with {} results",
            outcome.suite_name,
            self.results.len()
        );
        self.observer.on_run_complete(&self.results);

        Ok(Advance::Completed(outcome))
    }

    /// Abandon the active run.
    ///
    /// The presented case is reset, which detaches its ticker. Results recorded so far are kept
    /// until the next run starts. Returns whether a run was active.
    pub fn abort(&mut self) -> bool {
        let Some(run) = self.run.take() else {
            return false;
        };

        let suite = &mut self.suites[run.suite];
        log::info!(
            "Aborted suite [{}] at case {} of {}",
            suite.name(),
            run.cursor + 1,
            run.len
        );
        suite.cases_mut()[run.cursor].reset();

        true
    }

    /// Offer the registered suites to the operator.
    pub fn show_menu(&mut self) {
        self.observer.on_menu(&self.suites);
    }

    /// Reset the case at the cursor and tell the observer about it.
    fn present(&mut self) {
        let Some(run) = &self.run else {
            return;
        };

        let case = &mut self.suites[run.suite].cases_mut()[run.cursor];
        let remaining = case.reset();
        log::debug!(
            "Presenting case {} ({} of {})",
            case.id(),
            run.cursor + 1,
            run.len
        );

        self.observer.on_present(case, run.cursor, run.len);
        self.observer.on_display_update(case.id(), remaining);
    }
}

fn presented_case<'a>(
    suites: &'a mut [TestSuite],
    run: Option<&ActiveRun>,
    case_id: &CaseId,
) -> Result<&'a mut TimedCase, TrialError> {
    let run = run.ok_or(TrialError::NoActiveRun)?;
    let case = &mut suites[run.suite].cases_mut()[run.cursor];

    if case.id() != case_id {
        return Err(TrialError::NotPresented {
            case_id: case_id.clone(),
            current: case.id().clone(),
        });
    }

    Ok(case)
}
