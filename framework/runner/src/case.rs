use std::time::Duration;

use timed_trial_core::prelude::{CaseId, Tick, TickSource, TickerHandle};
use timed_trial_summary_model::ResultRecord;
use tokio::time::Instant;

use crate::definition::{CaseDefinition, CaseKind};
use crate::error::TrialError;
use crate::policy::{CasePolicy, PolicyOutcome, RunningToggle};

/// The externally visible state of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum CaseState {
    Idle,
    Running,
    Stopped,
}

/// The result of a trigger that was accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The case went from idle to running.
    Started,
    /// A phase of a multi-trigger case ended and the case is still running.
    Split { phase: usize, at: Duration },
    /// The case finished and produced its result.
    Stopped(ResultRecord),
}

/// Lifecycle data that only exists in some states.
///
/// The ticker handle lives in the running state, so leaving that state always detaches it.
#[derive(Debug)]
enum Lifecycle {
    Idle,
    Running {
        started_at: Instant,
        ticker: TickerHandle,
    },
    Stopped {
        elapsed: Duration,
    },
}

/// One test case and its timing state machine.
///
/// Cases are reusable: presenting a case resets it, so the same value can be run any number of
/// times across runs.
#[derive(Debug)]
pub struct TimedCase {
    id: CaseId,
    images: Vec<String>,
    countdown_s: u64,
    remaining: i64,
    splits: Vec<Duration>,
    policy: CasePolicy,
    lifecycle: Lifecycle,
    /// Incremented each time the case starts, so ticks from an earlier activation can be told apart
    activation: u64,
}

impl TimedCase {
    pub fn new(id: CaseId, images: Vec<String>, countdown_s: u64, policy: CasePolicy) -> Self {
        Self {
            id,
            images,
            countdown_s,
            remaining: countdown_s as i64,
            splits: Vec::new(),
            policy,
            lifecycle: Lifecycle::Idle,
            activation: 0,
        }
    }

    pub fn id(&self) -> &CaseId {
        &self.id
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// The configured countdown. This is only displayed, the case keeps running after it reaches 0.
    pub fn countdown_s(&self) -> u64 {
        self.countdown_s
    }

    /// Seconds left on the countdown. Goes negative once the countdown is overrun.
    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    pub fn policy(&self) -> &CasePolicy {
        &self.policy
    }

    pub fn splits(&self) -> &[Duration] {
        &self.splits
    }

    pub fn state(&self) -> CaseState {
        match self.lifecycle {
            Lifecycle::Idle => CaseState::Idle,
            Lifecycle::Running { .. } => CaseState::Running,
            Lifecycle::Stopped { .. } => CaseState::Stopped,
        }
    }

    pub fn started_at(&self) -> Option<Instant> {
        match &self.lifecycle {
            Lifecycle::Running { started_at, .. } => Some(*started_at),
            _ => None,
        }
    }

    /// Total time from start to stop, once the case has stopped.
    pub fn elapsed(&self) -> Option<Duration> {
        match self.lifecycle {
            Lifecycle::Stopped { elapsed } => Some(elapsed),
            _ => None,
        }
    }

    pub fn is_ticking(&self) -> bool {
        matches!(&self.lifecycle, Lifecycle::Running { ticker, .. } if ticker.is_attached())
    }

    /// Handle the operator trigger.
    ///
    /// Starts an idle case, or lets the policy decide what a trigger means for a running case. A
    /// stopped case ignores the trigger and reports [TrialError::CaseStopped].
    pub fn toggle(
        &mut self,
        now: Instant,
        ticker: &dyn TickSource,
    ) -> Result<Transition, TrialError> {
        let started_at = match &self.lifecycle {
            Lifecycle::Idle => {
                self.activation += 1;
                self.splits.clear();
                self.policy.reset();
                self.lifecycle = Lifecycle::Running {
                    started_at: now,
                    ticker: ticker.attach(self.id.clone(), self.activation),
                };
                log::debug!("Case {} started", self.id);
                return Ok(Transition::Started);
            }
            Lifecycle::Running { started_at, .. } => *started_at,
            Lifecycle::Stopped { .. } => return Err(TrialError::CaseStopped(self.id.clone())),
        };

        let outcome = self.policy.on_toggle_while_running(RunningToggle {
            case_id: &self.id,
            started_at,
            now,
            splits: &mut self.splits,
        });

        match outcome {
            PolicyOutcome::StayRunning { phase, at } => {
                log::debug!("Case {} ended phase {phase} at {:.2}s", self.id, at.as_secs_f64());
                Ok(Transition::Split { phase, at })
            }
            PolicyOutcome::Stop(record) => {
                self.detach_ticker();
                self.lifecycle = Lifecycle::Stopped {
                    elapsed: record.elapsed(),
                };
                log::debug!(
                    "Case {} stopped after {:.2}s",
                    self.id,
                    record.elapsed().as_secs_f64()
                );
                Ok(Transition::Stopped(record))
            }
        }
    }

    /// Apply a countdown tick.
    ///
    /// Returns the new remaining value, or `None` if the tick does not belong to the current
    /// activation of this case, which includes every tick that arrives after the case stopped.
    pub fn tick(&mut self, tick: &Tick) -> Option<i64> {
        match &self.lifecycle {
            Lifecycle::Running { ticker, .. }
                if tick.case_id == self.id && tick.activation == ticker.activation() =>
            {
                self.remaining -= 1;
                Some(self.remaining)
            }
            _ => {
                log::trace!(
                    "Discarding tick for case {} activation {}",
                    tick.case_id,
                    tick.activation
                );
                None
            }
        }
    }

    /// Return the case to idle, from any state. Returns the restored countdown.
    pub fn reset(&mut self) -> i64 {
        self.detach_ticker();
        self.lifecycle = Lifecycle::Idle;
        self.remaining = self.countdown_s as i64;
        self.splits.clear();
        self.policy.reset();
        self.remaining
    }

    fn detach_ticker(&mut self) {
        if let Lifecycle::Running { ticker, .. } = &mut self.lifecycle {
            ticker.detach();
        }
    }
}

impl From<CaseDefinition> for TimedCase {
    fn from(definition: CaseDefinition) -> Self {
        let policy = match definition.kind {
            CaseKind::Single { alert_s } => CasePolicy::single(alert_s),
            CaseKind::Multi {
                overall_s,
                phases_s,
            } => CasePolicy::multi(overall_s, phases_s),
        };

        TimedCase::new(definition.id, definition.images, definition.countdown_s, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timed_trial_core::prelude::ManualTicker;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn single_case() -> TimedCase {
        TimedCase::new(CaseId::from("1"), vec![], 30, CasePolicy::single(5))
    }

    fn triple_case() -> TimedCase {
        TimedCase::new(CaseId::from("6"), vec![], 60, CasePolicy::multi(60, vec![18, 21, 21]))
    }

    fn tick_for(case: &TimedCase, activation: u64) -> Tick {
        Tick {
            case_id: case.id().clone(),
            activation,
        }
    }

    #[test]
    fn single_case_starts_then_stops() {
        let ticker = ManualTicker::new();
        let mut case = single_case();
        let start = Instant::now();

        assert_eq!(Transition::Started, case.toggle(start, &ticker).unwrap());
        assert_eq!(CaseState::Running, case.state());
        assert_eq!(Some(start), case.started_at());
        assert!(case.is_ticking());
        assert_eq!(1, ticker.attached_count());

        let Transition::Stopped(record) = case.toggle(start + secs(7), &ticker).unwrap() else {
            panic!("Expected the second toggle to stop a single-trigger case");
        };
        assert_eq!(secs(7), record.elapsed());
        assert_eq!(CaseState::Stopped, case.state());
        assert_eq!(Some(secs(7)), case.elapsed());
        assert_eq!(None, case.started_at());
        assert_eq!(0, ticker.attached_count());
    }

    #[test]
    fn toggle_on_stopped_case_is_rejected() {
        let ticker = ManualTicker::new();
        let mut case = single_case();
        let start = Instant::now();
        case.toggle(start, &ticker).unwrap();
        case.toggle(start + secs(1), &ticker).unwrap();

        let err = case.toggle(start + secs(2), &ticker).unwrap_err();

        assert_eq!(TrialError::CaseStopped(CaseId::from("1")), err);
        assert_eq!(CaseState::Stopped, case.state());
        assert_eq!(Some(secs(1)), case.elapsed());
        assert_eq!(0, ticker.attached_count());
    }

    #[test]
    fn triple_case_runs_until_fourth_toggle() {
        let ticker = ManualTicker::new();
        let mut case = triple_case();
        let start = Instant::now();

        case.toggle(start, &ticker).unwrap();
        for (phase, at) in [(1, 3), (2, 10)] {
            assert_eq!(
                Transition::Split { phase, at: secs(at) },
                case.toggle(start + secs(at), &ticker).unwrap()
            );
            assert_eq!(CaseState::Running, case.state());
        }

        let Transition::Stopped(record) = case.toggle(start + secs(15), &ticker).unwrap() else {
            panic!("Expected the fourth toggle to stop a triple case");
        };
        assert_eq!(&[secs(3), secs(10), secs(15)], case.splits());
        assert_eq!(case.splits(), record.splits());
        assert_eq!(secs(15), record.elapsed());
        assert_eq!(0, ticker.attached_count());
    }

    #[test]
    fn ticks_decrement_past_zero() {
        let ticker = ManualTicker::new();
        let mut case = TimedCase::new(CaseId::from("1"), vec![], 2, CasePolicy::single(5));
        case.toggle(Instant::now(), &ticker).unwrap();
        let tick = tick_for(&case, 1);

        assert_eq!(Some(1), case.tick(&tick));
        assert_eq!(Some(0), case.tick(&tick));
        assert_eq!(Some(-1), case.tick(&tick));
        assert_eq!(-1, case.remaining());
    }

    #[test]
    fn ticks_are_ignored_unless_running() {
        let ticker = ManualTicker::new();
        let mut case = single_case();
        let start = Instant::now();

        assert_eq!(None, case.tick(&tick_for(&case, 0)));

        case.toggle(start, &ticker).unwrap();
        let tick = tick_for(&case, 1);
        case.tick(&tick);
        case.toggle(start + secs(1), &ticker).unwrap();

        assert_eq!(None, case.tick(&tick));
        assert_eq!(29, case.remaining());
    }

    #[test]
    fn ticks_from_an_earlier_activation_are_ignored() {
        let ticker = ManualTicker::new();
        let mut case = single_case();

        case.toggle(Instant::now(), &ticker).unwrap();
        let stale = tick_for(&case, 1);
        case.reset();
        case.toggle(Instant::now(), &ticker).unwrap();

        assert_eq!(None, case.tick(&stale));
        assert_eq!(Some(29), case.tick(&tick_for(&case, 2)));
    }

    #[test]
    fn ticks_for_another_case_are_ignored() {
        let ticker = ManualTicker::new();
        let mut case = single_case();
        case.toggle(Instant::now(), &ticker).unwrap();

        let other = Tick {
            case_id: CaseId::from("2"),
            activation: 1,
        };
        assert_eq!(None, case.tick(&other));
        assert_eq!(30, case.remaining());
    }

    #[test]
    fn reset_is_idempotent_in_every_state() {
        let ticker = ManualTicker::new();
        let start = Instant::now();

        let mut idle = triple_case();
        let mut running = triple_case();
        running.toggle(start, &ticker).unwrap();
        running.toggle(start + secs(2), &ticker).unwrap();
        running.tick(&tick_for(&running, 1));
        let mut stopped = single_case();
        stopped.toggle(start, &ticker).unwrap();
        stopped.toggle(start + secs(4), &ticker).unwrap();

        for case in [&mut idle, &mut running, &mut stopped] {
            for _ in 0..3 {
                assert_eq!(case.countdown_s() as i64, case.reset());
                assert_eq!(CaseState::Idle, case.state());
                assert_eq!(case.countdown_s() as i64, case.remaining());
                assert!(case.splits().is_empty());
                assert_eq!(None, case.elapsed());
                assert_eq!(None, case.started_at());
            }
        }
        assert_eq!(0, ticker.attached_count());
    }

    #[test]
    fn reset_case_can_run_again() {
        let ticker = ManualTicker::new();
        let mut case = triple_case();
        let start = Instant::now();

        case.toggle(start, &ticker).unwrap();
        case.toggle(start + secs(1), &ticker).unwrap();
        case.toggle(start + secs(2), &ticker).unwrap();
        case.reset();

        let restart = start + secs(10);
        case.toggle(restart, &ticker).unwrap();
        assert_eq!(
            Transition::Split {
                phase: 1,
                at: secs(4)
            },
            case.toggle(restart + secs(4), &ticker).unwrap()
        );
        assert_eq!(&[secs(4)], case.splits());
    }

    #[test]
    fn built_from_definition() {
        let case = TimedCase::from(CaseDefinition::triple("6", ["assets/image7.png"]));

        assert_eq!(&CaseId::from("6"), case.id());
        assert_eq!(60, case.countdown_s());
        assert_eq!(3, case.policy().triggers_to_stop());
        assert_eq!(&["assets/image7.png".to_string()], case.images());
    }
}
