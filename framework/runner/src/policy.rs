use std::time::Duration;

use timed_trial_core::prelude::CaseId;
use timed_trial_summary_model::ResultRecord;
use tokio::time::Instant;

/// Decides what a trigger does to a running case.
///
/// This is the only part of a case's behaviour that depends on the kind of case. The state machine
/// in [crate::case::TimedCase] is written once against [CasePolicy::on_toggle_while_running].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasePolicy {
    /// One trigger to start, one to stop.
    Single { alert_s: u64 },
    /// One trigger to start, then one trigger per phase. The trigger that ends the last phase
    /// stops the case.
    Multi {
        overall_s: u64,
        phases_s: Vec<u64>,
        /// Triggers received since the case started
        toggles: usize,
    },
}

/// What the policy decided for a trigger received while running.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyOutcome {
    /// A phase ended but the case keeps running. `phase` counts from 1.
    StayRunning { phase: usize, at: Duration },
    /// The case is finished, with its result.
    Stop(ResultRecord),
}

/// The running case, as seen by the policy for a single trigger.
pub(crate) struct RunningToggle<'a> {
    pub case_id: &'a CaseId,
    pub started_at: Instant,
    pub now: Instant,
    pub splits: &'a mut Vec<Duration>,
}

impl RunningToggle<'_> {
    fn elapsed(&self) -> Duration {
        self.now.saturating_duration_since(self.started_at)
    }
}

impl CasePolicy {
    pub fn single(alert_s: u64) -> Self {
        CasePolicy::Single { alert_s }
    }

    /// A multi-trigger policy with one phase per entry in `phases_s`.
    pub fn multi(overall_s: u64, phases_s: Vec<u64>) -> Self {
        CasePolicy::Multi {
            overall_s,
            phases_s,
            toggles: 0,
        }
    }

    /// The number of triggers after the start that it takes to stop the case.
    pub fn triggers_to_stop(&self) -> usize {
        match self {
            CasePolicy::Single { .. } => 1,
            CasePolicy::Multi { phases_s, .. } => phases_s.len().max(1),
        }
    }

    pub(crate) fn reset(&mut self) {
        if let CasePolicy::Multi { toggles, .. } = self {
            *toggles = 0;
        }
    }

    pub(crate) fn on_toggle_while_running(&mut self, toggle: RunningToggle<'_>) -> PolicyOutcome {
        let triggers_to_stop = self.triggers_to_stop();
        let elapsed = toggle.elapsed();

        match self {
            CasePolicy::Single { alert_s } => {
                PolicyOutcome::Stop(ResultRecord::single(toggle.case_id.clone(), elapsed, *alert_s))
            }
            CasePolicy::Multi {
                overall_s,
                phases_s,
                toggles,
            } => {
                toggle.splits.push(elapsed);
                *toggles += 1;

                if *toggles < triggers_to_stop {
                    return PolicyOutcome::StayRunning {
                        phase: *toggles,
                        at: elapsed,
                    };
                }

                PolicyOutcome::Stop(ResultRecord::phased(
                    toggle.case_id.clone(),
                    elapsed,
                    toggle.splits.clone(),
                    *overall_s,
                    phases_s.clone(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timed_trial_summary_model::Thresholds;

    fn toggle_at<'a>(
        case_id: &'a CaseId,
        started_at: Instant,
        secs: u64,
        splits: &'a mut Vec<Duration>,
    ) -> RunningToggle<'a> {
        RunningToggle {
            case_id,
            started_at,
            now: started_at + Duration::from_secs(secs),
            splits,
        }
    }

    #[test]
    fn single_stops_on_first_toggle() {
        let case_id = CaseId::from("1");
        let start = Instant::now();
        let mut splits = Vec::new();
        let mut policy = CasePolicy::single(5);

        let outcome = policy.on_toggle_while_running(toggle_at(&case_id, start, 7, &mut splits));

        assert_eq!(
            PolicyOutcome::Stop(ResultRecord::single(case_id, Duration::from_secs(7), 5)),
            outcome
        );
        assert!(splits.is_empty());
    }

    #[test]
    fn multi_stops_after_each_phase_has_ended() {
        let case_id = CaseId::from("6");
        let start = Instant::now();
        let mut splits = Vec::new();
        let mut policy = CasePolicy::multi(60, vec![18, 21, 21]);

        for (phase, secs) in [(1, 3), (2, 10)] {
            let outcome =
                policy.on_toggle_while_running(toggle_at(&case_id, start, secs, &mut splits));
            assert_eq!(
                PolicyOutcome::StayRunning {
                    phase,
                    at: Duration::from_secs(secs)
                },
                outcome
            );
        }

        let outcome = policy.on_toggle_while_running(toggle_at(&case_id, start, 15, &mut splits));
        let PolicyOutcome::Stop(record) = outcome else {
            panic!("Expected the third phase trigger to stop the case");
        };
        assert_eq!(Duration::from_secs(15), record.elapsed());
        assert_eq!(
            &[
                Duration::from_secs(3),
                Duration::from_secs(10),
                Duration::from_secs(15)
            ],
            record.splits()
        );
        assert_eq!(
            &Thresholds::Phased {
                overall_s: 60,
                phases_s: vec![18, 21, 21]
            },
            record.thresholds()
        );
    }

    #[test]
    fn five_phase_shape_needs_five_triggers() {
        let case_id = CaseId::from("five");
        let start = Instant::now();
        let mut splits = Vec::new();
        let mut policy = CasePolicy::multi(100, vec![20; 5]);
        assert_eq!(5, policy.triggers_to_stop());

        for secs in 1..5 {
            let outcome =
                policy.on_toggle_while_running(toggle_at(&case_id, start, secs, &mut splits));
            assert!(matches!(outcome, PolicyOutcome::StayRunning { .. }));
        }
        let outcome = policy.on_toggle_while_running(toggle_at(&case_id, start, 5, &mut splits));
        assert!(matches!(outcome, PolicyOutcome::Stop(_)));
    }

    #[test]
    fn reset_restarts_the_trigger_count() {
        let case_id = CaseId::from("6");
        let start = Instant::now();
        let mut splits = Vec::new();
        let mut policy = CasePolicy::multi(60, vec![18, 21, 21]);

        policy.on_toggle_while_running(toggle_at(&case_id, start, 1, &mut splits));
        policy.on_toggle_while_running(toggle_at(&case_id, start, 2, &mut splits));
        policy.reset();
        splits.clear();

        let outcome = policy.on_toggle_while_running(toggle_at(&case_id, start, 3, &mut splits));
        assert_eq!(
            PolicyOutcome::StayRunning {
                phase: 1,
                at: Duration::from_secs(3)
            },
            outcome
        );
    }
}
