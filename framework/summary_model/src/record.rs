use std::time::Duration;

use serde::{Deserialize, Serialize};
use timed_trial_core::prelude::CaseId;

/// Alert thresholds for a case, in whole seconds.
///
/// These are only used when summarising results to flag cases that went over budget. They never
/// affect how a case runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Thresholds {
    /// A single budget for a case that is started and stopped once.
    Single { alert_s: u64 },
    /// An overall budget plus one budget per phase of a multi-trigger case.
    ///
    /// Each phase budget is compared with how long that phase took on its own, not with the time
    /// since the case started.
    Phased { overall_s: u64, phases_s: Vec<u64> },
}

impl Thresholds {
    /// The budget for the whole case.
    pub fn overall_s(&self) -> u64 {
        match self {
            Thresholds::Single { alert_s } => *alert_s,
            Thresholds::Phased { overall_s, .. } => *overall_s,
        }
    }

    /// Per-phase budgets, empty for a single-trigger case.
    pub fn phases_s(&self) -> &[u64] {
        match self {
            Thresholds::Single { .. } => &[],
            Thresholds::Phased { phases_s, .. } => phases_s,
        }
    }
}

/// The result of one completed test case.
///
/// Created exactly once, when the case stops, and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    case_id: CaseId,
    #[serde(with = "seconds")]
    elapsed: Duration,
    thresholds: Thresholds,
    /// Time since the start of the case at each intermediate trigger
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "seconds_list")]
    splits: Vec<Duration>,
}

impl ResultRecord {
    pub fn single(case_id: CaseId, elapsed: Duration, alert_s: u64) -> Self {
        Self {
            case_id,
            elapsed,
            thresholds: Thresholds::Single { alert_s },
            splits: Vec::with_capacity(0),
        }
    }

    pub fn phased(
        case_id: CaseId,
        elapsed: Duration,
        splits: Vec<Duration>,
        overall_s: u64,
        phases_s: Vec<u64>,
    ) -> Self {
        Self {
            case_id,
            elapsed,
            thresholds: Thresholds::Phased {
                overall_s,
                phases_s,
            },
            splits,
        }
    }

    pub fn case_id(&self) -> &CaseId {
        &self.case_id
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn splits(&self) -> &[Duration] {
        &self.splits
    }

    pub fn is_phased(&self) -> bool {
        matches!(self.thresholds, Thresholds::Phased { .. })
    }

    /// Whether the case took longer than its overall budget.
    pub fn is_over_budget(&self) -> bool {
        exceeds(self.elapsed, self.thresholds.overall_s())
    }

    /// The duration of each phase, taken from the gaps between consecutive splits.
    pub fn phase_durations(&self) -> Vec<Duration> {
        let mut previous = Duration::ZERO;
        self.splits
            .iter()
            .map(|split| {
                let phase = split.saturating_sub(previous);
                previous = *split;
                phase
            })
            .collect()
    }

    /// One flag per phase, set when that phase took longer than its budget.
    ///
    /// Phases without a configured budget are never flagged.
    pub fn phase_overruns(&self) -> Vec<bool> {
        let budgets = self.thresholds.phases_s();
        self.phase_durations()
            .into_iter()
            .enumerate()
            .map(|(i, phase)| budgets.get(i).is_some_and(|budget| exceeds(phase, *budget)))
            .collect()
    }
}

fn exceeds(duration: Duration, budget_s: u64) -> bool {
    duration > Duration::from_secs(budget_s)
}

mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

mod seconds_list {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &[Duration], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(value.iter().map(Duration::as_secs_f64))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Duration>, D::Error> {
        Vec::<f64>::deserialize(deserializer)?
            .into_iter()
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
            .collect()
    }
}
