use timed_trial_core::prelude::CaseId;

/// Misuse of a case or of the run sequencer.
///
/// None of these are fatal. The caller decides whether to ignore them or show them to the operator.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrialError {
    /// The case has stopped and must be reset before it can be started again.
    #[error("Case [{0}] has already stopped")]
    CaseStopped(CaseId),
    /// A trigger arrived for a case other than the one being presented.
    #[error("Case [{case_id}] is not being presented, the current case is [{current}]")]
    NotPresented { case_id: CaseId, current: CaseId },
    #[error("No run is active")]
    NoActiveRun,
    #[error("Suite [{0}] has no test cases")]
    EmptySuite(String),
    #[error("Suite [{0}] is not registered")]
    UnknownSuite(String),
}

impl TrialError {
    /// Whether this error is a trigger that does not apply in the current state, as opposed to a
    /// run that could not be started.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            TrialError::CaseStopped(_) | TrialError::NotPresented { .. } | TrialError::NoActiveRun
        )
    }
}
