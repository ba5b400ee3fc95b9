mod case;
mod cli;
mod config;
mod definition;
mod error;
mod init;
mod input;
mod observer;
mod policy;
mod progress;
mod run;
mod sequencer;
mod types;

pub mod prelude {
    pub use crate::case::{CaseState, TimedCase, Transition};
    pub use crate::cli::{TimedTrialCli, MAX_CASE_COUNT};
    pub use crate::config::{load_suite_file, parse_suites, ConfigError};
    pub use crate::definition::{
        CaseDefinition, CaseKind, SuiteDefinition, SuiteDefinitionBuilder, TestSuite,
        TrialDefinition, DEFAULT_MULTI_COUNTDOWN_S, DEFAULT_MULTI_OVERALL_S,
        DEFAULT_MULTI_PHASES_S,
    };
    pub use crate::error::TrialError;
    pub use crate::init::init;
    pub use crate::input::OperatorInput;
    pub use crate::observer::{NoopObserver, RunObserver};
    pub use crate::policy::{CasePolicy, PolicyOutcome};
    pub use crate::run::{run, run_session, SessionEvent};
    pub use crate::sequencer::{clamp_case_count, Advance, RunOutcome, RunSequencer};
    pub use crate::types::TimedTrialResult;

    /// Re-export of the core prelude, for ticks and case ids.
    pub use timed_trial_core::prelude::*;

    /// Re-export of the summary model, for reading results.
    pub use timed_trial_summary_model::{ResultRecord, ResultTable, RunSummary, Thresholds};
}
