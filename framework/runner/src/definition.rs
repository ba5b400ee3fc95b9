use std::collections::HashSet;

use anyhow::Context;
use timed_trial_core::prelude::CaseId;

use crate::case::TimedCase;
use crate::cli::TimedTrialCli;
use crate::config::{load_suite_file, ConfigError};

/// Countdown for a multi-trigger case that does not set one.
pub const DEFAULT_MULTI_COUNTDOWN_S: u64 = 60;
/// Overall budget for a multi-trigger case that does not set one.
pub const DEFAULT_MULTI_OVERALL_S: u64 = 60;
/// Phase budgets for a multi-trigger case that does not set them.
pub const DEFAULT_MULTI_PHASES_S: [u64; 3] = [18, 21, 21];

/// The kind of case and its alert thresholds, in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseKind {
    Single { alert_s: u64 },
    Multi { overall_s: u64, phases_s: Vec<u64> },
}

/// Configuration for one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseDefinition {
    pub id: CaseId,
    /// Reference material shown to the operator while the case is presented
    pub images: Vec<String>,
    pub countdown_s: u64,
    pub kind: CaseKind,
}

impl CaseDefinition {
    /// A case that is started and stopped with one trigger each.
    pub fn single(
        id: impl Into<CaseId>,
        images: impl IntoIterator<Item = impl Into<String>>,
        countdown_s: u64,
        alert_s: u64,
    ) -> Self {
        Self {
            id: id.into(),
            images: images.into_iter().map(Into::into).collect(),
            countdown_s,
            kind: CaseKind::Single { alert_s },
        }
    }

    /// A case with one phase per entry in `phases_s`, each ended by a trigger.
    pub fn multi(
        id: impl Into<CaseId>,
        images: impl IntoIterator<Item = impl Into<String>>,
        countdown_s: u64,
        overall_s: u64,
        phases_s: Vec<u64>,
    ) -> Self {
        Self {
            id: id.into(),
            images: images.into_iter().map(Into::into).collect(),
            countdown_s,
            kind: CaseKind::Multi {
                overall_s,
                phases_s,
            },
        }
    }

    /// A three phase case with the default countdown and budgets.
    pub fn triple(
        id: impl Into<CaseId>,
        images: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::multi(
            id,
            images,
            DEFAULT_MULTI_COUNTDOWN_S,
            DEFAULT_MULTI_OVERALL_S,
            DEFAULT_MULTI_PHASES_S.to_vec(),
        )
    }
}

/// A named, ordered list of cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteDefinition {
    pub name: String,
    pub cases: Vec<CaseDefinition>,
}

impl SuiteDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cases: Vec::new(),
        }
    }

    pub fn with_case(mut self, case: CaseDefinition) -> Self {
        self.cases.push(case);
        self
    }

    /// Check that case ids are unique and that every multi-trigger case has at least one phase.
    ///
    /// A suite without cases is valid here. Starting a run of it is what fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for case in &self.cases {
            if !seen.insert(&case.id) {
                return Err(ConfigError::DuplicateCaseId {
                    suite: self.name.clone(),
                    case_id: case.id.clone(),
                });
            }

            if let CaseKind::Multi { phases_s, .. } = &case.kind {
                if phases_s.is_empty() {
                    return Err(ConfigError::NoPhases {
                        suite: self.name.clone(),
                        case_id: case.id.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// The runtime form of a suite, holding the cases that get presented to the operator.
#[derive(Debug)]
pub struct TestSuite {
    name: String,
    cases: Vec<TimedCase>,
}

impl TestSuite {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cases(&self) -> &[TimedCase] {
        &self.cases
    }

    pub(crate) fn cases_mut(&mut self) -> &mut [TimedCase] {
        &mut self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

impl From<SuiteDefinition> for TestSuite {
    fn from(definition: SuiteDefinition) -> Self {
        Self {
            name: definition.name,
            cases: definition.cases.into_iter().map(TimedCase::from).collect(),
        }
    }
}

/// The builder for a timed trial.
///
/// This must be used in the `main` function of a trial binary to define the suites that the
/// operator can run.
pub struct SuiteDefinitionBuilder {
    /// The name of the trial.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    /// This value is initialised for you from the command line.
    #[doc(hidden)]
    cli: TimedTrialCli,
    /// The built-in suites, in the order they are offered.
    ///
    /// Replaced entirely when the operator passes a suite file on the command line.
    suites: Vec<SuiteDefinition>,
}

pub struct TrialDefinition {
    pub name: String,
    pub cli: TimedTrialCli,
    pub suites: Vec<SuiteDefinition>,
}

impl TrialDefinition {
    /// The suite the operator asked for, or the first suite if they did not ask.
    pub fn selected_suite(&self) -> anyhow::Result<&SuiteDefinition> {
        match &self.cli.suite {
            Some(name) => self
                .suites
                .iter()
                .find(|s| &s.name == name)
                .with_context(|| format!("Suite [{name}] is not defined")),
            None => self.suites.first().context("No suites are defined"),
        }
    }
}

impl SuiteDefinitionBuilder {
    /// Initialise logging and parse the command line, then create a builder.
    pub fn new_with_init(name: &str) -> Self {
        let cli = crate::init::init();
        Self::new(name, cli)
    }

    /// Create a builder from an already parsed command line.
    pub fn new(name: &str, cli: TimedTrialCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            suites: Vec::new(),
        }
    }

    /// Add a built-in suite.
    pub fn use_suite(mut self, suite: SuiteDefinition) -> Self {
        if self.suites.iter().any(|s| s.name == suite.name) {
            panic!("Suite [{}] is already defined", suite.name);
        }

        self.suites.push(suite);
        self
    }

    pub(crate) fn build(self) -> anyhow::Result<TrialDefinition> {
        let suites = match &self.cli.suite_file {
            Some(path) => {
                log::info!("Loading suites from {}", path.display());
                load_suite_file(path)?
            }
            None => self.suites,
        };

        let mut names = HashSet::new();
        for suite in &suites {
            if !names.insert(suite.name.as_str()) {
                anyhow::bail!("Suite [{}] is defined more than once", suite.name);
            }
            suite.validate()?;
        }

        Ok(TrialDefinition {
            name: self.name,
            cli: self.cli,
            suites,
        })
    }
}
