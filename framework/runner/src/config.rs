//! Suite definitions loaded from a TOML file.
//!
//! ```toml
//! [[suite]]
//! name = "Sample Quiz"
//!
//! [[suite.case]]
//! id = 1
//! images = ["assets/image1.png", "assets/image2.png"]
//! countdown = 30
//! alert = 5
//!
//! [[suite.case]]
//! id = 6
//! images = ["assets/image7.png"]
//! countdown = 120
//! # overall, then one budget per phase
//! alerts = [100, 3, 3, 4]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use timed_trial_core::prelude::CaseId;

use crate::definition::{
    CaseDefinition, CaseKind, SuiteDefinition, DEFAULT_MULTI_COUNTDOWN_S,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read suite file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse suite file")]
    Parse(#[from] toml::de::Error),
    #[error("Case [{case_id}] in suite [{suite}] needs either `alert` or `alerts`")]
    MissingThreshold { suite: String, case_id: CaseId },
    #[error("Case [{case_id}] in suite [{suite}] sets both `alert` and `alerts`")]
    ConflictingThresholds { suite: String, case_id: CaseId },
    #[error("Case [{case_id}] in suite [{suite}] has no `countdown`")]
    MissingCountdown { suite: String, case_id: CaseId },
    #[error("Case [{case_id}] in suite [{suite}] needs an overall and a phase budget in `alerts`")]
    NoPhases { suite: String, case_id: CaseId },
    #[error("Case [{case_id}] is defined more than once in suite [{suite}]")]
    DuplicateCaseId { suite: String, case_id: CaseId },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteFile {
    #[serde(default, rename = "suite")]
    suites: Vec<SuiteEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteEntry {
    name: String,
    #[serde(default, rename = "case")]
    cases: Vec<CaseEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseEntry {
    id: RawCaseId,
    #[serde(default)]
    images: Vec<String>,
    countdown: Option<u64>,
    alert: Option<u64>,
    alerts: Option<Vec<u64>>,
}

/// Case ids can be written as numbers or strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCaseId {
    Number(i64),
    Text(String),
}

impl From<RawCaseId> for CaseId {
    fn from(value: RawCaseId) -> Self {
        match value {
            RawCaseId::Number(n) => CaseId::new(n.to_string()),
            RawCaseId::Text(s) => CaseId::new(s),
        }
    }
}

/// Load every suite defined in a TOML file.
pub fn load_suite_file(path: &Path) -> Result<Vec<SuiteDefinition>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_suites(&text)
}

/// Parse suites from TOML text.
pub fn parse_suites(text: &str) -> Result<Vec<SuiteDefinition>, ConfigError> {
    let file: SuiteFile = toml::from_str(text)?;

    file.suites
        .into_iter()
        .map(|suite| {
            let cases = suite
                .cases
                .into_iter()
                .map(|case| case_definition(&suite.name, case))
                .collect::<Result<Vec<_>, _>>()?;

            let definition = SuiteDefinition {
                name: suite.name,
                cases,
            };
            definition.validate()?;
            Ok(definition)
        })
        .collect()
}

fn case_definition(suite: &str, case: CaseEntry) -> Result<CaseDefinition, ConfigError> {
    let id = CaseId::from(case.id);

    let (kind, default_countdown) = match (case.alert, case.alerts) {
        (Some(alert_s), None) => (CaseKind::Single { alert_s }, None),
        (None, Some(alerts)) => match alerts.split_first() {
            Some((overall_s, phases_s)) if !phases_s.is_empty() => (
                CaseKind::Multi {
                    overall_s: *overall_s,
                    phases_s: phases_s.to_vec(),
                },
                Some(DEFAULT_MULTI_COUNTDOWN_S),
            ),
            _ => {
                return Err(ConfigError::NoPhases {
                    suite: suite.to_string(),
                    case_id: id,
                })
            }
        },
        (Some(_), Some(_)) => {
            return Err(ConfigError::ConflictingThresholds {
                suite: suite.to_string(),
                case_id: id,
            })
        }
        (None, None) => {
            return Err(ConfigError::MissingThreshold {
                suite: suite.to_string(),
                case_id: id,
            })
        }
    };

    let countdown_s = case
        .countdown
        .or(default_countdown)
        .ok_or_else(|| ConfigError::MissingCountdown {
            suite: suite.to_string(),
            case_id: id.clone(),
        })?;

    Ok(CaseDefinition {
        id,
        images: case.images,
        countdown_s,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_single_and_multi_cases() {
        let suites = parse_suites(
            r#"
[[suite]]
name = "Sample Quiz"

[[suite.case]]
id = 1
images = ["assets/image1.png", "assets/image2.png"]
countdown = 30
alert = 5

[[suite]]
name = "Triple Countdown Test"

[[suite.case]]
id = "six"
alerts = [100, 3, 3, 4]
"#,
        )
        .unwrap();

        assert_eq!(
            vec![
                SuiteDefinition::new("Sample Quiz").with_case(CaseDefinition::single(
                    "1",
                    ["assets/image1.png", "assets/image2.png"],
                    30,
                    5
                )),
                SuiteDefinition::new("Triple Countdown Test").with_case(CaseDefinition::multi(
                    "six",
                    Vec::<String>::new(),
                    60,
                    100,
                    vec![3, 3, 4]
                )),
            ],
            suites
        );
    }

    #[test]
    fn suite_without_cases_is_allowed() {
        let suites = parse_suites("[[suite]]\nname = \"Empty\"\n").unwrap();
        assert!(suites[0].cases.is_empty());
    }

    #[test]
    fn single_case_needs_a_countdown() {
        let err = parse_suites(
            "[[suite]]\nname = \"S\"\n[[suite.case]]\nid = 1\nalert = 5\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCountdown { .. }));
    }

    #[test]
    fn thresholds_must_be_set_once() {
        let err = parse_suites(
            "[[suite]]\nname = \"S\"\n[[suite.case]]\nid = 1\ncountdown = 5\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingThreshold { .. }));

        let err = parse_suites(concat!(
            "[[suite]]\nname = \"S\"\n",
            "[[suite.case]]\nid = 1\ncountdown = 5\nalert = 1\nalerts = [1, 1]\n",
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingThresholds { .. }));
    }

    #[test]
    fn multi_case_needs_a_phase() {
        let err = parse_suites("[[suite]]\nname = \"S\"\n[[suite.case]]\nid = 1\nalerts = [10]\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoPhases { .. }));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = parse_suites(concat!(
            "[[suite]]\nname = \"S\"\n",
            "[[suite.case]]\nid = 1\ncountdown = 5\nalert = 1\n",
            "[[suite.case]]\nid = \"1\"\ncountdown = 5\nalert = 1\n",
        ))
        .unwrap_err();
        assert_eq!(
            "Case [1] is defined more than once in suite [S]",
            err.to_string()
        );
    }

    #[test]
    fn unreadable_file_reports_path() {
        let err = load_suite_file(Path::new("/does/not/exist.toml")).unwrap_err();
        assert_eq!(
            "Failed to read suite file /does/not/exist.toml",
            err.to_string()
        );
    }
}
