use std::path::PathBuf;

use clap::Parser;

/// The largest number of cases an operator can select for one run.
pub const MAX_CASE_COUNT: usize = 10;

#[derive(Parser, Debug, Clone)]
#[command(about, long_about = None)]
pub struct TimedTrialCli {
    /// The number of test cases to run from the selected suite
    ///
    /// Suites with fewer cases run all of their cases.
    #[clap(
        short,
        long,
        default_value = "1",
        value_parser = clap::value_parser!(u64).range(1..=MAX_CASE_COUNT as u64)
    )]
    pub count: u64,

    /// The name of the suite to run. Defaults to the first suite that is defined.
    #[clap(short, long)]
    pub suite: Option<String>,

    /// Load suite definitions from a TOML file instead of using the built-in suites.
    #[clap(long)]
    pub suite_file: Option<PathBuf>,

    /// Append the run summary to this file as a line of JSON.
    ///
    /// Can also be set with the `RUN_SUMMARY_PATH` environment variable.
    #[clap(long, env = "RUN_SUMMARY_PATH")]
    pub summary_path: Option<PathBuf>,

    /// Do not show a live countdown bar on the CLI, print plain lines instead.
    ///
    /// This is recommended when the output is captured rather than watched.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = TimedTrialCli::try_parse_from(["timed-trial"]).unwrap();
        assert_eq!(1, cli.count);
        assert_eq!(None, cli.suite);
        assert!(!cli.no_progress);
    }

    #[test]
    fn count_is_bounded() {
        assert!(TimedTrialCli::try_parse_from(["timed-trial", "--count", "10"]).is_ok());
        assert!(TimedTrialCli::try_parse_from(["timed-trial", "--count", "0"]).is_err());
        assert!(TimedTrialCli::try_parse_from(["timed-trial", "--count", "11"]).is_err());
    }
}
