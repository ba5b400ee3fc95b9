use crate::cli::TimedTrialCli;
use clap::Parser;

/// Start logging and parse the trial command line.
///
/// Operator feedback, such as a trigger that has no case to act on, is logged as a warning, so
/// logging is shown from `warn` up unless `RUST_LOG` says otherwise.
pub fn init() -> TimedTrialCli {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = TimedTrialCli::parse();
    log::debug!(
        "Running {} cases per run, summaries to {:?}",
        cli.count,
        cli.summary_path
    );
    cli
}
