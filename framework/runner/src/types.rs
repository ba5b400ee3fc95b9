/// Result type for a trial binary's `main`.
///
/// [crate::run::run] returns it, so a trial can use `?` on the run and on its own setup, such as
/// loading a suite file, and return whatever fails.
pub type TimedTrialResult<T> = anyhow::Result<T>;
