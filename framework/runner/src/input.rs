use std::io::BufRead;

use anyhow::Context;
use tokio::sync::mpsc::UnboundedSender;

/// A command typed by the operator, one per line.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum OperatorInput {
    /// Start, split or stop the presented case. An empty line, so the operator only presses Enter.
    Toggle,
    /// Put the presented case back to its initial state.
    Reset,
    /// Move on to the next case.
    Next,
    /// Abandon the active run and go back to suite selection.
    Menu,
    /// Start a run.
    ///
    /// Without a suite the last suite is run again. Without a count the count from the command
    /// line is used.
    #[display("Start")]
    Start {
        suite: Option<String>,
        count: Option<usize>,
    },
    /// End the session.
    Quit,
}

impl OperatorInput {
    pub const HELP: &'static str = "[Enter] start/stop  [r] reset  [n] next  [m] menu  [q] quit";
    pub const MENU_HELP: &'static str = "start [suite] [count]  [q] quit";

    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(command, rest)| (command, rest.trim()))
            .unwrap_or((line, ""));

        let input = match command.to_ascii_lowercase().as_str() {
            "start" => return Some(parse_start(rest)),
            "" | "s" => OperatorInput::Toggle,
            "r" | "reset" => OperatorInput::Reset,
            "n" | "next" => OperatorInput::Next,
            "m" | "menu" | "back" => OperatorInput::Menu,
            "q" | "quit" => OperatorInput::Quit,
            _ => return None,
        };

        rest.is_empty().then_some(input)
    }
}

/// `start`, `start <count>`, `start <suite>` or `start <suite> <count>`. Suite names may contain
/// spaces, so only a trailing number is taken as the count.
fn parse_start(args: &str) -> OperatorInput {
    if args.is_empty() {
        return OperatorInput::Start {
            suite: None,
            count: None,
        };
    }

    if let Ok(count) = args.parse() {
        return OperatorInput::Start {
            suite: None,
            count: Some(count),
        };
    }

    match args.rsplit_once(char::is_whitespace) {
        Some((suite, count)) if count.parse::<usize>().is_ok() => OperatorInput::Start {
            suite: Some(suite.trim().to_string()),
            count: count.parse().ok(),
        },
        _ => OperatorInput::Start {
            suite: Some(args.to_string()),
            count: None,
        },
    }
}

/// Read operator commands from stdin on a dedicated thread and forward them as session events.
///
/// The thread ends when stdin closes, which is sent as a quit, or when the session stops listening.
pub(crate) fn start_operator_input<E>(sender: UnboundedSender<E>) -> anyhow::Result<()>
where
    E: From<OperatorInput> + Send + 'static,
{
    std::thread::Builder::new()
        .name("operator-input".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        log::error!("Failed to read operator input: {e:?}");
                        break;
                    }
                };

                let Some(input) = OperatorInput::parse(&line) else {
                    log::warn!("Unrecognised input [{}]. {}", line.trim(), OperatorInput::HELP);
                    continue;
                };

                if sender.send(input.into()).is_err() {
                    break;
                }
            }

            log::trace!("Operator input thread shutting down");
            let _ = sender.send(OperatorInput::Quit.into());
        })
        .context("Failed to start operator input thread")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(suite: Option<&str>, count: Option<usize>) -> Option<OperatorInput> {
        Some(OperatorInput::Start {
            suite: suite.map(str::to_string),
            count,
        })
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Some(OperatorInput::Toggle), OperatorInput::parse(""));
        assert_eq!(Some(OperatorInput::Toggle), OperatorInput::parse("   \n"));
        assert_eq!(Some(OperatorInput::Reset), OperatorInput::parse("R"));
        assert_eq!(Some(OperatorInput::Next), OperatorInput::parse("next"));
        assert_eq!(Some(OperatorInput::Menu), OperatorInput::parse("back"));
        assert_eq!(Some(OperatorInput::Quit), OperatorInput::parse(" q "));
        assert_eq!(None, OperatorInput::parse("go"));
        assert_eq!(None, OperatorInput::parse("next please"));
    }

    #[test]
    fn parses_start_arguments() {
        assert_eq!(start(None, None), OperatorInput::parse("start"));
        assert_eq!(start(None, Some(3)), OperatorInput::parse("start 3"));
        assert_eq!(
            start(Some("Sample Quiz"), None),
            OperatorInput::parse("start Sample Quiz")
        );
        assert_eq!(
            start(Some("Sample Quiz"), Some(5)),
            OperatorInput::parse("Start  Sample Quiz 5 ")
        );
    }
}
