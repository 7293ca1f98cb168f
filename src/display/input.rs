use thiserror::Error;

use crate::error::{EngineError, UnknownMode};
use crate::pomodoro::format::parse_clock;
use crate::pomodoro::{Command, Mode};

pub const HELP: &str = "\
Commands:
  start [MM:SS]   start or resume (optionally with a new duration)
  pause           pause the countdown
  reset           back to the configured duration
  mode <name>     switch to focus, short or long
  set <MM:SS>     change the selected mode's duration
  status          show the current state
  quit            leave";

/// One line typed at the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    /// Duration edit for whichever mode is selected when it is applied.
    SetSelected(u64),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("{0}")]
    Mode(#[from] UnknownMode),

    #[error(transparent)]
    Clock(#[from] EngineError),
}

pub fn parse_input(line: &str) -> Result<Option<Input>, InputError> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let input = match word.to_lowercase().as_str() {
        "start" | "s" => Input::Command(Command::Start {
            duration: arg.map(parse_clock).transpose()?,
        }),
        "pause" | "p" => Input::Command(Command::Pause),
        "reset" | "r" => Input::Command(Command::Reset),
        "mode" | "m" => {
            let mode = arg.ok_or(InputError::MissingArgument("mode"))?.parse::<Mode>()?;
            Input::Command(Command::SelectMode { mode })
        }
        "set" => Input::SetSelected(parse_clock(arg.ok_or(InputError::MissingArgument("set"))?)?),
        "status" => Input::Status,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => return Err(InputError::Unknown(other.to_string())),
    };
    Ok(Some(input))
}
