//! Operator commands
//!
//! Live setters and manual controls sent to the companion worker. Parsed
//! from one line of text each, e.g. `interval 30` or `profile 1234`.

use std::str::FromStr;

use thiserror::Error;

use crate::models::{DetectionMode, ProfileId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartTimer,
    PauseTimer,
    ResumeTimer,
    TogglePause,
    StopTimer,
    ResetTimer,
    SetInterval(u32),
    SetMode(DetectionMode),
    /// `None` clears the identifier
    SetProfileId(Option<ProfileId>),
    SetAutoStart(bool),
    StartDetection,
    StopDetection,
    ManualStart,
    ManualStop,
    Status,
    Stats,
    /// Clear the session log and the running totals
    ResetStats,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'{command}' expects {expected}")]
    BadArgument {
        command: String,
        expected: &'static str,
    },
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or(ParseCommandError::Empty)?.to_lowercase();
        let arg = parts.next();

        let bad = |expected: &'static str| ParseCommandError::BadArgument {
            command: name.clone(),
            expected,
        };

        let command = match name.as_str() {
            "start" => Command::StartTimer,
            "pause" => Command::PauseTimer,
            "resume" => Command::ResumeTimer,
            "toggle" => Command::TogglePause,
            "stop" => Command::StopTimer,
            "reset" => Command::ResetTimer,
            "interval" => Command::SetInterval(
                arg.and_then(|a| a.parse().ok())
                    .ok_or_else(|| bad("a number of seconds"))?,
            ),
            "mode" => Command::SetMode(
                arg.and_then(|a| a.parse().ok())
                    .ok_or_else(|| bad("'api' or 'manual'"))?,
            ),
            "profile" => match arg {
                Some("-") => Command::SetProfileId(None),
                Some(id) => Command::SetProfileId(ProfileId::new(id)),
                None => return Err(bad("a profile ID or '-'")),
            },
            "auto-start" => Command::SetAutoStart(match arg {
                Some("on") => true,
                Some("off") => false,
                _ => return Err(bad("'on' or 'off'")),
            }),
            "detect-start" => Command::StartDetection,
            "detect-stop" => Command::StopDetection,
            "game-start" => Command::ManualStart,
            "game-stop" => Command::ManualStop,
            "status" => Command::Status,
            "stats" => Command::Stats,
            "reset-stats" => Command::ResetStats,
            "quit" | "exit" => Command::Quit,
            _ => return Err(ParseCommandError::Unknown(name.clone())),
        };

        Ok(command)
    }
}
