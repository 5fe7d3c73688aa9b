use serde::{Deserialize, Serialize};

/// Lifecycle of the reminder countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
        }
    }
}

/// Event emitted by the reminder timer, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Started,
    Paused,
    Resumed,
    Stopped,
    /// Remaining seconds after a change
    Tick(u32),
    /// Countdown reached zero; `count` is the alert number within the run
    Alert { count: u32 },
}
