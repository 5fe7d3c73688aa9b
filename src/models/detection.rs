use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the start and end of a match are detected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Poll the status endpoint while the game process is running
    #[default]
    ApiPolling,
    /// The operator signals start/end directly, no external calls
    Manual,
}

impl DetectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMode::ApiPolling => "api",
            DetectionMode::Manual => "manual",
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "api" | "api_polling" => Ok(DetectionMode::ApiPolling),
            "manual" => Ok(DetectionMode::Manual),
            other => Err(format!("unknown detection mode: {}", other)),
        }
    }
}

/// Player account identifier understood by the status endpoint.
///
/// Always non-empty; construction from a blank string yields `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(String);

impl ProfileId {
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Match status reported by the status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStatus {
    /// Whether a match is currently in progress
    #[serde(default)]
    pub ongoing: bool,
}
