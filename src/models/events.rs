use std::fmt;

/// Event emitted by the match detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorEvent {
    /// A match started (emitted once per match)
    GameStarted,
    /// A match ended (emitted once per match)
    GameEnded,
    /// Human-readable status for the UI, not authoritative
    StatusChanged(DetectorStatus),
}

/// Status reported by the match detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorStatus {
    ApiDetectionActive,
    ManualModeReady,
    WaitingForProcess,
    ProcessDetected,
    GameDetected,
    GameOver,
    MissingProfileId,
    /// The status endpoint does not know the profile identifier
    ProfileNotFound,
    /// Unexpected HTTP status code
    ApiError(u16),
    /// Timeout, connection failure or unreadable body
    ApiUnreachable(String),
    ProcessCheckFailed(String),
    DetectionStopped,
}

impl DetectorStatus {
    /// Whether this status asks the operator to fix configuration
    pub fn is_configuration_hint(&self) -> bool {
        matches!(
            self,
            DetectorStatus::MissingProfileId | DetectorStatus::ProfileNotFound
        )
    }
}

impl fmt::Display for DetectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorStatus::ApiDetectionActive => write!(f, "API detection active"),
            DetectorStatus::ManualModeReady => write!(f, "Manual mode - press start"),
            DetectorStatus::WaitingForProcess => write!(f, "Waiting for the game to launch"),
            DetectorStatus::ProcessDetected => write!(f, "Game running, watching for a match"),
            DetectorStatus::GameDetected => write!(f, "Match detected!"),
            DetectorStatus::GameOver => write!(f, "Match over"),
            DetectorStatus::MissingProfileId => write!(f, "Error: profile ID required"),
            DetectorStatus::ProfileNotFound => {
                write!(f, "Profile not found - check your profile ID")
            }
            DetectorStatus::ApiError(code) => write!(f, "API error: {}", code),
            DetectorStatus::ApiUnreachable(reason) => {
                write!(f, "API connection error: {}", reason)
            }
            DetectorStatus::ProcessCheckFailed(reason) => {
                write!(f, "Process check error: {}", reason)
            }
            DetectorStatus::DetectionStopped => write!(f, "Detection stopped"),
        }
    }
}
