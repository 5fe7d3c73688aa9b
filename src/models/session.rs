use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A finished play session, appended to the session log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Row id, `None` until stored
    pub id: Option<i64>,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// When the session ended
    pub ended_at: DateTime<Utc>,

    /// Session length in whole seconds
    pub duration_seconds: i64,

    /// Alerts raised during the session
    pub alerts: u32,
}

impl SessionRecord {
    pub fn new(started_at: DateTime<Utc>, ended_at: DateTime<Utc>, alerts: u32) -> Self {
        let duration_seconds = (ended_at - started_at).num_seconds().max(0);

        Self {
            id: None,
            started_at,
            ended_at,
            duration_seconds,
            alerts,
        }
    }
}
