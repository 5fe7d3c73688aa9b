//! Play session statistics
//!
//! [`StatsTracker`] follows the current session in memory and hands each
//! finished session to the session log as a [`SessionRecord`].

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::models::SessionRecord;

/// Write-only sink for session statistics
pub trait StatsRecorder: Send {
    fn start_session(&mut self);
    fn end_session(&mut self);
    fn record_alert(&mut self);
    /// Forget accumulated totals; an active session keeps running
    fn reset_totals(&mut self);
}

pub struct StatsTracker {
    session_start: Option<DateTime<Utc>>,
    session_alerts: u32,
    total_sessions: u64,
    total_alerts: u64,
    log_tx: mpsc::UnboundedSender<SessionRecord>,
}

impl StatsTracker {
    pub fn new(log_tx: mpsc::UnboundedSender<SessionRecord>) -> Self {
        Self {
            session_start: None,
            session_alerts: 0,
            total_sessions: 0,
            total_alerts: 0,
            log_tx,
        }
    }

    pub fn is_session_active(&self) -> bool {
        self.session_start.is_some()
    }

    /// Alerts in the current session
    pub fn session_alerts(&self) -> u32 {
        self.session_alerts
    }

    /// Sessions started since launch
    pub fn total_sessions(&self) -> u64 {
        self.total_sessions
    }

    /// Alerts raised since launch
    pub fn total_alerts(&self) -> u64 {
        self.total_alerts
    }

    /// Seconds since the current session started, 0 without a session
    pub fn current_session_seconds(&self) -> i64 {
        self.session_start
            .map(|start| (Utc::now() - start).num_seconds().max(0))
            .unwrap_or(0)
    }
}

impl StatsRecorder for StatsTracker {
    fn start_session(&mut self) {
        if self.session_start.is_some() {
            debug!("Session already active");
            return;
        }

        self.session_start = Some(Utc::now());
        self.session_alerts = 0;
        self.total_sessions += 1;
        info!("Session #{} started", self.total_sessions);
    }

    fn end_session(&mut self) {
        let Some(started_at) = self.session_start.take() else {
            return;
        };

        let record = SessionRecord::new(started_at, Utc::now(), self.session_alerts);
        info!(
            "Session ended | {}s | {} alerts",
            record.duration_seconds, record.alerts
        );

        if let Err(e) = self.log_tx.send(record) {
            warn!("Session log closed, dropping session: {}", e);
        }
        self.session_alerts = 0;
    }

    fn record_alert(&mut self) {
        self.session_alerts += 1;
        self.total_alerts += 1;
    }

    fn reset_totals(&mut self) {
        self.total_sessions = 0;
        self.total_alerts = 0;
        info!("Statistics reset");
    }
}
