use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::db::SessionStore;
use crate::models::SessionRecord;

/// Worker that appends finished sessions to the session log
pub struct SessionLogWorker {
    store: Arc<SessionStore>,
    log_rx: mpsc::UnboundedReceiver<SessionRecord>,
}

impl SessionLogWorker {
    /// Create a new session log worker
    pub fn new(store: Arc<SessionStore>, log_rx: mpsc::UnboundedReceiver<SessionRecord>) -> Self {
        Self { store, log_rx }
    }

    /// Run until every sender is gone, storing whatever is still queued
    pub async fn run(mut self) {
        info!("Session log started");

        while let Some(session) = self.log_rx.recv().await {
            match self.store.insert_session(&session).await {
                Ok(id) => {
                    info!(
                        "Stored session id: {} ({}s, {} alerts)",
                        id, session.duration_seconds, session.alerts
                    );
                }
                Err(e) => {
                    error!("Failed to store session: {:#}", e);
                }
            }
        }

        warn!("Session log channel closed");
    }
}
