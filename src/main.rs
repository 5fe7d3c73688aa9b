use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Local, TimeZone, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use villager_reminder::api::StatusClient;
use villager_reminder::config::Config;
use villager_reminder::control::Command;
use villager_reminder::coordinator::Coordinator;
use villager_reminder::db::SessionStore;
use villager_reminder::detector::MatchDetector;
use villager_reminder::models::{DetectorEvent, TimerEvent};
use villager_reminder::notify::DesktopNotifier;
use villager_reminder::process::SystemProcessProbe;
use villager_reminder::stats::StatsTracker;
use villager_reminder::timer::ReminderTimer;
use villager_reminder::workers::{CompanionUpdate, CompanionWorker, SessionLogWorker};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "villager_reminder=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting villager-reminder");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded (interval: {}s, mode: {}, profile: {})",
        config.interval_seconds,
        config.detection_mode,
        config
            .profile_id
            .as_ref()
            .map(|id| id.as_str())
            .unwrap_or("none")
    );

    // Initialize database
    let session_store = Arc::new(SessionStore::new(&config.database_url).await?);
    info!("Database initialized");

    // Collaborators
    let status_client = StatusClient::new(&config.status_api_url, config.api_timeout())?;
    let notifier = DesktopNotifier::new(config.sound_enabled, config.popup_enabled);
    let (log_tx, log_rx) = mpsc::unbounded_channel();
    let stats = StatsTracker::new(log_tx);

    // Core
    let coordinator = Coordinator::new(
        ReminderTimer::new(config.interval_seconds),
        Box::new(notifier),
        Box::new(stats),
        config.auto_start,
    );
    let detector = MatchDetector::new(config.detector_settings());

    // Channels
    let (command_tx, command_rx) = mpsc::channel(32);
    let (update_tx, update_rx) = mpsc::channel(100);

    // Create workers
    let companion = CompanionWorker::new(
        detector,
        coordinator,
        Arc::new(SystemProcessProbe),
        Arc::new(status_client),
        command_rx,
        update_tx,
    );
    let session_log = SessionLogWorker::new(Arc::clone(&session_store), log_rx);

    info!("Workers created, starting...");

    let mut companion_handle = tokio::spawn(companion.run());
    let session_log_handle = tokio::spawn(session_log.run());
    tokio::spawn(display_updates(update_rx));
    tokio::spawn(read_commands(command_tx.clone(), Arc::clone(&session_store)));

    if config.auto_start_detection {
        command_tx.send(Command::StartDetection).await?;
    }

    info!("Ready. Type 'status', 'start', 'stop', 'pause', 'interval <n>' or 'quit'");

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            if command_tx.send(Command::Quit).await.is_ok() {
                if let Err(e) = (&mut companion_handle).await {
                    error!("Companion worker failed: {:?}", e);
                }
            }
        }
        result = &mut companion_handle => {
            if let Err(e) = result {
                error!("Companion worker exited unexpectedly: {:?}", e);
            }
        }
    }

    // The companion owned the last session log sender
    if let Err(e) = session_log_handle.await {
        error!("Session log worker failed: {:?}", e);
    }

    info!("Shutting down villager-reminder");
    Ok(())
}

/// Stand-in for the UI: log what the companion reports
async fn display_updates(mut update_rx: mpsc::Receiver<CompanionUpdate>) {
    while let Some(update) = update_rx.recv().await {
        match update {
            CompanionUpdate::Timer(TimerEvent::Tick(remaining)) => {
                debug!("Next villager in {}s", remaining);
            }
            CompanionUpdate::Timer(TimerEvent::Alert { count }) => {
                info!("VILLAGER! (#{})", count);
            }
            CompanionUpdate::Timer(event) => info!("Reminder {:?}", event),
            CompanionUpdate::Detector(DetectorEvent::StatusChanged(status)) => {
                if status.is_configuration_hint() {
                    warn!("{}", status);
                } else {
                    info!("{}", status);
                }
            }
            CompanionUpdate::Detector(event) => info!("Detector {:?}", event),
        }
    }
}

/// Read operator commands from stdin
async fn read_commands(command_tx: mpsc::Sender<Command>, session_store: Arc<SessionStore>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("stdin closed, no more commands");
                return;
            }
            Err(e) => {
                warn!("Failed to read command: {}", e);
                return;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Stats) => {
                if let Err(e) = log_stats(&session_store).await {
                    error!("Failed to load statistics: {:#}", e);
                }
            }
            Ok(Command::ResetStats) => {
                match session_store.clear().await {
                    Ok(removed) => info!("Statistics reset ({} sessions removed)", removed),
                    Err(e) => {
                        error!("Failed to reset statistics: {:#}", e);
                        continue;
                    }
                }
                if command_tx.send(Command::ResetStats).await.is_err() {
                    return;
                }
            }
            Ok(command) => {
                let quit = command == Command::Quit;
                if command_tx.send(command).await.is_err() || quit {
                    return;
                }
            }
            Err(e) => warn!("{}", e),
        }
    }
}

async fn log_stats(session_store: &SessionStore) -> Result<()> {
    let today_start = Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .map(|midnight| midnight.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let today = session_store.totals_since(today_start).await?;
    let week = session_store
        .totals_since(today_start - Duration::days(6))
        .await?;
    let total = session_store.totals().await?;

    info!(
        "Today: {} sessions | {} alerts | {}",
        today.sessions,
        today.alerts,
        format_seconds(today.seconds)
    );
    info!(
        "Last 7 days: {} sessions | {} alerts | {}",
        week.sessions,
        week.alerts,
        format_seconds(week.seconds)
    );
    info!(
        "All time: {} sessions | {} alerts | {} | {:.1} alerts/session",
        total.sessions,
        total.alerts,
        format_seconds(total.seconds),
        total.average_alerts()
    );

    Ok(())
}

fn format_seconds(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
