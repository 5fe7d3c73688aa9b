use std::env;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use villager_reminder::api::status::parse_status;
use villager_reminder::api::StatusClient;
use villager_reminder::config::Config;
use villager_reminder::models::ProfileId;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "check_status=info,villager_reminder=debug,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Profile from the first argument, falling back to PROFILE_ID
    let args: Vec<String> = env::args().collect();
    let profile_id = args
        .get(1)
        .and_then(|arg| ProfileId::new(arg))
        .or(config.profile_id.clone())
        .context("Usage: check_status <profile-id> (or set PROFILE_ID)")?;

    let client = StatusClient::new(&config.status_api_url, config.api_timeout())?;
    info!("Requesting {}", client.status_url(&profile_id));

    let body = match client.fetch_raw(&profile_id).await {
        Ok(body) => body,
        Err(e) if e.is_not_found() => {
            warn!("Profile {} not found - check the profile ID", profile_id);
            return Ok(());
        }
        Err(e) => {
            error!("Status request failed: {}", e);
            return Ok(());
        }
    };

    for field in ["started_at", "finished_at", "duration"] {
        if let Some(value) = body.get(field).filter(|v| !v.is_null()) {
            info!("  {}: {}", field, value);
        }
    }
    if let Some(map) = body.pointer("/map/name").or_else(|| body.get("map")) {
        info!("  map: {}", map);
    }

    match parse_status(body) {
        Ok(status) if status.ongoing => info!("Profile {} is in a match", profile_id),
        Ok(_) => info!("Profile {} has no match in progress", profile_id),
        Err(e) => error!("Unexpected response: {}", e),
    }

    Ok(())
}
