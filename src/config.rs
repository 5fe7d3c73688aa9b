use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::api::status::{DEFAULT_STATUS_URL, DEFAULT_TIMEOUT};
use crate::detector::{DetectorSettings, DEFAULT_API_INTERVAL, DEFAULT_PROCESS_INTERVAL};
use crate::models::{DetectionMode, ProfileId};
use crate::process::DEFAULT_PROCESS_NAME;
use crate::timer::{clamp_interval, DEFAULT_INTERVAL};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Seconds between villager alerts, clamped to the supported range
    pub interval_seconds: u32,

    /// How matches are detected
    pub detection_mode: DetectionMode,

    /// Player profile for the status endpoint
    pub profile_id: Option<ProfileId>,

    /// Start the reminder automatically when a match starts
    pub auto_start: bool,

    /// Start detection at launch
    pub auto_start_detection: bool,

    /// Game executable to look for
    pub process_name: String,

    /// Interval in seconds between process checks
    pub process_check_interval: u64,

    /// Interval in seconds between status requests
    pub api_check_interval: u64,

    /// Status endpoint URL with a `{profile_id}` placeholder
    pub status_api_url: String,

    /// Status request timeout in seconds
    pub api_timeout: u64,

    pub sound_enabled: bool,

    pub popup_enabled: bool,

    /// SQLite database for the session log
    pub database_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let interval: u32 = var("REMINDER_INTERVAL", &DEFAULT_INTERVAL.to_string())
            .trim()
            .parse()
            .context("REMINDER_INTERVAL must be a valid number")?;

        let detection_mode: DetectionMode = var("DETECTION_MODE", "api")
            .parse()
            .map_err(anyhow::Error::msg)
            .context("DETECTION_MODE must be 'api' or 'manual'")?;

        Ok(Config {
            interval_seconds: clamp_interval(interval),

            detection_mode,

            profile_id: lookup("PROFILE_ID").and_then(|id| ProfileId::new(&id)),

            auto_start: parse_bool("AUTO_START", &var("AUTO_START", "true"))?,

            auto_start_detection: parse_bool(
                "AUTO_START_DETECTION",
                &var("AUTO_START_DETECTION", "true"),
            )?,

            process_name: var("GAME_PROCESS_NAME", DEFAULT_PROCESS_NAME),

            process_check_interval: parse_secs(
                "PROCESS_CHECK_INTERVAL",
                &var(
                    "PROCESS_CHECK_INTERVAL",
                    &DEFAULT_PROCESS_INTERVAL.as_secs().to_string(),
                ),
            )?,

            api_check_interval: parse_secs(
                "API_CHECK_INTERVAL",
                &var(
                    "API_CHECK_INTERVAL",
                    &DEFAULT_API_INTERVAL.as_secs().to_string(),
                ),
            )?,

            status_api_url: var("STATUS_API_URL", DEFAULT_STATUS_URL),

            api_timeout: parse_secs(
                "API_TIMEOUT",
                &var("API_TIMEOUT", &DEFAULT_TIMEOUT.as_secs().to_string()),
            )?,

            sound_enabled: parse_bool("SOUND_ENABLED", &var("SOUND_ENABLED", "true"))?,

            popup_enabled: parse_bool("POPUP_ENABLED", &var("POPUP_ENABLED", "true"))?,

            database_url: var("DATABASE_URL", "sqlite:data/sessions.db"),
        })
    }

    /// Settings handed to the match detector
    pub fn detector_settings(&self) -> DetectorSettings {
        DetectorSettings {
            mode: self.detection_mode,
            profile_id: self.profile_id.clone(),
            process_name: self.process_name.clone(),
            process_interval: Duration::from_secs(self.process_check_interval),
            api_interval: Duration::from_secs(self.api_check_interval),
        }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{} must be a boolean, got '{}'", key, other),
    }
}

/// Whole seconds, at least 1
fn parse_secs(key: &str, value: &str) -> Result<u64> {
    let secs: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{} must be a valid number", key))?;
    Ok(secs.max(1))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.interval_seconds, 25);
        assert_eq!(config.detection_mode, DetectionMode::ApiPolling);
        assert!(config.profile_id.is_none());
        assert!(config.auto_start);
        assert_eq!(config.process_name, "RelicCardinal.exe");
        assert_eq!(config.process_check_interval, 10);
        assert_eq!(config.api_check_interval, 10);
        assert_eq!(config.api_timeout(), Duration::from_secs(10));
        assert_eq!(config.database_url, "sqlite:data/sessions.db");
    }

    #[test]
    fn test_interval_is_clamped() {
        let config = config_from(&[("REMINDER_INTERVAL", "2")]).unwrap();
        assert_eq!(config.interval_seconds, 5);

        let config = config_from(&[("REMINDER_INTERVAL", "90")]).unwrap();
        assert_eq!(config.interval_seconds, 60);
    }

    #[test]
    fn test_blank_profile_is_unset() {
        let config = config_from(&[("PROFILE_ID", "  ")]).unwrap();
        assert!(config.profile_id.is_none());

        let config = config_from(&[("PROFILE_ID", "777")]).unwrap();
        assert_eq!(config.detector_settings().profile_id, ProfileId::new("777"));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config_from(&[("REMINDER_INTERVAL", "soon")]).is_err());
        assert!(config_from(&[("DETECTION_MODE", "process")]).is_err());
        assert!(config_from(&[("AUTO_START", "maybe")]).is_err());
        assert!(config_from(&[("API_CHECK_INTERVAL", "-1")]).is_err());
    }

    #[test]
    fn test_booleans_and_intervals() {
        let config = config_from(&[
            ("AUTO_START", "off"),
            ("POPUP_ENABLED", "0"),
            ("DETECTION_MODE", "manual"),
            ("PROCESS_CHECK_INTERVAL", "0"),
        ])
        .unwrap();

        assert!(!config.auto_start);
        assert!(!config.popup_enabled);
        assert_eq!(config.detection_mode, DetectionMode::Manual);
        assert_eq!(
            config.detector_settings().process_interval,
            Duration::from_secs(1)
        );
    }
}
