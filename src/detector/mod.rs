//! Match lifecycle detection.
//!
//! [`MatchDetector`] decides whether a match is in progress. In API mode
//! it gates remote polling on the game process being open:
//!
//! ```text
//!                 start_detection()
//!  Stopped ─────────────────────────► WaitingForProcess
//!     ▲                                  │        ▲
//!     │                  process seen    │        │  process gone
//!     │                                  ▼        │  (ends an ongoing match first)
//!     └──────── stop_detection() ──── PollingApi ─┘
//! ```
//!
//! In manual mode the operator drives `ManualIdle` / `ManualActive`
//! directly.
//!
//! The detector performs no I/O. It returns [`Check`] requests that its
//! owner executes on its own clocks and feeds back through
//! [`MatchDetector::on_process_snapshot`] and
//! [`MatchDetector::on_api_response`]. Every request carries the
//! generation it was issued in; the generation changes on each state
//! change, so a result that arrives after a stop, a mode switch or a
//! gate transition is discarded. At most one check of each kind is
//! outstanding: a poll is skipped until the previous result has come back.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::StatusError;
use crate::models::{DetectionMode, DetectorEvent, DetectorStatus, MatchStatus, ProfileId};
use crate::process::{snapshot_contains, DEFAULT_PROCESS_NAME};

/// Default seconds between process checks
pub const DEFAULT_PROCESS_INTERVAL: Duration = Duration::from_secs(10);

/// Default seconds between status requests
pub const DEFAULT_API_INTERVAL: Duration = Duration::from_secs(10);

/// Detector configuration, fixed at construction apart from the setters
#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub mode: DetectionMode,
    pub profile_id: Option<ProfileId>,
    /// Executable matched case-insensitively against process snapshots
    pub process_name: String,
    pub process_interval: Duration,
    pub api_interval: Duration,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            mode: DetectionMode::ApiPolling,
            profile_id: None,
            process_name: DEFAULT_PROCESS_NAME.to_string(),
            process_interval: DEFAULT_PROCESS_INTERVAL,
            api_interval: DEFAULT_API_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Stopped,
    /// API mode, game process not seen yet
    WaitingForProcess,
    /// API mode, game process open, polling match status
    PollingApi,
    ManualIdle,
    ManualActive,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    #[error("a profile ID is required for API detection")]
    MissingProfileId,
}

/// I/O requested by the detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// Take a snapshot of running processes
    Process { generation: u64 },
    /// Request match status for a profile
    Api {
        generation: u64,
        profile_id: ProfileId,
    },
}

/// Output of a detector operation, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorOutput {
    Event(DetectorEvent),
    Check(Check),
}

pub struct MatchDetector {
    settings: DetectorSettings,
    state: DetectorState,
    game_running: bool,
    ongoing: bool,
    generation: u64,
    process_in_flight: bool,
    api_in_flight: bool,
}

impl MatchDetector {
    pub fn new(settings: DetectorSettings) -> Self {
        Self {
            settings,
            state: DetectorState::Stopped,
            game_running: false,
            ongoing: false,
            generation: 0,
            process_in_flight: false,
            api_in_flight: false,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn mode(&self) -> DetectionMode {
        self.settings.mode
    }

    pub fn profile_id(&self) -> Option<&ProfileId> {
        self.settings.profile_id.as_ref()
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    /// Whether the game process was seen in the last snapshot
    pub fn is_game_running(&self) -> bool {
        self.game_running
    }

    /// Whether a match is currently considered in progress
    pub fn is_ongoing(&self) -> bool {
        self.ongoing
    }

    pub fn is_detecting(&self) -> bool {
        self.state != DetectorState::Stopped
    }

    /// Changes whenever outstanding checks become stale
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start detection in the current mode. No-op while already detecting.
    pub fn start_detection(&mut self) -> Vec<DetectorOutput> {
        if self.is_detecting() {
            return Vec::new();
        }

        match self.settings.mode {
            DetectionMode::ApiPolling => {
                if let Err(err) = self.require_profile() {
                    warn!("Cannot start detection: {}", err);
                    return vec![status(DetectorStatus::MissingProfileId)];
                }

                info!(
                    "API detection started, waiting for {}",
                    self.settings.process_name
                );
                self.enter(DetectorState::WaitingForProcess);

                let mut outputs = vec![
                    status(DetectorStatus::ApiDetectionActive),
                    status(DetectorStatus::WaitingForProcess),
                ];
                outputs.extend(self.process_check());
                outputs
            }
            DetectionMode::Manual => {
                info!("Manual detection started");
                self.enter(self.manual_state());
                vec![status(DetectorStatus::ManualModeReady)]
            }
        }
    }

    /// Stop detection from any state
    pub fn stop_detection(&mut self) -> Vec<DetectorOutput> {
        self.halt();
        info!("Detection stopped");
        vec![status(DetectorStatus::DetectionStopped)]
    }

    /// Switch mode, restarting detection if it was active
    pub fn set_mode(&mut self, mode: DetectionMode) -> Vec<DetectorOutput> {
        if mode == self.settings.mode {
            return Vec::new();
        }

        info!("Detection mode: {} -> {}", self.settings.mode, mode);
        self.restart_with(|settings| settings.mode = mode)
    }

    /// Replace the profile identifier, restarting API detection if active
    pub fn set_profile_id(&mut self, profile_id: Option<ProfileId>) -> Vec<DetectorOutput> {
        if profile_id == self.settings.profile_id {
            return Vec::new();
        }

        if self.settings.mode != DetectionMode::ApiPolling {
            self.settings.profile_id = profile_id;
            return Vec::new();
        }

        self.restart_with(|settings| settings.profile_id = profile_id)
    }

    /// Process clock fired
    pub fn poll_process(&mut self) -> Vec<DetectorOutput> {
        match self.state {
            DetectorState::WaitingForProcess | DetectorState::PollingApi => {
                self.process_check().into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    /// API clock fired
    pub fn poll_api(&mut self) -> Vec<DetectorOutput> {
        match self.state {
            DetectorState::PollingApi => self.api_check().into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Whether a process snapshot is outstanding
    pub fn is_process_check_pending(&self) -> bool {
        self.process_in_flight
    }

    /// Whether a status request is outstanding
    pub fn is_api_check_pending(&self) -> bool {
        self.api_in_flight
    }

    /// Result of a process snapshot issued in `generation`
    pub fn on_process_snapshot(
        &mut self,
        generation: u64,
        snapshot: Result<Vec<String>, String>,
    ) -> Vec<DetectorOutput> {
        if !self.accepts(generation)
            || !matches!(
                self.state,
                DetectorState::WaitingForProcess | DetectorState::PollingApi
            )
        {
            debug!("Discarding stale process snapshot (generation {})", generation);
            return Vec::new();
        }
        self.process_in_flight = false;

        let names = match snapshot {
            Ok(names) => names,
            Err(reason) => {
                warn!("Process check failed: {}", reason);
                return vec![status(DetectorStatus::ProcessCheckFailed(reason))];
            }
        };

        let running = snapshot_contains(&names, &self.settings.process_name);

        match (self.state, running) {
            (DetectorState::WaitingForProcess, true) => {
                info!("{} detected, polling match status", self.settings.process_name);
                self.game_running = true;
                self.enter(DetectorState::PollingApi);

                let mut outputs = vec![status(DetectorStatus::ProcessDetected)];
                outputs.extend(self.poll_api());
                outputs
            }
            (DetectorState::PollingApi, false) => {
                info!("{} no longer running", self.settings.process_name);
                self.game_running = false;
                self.enter(DetectorState::WaitingForProcess);

                let mut outputs = self.set_ongoing(false);
                outputs.push(status(DetectorStatus::WaitingForProcess));
                outputs
            }
            // Game closed while a match is remembered from an earlier session
            (DetectorState::WaitingForProcess, false) => self.set_ongoing(false),
            _ => Vec::new(),
        }
    }

    /// Result of a status request issued in `generation`
    pub fn on_api_response(
        &mut self,
        generation: u64,
        response: Result<MatchStatus, StatusError>,
    ) -> Vec<DetectorOutput> {
        if !self.accepts(generation) || self.state != DetectorState::PollingApi {
            debug!("Discarding stale status response (generation {})", generation);
            return Vec::new();
        }
        self.api_in_flight = false;

        match response {
            Ok(match_status) => self.set_ongoing(match_status.ongoing),
            Err(StatusError::NotFound) => {
                let profile = self.settings.profile_id.as_ref().map(ProfileId::as_str);
                warn!(
                    "Status endpoint does not know profile {}",
                    profile.unwrap_or("-")
                );
                vec![status(DetectorStatus::ProfileNotFound)]
            }
            Err(StatusError::UnexpectedStatus(code)) => {
                warn!("Status endpoint returned {}", code);
                vec![status(DetectorStatus::ApiError(code))]
            }
            Err(err) => {
                warn!("Status request failed: {}", err);
                vec![status(DetectorStatus::ApiUnreachable(err.to_string()))]
            }
        }
    }

    /// Operator signals a match start. Manual mode only.
    pub fn manual_start(&mut self) -> Vec<DetectorOutput> {
        self.manual_signal(true)
    }

    /// Operator signals a match end. Manual mode only.
    pub fn manual_stop(&mut self) -> Vec<DetectorOutput> {
        self.manual_signal(false)
    }

    fn manual_signal(&mut self, ongoing: bool) -> Vec<DetectorOutput> {
        if self.settings.mode != DetectionMode::Manual {
            debug!("Ignoring manual signal in {} mode", self.settings.mode);
            return Vec::new();
        }

        let outputs = self.set_ongoing(ongoing);
        if self.is_detecting() {
            self.state = self.manual_state();
        }
        outputs
    }

    fn set_ongoing(&mut self, ongoing: bool) -> Vec<DetectorOutput> {
        if ongoing == self.ongoing {
            return Vec::new();
        }

        self.ongoing = ongoing;
        if ongoing {
            info!("Match started");
            vec![
                DetectorOutput::Event(DetectorEvent::GameStarted),
                status(DetectorStatus::GameDetected),
            ]
        } else {
            info!("Match ended");
            vec![
                DetectorOutput::Event(DetectorEvent::GameEnded),
                status(DetectorStatus::GameOver),
            ]
        }
    }

    fn restart_with(&mut self, update: impl FnOnce(&mut DetectorSettings)) -> Vec<DetectorOutput> {
        let was_detecting = self.is_detecting();
        if was_detecting {
            self.halt();
        }

        update(&mut self.settings);

        if was_detecting {
            self.start_detection()
        } else {
            Vec::new()
        }
    }

    fn halt(&mut self) {
        self.game_running = false;
        self.enter(DetectorState::Stopped);
    }

    fn enter(&mut self, state: DetectorState) {
        self.state = state;
        self.generation += 1;
        // Results of the previous generation are discarded on arrival
        self.process_in_flight = false;
        self.api_in_flight = false;
    }

    fn process_check(&mut self) -> Option<DetectorOutput> {
        if self.process_in_flight {
            debug!("Process check still running, skipping");
            return None;
        }

        self.process_in_flight = true;
        Some(DetectorOutput::Check(Check::Process {
            generation: self.generation,
        }))
    }

    fn api_check(&mut self) -> Option<DetectorOutput> {
        if self.api_in_flight {
            debug!("Status request still running, skipping");
            return None;
        }
        let profile_id = self.settings.profile_id.clone()?;

        self.api_in_flight = true;
        Some(DetectorOutput::Check(Check::Api {
            generation: self.generation,
            profile_id,
        }))
    }

    fn accepts(&self, generation: u64) -> bool {
        generation == self.generation
    }

    fn manual_state(&self) -> DetectorState {
        if self.ongoing {
            DetectorState::ManualActive
        } else {
            DetectorState::ManualIdle
        }
    }

    fn require_profile(&self) -> Result<&ProfileId, DetectionError> {
        self.settings
            .profile_id
            .as_ref()
            .ok_or(DetectionError::MissingProfileId)
    }
}

fn status(status: DetectorStatus) -> DetectorOutput {
    DetectorOutput::Event(DetectorEvent::StatusChanged(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXE: &str = "RelicCardinal.exe";

    fn api_detector() -> MatchDetector {
        MatchDetector::new(DetectorSettings {
            profile_id: ProfileId::new("1234"),
            ..Default::default()
        })
    }

    fn manual_detector() -> MatchDetector {
        MatchDetector::new(DetectorSettings {
            mode: DetectionMode::Manual,
            ..Default::default()
        })
    }

    fn running() -> Result<Vec<String>, String> {
        Ok(vec!["explorer.exe".to_string(), EXE.to_string()])
    }

    fn not_running() -> Result<Vec<String>, String> {
        Ok(vec!["explorer.exe".to_string()])
    }

    fn ongoing(value: bool) -> Result<MatchStatus, StatusError> {
        Ok(MatchStatus { ongoing: value })
    }

    fn events(outputs: &[DetectorOutput]) -> Vec<DetectorEvent> {
        outputs
            .iter()
            .filter_map(|o| match o {
                DetectorOutput::Event(e) => Some(e.clone()),
                DetectorOutput::Check(_) => None,
            })
            .collect()
    }

    fn checks(outputs: &[DetectorOutput]) -> Vec<Check> {
        outputs
            .iter()
            .filter_map(|o| match o {
                DetectorOutput::Check(c) => Some(c.clone()),
                DetectorOutput::Event(_) => None,
            })
            .collect()
    }

    fn count(outputs: &[DetectorOutput], event: &DetectorEvent) -> usize {
        events(outputs).iter().filter(|e| *e == event).count()
    }

    /// Start API detection and get the detector polling the API
    fn polling_detector() -> MatchDetector {
        let mut detector = api_detector();
        detector.start_detection();
        let generation = detector.generation();
        detector.on_process_snapshot(generation, running());
        assert_eq!(detector.state(), DetectorState::PollingApi);
        detector
    }

    #[test]
    fn test_start_without_profile_reports_configuration_error() {
        let mut detector = MatchDetector::new(DetectorSettings::default());
        let outputs = detector.start_detection();

        assert_eq!(
            events(&outputs),
            vec![DetectorEvent::StatusChanged(DetectorStatus::MissingProfileId)]
        );
        assert!(checks(&outputs).is_empty());
        assert_eq!(detector.state(), DetectorState::Stopped);

        // Recoverable by supplying an identifier
        let outputs = detector.set_profile_id(ProfileId::new("99"));
        assert!(outputs.is_empty());
        let outputs = detector.start_detection();
        assert_eq!(detector.state(), DetectorState::WaitingForProcess);
        assert_eq!(checks(&outputs).len(), 1);
    }

    #[test]
    fn test_start_checks_process_immediately() {
        let mut detector = api_detector();
        let outputs = detector.start_detection();

        assert_eq!(
            checks(&outputs),
            vec![Check::Process {
                generation: detector.generation()
            }]
        );
        assert!(detector.is_detecting());
        assert!(detector.start_detection().is_empty());
    }

    #[test]
    fn test_no_api_request_until_process_seen() {
        let mut detector = api_detector();
        let mut all = detector.start_detection();

        for _ in 0..20 {
            let generation = detector.generation();
            all.extend(detector.poll_process());
            all.extend(detector.poll_api());
            all.extend(detector.on_process_snapshot(generation, not_running()));
        }

        assert!(checks(&all)
            .iter()
            .all(|c| matches!(c, Check::Process { .. })));
        assert_eq!(detector.state(), DetectorState::WaitingForProcess);
    }

    #[test]
    fn test_process_seen_starts_api_polling_immediately() {
        let mut detector = api_detector();
        detector.start_detection();
        let generation = detector.generation();

        let outputs = detector.on_process_snapshot(generation, running());
        assert!(detector.is_game_running());
        assert_eq!(
            checks(&outputs),
            vec![Check::Api {
                generation: detector.generation(),
                profile_id: ProfileId::new("1234").unwrap(),
            }]
        );
    }

    #[test]
    fn test_process_name_match_is_case_insensitive() {
        let mut detector = api_detector();
        detector.start_detection();
        let generation = detector.generation();

        detector.on_process_snapshot(generation, Ok(vec!["reliccardinal.EXE".to_string()]));
        assert_eq!(detector.state(), DetectorState::PollingApi);
    }

    #[test]
    fn test_api_responses_are_idempotent() {
        let mut detector = polling_detector();
        let generation = detector.generation();

        let mut all = Vec::new();
        all.extend(detector.on_api_response(generation, ongoing(true)));
        all.extend(detector.on_api_response(generation, ongoing(true)));
        all.extend(detector.on_api_response(generation, ongoing(false)));
        all.extend(detector.on_api_response(generation, ongoing(false)));

        assert_eq!(count(&all, &DetectorEvent::GameStarted), 1);
        assert_eq!(count(&all, &DetectorEvent::GameEnded), 1);
        assert!(!detector.is_ongoing());
    }

    #[test]
    fn test_not_found_never_flips_ongoing() {
        for previous in [false, true] {
            let mut detector = polling_detector();
            let generation = detector.generation();
            detector.on_api_response(generation, ongoing(previous));

            let outputs = detector.on_api_response(generation, Err(StatusError::NotFound));
            assert_eq!(
                events(&outputs),
                vec![DetectorEvent::StatusChanged(DetectorStatus::ProfileNotFound)]
            );
            assert_eq!(detector.is_ongoing(), previous);
            assert_eq!(detector.state(), DetectorState::PollingApi);
        }
    }

    #[test]
    fn test_transient_errors_keep_state_and_polling() {
        let mut detector = polling_detector();
        let generation = detector.generation();
        detector.on_api_response(generation, ongoing(true));

        let failures = [
            StatusError::UnexpectedStatus(503),
            StatusError::Timeout,
            StatusError::Connection("refused".to_string()),
            StatusError::Decode("eof".to_string()),
        ];

        for failure in failures {
            let outputs = detector.on_api_response(generation, Err(failure));
            let events = events(&outputs);
            assert_eq!(events.len(), 1);
            assert!(matches!(
                events[0],
                DetectorEvent::StatusChanged(DetectorStatus::ApiError(503))
                    | DetectorEvent::StatusChanged(DetectorStatus::ApiUnreachable(_))
            ));
            assert!(detector.is_ongoing());
            assert_eq!(checks(&detector.poll_api()).len(), 1);
        }
    }

    #[test]
    fn test_process_exit_while_ongoing_ends_match_first() {
        let mut detector = polling_detector();
        let generation = detector.generation();
        detector.on_api_response(generation, ongoing(true));

        let outputs = detector.on_process_snapshot(generation, not_running());
        let events = events(&outputs);

        let ended = events
            .iter()
            .position(|e| *e == DetectorEvent::GameEnded)
            .expect("game ended");
        let waiting = events
            .iter()
            .position(|e| *e == DetectorEvent::StatusChanged(DetectorStatus::WaitingForProcess))
            .expect("waiting status");

        assert!(ended < waiting);
        assert_eq!(
            events.iter().filter(|e| **e == DetectorEvent::GameEnded).count(),
            1
        );
        assert!(!detector.is_game_running());
        assert_eq!(detector.state(), DetectorState::WaitingForProcess);
        assert!(detector.poll_api().is_empty());
    }

    #[test]
    fn test_process_exit_without_match_only_reports_waiting() {
        let mut detector = polling_detector();
        let generation = detector.generation();

        let outputs = detector.on_process_snapshot(generation, not_running());
        assert_eq!(
            events(&outputs),
            vec![DetectorEvent::StatusChanged(DetectorStatus::WaitingForProcess)]
        );
    }

    #[test]
    fn test_stale_api_response_after_gate_closes_is_ignored() {
        let mut detector = polling_detector();
        let api_generation = detector.generation();

        detector.on_process_snapshot(api_generation, not_running());
        let outputs = detector.on_api_response(api_generation, ongoing(true));

        assert!(outputs.is_empty());
        assert!(!detector.is_ongoing());
    }

    #[test]
    fn test_process_check_failure_changes_nothing() {
        let mut detector = polling_detector();
        let generation = detector.generation();

        let outputs = detector.on_process_snapshot(generation, Err("ps failed".to_string()));
        assert_eq!(
            events(&outputs),
            vec![DetectorEvent::StatusChanged(DetectorStatus::ProcessCheckFailed(
                "ps failed".to_string()
            ))]
        );
        assert_eq!(detector.state(), DetectorState::PollingApi);
        assert!(detector.is_game_running());
    }

    #[test]
    fn test_stop_detection_discards_outstanding_checks() {
        let mut detector = polling_detector();
        let generation = detector.generation();

        let outputs = detector.stop_detection();
        assert_eq!(
            events(&outputs),
            vec![DetectorEvent::StatusChanged(DetectorStatus::DetectionStopped)]
        );
        assert_eq!(detector.state(), DetectorState::Stopped);
        assert!(!detector.is_game_running());

        assert!(detector.on_api_response(generation, ongoing(true)).is_empty());
        assert!(detector.on_process_snapshot(generation, running()).is_empty());
        assert!(detector.poll_process().is_empty());
        assert!(detector.poll_api().is_empty());
    }

    #[test]
    fn test_remembered_match_ends_when_game_absent_after_restart() {
        let mut detector = polling_detector();
        let generation = detector.generation();
        detector.on_api_response(generation, ongoing(true));

        detector.stop_detection();
        assert!(detector.is_ongoing());

        detector.start_detection();
        let generation = detector.generation();
        let outputs = detector.on_process_snapshot(generation, not_running());
        assert_eq!(count(&outputs, &DetectorEvent::GameEnded), 1);

        let outputs = detector.on_process_snapshot(generation, not_running());
        assert!(outputs.is_empty());
    }

    #[test]
    fn test_mode_switch_restarts_without_leaking() {
        let mut detector = polling_detector();
        let old_generation = detector.generation();

        let outputs = detector.set_mode(DetectionMode::Manual);
        assert_eq!(
            events(&outputs),
            vec![DetectorEvent::StatusChanged(DetectorStatus::ManualModeReady)]
        );
        assert_eq!(detector.state(), DetectorState::ManualIdle);
        assert!(!detector.is_game_running());

        assert!(detector.on_api_response(old_generation, ongoing(true)).is_empty());
        assert!(!detector.is_ongoing());

        let outputs = detector.set_mode(DetectionMode::ApiPolling);
        assert_eq!(detector.state(), DetectorState::WaitingForProcess);
        assert_eq!(checks(&outputs).len(), 1);
    }

    #[test]
    fn test_mode_switch_while_stopped_does_not_start() {
        let mut detector = api_detector();
        assert!(detector.set_mode(DetectionMode::Manual).is_empty());
        assert!(!detector.is_detecting());
        assert_eq!(detector.mode(), DetectionMode::Manual);
    }

    #[test]
    fn test_clearing_profile_while_detecting_stops() {
        let mut detector = polling_detector();
        let outputs = detector.set_profile_id(None);

        assert_eq!(
            events(&outputs),
            vec![DetectorEvent::StatusChanged(DetectorStatus::MissingProfileId)]
        );
        assert!(!detector.is_detecting());
    }

    #[test]
    fn test_manual_start_twice_emits_once() {
        let mut detector = manual_detector();
        detector.start_detection();

        let mut all = detector.manual_start();
        all.extend(detector.manual_start());
        assert_eq!(count(&all, &DetectorEvent::GameStarted), 1);
        assert_eq!(detector.state(), DetectorState::ManualActive);

        let mut all = detector.manual_stop();
        all.extend(detector.manual_stop());
        assert_eq!(count(&all, &DetectorEvent::GameEnded), 1);
        assert_eq!(detector.state(), DetectorState::ManualIdle);
    }

    #[test]
    fn test_manual_signals_ignored_in_api_mode() {
        let mut detector = polling_detector();
        assert!(detector.manual_start().is_empty());
        assert!(!detector.is_ongoing());
    }

    #[test]
    fn test_api_poll_waits_for_outstanding_request() {
        let mut detector = polling_detector();
        let generation = detector.generation();
        assert!(detector.is_api_check_pending());

        // Clock fires twice while the first request is still out
        assert!(detector.poll_api().is_empty());
        assert!(detector.poll_api().is_empty());

        detector.on_api_response(generation, ongoing(true));
        assert!(!detector.is_api_check_pending());
        assert_eq!(checks(&detector.poll_api()).len(), 1);
        assert!(detector.poll_api().is_empty());
    }

    #[test]
    fn test_process_poll_waits_for_outstanding_snapshot() {
        let mut detector = api_detector();
        detector.start_detection();
        let generation = detector.generation();

        assert!(detector.poll_process().is_empty());

        detector.on_process_snapshot(generation, not_running());
        assert_eq!(checks(&detector.poll_process()).len(), 1);
        assert!(detector.poll_process().is_empty());
    }

    #[test]
    fn test_gate_transition_clears_outstanding_checks() {
        let mut detector = polling_detector();
        let generation = detector.generation();
        assert_eq!(checks(&detector.poll_process()).len(), 1);

        detector.on_process_snapshot(generation, not_running());
        assert!(!detector.is_api_check_pending());
        assert_eq!(checks(&detector.poll_process()).len(), 1);

        // Reopening issues a fresh request even though the old one never answered
        let generation = detector.generation();
        let outputs = detector.on_process_snapshot(generation, running());
        assert_eq!(checks(&outputs).len(), 1);
    }

    #[test]
    fn test_manual_mode_issues_no_checks() {
        let mut detector = manual_detector();
        let mut all = detector.start_detection();
        all.extend(detector.poll_process());
        all.extend(detector.poll_api());
        all.extend(detector.manual_start());

        assert!(checks(&all).is_empty());
    }
}
