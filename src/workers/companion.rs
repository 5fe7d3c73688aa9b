use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::api::{StatusError, StatusSource};
use crate::control::Command;
use crate::coordinator::Coordinator;
use crate::detector::{Check, DetectorOutput, DetectorState, MatchDetector};
use crate::models::{DetectorEvent, MatchStatus, TimerEvent};
use crate::process::ProcessProbe;

/// Countdown resolution
const PULSE: Duration = Duration::from_secs(1);

/// Update published for the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanionUpdate {
    Timer(TimerEvent),
    Detector(DetectorEvent),
}

/// Completed check re-entering the loop
enum CheckResult {
    Process {
        generation: u64,
        snapshot: Result<Vec<String>, String>,
    },
    Api {
        generation: u64,
        response: Result<MatchStatus, StatusError>,
    },
}

/// Worker that owns the detector and the reminder and runs every clock
/// on one loop
pub struct CompanionWorker {
    detector: MatchDetector,
    coordinator: Coordinator,
    probe: Arc<dyn ProcessProbe>,
    status_source: Arc<dyn StatusSource>,
    command_rx: mpsc::Receiver<Command>,
    update_tx: mpsc::Sender<CompanionUpdate>,
    result_tx: mpsc::Sender<CheckResult>,
    result_rx: mpsc::Receiver<CheckResult>,
    pulse_clock: Option<Interval>,
    process_clock: Option<Interval>,
    api_clock: Option<Interval>,
    clock_generation: Option<u64>,
}

impl CompanionWorker {
    /// Create a new companion worker
    pub fn new(
        detector: MatchDetector,
        coordinator: Coordinator,
        probe: Arc<dyn ProcessProbe>,
        status_source: Arc<dyn StatusSource>,
        command_rx: mpsc::Receiver<Command>,
        update_tx: mpsc::Sender<CompanionUpdate>,
    ) -> Self {
        let (result_tx, result_rx) = mpsc::channel(32);

        Self {
            detector,
            coordinator,
            probe,
            status_source,
            command_rx,
            update_tx,
            result_tx,
            result_rx,
            pulse_clock: None,
            process_clock: None,
            api_clock: None,
            clock_generation: None,
        }
    }

    /// Run the worker loop until `Quit` or the command channel closes
    pub async fn run(mut self) {
        info!(
            "Companion worker started (reminder every {}s, detection: {})",
            self.coordinator.timer().interval(),
            self.detector.mode()
        );

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(Command::Quit) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                Some(result) = self.result_rx.recv() => {
                    self.handle_result(result).await;
                }
                _ = next_tick(&mut self.pulse_clock) => {
                    let events = self.coordinator.pulse();
                    self.publish_timer(events).await;
                }
                _ = next_tick(&mut self.process_clock) => {
                    let outputs = self.detector.poll_process();
                    self.apply(outputs).await;
                }
                _ = next_tick(&mut self.api_clock) => {
                    let outputs = self.detector.poll_api();
                    self.apply(outputs).await;
                }
            }
        }

        self.shutdown().await;
    }

    async fn handle_command(&mut self, command: Command) {
        debug!("Command: {:?}", command);

        match command {
            Command::StartTimer => {
                let events = self.coordinator.start_timer();
                self.publish_timer(events).await;
            }
            Command::PauseTimer => {
                let events = self.coordinator.pause_timer();
                self.publish_timer(events).await;
            }
            Command::ResumeTimer => {
                let events = self.coordinator.resume_timer();
                self.publish_timer(events).await;
            }
            Command::TogglePause => {
                let events = self.coordinator.toggle_pause();
                self.publish_timer(events).await;
            }
            Command::StopTimer => {
                let events = self.coordinator.stop_timer();
                self.publish_timer(events).await;
            }
            Command::ResetTimer => {
                let events = self.coordinator.reset_timer();
                self.publish_timer(events).await;
            }
            Command::SetInterval(seconds) => {
                let events = self.coordinator.set_interval(seconds);
                info!("Reminder interval: {}s", self.coordinator.timer().interval());
                self.publish_timer(events).await;
            }
            Command::SetAutoStart(enabled) => {
                info!("Auto-start: {}", if enabled { "on" } else { "off" });
                self.coordinator.set_auto_start(enabled);
            }
            Command::SetMode(mode) => {
                let outputs = self.detector.set_mode(mode);
                self.apply(outputs).await;
            }
            Command::SetProfileId(profile_id) => {
                let outputs = self.detector.set_profile_id(profile_id);
                self.apply(outputs).await;
            }
            Command::StartDetection => {
                let outputs = self.detector.start_detection();
                self.apply(outputs).await;
            }
            Command::StopDetection => {
                let outputs = self.detector.stop_detection();
                self.apply(outputs).await;
            }
            Command::ManualStart => {
                let outputs = self.detector.manual_start();
                self.apply(outputs).await;
            }
            Command::ManualStop => {
                let outputs = self.detector.manual_stop();
                self.apply(outputs).await;
            }
            Command::Status => self.log_status(),
            Command::ResetStats => self.coordinator.reset_stats(),
            // Served by the caller from the session log
            Command::Stats | Command::Quit => {}
        }
    }

    async fn handle_result(&mut self, result: CheckResult) {
        let outputs = match result {
            CheckResult::Process {
                generation,
                snapshot,
            } => self.detector.on_process_snapshot(generation, snapshot),
            CheckResult::Api {
                generation,
                response,
            } => self.detector.on_api_response(generation, response),
        };

        self.apply(outputs).await;
    }

    /// Route detector output: events to the coordinator and the UI, checks
    /// to background tasks
    async fn apply(&mut self, outputs: Vec<DetectorOutput>) {
        for output in outputs {
            match output {
                DetectorOutput::Event(event) => {
                    let timer_events = self.coordinator.on_detector_event(&event);
                    self.publish(CompanionUpdate::Detector(event)).await;
                    self.publish_timer(timer_events).await;
                }
                DetectorOutput::Check(check) => self.dispatch(check),
            }
        }

        self.sync_detector_clocks();
    }

    /// Run a check off the loop; its result comes back through `result_rx`
    fn dispatch(&self, check: Check) {
        let result_tx = self.result_tx.clone();

        match check {
            Check::Process { generation } => {
                let snapshot = self.probe.running_processes();
                tokio::spawn(async move {
                    let snapshot = snapshot.await.map_err(|e| format!("{:#}", e));
                    let _ = result_tx
                        .send(CheckResult::Process {
                            generation,
                            snapshot,
                        })
                        .await;
                });
            }
            Check::Api {
                generation,
                profile_id,
            } => {
                let response = self.status_source.fetch_status(&profile_id);
                tokio::spawn(async move {
                    let response = response.await;
                    let _ = result_tx
                        .send(CheckResult::Api {
                            generation,
                            response,
                        })
                        .await;
                });
            }
        }
    }

    /// Recreate the polling clocks whenever the detector changes state
    fn sync_detector_clocks(&mut self) {
        let generation = self.detector.generation();
        if self.clock_generation == Some(generation) {
            return;
        }
        self.clock_generation = Some(generation);

        let settings = self.detector.settings();
        let state = self.detector.state();

        self.process_clock = matches!(
            state,
            DetectorState::WaitingForProcess | DetectorState::PollingApi
        )
        .then(|| clock(settings.process_interval));

        self.api_clock =
            (state == DetectorState::PollingApi).then(|| clock(settings.api_interval));
    }

    async fn publish_timer(&mut self, events: Vec<TimerEvent>) {
        for event in events {
            match event {
                TimerEvent::Started | TimerEvent::Resumed => {
                    self.pulse_clock = Some(clock(PULSE));
                }
                TimerEvent::Paused | TimerEvent::Stopped => {
                    self.pulse_clock = None;
                }
                TimerEvent::Tick(_) | TimerEvent::Alert { .. } => {}
            }

            self.publish(CompanionUpdate::Timer(event)).await;
        }
    }

    async fn publish(&mut self, update: CompanionUpdate) {
        if let Err(e) = self.update_tx.send(update).await {
            debug!("No update listener: {}", e);
        }
    }

    fn log_status(&self) {
        let timer = self.coordinator.timer();
        info!(
            "Reminder: {} | {}s of {}s | {} alerts | auto-start: {}",
            timer.state().as_str(),
            timer.remaining(),
            timer.interval(),
            timer.alert_count(),
            self.coordinator.auto_start()
        );
        info!(
            "Detection: {:?} ({}) | game running: {} | match ongoing: {}",
            self.detector.state(),
            self.detector.mode(),
            self.detector.is_game_running(),
            self.detector.is_ongoing()
        );
    }

    async fn shutdown(&mut self) {
        info!("Companion worker shutting down");

        let events = self.coordinator.shutdown();
        self.publish_timer(events).await;

        if self.detector.is_detecting() {
            let outputs = self.detector.stop_detection();
            self.apply(outputs).await;
        }
    }
}

/// Clock whose first tick is one period from now. Ticks missed during a
/// stall are not replayed.
fn clock(period: Duration) -> Interval {
    let mut clock = time::interval_at(Instant::now() + period, period);
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
    clock
}

async fn next_tick(clock: &mut Option<Interval>) {
    match clock {
        Some(clock) => {
            clock.tick().await;
        }
        None => pending::<()>().await,
    }
}
