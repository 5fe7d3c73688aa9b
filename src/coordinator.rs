//! Interlock between match detection and the reminder timer.
//!
//! Match start auto-starts the timer (when enabled) and opens a statistics
//! session; match end stops both. Every alert is forwarded to the notifier
//! and counted. Repeated or out-of-order signals are no-ops.

use tracing::{debug, info};

use crate::models::{DetectorEvent, TimerEvent, TimerState};
use crate::notify::Notifier;
use crate::stats::StatsRecorder;
use crate::timer::ReminderTimer;

pub struct Coordinator {
    timer: ReminderTimer,
    notifier: Box<dyn Notifier>,
    stats: Box<dyn StatsRecorder>,
    auto_start: bool,
}

impl Coordinator {
    pub fn new(
        timer: ReminderTimer,
        notifier: Box<dyn Notifier>,
        stats: Box<dyn StatsRecorder>,
        auto_start: bool,
    ) -> Self {
        Self {
            timer,
            notifier,
            stats,
            auto_start,
        }
    }

    pub fn timer(&self) -> &ReminderTimer {
        &self.timer
    }

    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    pub fn set_auto_start(&mut self, enabled: bool) {
        self.auto_start = enabled;
    }

    /// React to a detector event; returns the timer events it caused
    pub fn on_detector_event(&mut self, event: &DetectorEvent) -> Vec<TimerEvent> {
        match event {
            DetectorEvent::GameStarted if self.auto_start => {
                info!("Match started, starting reminder");
                self.start_timer()
            }
            DetectorEvent::GameStarted => {
                debug!("Match started, auto-start disabled");
                Vec::new()
            }
            DetectorEvent::GameEnded => {
                info!("Match ended, stopping reminder");
                self.stop_timer()
            }
            DetectorEvent::StatusChanged(_) => Vec::new(),
        }
    }

    /// Start (or resume) the timer; a fresh start opens a statistics session
    pub fn start_timer(&mut self) -> Vec<TimerEvent> {
        let events = self.timer.start();
        if events.contains(&TimerEvent::Started) {
            self.stats.start_session();
        }
        self.forward(events)
    }

    /// Stop the timer and close the statistics session. No-op when idle.
    pub fn stop_timer(&mut self) -> Vec<TimerEvent> {
        if self.timer.state() == TimerState::Idle {
            debug!("Reminder already idle");
            return Vec::new();
        }

        let events = self.timer.stop();
        self.stats.end_session();
        self.forward(events)
    }

    pub fn pause_timer(&mut self) -> Vec<TimerEvent> {
        let events = self.timer.pause();
        self.forward(events)
    }

    pub fn resume_timer(&mut self) -> Vec<TimerEvent> {
        let events = self.timer.resume();
        self.forward(events)
    }

    pub fn toggle_pause(&mut self) -> Vec<TimerEvent> {
        let events = self.timer.toggle_pause();
        self.forward(events)
    }

    pub fn reset_timer(&mut self) -> Vec<TimerEvent> {
        let events = self.timer.reset();
        self.forward(events)
    }

    pub fn set_interval(&mut self, seconds: u32) -> Vec<TimerEvent> {
        let events = self.timer.set_interval(seconds);
        self.forward(events)
    }

    /// One-second clock pulse
    pub fn pulse(&mut self) -> Vec<TimerEvent> {
        let events = self.timer.pulse();
        self.forward(events)
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset_totals();
    }

    /// Stop everything before exit
    pub fn shutdown(&mut self) -> Vec<TimerEvent> {
        self.stop_timer()
    }

    fn forward(&mut self, events: Vec<TimerEvent>) -> Vec<TimerEvent> {
        for event in &events {
            if let TimerEvent::Alert { count } = event {
                info!("Villager alert #{}", count);
                self.notifier.notify();
                self.stats.record_alert();
            }
        }
        events
    }
}
