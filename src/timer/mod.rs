//! Villager reminder countdown.
//!
//! A single countdown that alerts every time it reaches zero and starts
//! over. The timer has no clock of its own: whoever owns it calls
//! [`ReminderTimer::pulse`] once per second while it is running.
//!
//! ```text
//!         start()             pause()
//!  Idle ───────────► Running ─────────► Paused
//!   ▲                 ▲  │                │
//!   │                 │  └─ resume() / start()
//!   └──── stop() ─────┴───────────────────┘
//! ```
//!
//! Every operation returns the events it produced, in order.

use std::ops::RangeInclusive;

use tracing::debug;

use crate::models::{TimerEvent, TimerState};

/// Default seconds between alerts (one villager build time)
pub const DEFAULT_INTERVAL: u32 = 25;
pub const MIN_INTERVAL: u32 = 5;
pub const MAX_INTERVAL: u32 = 60;

/// Clamp an interval to the supported range
pub fn clamp_interval(seconds: u32) -> u32 {
    seconds.clamp(MIN_INTERVAL, MAX_INTERVAL)
}

/// Countdown that repeatedly alerts at a fixed cadence
#[derive(Debug, Clone)]
pub struct ReminderTimer {
    state: TimerState,
    interval: u32,
    remaining: u32,
    alert_count: u32,
    bounds: RangeInclusive<u32>,
}

impl ReminderTimer {
    /// Create an idle timer; the interval is clamped to the supported range
    pub fn new(interval_seconds: u32) -> Self {
        Self::with_bounds(interval_seconds, MIN_INTERVAL..=MAX_INTERVAL)
    }

    /// Create an idle timer with custom interval bounds (lower bound at least 1s)
    pub fn with_bounds(interval_seconds: u32, bounds: RangeInclusive<u32>) -> Self {
        let low = (*bounds.start()).max(1);
        let high = (*bounds.end()).max(low);
        let bounds = low..=high;
        let interval = interval_seconds.clamp(low, high);

        Self {
            state: TimerState::Idle,
            interval,
            remaining: interval,
            alert_count: 0,
            bounds,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Alerts raised since the last fresh start
    pub fn alert_count(&self) -> u32 {
        self.alert_count
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Start a fresh countdown, or resume a paused one
    pub fn start(&mut self) -> Vec<TimerEvent> {
        match self.state {
            TimerState::Running => Vec::new(),
            TimerState::Paused => self.resume(),
            TimerState::Idle => {
                self.remaining = self.interval;
                self.alert_count = 0;
                self.state = TimerState::Running;
                debug!("Reminder timer started ({}s)", self.interval);
                vec![TimerEvent::Started, TimerEvent::Tick(self.remaining)]
            }
        }
    }

    pub fn pause(&mut self) -> Vec<TimerEvent> {
        if self.state != TimerState::Running {
            return Vec::new();
        }

        self.state = TimerState::Paused;
        debug!("Reminder timer paused at {}s", self.remaining);
        vec![TimerEvent::Paused]
    }

    pub fn resume(&mut self) -> Vec<TimerEvent> {
        if self.state != TimerState::Paused {
            return Vec::new();
        }

        self.state = TimerState::Running;
        debug!("Reminder timer resumed at {}s", self.remaining);
        vec![TimerEvent::Resumed]
    }

    /// Pause when running, resume when paused, nothing when idle
    pub fn toggle_pause(&mut self) -> Vec<TimerEvent> {
        match self.state {
            TimerState::Running => self.pause(),
            TimerState::Paused => self.resume(),
            TimerState::Idle => Vec::new(),
        }
    }

    /// Stop from any state and rewind to the full interval
    pub fn stop(&mut self) -> Vec<TimerEvent> {
        self.state = TimerState::Idle;
        self.remaining = self.interval;
        debug!("Reminder timer stopped");
        vec![TimerEvent::Stopped, TimerEvent::Tick(self.remaining)]
    }

    /// Rewind to the full interval without changing state
    pub fn reset(&mut self) -> Vec<TimerEvent> {
        self.remaining = self.interval;
        vec![TimerEvent::Tick(self.remaining)]
    }

    /// Change the interval.
    ///
    /// While idle the displayed remaining time follows immediately. A
    /// countdown in progress keeps going and picks up the new interval at
    /// its next reset, unless it is now longer than the new interval.
    pub fn set_interval(&mut self, seconds: u32) -> Vec<TimerEvent> {
        self.interval = seconds.clamp(*self.bounds.start(), *self.bounds.end());

        if self.state == TimerState::Idle {
            self.remaining = self.interval;
            return vec![TimerEvent::Tick(self.remaining)];
        }

        if self.remaining > self.interval {
            self.remaining = self.interval;
            return vec![TimerEvent::Tick(self.remaining)];
        }

        Vec::new()
    }

    /// Advance the countdown by one second. Ignored unless running.
    pub fn pulse(&mut self) -> Vec<TimerEvent> {
        if self.state != TimerState::Running {
            return Vec::new();
        }

        self.remaining = self.remaining.saturating_sub(1);
        let mut events = vec![TimerEvent::Tick(self.remaining)];

        if self.remaining == 0 {
            self.alert_count += 1;
            events.push(TimerEvent::Alert {
                count: self.alert_count,
            });
            self.remaining = self.interval;
            events.push(TimerEvent::Tick(self.remaining));
        }

        events
    }
}

impl Default for ReminderTimer {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}
