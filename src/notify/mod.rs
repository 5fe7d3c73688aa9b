use std::io::Write;

use notify_rust::Notification;
use tracing::{debug, warn};

pub const DEFAULT_TITLE: &str = "Make villagers!";
pub const DEFAULT_MESSAGE: &str = "Time to queue a villager.";

/// Receives alert notifications
pub trait Notifier: Send {
    /// Raise an alert with the default title and message
    fn notify(&self);
}

/// Desktop popup notifier with an optional sound
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    title: String,
    message: String,
    sound_enabled: bool,
    popup_enabled: bool,
}

impl DesktopNotifier {
    pub fn new(sound_enabled: bool, popup_enabled: bool) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
            sound_enabled,
            popup_enabled,
        }
    }

    fn show_popup(&self) {
        let mut notification = Notification::new();
        notification
            .summary(&self.title)
            .body(&self.message)
            .timeout(2000);

        if self.sound_enabled {
            notification.sound_name("message-new-instant");
        }

        let show = move || {
            if let Err(e) = notification.show() {
                warn!("Failed to show notification: {}", e);
            }
        };

        // Some notification backends block on the session bus
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(show);
            }
            Err(_) => show(),
        }
    }

    fn beep(&self) {
        let mut stdout = std::io::stdout();
        if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
            debug!("Failed to ring terminal bell: {}", e);
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self) {
        match (self.popup_enabled, self.sound_enabled) {
            (true, _) => self.show_popup(),
            (false, true) => self.beep(),
            (false, false) => debug!("Notifications disabled, skipping alert"),
        }
    }
}
