pub mod detection;
pub mod events;
pub mod session;
pub mod timer_state;

pub use detection::{DetectionMode, MatchStatus, ProfileId};
pub use events::{DetectorEvent, DetectorStatus};
pub use session::SessionRecord;
pub use timer_state::{TimerEvent, TimerState};
