pub mod companion;
pub mod session_log;

pub use companion::{CompanionUpdate, CompanionWorker};
pub use session_log::SessionLogWorker;
