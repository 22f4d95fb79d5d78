pub mod detection;
pub mod log_entry;
pub mod status;

mod lenient;

pub use detection::{DetectionEvent, DetectionPayload, ThreatLevel};
pub use lenient::parse_timestamp;
pub use log_entry::{LogEntry, Severity};
pub use status::{StatusPayload, StatusSnapshot};
