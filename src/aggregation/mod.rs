pub mod dashboard;
pub mod log_window;
pub mod status;
pub mod threat_window;
pub mod timeline;
pub mod traffic;

pub use dashboard::{DashboardMessage, DashboardState};
pub use log_window::LogWindow;
pub use status::StatusAggregator;
pub use threat_window::{ThreatEntry, ThreatWindow};
pub use timeline::{TimelineBuffer, TimelinePoint};
pub use traffic::TrafficTally;
