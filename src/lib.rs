pub mod aggregation;
pub mod config;
pub mod input;
pub mod models;
pub mod output;
pub mod runtime;
pub mod view;

// Re-export commonly used types
pub use aggregation::{DashboardMessage, DashboardState};
pub use models::{DetectionEvent, LogEntry, Severity, StatusSnapshot, ThreatLevel};
pub use runtime::{DashboardRuntime, QuitHandle};
pub use view::DashboardView;
