//! Explicit state container for the dashboard
//!
//! All aggregation state lives here and is only mutated through
//! [`DashboardState::handle`], one message at a time.

use chrono::{DateTime, Local};

use super::{LogWindow, StatusAggregator, ThreatWindow, TimelineBuffer, TrafficTally};
use crate::models::{DetectionEvent, Severity, StatusSnapshot};

/// Every way the aggregation state can change
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardMessage {
    TransportConnected,
    TransportDisconnected { reason: String },
    Detection(DetectionEvent),
    Status(StatusSnapshot),
    ClearThreats,
    ClearLogs,
}

pub struct DashboardState {
    status: StatusAggregator,
    threats: ThreatWindow,
    logs: LogWindow,
    timeline: TimelineBuffer,
    traffic: TrafficTally,
}

impl DashboardState {
    /// Fresh state with the boot log messages
    pub fn new() -> Self {
        Self::started_at(Local::now())
    }

    pub fn started_at(now: DateTime<Local>) -> Self {
        DashboardState {
            status: StatusAggregator::new(),
            threats: ThreatWindow::new(),
            logs: LogWindow::with_boot_messages(now),
            timeline: TimelineBuffer::new(),
            traffic: TrafficTally::new(),
        }
    }

    pub fn handle(&mut self, message: DashboardMessage) {
        match message {
            DashboardMessage::TransportConnected => {
                self.logs.append("Connected to security server", Severity::Success);
            }
            DashboardMessage::TransportDisconnected { reason } => {
                log::debug!("Transport disconnected: {}", reason);
                self.logs
                    .append("Connection lost - attempting reconnect", Severity::Danger);
            }
            DashboardMessage::Detection(event) => self.ingest_detection(event),
            DashboardMessage::Status(snapshot) => self.status.replace(snapshot),
            DashboardMessage::ClearThreats => {
                self.threats.clear();
                self.logs.append("Threat list cleared by user", Severity::Info);
            }
            DashboardMessage::ClearLogs => self.logs.clear(),
        }
    }

    fn ingest_detection(&mut self, event: DetectionEvent) {
        self.timeline.record(&event);
        self.traffic.record(&event.traffic_type);

        let (verdict, severity) = if event.is_malicious {
            ("THREAT DETECTED", Severity::Danger)
        } else {
            ("SAFE", Severity::Success)
        };
        self.logs
            .append(format!("{}: {}", event.traffic_type, verdict), severity);

        self.threats.ingest(event);
    }

    pub fn status(&self) -> &StatusSnapshot {
        self.status.current()
    }

    pub fn threats(&self) -> &ThreatWindow {
        &self.threats
    }

    pub fn logs(&self) -> &LogWindow {
        &self.logs
    }

    pub fn timeline(&self) -> &TimelineBuffer {
        &self.timeline
    }

    pub fn traffic(&self) -> &TrafficTally {
        &self.traffic
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DetectionPayload;
    use chrono::TimeZone;
    use serde_json::json;

    fn create_detection(value: serde_json::Value) -> DashboardMessage {
        let payload = DetectionPayload::from_value(value).unwrap();
        let received = Local.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        DashboardMessage::Detection(DetectionEvent::from_payload(payload, received))
    }

    #[test]
    fn test_safe_dns_detection() {
        let mut state = DashboardState::new();
        state.handle(create_detection(json!({
            "traffic_type": "DNS",
            "is_malicious": false,
            "confidence": 0.92,
            "timestamp": "2024-03-01T10:15:00"
        })));

        let entry = state.threats().newest().unwrap();
        assert_eq!(entry.event.traffic_type, "DNS");
        assert!(entry.event.threat_level.is_none());

        assert_eq!(state.traffic().iter().collect::<Vec<_>>(), vec![("DNS", 1)]);

        let points: Vec<_> = state.timeline().points().collect();
        assert_eq!(points.len(), 1);
        assert_eq!((points[0].threats, points[0].safe), (0, 1));

        let log = state.logs().newest().unwrap();
        assert_eq!(log.message, "DNS: SAFE");
        assert_eq!(log.severity, Severity::Success);
    }

    #[test]
    fn test_malicious_detection_log() {
        let mut state = DashboardState::new();
        state.handle(create_detection(json!({"traffic_type": "Port Scan", "is_malicious": true})));

        let log = state.logs().newest().unwrap();
        assert_eq!(log.message, "Port Scan: THREAT DETECTED");
        assert_eq!(log.severity, Severity::Danger);
    }

    #[test]
    fn test_fifty_one_detections() {
        let mut state = DashboardState::new();
        for i in 0..51 {
            state.handle(create_detection(json!({"traffic_type": format!("t{}", i)})));
        }

        assert_eq!(state.threats().len(), 50);
        assert!(state.threats().iter().all(|e| e.event.traffic_type != "t0"));
        assert_eq!(state.traffic().total(), 51);
        assert_eq!(state.timeline().len(), 15);
        assert_eq!(state.logs().len(), 20);
    }

    #[test]
    fn test_connection_lifecycle_logs() {
        let mut state = DashboardState::new();
        state.handle(DashboardMessage::TransportConnected);
        assert_eq!(state.logs().newest().unwrap().severity, Severity::Success);

        state.handle(DashboardMessage::TransportDisconnected {
            reason: "ping timeout".to_string(),
        });
        let log = state.logs().newest().unwrap();
        assert_eq!(log.severity, Severity::Danger);
        assert_eq!(log.message, "Connection lost - attempting reconnect");
    }

    #[test]
    fn test_clear_threats_logs_info() {
        let mut state = DashboardState::new();
        state.handle(create_detection(json!({"traffic_type": "HTTP"})));
        state.handle(DashboardMessage::ClearThreats);

        assert!(state.threats().is_empty());
        // chart buffers are not touched by clearing the feed
        assert_eq!(state.traffic().total(), 1);
        let log = state.logs().newest().unwrap();
        assert_eq!(log.message, "Threat list cleared by user");
        assert_eq!(log.severity, Severity::Info);
    }

    #[test]
    fn test_clear_logs() {
        let mut state = DashboardState::new();
        state.handle(DashboardMessage::TransportConnected);
        state.handle(DashboardMessage::ClearLogs);

        assert_eq!(state.logs().len(), 1);
        assert_eq!(state.logs().newest().unwrap().message, "System logs cleared");
    }

    #[test]
    fn test_status_replaced() {
        let mut state = DashboardState::new();
        let snapshot = StatusSnapshot {
            device_connected: true,
            total_checks: 10,
            threats_detected: 1,
            threat_rate: 10.0,
            last_update: None,
        };
        state.handle(DashboardMessage::Status(snapshot.clone()));
        assert_eq!(state.status(), &snapshot);

        state.handle(DashboardMessage::Status(StatusSnapshot::default()));
        assert_eq!(state.status(), &StatusSnapshot::default());
    }
}
