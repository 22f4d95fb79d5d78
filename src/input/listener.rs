use chrono::Local;
use tokio::sync::mpsc;

use super::socket_io::TransportEvent;
use crate::aggregation::DashboardMessage;
use crate::models::{DetectionEvent, DetectionPayload, StatusPayload, StatusSnapshot};

pub const DETECTION_EVENT: &str = "new_detection";
pub const STATUS_EVENT: &str = "status_update";

/// Turns transport notifications into dashboard messages
///
/// Detection and status payloads are normalized here, so the state
/// container only ever sees fully-populated records.
pub struct TransportListener;

impl TransportListener {
    pub fn translate(event: TransportEvent) -> Option<DashboardMessage> {
        match event {
            TransportEvent::Connected => Some(DashboardMessage::TransportConnected),
            TransportEvent::Disconnected { reason } => {
                Some(DashboardMessage::TransportDisconnected { reason })
            }
            TransportEvent::Event { name, data } => match name.as_str() {
                DETECTION_EVENT => match DetectionPayload::from_value(data) {
                    Some(payload) => Some(DashboardMessage::Detection(
                        DetectionEvent::from_payload(payload, Local::now()),
                    )),
                    None => {
                        log::warn!("Discarding {} payload that is not an object", name);
                        None
                    }
                },
                STATUS_EVENT => match StatusPayload::from_value(data) {
                    Some(payload) => Some(DashboardMessage::Status(StatusSnapshot::from_payload(
                        &payload,
                    ))),
                    None => {
                        log::warn!("Discarding {} payload that is not an object", name);
                        None
                    }
                },
                other => {
                    log::debug!("Ignoring event '{}'", other);
                    None
                }
            },
        }
    }

    /// Forward translated messages until either channel closes
    pub async fn run(mut rx: mpsc::Receiver<TransportEvent>, tx: mpsc::Sender<DashboardMessage>) {
        while let Some(event) = rx.recv().await {
            if let Some(message) = Self::translate(event) {
                if tx.send(message).await.is_err() {
                    log::info!("Dashboard channel closed, stopping transport listener");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ThreatLevel;
    use serde_json::json;

    fn create_event(name: &str, data: serde_json::Value) -> TransportEvent {
        TransportEvent::Event {
            name: name.to_string(),
            data,
        }
    }

    #[test]
    fn test_detection_translated() {
        let message = TransportListener::translate(create_event(
            DETECTION_EVENT,
            json!({"traffic_type": "SSH", "is_malicious": true, "threat_level": "MEDIUM"}),
        ));

        match message {
            Some(DashboardMessage::Detection(event)) => {
                assert_eq!(event.traffic_type, "SSH");
                assert!(event.is_malicious);
                assert_eq!(event.threat_level, Some(ThreatLevel::Medium));
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_status_translated_with_defaults() {
        let message = TransportListener::translate(create_event(STATUS_EVENT, json!({"threat_rate": 12.5})));
        assert_eq!(
            message,
            Some(DashboardMessage::Status(StatusSnapshot {
                threat_rate: 12.5,
                ..StatusSnapshot::default()
            }))
        );
    }

    #[test]
    fn test_lifecycle_translated() {
        assert_eq!(
            TransportListener::translate(TransportEvent::Connected),
            Some(DashboardMessage::TransportConnected)
        );
        assert_eq!(
            TransportListener::translate(TransportEvent::Disconnected { reason: "x".to_string() }),
            Some(DashboardMessage::TransportDisconnected { reason: "x".to_string() })
        );
    }

    #[test]
    fn test_unknown_and_malformed_ignored() {
        assert!(TransportListener::translate(create_event("traffic_stats", json!({}))).is_none());
        assert!(TransportListener::translate(create_event(DETECTION_EVENT, json!([1, 2]))).is_none());
        assert!(TransportListener::translate(create_event(STATUS_EVENT, json!(null))).is_none());
    }

    #[tokio::test]
    async fn test_run_forwards_until_closed() {
        let (transport_tx, transport_rx) = mpsc::channel(8);
        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(TransportListener::run(transport_rx, tx));

        transport_tx.send(TransportEvent::Connected).await.unwrap();
        transport_tx.send(create_event("noise", json!({}))).await.unwrap();
        transport_tx
            .send(create_event(DETECTION_EVENT, json!({"traffic_type": "DNS"})))
            .await
            .unwrap();
        drop(transport_tx);

        assert_eq!(rx.recv().await, Some(DashboardMessage::TransportConnected));
        assert!(matches!(rx.recv().await, Some(DashboardMessage::Detection(_))));
        assert_eq!(rx.recv().await, None);
        handle.await.unwrap();
    }
}
