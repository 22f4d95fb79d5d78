use crate::models::{StatusPayload, StatusSnapshot};

/// Holds the current device status, replaced wholesale on each update
#[derive(Debug, Clone, Default)]
pub struct StatusAggregator {
    current: StatusSnapshot,
}

impl StatusAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &StatusSnapshot {
        &self.current
    }

    pub fn replace(&mut self, snapshot: StatusSnapshot) {
        self.current = snapshot;
    }

    /// Normalize a raw payload and install it as the current status
    pub fn apply(&mut self, payload: &StatusPayload) -> &StatusSnapshot {
        self.replace(StatusSnapshot::from_payload(payload));
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_payload(value: serde_json::Value) -> StatusPayload {
        StatusPayload::from_value(value).unwrap()
    }

    #[test]
    fn test_replacement_does_not_merge() {
        let mut aggregator = StatusAggregator::new();
        aggregator.apply(&create_payload(json!({
            "esp32_connected": true,
            "total_checks": 40,
            "threats_detected": 4,
            "threat_rate": 10.0
        })));
        assert_eq!(aggregator.current().total_checks, 40);

        aggregator.apply(&create_payload(json!({"threats_detected": 5})));

        let current = aggregator.current();
        assert_eq!(current.total_checks, 0);
        assert_eq!(current.threats_detected, 5);
        assert!(!current.device_connected);
        assert_eq!(current.threat_rate, 0.0);
    }

    #[test]
    fn test_apply_twice_same_result() {
        let payload = create_payload(json!({"esp32_connected": true, "total_checks": 9}));
        let mut aggregator = StatusAggregator::new();

        let first = aggregator.apply(&payload).clone();
        let second = aggregator.apply(&payload).clone();
        assert_eq!(first, second);
    }
}
