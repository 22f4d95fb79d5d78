use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;

/// Raw `status_update` payload (also the shape of the polled status endpoint)
///
/// A missing field means "unknown/zero", never "unchanged".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusPayload {
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub esp32_connected: Option<bool>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_checks: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub threats_detected: Option<u64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub threat_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub last_update: Option<DateTime<Local>>,
}

impl StatusPayload {
    /// Decode a payload, returning `None` if the value is not a JSON object
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }
}

/// Latest known operational state of the sensor device
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub device_connected: bool,
    pub total_checks: u64,
    pub threats_detected: u64,
    /// Percentage of checks classified malicious
    pub threat_rate: f64,
    pub last_update: Option<DateTime<Local>>,
}

impl StatusSnapshot {
    /// Build a fully-populated snapshot from a payload.
    ///
    /// Pure: only the payload is consulted, never a previous snapshot.
    pub fn from_payload(payload: &StatusPayload) -> Self {
        StatusSnapshot {
            device_connected: payload.esp32_connected.unwrap_or(false),
            total_checks: payload.total_checks.unwrap_or(0),
            threats_detected: payload.threats_detected.unwrap_or(0),
            threat_rate: payload.threat_rate.unwrap_or(0.0),
            last_update: payload.last_update,
        }
    }
}
