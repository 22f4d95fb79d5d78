use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;

/// Coarse severity label attached to a detection by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

impl ThreatLevel {
    /// Level shown for events whose payload carried none
    pub const DISPLAY_DEFAULT: ThreatLevel = ThreatLevel::Low;

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(ThreatLevel::Low),
            "MEDIUM" => Some(ThreatLevel::Medium),
            "HIGH" => Some(ThreatLevel::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "LOW",
            ThreatLevel::Medium => "MEDIUM",
            ThreatLevel::High => "HIGH",
        }
    }
}

/// Raw `new_detection` payload as sent by the sensor server
///
/// Every field is optional and tolerant of wrong types; see
/// [`DetectionEvent::from_payload`] for the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectionPayload {
    #[serde(default, deserialize_with = "lenient::string")]
    pub traffic_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub is_malicious: Option<bool>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub threat_level: Option<String>,
    #[serde(default, deserialize_with = "lenient::port")]
    pub id_orig_p: Option<u16>,
    #[serde(default, deserialize_with = "lenient::port")]
    pub id_resp_p: Option<u16>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub ports: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub recommendation: Option<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub timestamp: Option<DateTime<Local>>,
}

impl DetectionPayload {
    /// Decode a payload from a JSON value.
    ///
    /// Returns `None` only when the value is not a JSON object; individual
    /// malformed fields never fail decoding.
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }
}

/// A normalized detection, immutable once ingested
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionEvent {
    pub traffic_type: String,
    pub is_malicious: bool,
    /// Classifier confidence in `[0, 1]`
    pub confidence: f64,
    /// `None` when the sensor did not classify severity
    pub threat_level: Option<ThreatLevel>,
    pub source_port: Option<u16>,
    pub dest_port: Option<u16>,
    /// Preformatted port description from the sensor, if any
    pub ports: Option<String>,
    pub recommendation: Option<String>,
    pub timestamp: DateTime<Local>,
}

impl DetectionEvent {
    pub const UNKNOWN_TRAFFIC: &'static str = "Unknown";

    /// Fill every missing field of a payload.
    ///
    /// `received_at` stands in for an absent or unparsable timestamp.
    pub fn from_payload(payload: DetectionPayload, received_at: DateTime<Local>) -> Self {
        DetectionEvent {
            traffic_type: payload
                .traffic_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| Self::UNKNOWN_TRAFFIC.to_string()),
            is_malicious: payload.is_malicious.unwrap_or(false),
            confidence: payload.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
            threat_level: payload.threat_level.as_deref().and_then(ThreatLevel::parse),
            source_port: payload.id_orig_p,
            dest_port: payload.id_resp_p,
            ports: payload.ports.filter(|p| !p.is_empty()),
            recommendation: payload.recommendation.filter(|r| !r.is_empty()),
            timestamp: payload.timestamp.unwrap_or(received_at),
        }
    }

    /// Human-readable port description
    pub fn port_summary(&self) -> String {
        if let Some(ref ports) = self.ports {
            return ports.clone();
        }
        let fmt = |p: Option<u16>| p.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string());
        format!("{} → {}", fmt(self.source_port), fmt(self.dest_port))
    }
}
