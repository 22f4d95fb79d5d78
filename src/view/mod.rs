//! Presentation layer
//!
//! A pure function from dashboard state to a renderable view. Nothing here
//! owns state; display defaults (such as the LOW severity badge) are applied
//! only at this point and never written back.

pub mod format;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::aggregation::{DashboardState, ThreatEntry};
use crate::models::{LogEntry, StatusSnapshot, ThreatLevel};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub clock: String,
    pub metrics: Vec<MetricTile>,
    pub timeline: TimelineChart,
    pub traffic: TrafficChart,
    pub threats: Vec<ThreatRow>,
    pub logs: Vec<LogRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTile {
    pub title: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineChart {
    pub labels: Vec<String>,
    pub threats: Vec<u32>,
    pub safe: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficSlice {
    pub label: String,
    pub count: u64,
    /// Share of the tally in percent
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficChart {
    pub slices: Vec<TrafficSlice>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatRow {
    pub id: u64,
    pub traffic_type: String,
    /// "MALICIOUS" or "SAFE"
    pub verdict: &'static str,
    pub severity: &'static str,
    pub ports: String,
    pub confidence: String,
    pub time: String,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRow {
    pub id: u64,
    pub severity: &'static str,
    pub time: String,
    pub message: String,
}

impl DashboardView {
    pub fn build(state: &DashboardState, now: DateTime<Local>) -> Self {
        let timeline = state.timeline();
        let traffic = state.traffic();
        let total = traffic.total();

        DashboardView {
            clock: format::clock_time(&now),
            metrics: metric_tiles(state.status()),
            timeline: TimelineChart {
                labels: timeline.labels().map(str::to_string).collect(),
                threats: timeline.threat_counts().collect(),
                safe: timeline.safe_counts().collect(),
            },
            traffic: TrafficChart {
                slices: traffic
                    .iter()
                    .map(|(label, count)| TrafficSlice {
                        label: label.to_string(),
                        count,
                        share: if total == 0 { 0.0 } else { count as f64 * 100.0 / total as f64 },
                    })
                    .collect(),
                total,
            },
            threats: state.threats().iter().map(ThreatRow::from_entry).collect(),
            logs: state.logs().iter().map(LogRow::from_entry).collect(),
        }
    }
}

fn metric_tiles(status: &StatusSnapshot) -> Vec<MetricTile> {
    vec![
        MetricTile {
            title: "ESP32 Device",
            value: if status.device_connected { "ONLINE" } else { "OFFLINE" }.to_string(),
        },
        MetricTile {
            title: "Security Scans",
            value: format::group_thousands(status.total_checks),
        },
        MetricTile {
            title: "Threats Detected",
            value: format::group_thousands(status.threats_detected),
        },
        MetricTile {
            title: "Risk Level",
            value: format::rate_percent(status.threat_rate),
        },
    ]
}

impl ThreatRow {
    pub fn from_entry(entry: &ThreatEntry) -> Self {
        let event = &entry.event;
        ThreatRow {
            id: entry.id,
            traffic_type: event.traffic_type.clone(),
            verdict: if event.is_malicious { "MALICIOUS" } else { "SAFE" },
            severity: event.threat_level.unwrap_or(ThreatLevel::DISPLAY_DEFAULT).as_str(),
            ports: event.port_summary(),
            confidence: format::confidence_percent(event.confidence),
            time: format::clock_time(&event.timestamp),
            recommendation: event.recommendation.clone(),
        }
    }
}

impl LogRow {
    pub fn from_entry(entry: &LogEntry) -> Self {
        LogRow {
            id: entry.id,
            severity: entry.severity.as_str(),
            time: format::clock_time(&entry.timestamp),
            message: entry.message.clone(),
        }
    }
}
