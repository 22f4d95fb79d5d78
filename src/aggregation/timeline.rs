//! Threat/safe timeline chart buffer
//!
//! One point per detection, labelled with the event's local `HH:MM`.
//! Points are not merged by label, so the window is the last
//! [`TimelineBuffer::CAPACITY`] events rather than the last N minutes.

use std::collections::VecDeque;

use chrono::{DateTime, Local};

use crate::models::DetectionEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelinePoint<'a> {
    pub label: &'a str,
    pub threats: u32,
    pub safe: u32,
}

/// Three parallel series kept in lockstep, oldest point first
#[derive(Debug, Clone, Default)]
pub struct TimelineBuffer {
    labels: VecDeque<String>,
    threat_counts: VecDeque<u32>,
    safe_counts: VecDeque<u32>,
}

impl TimelineBuffer {
    pub const CAPACITY: usize = 15;

    pub fn new() -> Self {
        Self::default()
    }

    /// Minute-granularity bucket label in 24-hour format
    pub fn bucket_label(timestamp: &DateTime<Local>) -> String {
        timestamp.format("%H:%M").to_string()
    }

    pub fn record(&mut self, event: &DetectionEvent) {
        let (threat, safe) = if event.is_malicious { (1, 0) } else { (0, 1) };

        self.labels.push_back(Self::bucket_label(&event.timestamp));
        self.threat_counts.push_back(threat);
        self.safe_counts.push_back(safe);

        while self.labels.len() > Self::CAPACITY {
            self.labels.pop_front();
            self.threat_counts.pop_front();
            self.safe_counts.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn threat_counts(&self) -> impl Iterator<Item = u32> + '_ {
        self.threat_counts.iter().copied()
    }

    pub fn safe_counts(&self) -> impl Iterator<Item = u32> + '_ {
        self.safe_counts.iter().copied()
    }

    pub fn points(&self) -> impl Iterator<Item = TimelinePoint<'_>> {
        self.labels
            .iter()
            .zip(self.threat_counts.iter().zip(self.safe_counts.iter()))
            .map(|(label, (&threats, &safe))| TimelinePoint {
                label: label.as_str(),
                threats,
                safe,
            })
    }
}
