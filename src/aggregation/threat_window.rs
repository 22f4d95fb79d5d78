//! Rolling feed of recent detections
//!
//! Newest first, bounded to [`ThreatWindow::CAPACITY`] entries.

use std::collections::VecDeque;

use serde::Serialize;

use crate::models::DetectionEvent;

/// A detection keyed by a locally-assigned id
///
/// The id is independent of the event content, so two identical payloads
/// are still distinct entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatEntry {
    pub id: u64,
    pub event: DetectionEvent,
}

#[derive(Debug, Clone)]
pub struct ThreatWindow {
    entries: VecDeque<ThreatEntry>,
    next_id: u64,
}

impl ThreatWindow {
    pub const CAPACITY: usize = 50;

    pub fn new() -> Self {
        ThreatWindow {
            entries: VecDeque::with_capacity(Self::CAPACITY + 1),
            next_id: 1,
        }
    }

    /// Prepend a detection and evict from the tail past capacity.
    ///
    /// Returns the id assigned to the entry.
    pub fn ingest(&mut self, event: DetectionEvent) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.entries.push_front(ThreatEntry { id, event });
        self.entries.truncate(Self::CAPACITY);
        id
    }

    /// Drop every entry. Ids keep increasing across clears.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &ThreatEntry> {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&ThreatEntry> {
        self.entries.front()
    }
}

impl Default for ThreatWindow {
    fn default() -> Self {
        Self::new()
    }
}
