//! Rolling feed of operational messages
//!
//! Newest first, bounded to [`LogWindow::CAPACITY`] entries, never empty
//! after a clear.

use std::collections::VecDeque;

use chrono::{DateTime, Local};

use crate::models::{LogEntry, Severity};

#[derive(Debug, Clone)]
pub struct LogWindow {
    entries: VecDeque<LogEntry>,
    next_id: u64,
}

impl LogWindow {
    pub const CAPACITY: usize = 20;
    pub const CLEARED_MESSAGE: &'static str = "System logs cleared";

    /// Create an empty window
    pub fn new() -> Self {
        LogWindow {
            entries: VecDeque::with_capacity(Self::CAPACITY + 1),
            next_id: 1,
        }
    }

    /// Create a window holding the boot messages, newest first
    pub fn with_boot_messages(now: DateTime<Local>) -> Self {
        let mut window = Self::new();
        window.append_at("Waiting for ESP32 connection...", Severity::Warning, now);
        window.append_at("Database connection established", Severity::Info, now);
        window.append_at("CyberShield platform initialized", Severity::Success, now);
        window
    }

    pub fn append(&mut self, message: impl Into<String>, severity: Severity) -> u64 {
        self.append_at(message, severity, Local::now())
    }

    /// Prepend an entry stamped with `timestamp`, evicting past capacity
    pub fn append_at(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        timestamp: DateTime<Local>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.entries.push_front(LogEntry {
            id,
            severity,
            message: message.into(),
            timestamp,
        });
        self.entries.truncate(Self::CAPACITY);
        id
    }

    /// Replace the whole window with a single confirmation entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.append(Self::CLEARED_MESSAGE, Severity::Info);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }
}

impl Default for LogWindow {
    fn default() -> Self {
        Self::new()
    }
}
