//! Offline event source
//!
//! Reads a JSONL file where every line is a Socket.IO event array such as
//! `["new_detection", {...}]`, and yields the same transport events a live
//! connection would.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use thiserror::Error;

use super::packet::split_event;
use super::socket_io::TransportEvent;

/// Only I/O failures end a replay; malformed lines are skipped
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct EventReplay {
    file_path: PathBuf,
}

impl EventReplay {
    pub fn new(file_path: PathBuf) -> Self {
        EventReplay { file_path }
    }

    /// Read every event in the file.
    ///
    /// Lines that are blank or not valid event arrays are skipped with a
    /// warning.
    pub fn read_events(&self) -> Result<Vec<TransportEvent>, ReplayError> {
        let reader = BufReader::new(File::open(&self.file_path)?);
        let mut events = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match Self::parse_line(&line) {
                Some(event) => events.push(event),
                None => log::warn!("{:?}:{}: not an event array, skipped", self.file_path, index + 1),
            }
        }

        Ok(events)
    }

    fn parse_line(line: &str) -> Option<TransportEvent> {
        let value = serde_json::from_str(line).ok()?;
        let (name, data) = split_event(Some(value)).ok()?;
        Some(TransportEvent::Event { name, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_parse_line() {
        let event = EventReplay::parse_line(r#"["status_update", {"total_checks": 4}]"#).unwrap();
        assert_eq!(
            event,
            TransportEvent::Event {
                name: "status_update".to_string(),
                data: json!({"total_checks": 4}),
            }
        );
        assert!(EventReplay::parse_line(r#"{"traffic_type": "DNS"}"#).is_none());
        assert!(EventReplay::parse_line("not json").is_none());
    }

    #[test]
    fn test_read_events_skips_bad_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"["new_detection", {{"traffic_type": "DNS"}}]"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "garbage").unwrap();
        writeln!(file, r#"["status_update", {{}}]"#).unwrap();

        let replay = EventReplay::new(file.path().to_path_buf());
        let events = replay.read_events().unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let replay = EventReplay::new(PathBuf::from("/nonexistent/events.jsonl"));
        assert!(matches!(replay.read_events(), Err(ReplayError::Io(_))));
    }
}
