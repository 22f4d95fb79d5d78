//! Operator commands read line by line from stdin

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::aggregation::DashboardMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ClearThreats,
    ClearLogs,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "t" | "clear threats" => Some(Command::ClearThreats),
            "l" | "clear logs" => Some(Command::ClearLogs),
            "q" | "quit" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

pub struct CommandReader;

impl CommandReader {
    /// Read commands until EOF, `quit`, or a closed channel.
    ///
    /// Clear commands go to the dashboard channel; `quit` is signalled on
    /// `quit_tx`.
    pub async fn run<R>(reader: R, tx: mpsc::Sender<DashboardMessage>, quit_tx: mpsc::Sender<()>)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    log::error!("Error reading commands: {}", e);
                    break;
                }
            };

            let message = match Command::parse(&line) {
                Some(Command::ClearThreats) => DashboardMessage::ClearThreats,
                Some(Command::ClearLogs) => DashboardMessage::ClearLogs,
                Some(Command::Quit) => {
                    let _ = quit_tx.try_send(());
                    break;
                }
                None => {
                    if !line.trim().is_empty() {
                        log::warn!("Unknown command: {} (t = clear threats, l = clear logs, q = quit)", line.trim());
                    }
                    continue;
                }
            };

            if tx.send(message).await.is_err() {
                break;
            }
        }
    }
}
