use crate::view::DashboardView;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;

const RULE: &str = "------------------------------------------------------------------------";
const BAR_WIDTH: usize = 24;
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Output handler for dashboard frames
pub struct OutputHandler {
    format: OutputFormat,
    writer: Option<Box<dyn Write + Send>>,
    clear_screen: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Console,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "jsonl" => OutputFormat::Jsonl,
            "console" => OutputFormat::Console,
            _ => OutputFormat::Console, // Default
        }
    }
}

impl OutputHandler {
    /// Create a new output handler; frames go to stdout unless a file is given
    pub fn new(
        format: OutputFormat,
        file_path: Option<PathBuf>,
        clear_screen: bool,
    ) -> Result<Self, OutputError> {
        let writer: Option<Box<dyn Write + Send>> = match file_path {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(Box::new(BufWriter::new(file)))
            }
            None => None,
        };

        // Escape codes only make sense on a terminal.
        let clear_screen = clear_screen && writer.is_none() && format == OutputFormat::Console;

        Ok(OutputHandler {
            format,
            writer,
            clear_screen,
        })
    }

    /// Whether frames should be redrawn for clock ticks alone
    pub fn wants_clock_frames(&self) -> bool {
        self.format == OutputFormat::Console
    }

    /// Write one dashboard frame
    pub fn write_frame(&mut self, view: &DashboardView) -> Result<(), OutputError> {
        let data = match self.format {
            OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(view)?),
            OutputFormat::Jsonl => format!("{}\n", serde_json::to_string(view)?),
            OutputFormat::Console => {
                let mut frame = String::new();
                if self.clear_screen {
                    frame.push_str(CLEAR_SCREEN);
                }
                frame.push_str(&render_console(view));
                frame
            }
        };
        self.write_output(&data)
    }

    fn write_output(&mut self, data: &str) -> Result<(), OutputError> {
        match &mut self.writer {
            Some(writer) => {
                writer.write_all(data.as_bytes())?;
                writer.flush()?;
            }
            None => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                lock.write_all(data.as_bytes())?;
                lock.flush()?;
            }
        }
        Ok(())
    }

    /// Flush any buffered output
    pub fn flush(&mut self) -> Result<(), OutputError> {
        if let Some(writer) = &mut self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Render a frame as plain text
pub fn render_console(view: &DashboardView) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "CyberShield - ESP32 Security Platform{:>35}", format!("LIVE {}", view.clock));
    let _ = writeln!(out, "{}", RULE);

    let tiles: Vec<String> = view
        .metrics
        .iter()
        .map(|m| format!("{}: {}", m.title, m.value))
        .collect();
    let _ = writeln!(out, "{}", tiles.join(" | "));
    let _ = writeln!(out, "{}", RULE);

    let _ = writeln!(out, "Threat Detection Timeline");
    if view.timeline.labels.is_empty() {
        let _ = writeln!(out, "  (no detections yet)");
    } else {
        let _ = writeln!(out, "  threats {}", sparkline(&view.timeline.threats));
        let _ = writeln!(out, "  safe    {}", sparkline(&view.timeline.safe));
        let _ = writeln!(
            out,
            "  {} .. {} ({} points)",
            view.timeline.labels[0],
            view.timeline.labels[view.timeline.labels.len() - 1],
            view.timeline.labels.len()
        );
    }

    let _ = writeln!(out, "Traffic Analysis");
    if view.traffic.slices.is_empty() {
        let _ = writeln!(out, "  Waiting for traffic data...");
    }
    for slice in &view.traffic.slices {
        let filled = ((slice.share / 100.0) * BAR_WIDTH as f64).round() as usize;
        let _ = writeln!(
            out,
            "  {:<16} {:>6} {:>5.1}% {}",
            slice.label,
            slice.count,
            slice.share,
            "#".repeat(filled.min(BAR_WIDTH))
        );
    }
    let _ = writeln!(out, "{}", RULE);

    let _ = writeln!(out, "Live Threat Detection ({})", view.threats.len());
    if view.threats.is_empty() {
        let _ = writeln!(out, "  Waiting for ESP32 device connection...");
    }
    for row in &view.threats {
        let _ = writeln!(
            out,
            "  [{}] {:<16} {:<9} {:<6} {:>6}  {}",
            row.time, row.traffic_type, row.verdict, row.severity, row.confidence, row.ports
        );
    }
    let _ = writeln!(out, "{}", RULE);

    let _ = writeln!(out, "System Monitor");
    for row in &view.logs {
        let _ = writeln!(out, "  [{}] {:<7} {}", row.time, row.severity.to_uppercase(), row.message);
    }

    out
}

/// One glyph per point, `█` for 1 and `·` for 0
fn sparkline(series: &[u32]) -> String {
    series.iter().map(|&v| if v > 0 { '█' } else { '·' }).collect()
}
