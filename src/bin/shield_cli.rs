use std::path::PathBuf;
use structopt::StructOpt;

use cybershield::config::Config;
use cybershield::input::{EventReplay, StatusPoller, TransportListener};
use cybershield::output::{OutputFormat, OutputHandler};
use cybershield::DashboardRuntime;

/// CyberShield Command Line Interface
#[derive(StructOpt, Debug)]
#[structopt(name = "shield", about = "CyberShield security dashboard CLI")]
pub enum Cli {
    /// Generate a default configuration file
    Config {
        /// Output path for the configuration file
        #[structopt(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
    /// Replay recorded events from a JSONL file and print the resulting dashboard
    Replay {
        /// Path to the event file (one `["event", {...}]` array per line)
        #[structopt(short, long)]
        file: PathBuf,
        /// Output format: console, json or jsonl
        #[structopt(long, default_value = "console")]
        format: String,
    },
    /// Fetch the sensor status once and print it
    Status {
        /// Path to configuration file
        #[structopt(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();

    let cli = Cli::from_args();

    match cli {
        Cli::Config { output } => {
            let config = Config::default();
            config.to_file(&output)?;
            println!("Default configuration written to: {:?}", output);
        }
        Cli::Replay { file, format } => {
            if !file.exists() {
                eprintln!("File not found: {:?}", file);
                std::process::exit(1);
            }

            let events = EventReplay::new(file).read_events()?;
            let total = events.len();
            let messages: Vec<_> = events
                .into_iter()
                .filter_map(TransportListener::translate)
                .collect();
            log::info!("Replaying {} of {} event(s)", messages.len(), total);

            let view = DashboardRuntime::replay(messages);
            let mut output = OutputHandler::new(OutputFormat::from_str(&format), None, false)?;
            output.write_frame(&view)?;
        }
        Cli::Status { config } => {
            let config = Config::load(&config)?;
            let poller = StatusPoller::new(&config.server, &config.polling)?;

            let runtime = tokio::runtime::Runtime::new()?;
            match runtime.block_on(poller.fetch()) {
                Ok(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
                Err(e) => {
                    eprintln!("Failed to fetch status from {}: {}", poller.url(), e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
