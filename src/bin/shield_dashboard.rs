use std::env;
use std::path::PathBuf;
use std::time::Duration;

use cybershield::config::Config;
use cybershield::output::{OutputFormat, OutputHandler};
use cybershield::DashboardRuntime;

/// Live security-monitoring dashboard entry point
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting CyberShield dashboard...");

    // Load configuration
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let config = Config::load(&config_path)?;

    log::info!("Sensor server: {}", config.server.url);

    let output = OutputHandler::new(
        OutputFormat::from_str(&config.output.format),
        config.output.file_path.clone(),
        config.output.clear_screen,
    )?;

    let runtime = tokio::runtime::Runtime::new()?;
    let dashboard = DashboardRuntime::new(config, output);

    // Setup graceful shutdown signal handling
    let quit = dashboard.quit_handle();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal, gracefully stopping...");
        quit.quit();
    })?;

    let result = runtime.block_on(dashboard.run());

    // A pending stdin read would otherwise keep the process alive.
    runtime.shutdown_timeout(Duration::from_millis(500));

    result?;
    Ok(())
}
