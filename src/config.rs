use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Environment variable overriding `server.url`
pub const SERVER_URL_ENV: &str = "CYBERSHIELD_SERVER_URL";

/// Configuration for the CyberShield dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sensor server connection
    pub server: ServerConfig,
    /// Status polling fallback
    pub polling: PollingConfig,
    /// Frame output
    pub output: OutputConfig,
}

/// Sensor server connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base HTTP URL of the sensor server
    pub url: String,
    /// Path of the Socket.IO endpoint
    pub socket_path: String,
    /// Socket.IO namespace to join
    pub namespace: String,
    /// Initial delay before reconnecting after a lost connection
    pub reconnect_delay_ms: u64,
    /// Upper bound for the reconnect delay
    pub reconnect_delay_max_ms: u64,
}

/// Status polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Poll the status endpoint alongside the push channel
    pub enabled: bool,
    /// Path of the status endpoint, relative to `server.url`
    pub status_path: String,
    /// Interval between polls
    pub interval_ms: u64,
    /// Per-request timeout
    pub request_timeout_ms: u64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "console", "json", or "jsonl"
    pub format: String,
    /// Output file path (stdout when absent)
    pub file_path: Option<PathBuf>,
    /// Clear the terminal before each console frame
    pub clear_screen: bool,
    /// Read operator commands from stdin
    pub accept_commands: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                url: "http://127.0.0.1:5002".to_string(),
                socket_path: "/socket.io/".to_string(),
                namespace: "/".to_string(),
                reconnect_delay_ms: 1000,
                reconnect_delay_max_ms: 5000,
            },
            polling: PollingConfig {
                enabled: true,
                status_path: "/api/status".to_string(),
                interval_ms: 5000,
                request_timeout_ms: 4000,
            },
            output: OutputConfig {
                format: "console".to_string(),
                file_path: None,
                clear_screen: true,
                accept_commands: true,
            },
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Load from `path` if it exists, else defaults, then apply env overrides
    pub fn load(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = if path.exists() {
            Config::from_file(path)?
        } else {
            log::warn!("Config file {:?} not found, using defaults", path);
            Config::default()
        };

        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            config.apply_server_url(url);
        }
        Ok(config)
    }

    fn apply_server_url(&mut self, url: String) {
        if !url.trim().is_empty() {
            log::info!("Using server URL from {}: {}", SERVER_URL_ENV, url);
            self.server.url = url;
        }
    }
}

impl ServerConfig {
    /// WebSocket URL of the Socket.IO endpoint (Engine.IO v4)
    pub fn socket_url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.url)?.join(&self.socket_path)?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        // Both schemes are special, so the switch cannot fail.
        let _ = url.set_scheme(scheme);
        url.query_pairs_mut()
            .clear()
            .append_pair("EIO", "4")
            .append_pair("transport", "websocket");
        Ok(url)
    }

    /// Delay before reconnect attempt number `attempt` (zero-based)
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.min(16)).unwrap_or(u64::MAX);
        let delay = self.reconnect_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.reconnect_delay_max_ms))
    }
}

impl PollingConfig {
    /// Full status endpoint URL against a server base URL
    pub fn status_url(&self, server_url: &str) -> Result<Url, url::ParseError> {
        Url::parse(server_url)?.join(&self.status_path)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url() {
        let config = Config::default();
        assert_eq!(
            config.server.socket_url().unwrap().as_str(),
            "ws://127.0.0.1:5002/socket.io/?EIO=4&transport=websocket"
        );

        let secure = ServerConfig {
            url: "https://sensor.example.com".to_string(),
            ..config.server
        };
        assert_eq!(
            secure.socket_url().unwrap().as_str(),
            "wss://sensor.example.com/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_status_url() {
        let config = Config::default();
        assert_eq!(
            config.polling.status_url(&config.server.url).unwrap().as_str(),
            "http://127.0.0.1:5002/api/status"
        );
    }

    #[test]
    fn test_reconnect_delay_backoff() {
        let server = Config::default().server;
        assert_eq!(server.reconnect_delay(0), Duration::from_millis(1000));
        assert_eq!(server.reconnect_delay(1), Duration::from_millis(2000));
        assert_eq!(server.reconnect_delay(2), Duration::from_millis(4000));
        assert_eq!(server.reconnect_delay(3), Duration::from_millis(5000));
        assert_eq!(server.reconnect_delay(60), Duration::from_millis(5000));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.polling.interval_ms = 2500;
        config.output.format = "jsonl".to_string();
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.polling.interval_ms, 2500);
        assert_eq!(loaded.output.format, "jsonl");
        assert_eq!(loaded.server.url, config.server.url);
    }

    #[test]
    fn test_apply_server_url_ignores_blank() {
        let mut config = Config::default();
        config.apply_server_url("  ".to_string());
        assert_eq!(config.server.url, "http://127.0.0.1:5002");

        config.apply_server_url("http://10.0.0.5:5002".to_string());
        assert_eq!(config.server.url, "http://10.0.0.5:5002");
    }
}
