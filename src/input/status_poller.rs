//! Status polling fallback
//!
//! Periodically fetches the status endpoint and feeds the result through the
//! same replacement path as a pushed `status_update`. Failures are reported
//! to the operator log only and retried on the next tick.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use url::Url;

use crate::aggregation::DashboardMessage;
use crate::config::{PollingConfig, ServerConfig};
use crate::models::{StatusPayload, StatusSnapshot};

/// Errors that can occur while polling the status endpoint
#[derive(Error, Debug)]
pub enum PollError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid status URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Status response is not a JSON object")]
    NotAnObject,
}

pub struct StatusPoller {
    client: Client,
    url: Url,
    period: Duration,
}

impl StatusPoller {
    pub fn new(server: &ServerConfig, polling: &PollingConfig) -> Result<Self, PollError> {
        let client = Client::builder().timeout(polling.request_timeout()).build()?;
        Ok(StatusPoller {
            client,
            url: polling.status_url(&server.url)?,
            period: polling.interval(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch and normalize the current status once
    pub async fn fetch(&self) -> Result<StatusSnapshot, PollError> {
        let value: serde_json::Value = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let payload = StatusPayload::from_value(value).ok_or(PollError::NotAnObject)?;
        Ok(StatusSnapshot::from_payload(&payload))
    }

    /// Poll on a fixed interval until shutdown or until the channel closes.
    ///
    /// The first poll happens one full period after start.
    pub async fn run(self, tx: mpsc::Sender<DashboardMessage>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!("Status poller started for {} every {:?}", self.url, self.period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }

            let result = tokio::select! {
                result = self.fetch() => result,
                _ = shutdown.changed() => break,
            };

            match result {
                Ok(snapshot) => {
                    log::debug!("Fetched status via API: {:?}", snapshot);
                    if tx.send(DashboardMessage::Status(snapshot)).await.is_err() {
                        break;
                    }
                }
                Err(e) => log::warn!("Failed to fetch status: {}", e),
            }
        }

        log::info!("Status poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `body` with `status` to every connection
    async fn spawn_server(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (mut stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    fn create_poller(url: String, interval_ms: u64) -> StatusPoller {
        let mut config = Config::default();
        config.server.url = url;
        config.polling.interval_ms = interval_ms;
        StatusPoller::new(&config.server, &config.polling).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_normalizes() {
        let url = spawn_server("200 OK", r#"{"esp32_connected":true,"total_checks":"17"}"#).await;
        let poller = create_poller(url, 5000);

        let snapshot = poller.fetch().await.unwrap();
        assert!(snapshot.device_connected);
        assert_eq!(snapshot.total_checks, 17);
        assert_eq!(snapshot.threats_detected, 0);
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let url = spawn_server("500 Internal Server Error", "{}").await;
        let poller = create_poller(url, 5000);
        assert!(matches!(poller.fetch().await, Err(PollError::Http(_))));
    }

    #[tokio::test]
    async fn test_fetch_non_object() {
        let url = spawn_server("200 OK", "[1,2,3]").await;
        let poller = create_poller(url, 5000);
        assert!(matches!(poller.fetch().await, Err(PollError::NotAnObject)));
    }

    #[tokio::test]
    async fn test_run_sends_snapshots_and_stops() {
        let url = spawn_server("200 OK", r#"{"threats_detected":2}"#).await;
        let poller = create_poller(url, 20);
        let (tx, mut rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(poller.run(tx, shutdown_rx));

        match rx.recv().await {
            Some(DashboardMessage::Status(snapshot)) => assert_eq!(snapshot.threats_detected, 2),
            other => panic!("unexpected message {:?}", other),
        }

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("poller did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_survives_failures() {
        // nothing listens here once the listener is dropped
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let poller = create_poller(url, 10);
        let (tx, mut rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(poller.run(tx, shutdown_rx));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(rx.try_recv().is_err());
        assert!(!handle.is_finished());

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("poller did not stop")
            .unwrap();
    }
}
