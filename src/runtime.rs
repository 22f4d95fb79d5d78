//! Dashboard event loop
//!
//! Every source (transport, poller, operator commands) runs as its own task
//! and only sends [`DashboardMessage`]s. This loop is the single owner of
//! [`DashboardState`] and applies each message to completion before taking
//! the next, so no two mutations ever interleave.

use std::time::Duration;

use chrono::Local;
use thiserror::Error;
use tokio::io::BufReader;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::aggregation::{DashboardMessage, DashboardState};
use crate::config::Config;
use crate::input::socket_io::TransportError;
use crate::input::status_poller::PollError;
use crate::input::{CommandReader, SocketIoClient, StatusPoller, TransportListener};
use crate::output::{OutputError, OutputHandler};
use crate::view::DashboardView;

const CHANNEL_CAPACITY: usize = 256;
const CLOCK_PERIOD: Duration = Duration::from_secs(1);
const STOP_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Transport setup failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Poller setup failed: {0}")]
    Poller(#[from] PollError),
}

/// Handle used to stop a running dashboard from outside (e.g. Ctrl+C)
#[derive(Clone)]
pub struct QuitHandle {
    tx: mpsc::Sender<()>,
}

impl QuitHandle {
    /// Request shutdown. Safe to call from any thread.
    pub fn quit(&self) {
        let _ = self.tx.try_send(());
    }
}

pub struct DashboardRuntime {
    config: Config,
    output: OutputHandler,
    state: DashboardState,
    quit_tx: mpsc::Sender<()>,
    quit_rx: mpsc::Receiver<()>,
}

impl DashboardRuntime {
    pub fn new(config: Config, output: OutputHandler) -> Self {
        let (quit_tx, quit_rx) = mpsc::channel(1);
        DashboardRuntime {
            config,
            output,
            state: DashboardState::new(),
            quit_tx,
            quit_rx,
        }
    }

    pub fn quit_handle(&self) -> QuitHandle {
        QuitHandle {
            tx: self.quit_tx.clone(),
        }
    }

    /// Run until a quit is requested, then release the connection and the
    /// polling timer before returning.
    pub async fn run(mut self) -> Result<(), RuntimeError> {
        let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let client = SocketIoClient::new(&self.config.server)?;
        let (transport_tx, transport_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let mut workers: Vec<(&str, JoinHandle<()>)> = vec![
            ("transport", tokio::spawn(client.run(transport_tx, shutdown_rx.clone()))),
            ("listener", tokio::spawn(TransportListener::run(transport_rx, tx.clone()))),
        ];

        if self.config.polling.enabled {
            let poller = StatusPoller::new(&self.config.server, &self.config.polling)?;
            workers.push(("poller", tokio::spawn(poller.run(tx.clone(), shutdown_rx.clone()))));
        } else {
            log::info!("Status polling disabled");
        }

        // stdin reads cannot be cancelled, so this task is aborted rather than joined
        let commands = self.config.output.accept_commands.then(|| {
            let stdin = BufReader::new(tokio::io::stdin());
            tokio::spawn(CommandReader::run(stdin, tx.clone(), self.quit_tx.clone()))
        });
        drop(tx);

        log::info!("Dashboard running. Press Ctrl+C to stop.");
        let outcome = match self.render() {
            Ok(()) => self.event_loop(&mut rx).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &outcome {
            log::error!("Output failed, stopping dashboard: {}", e);
        }

        let _ = shutdown_tx.send(true);
        if let Some(commands) = commands {
            commands.abort();
        }
        // Drain so that no worker blocks on a full channel while stopping.
        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });

        for (name, handle) in workers.drain(..) {
            match tokio::time::timeout(STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => log::debug!("{} stopped", name),
                Ok(Err(e)) => log::error!("{} task failed: {}", name, e),
                Err(_) => log::warn!("{} did not stop within {:?}", name, STOP_TIMEOUT),
            }
        }
        drain.abort();

        outcome?;
        self.output.flush()?;
        log::info!("Dashboard stopped");
        Ok(())
    }

    /// Apply messages and render frames until a quit request, or until every
    /// source has stopped
    async fn event_loop(
        &mut self,
        rx: &mut mpsc::Receiver<DashboardMessage>,
    ) -> Result<(), OutputError> {
        let mut clock = tokio::time::interval(CLOCK_PERIOD);
        clock.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some(message) => {
                        self.state.handle(message);
                        self.render()?;
                    }
                    None => {
                        log::warn!("All event sources stopped");
                        return Ok(());
                    }
                },
                _ = clock.tick() => {
                    if self.output.wants_clock_frames() {
                        self.render()?;
                    }
                }
                _ = self.quit_rx.recv() => {
                    log::info!("Shutdown requested, stopping dashboard...");
                    return Ok(());
                }
            }
        }
    }

    fn render(&mut self) -> Result<(), OutputError> {
        let view = DashboardView::build(&self.state, Local::now());
        self.output.write_frame(&view)
    }

    /// Apply messages without any live source and return the final view
    pub fn replay<I>(messages: I) -> DashboardView
    where
        I: IntoIterator<Item = DashboardMessage>,
    {
        let mut state = DashboardState::new();
        for message in messages {
            state.handle(message);
        }
        DashboardView::build(&state, Local::now())
    }
}
