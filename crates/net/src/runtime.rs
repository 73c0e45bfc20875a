//! Client runtime integration.
//!
//! Bridges a synchronous caller (a terminal loop, a test) with the async
//! client. The runtime owns its own tokio runtime; events are polled with
//! `try_recv` and commands are sent with `send`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::client::{ClientEvent, GameClient};
use crate::config::ClientConfig;
use crate::error::NetError;
use crate::wire_log::WireLog;
use net_tetris_core::{Board, Tetromino};
use net_tetris_types::{Command, ConnectionState};

/// Running client instance.
pub struct ClientRuntime {
    rt: Runtime,
    client: Arc<GameClient>,
    events_rx: mpsc::UnboundedReceiver<ClientEvent>,
}

impl ClientRuntime {
    /// Start the runtime and connect using `config`.
    pub fn start(config: ClientConfig) -> Result<Self> {
        let rt = Runtime::new().context("failed to create tokio runtime")?;

        let wire_log = config.log_path.as_ref().map(|path| {
            let _guard = rt.enter();
            WireLog::spawn(path)
        });
        let (client, events_rx) = GameClient::new(&config, wire_log);
        let client = Arc::new(client);

        rt.block_on(client.connect(&config.host, config.port))
            .with_context(|| format!("connecting to {}:{}", config.host, config.port))?;

        Ok(Self {
            rt,
            client,
            events_rx,
        })
    }

    /// Start from environment variables.
    pub fn start_from_env() -> Result<Self> {
        Self::start(ClientConfig::from_env())
    }

    /// Predict and send one command; see [`GameClient::send_command`].
    pub fn send(&self, command: Command) -> Result<bool, NetError> {
        self.rt.block_on(self.client.send_command(command))
    }

    pub fn try_recv(&mut self) -> Option<ClientEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<ClientEvent> {
        let events_rx = &mut self.events_rx;
        self.rt
            .block_on(async { tokio::time::timeout(timeout, events_rx.recv()).await })
            .ok()
            .flatten()
    }

    pub fn state(&self) -> ConnectionState {
        self.client.state()
    }

    pub fn board(&self) -> Board {
        self.client.board()
    }

    pub fn active_piece(&self) -> Option<Tetromino> {
        self.client.active_piece()
    }

    pub fn disconnect(&self) {
        self.rt.block_on(self.client.disconnect());
    }
}

impl Drop for ClientRuntime {
    fn drop(&mut self) {
        self.rt.block_on(self.client.disconnect());
    }
}
