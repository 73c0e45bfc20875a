//! Network layer: framing, connection, client, and reference server
//!
//! The wire format is a length-prefixed stream of UTF-8 payloads
//! (`"<len>:" + payload`) over one TCP connection:
//!
//! - client → server: command literals (`move_left`, `rotate`, ...)
//! - server → client: 200-character `'0'`/`'1'` board snapshots, plus the
//!   `game_over` control message
//!
//! # Module Structure
//!
//! - [`framing`]: frame encoder and incremental, cancel-safe frame reader
//! - [`protocol`]: payload classification and command literals
//! - [`connection`]: stream lifecycle, send lock, background receive task
//! - [`client`]: connection + prediction state, pushed as [`ClientEvent`]s
//! - [`runtime`]: synchronous bridge owning a tokio runtime
//! - [`server`]: reference server running one session per client
//! - [`config`]: environment-driven configuration
//! - [`wire_log`]: optional JSON-lines traffic log

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod framing;
pub mod protocol;
pub mod runtime;
pub mod server;
pub mod wire_log;

pub use client::{ClientEvent, GameClient};
pub use config::{ClientConfig, ServerConfig};
pub use connection::{Connection, NetEvent};
pub use error::{FrameError, NetError};
pub use framing::{encode_frame, parse_length, write_frame, FrameReader, DEFAULT_MAX_FRAME};
pub use protocol::{classify, command_payload, parse_command, InboundMessage};
pub use runtime::ClientRuntime;
pub use server::run_server;
pub use wire_log::{Direction, WireLog, WireRecord};
