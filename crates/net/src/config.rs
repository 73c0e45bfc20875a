//! Client and server configuration
//!
//! Both configs are read from `NET_TETRIS_*` environment variables, with
//! defaults for anything unset or unparsable. Command-line flags are applied
//! on top by the binary.

use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};

use crate::framing::DEFAULT_MAX_FRAME;
use net_tetris_types::{DEFAULT_HOST, DEFAULT_PORT, SESSION_SECS};

pub const ENV_HOST: &str = "NET_TETRIS_HOST";
pub const ENV_PORT: &str = "NET_TETRIS_PORT";
pub const ENV_LOG_PATH: &str = "NET_TETRIS_LOG_PATH";
pub const ENV_MAX_FRAME: &str = "NET_TETRIS_MAX_FRAME";
pub const ENV_SEED: &str = "NET_TETRIS_SEED";
pub const ENV_GRAVITY: &str = "NET_TETRIS_GRAVITY";
pub const ENV_SESSION_SECS: &str = "NET_TETRIS_SESSION_SECS";

fn lookup_string<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|s| s.trim().to_string())
        .and_then(|s| if s.is_empty() { None } else { Some(s) })
}

fn lookup_parse<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup_string(lookup, name).and_then(|s| s.parse().ok())
}

fn lookup_flag<F>(lookup: &F, name: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup_string(lookup, name)
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok()
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub max_frame: usize,
    pub log_path: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_frame: DEFAULT_MAX_FRAME,
            log_path: None,
        }
    }
}

impl ClientConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    /// Create from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: lookup_string(&lookup, ENV_HOST).unwrap_or(defaults.host),
            port: lookup_parse(&lookup, ENV_PORT).unwrap_or(defaults.port),
            max_frame: lookup_parse(&lookup, ENV_MAX_FRAME).unwrap_or(defaults.max_frame),
            log_path: lookup_string(&lookup, ENV_LOG_PATH),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_frame: usize,
    pub log_path: Option<String>,
    /// Fixed piece seed; every client session gets the same sequence
    pub seed: Option<u32>,
    pub gravity: bool,
    pub session_secs: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_frame: DEFAULT_MAX_FRAME,
            log_path: None,
            seed: None,
            gravity: false,
            session_secs: SESSION_SECS,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: lookup_string(&lookup, ENV_HOST).unwrap_or(defaults.host),
            port: lookup_parse(&lookup, ENV_PORT).unwrap_or(defaults.port),
            max_frame: lookup_parse(&lookup, ENV_MAX_FRAME).unwrap_or(defaults.max_frame),
            log_path: lookup_string(&lookup, ENV_LOG_PATH),
            seed: lookup_parse(&lookup, ENV_SEED),
            gravity: lookup_flag(&lookup, ENV_GRAVITY),
            session_secs: lookup_parse(&lookup, ENV_SESSION_SECS)
                .unwrap_or(defaults.session_secs),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
