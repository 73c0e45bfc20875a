//! JSON-lines log of framed traffic
//!
//! Each payload sent or received is appended as one line:
//! `{"ts_ms":…,"dir":"in"|"out","peer":"…","payload":"…"}`.
//! Records go through an unbounded channel to a background writer task, so
//! logging never blocks the connection that produced the record.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

/// Traffic direction, relative to the process writing the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// One logged payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRecord {
    pub ts_ms: u64,
    pub dir: Direction,
    pub peer: String,
    pub payload: String,
}

impl WireRecord {
    pub fn new(dir: Direction, peer: impl Into<String>, payload: impl Into<String>) -> Self {
        let ts_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            ts_ms,
            dir,
            peer: peer.into(),
            payload: payload.into(),
        }
    }
}

/// Cloneable handle to the log writer task
#[derive(Debug, Clone)]
pub struct WireLog {
    tx: mpsc::UnboundedSender<WireRecord>,
}

impl WireLog {
    /// Spawn the writer task appending to `path`.
    ///
    /// Must be called from inside a tokio runtime. If the file cannot be
    /// opened the task logs a warning and records are dropped.
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<WireRecord>();

        tokio::spawn(async move {
            let mut file = match OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
            {
                Ok(f) => f,
                Err(e) => {
                    warn!("[Net] cannot open wire log {}: {}", path.display(), e);
                    return;
                }
            };

            let mut buf: Vec<u8> = Vec::with_capacity(512);
            while let Some(rec) = rx.recv().await {
                buf.clear();
                if serde_json::to_writer(&mut buf, &rec).is_err() {
                    continue;
                }
                buf.push(b'\n');
                if file.write_all(&buf).await.is_err() {
                    break;
                }
                if file.flush().await.is_err() {
                    break;
                }
            }
        });

        Self { tx }
    }

    /// Handle whose records are delivered to the returned receiver
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WireRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn record(&self, dir: Direction, peer: impl Into<String>, payload: &str) {
        let _ = self.tx.send(WireRecord::new(dir, peer, payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_record_json_shape() {
        let rec = WireRecord {
            ts_ms: 7,
            dir: Direction::Out,
            peer: "127.0.0.1:12345".to_string(),
            payload: "rotate".to_string(),
        };
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(
            json,
            r#"{"ts_ms":7,"dir":"out","peer":"127.0.0.1:12345","payload":"rotate"}"#
        );
        let back: WireRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }

    #[tokio::test]
    async fn test_channel_handle_delivers_records() {
        let (log, mut rx) = WireLog::channel();
        log.record(Direction::In, "peer", "game_over");
        let rec = rx.recv().await.unwrap();
        assert_eq!(rec.dir, Direction::In);
        assert_eq!(rec.payload, "game_over");
    }

    #[tokio::test]
    async fn test_spawned_log_appends_lines() {
        let path = std::env::temp_dir().join(format!(
            "net-tetris-wire-{}-{}.jsonl",
            std::process::id(),
            WireRecord::new(Direction::In, "", "").ts_ms
        ));
        let log = WireLog::spawn(&path);
        log.record(Direction::Out, "a", "move_left");
        log.record(Direction::In, "a", "game_over");

        let mut lines = Vec::new();
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let text = tokio::fs::read_to_string(&path).await.unwrap_or_default();
            lines = text.lines().map(str::to_string).collect();
            if lines.len() == 2 {
                break;
            }
        }
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(lines.len(), 2);
        let first: WireRecord = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first.payload, "move_left");
        assert_eq!(first.dir, Direction::Out);
    }
}
