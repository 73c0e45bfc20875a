//! Networked Tetris runner (default binary).
//!
//! `serve` runs the reference server. `play` connects to a server, reads
//! commands from stdin and prints every board it receives; `play --offline`
//! runs a local session instead.
//!
//! Configuration comes from `NET_TETRIS_*` environment variables; flags given
//! on the command line win.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use net_tetris::core::{
    format_clock, render_text, GameEvent, GameSession, SessionConfig, SimpleRng,
};
use net_tetris::net::{run_server, ClientConfig, ClientEvent, ClientRuntime, ServerConfig};
use net_tetris::types::Command;

const POLL_MS: u64 = 50;

/// Networked Tetris: reference server and line-driven client.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the reference server.
    Serve {
        /// Address to bind (default 127.0.0.1).
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (default 12345).
        #[arg(short, long)]
        port: Option<u16>,
        /// Fixed piece seed.
        #[arg(long)]
        seed: Option<u32>,
        /// Make pieces fall on their own.
        #[arg(long)]
        gravity: bool,
        /// Game length in seconds.
        #[arg(long)]
        session_secs: Option<u32>,
        /// Append framed traffic to this JSON-lines file.
        #[arg(long)]
        log_path: Option<String>,
    },
    /// Play from stdin: a/d/s/w/space (or command names), q to quit.
    Play {
        /// Server host (default 127.0.0.1).
        #[arg(long)]
        host: Option<String>,
        /// Server port (default 12345).
        #[arg(short, long)]
        port: Option<u16>,
        /// Append framed traffic to this JSON-lines file.
        #[arg(long)]
        log_path: Option<String>,
        /// Play a local game without a server.
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Command(Command),
    Quit,
}

/// Map one stdin line to an input. Accepts key letters and command names.
fn parse_input(line: &str) -> Option<Input> {
    if line == " " {
        return Some(Input::Command(Command::HardDrop));
    }
    let line = line.trim();
    if let Some(command) = Command::from_str(line) {
        return Some(Input::Command(command));
    }
    let command = match line.to_ascii_lowercase().as_str() {
        "a" | "left" => Command::MoveLeft,
        "d" | "right" => Command::MoveRight,
        "s" | "down" => Command::MoveDown,
        "w" | "up" => Command::Rotate,
        "drop" => Command::HardDrop,
        "q" | "quit" | "exit" => return Some(Input::Quit),
        _ => return None,
    };
    Some(Input::Command(command))
}

/// Read stdin on a plain thread; EOF counts as quit.
fn spawn_stdin_reader() -> Receiver<Input> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_input(&line) {
                Some(input) => {
                    if tx.send(input).is_err() {
                        return;
                    }
                }
                None if line.trim().is_empty() => {}
                None => eprintln!("unknown input {:?}", line),
            }
        }
        let _ = tx.send(Input::Quit);
    });
    rx
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.mode {
        Mode::Serve {
            host,
            port,
            seed,
            gravity,
            session_secs,
            log_path,
        } => {
            let mut config = ServerConfig::from_env();
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            config.gravity |= gravity;
            if let Some(secs) = session_secs {
                config.session_secs = secs;
            }
            if log_path.is_some() {
                config.log_path = log_path;
            }
            serve(config)
        }
        Mode::Play {
            host,
            port,
            log_path,
            offline,
        } => {
            let inputs = spawn_stdin_reader();
            if offline {
                return play_offline(inputs);
            }

            let mut config = ClientConfig::from_env();
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if log_path.is_some() {
                config.log_path = log_path;
            }
            play_online(config, inputs)
        }
    }
}

fn serve(config: ServerConfig) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    info!(
        "[Server] starting on {}:{} ({} s sessions, gravity {})",
        config.host, config.port, config.session_secs, config.gravity
    );
    rt.block_on(run_server(config, None))
}

fn play_online(config: ClientConfig, inputs: Receiver<Input>) -> Result<()> {
    let mut client = ClientRuntime::start(config)?;

    loop {
        while let Some(event) = client.try_recv() {
            match event {
                ClientEvent::Connected { peer } => println!("connected to {}", peer),
                ClientEvent::Game(GameEvent::BoardUpdated(board)) => {
                    println!("{}", render_text(&board, None));
                }
                ClientEvent::Game(_) => {}
                ClientEvent::RemoteGameOver => println!("game over"),
                ClientEvent::Unrecognized(_) => {}
                ClientEvent::Disconnected => {
                    println!("disconnected");
                    return Ok(());
                }
            }
        }

        match inputs.recv_timeout(Duration::from_millis(POLL_MS)) {
            Ok(Input::Command(command)) => {
                if let Err(e) = client.send(command) {
                    println!("send failed: {}", e);
                }
            }
            Ok(Input::Quit) | Err(RecvTimeoutError::Disconnected) => {
                client.disconnect();
                return Ok(());
            }
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}

fn play_offline(inputs: Receiver<Input>) -> Result<()> {
    let mut session = GameSession::new(
        Box::new(SimpleRng::from_entropy()),
        SessionConfig {
            gravity: true,
            ..SessionConfig::default()
        },
    );
    session.start();
    session.take_events();
    println!("{}", render_text(session.board(), session.active()));

    let mut last_tick = Instant::now();
    while !session.game_over() {
        match inputs.recv_timeout(Duration::from_millis(POLL_MS)) {
            Ok(Input::Command(command)) => {
                session.apply_command(command);
            }
            Ok(Input::Quit) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let now = Instant::now();
        session.tick(now.duration_since(last_tick).as_millis() as u32);
        last_tick = now;

        let mut redraw = false;
        for event in session.take_events() {
            match event {
                GameEvent::ScoreChanged(score) => println!("score {}", score),
                GameEvent::TimeChanged(secs) if secs % 10 == 0 => {
                    println!("time {}", format_clock(secs));
                }
                GameEvent::TimeChanged(_) => {}
                GameEvent::PieceChanged(_) | GameEvent::BoardUpdated(_) => redraw = true,
                GameEvent::GameOver(reason) => println!("game over ({:?})", reason),
            }
        }
        if redraw {
            println!("{}", render_text(session.board(), session.active()));
        }
    }

    println!("final score {}", session.score());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_keys_and_names() {
        assert_eq!(parse_input("a"), Some(Input::Command(Command::MoveLeft)));
        assert_eq!(parse_input("D\n"), Some(Input::Command(Command::MoveRight)));
        assert_eq!(parse_input("rotate"), Some(Input::Command(Command::Rotate)));
        assert_eq!(parse_input(" "), Some(Input::Command(Command::HardDrop)));
        assert_eq!(parse_input("hard_drop"), Some(Input::Command(Command::HardDrop)));
        assert_eq!(parse_input("q"), Some(Input::Quit));
        assert_eq!(parse_input("hold"), None);
    }
}
