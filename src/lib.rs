//! Networked Tetris (workspace facade crate).
//!
//! Re-exports the workspace members under one roof:
//! `net_tetris::{types, core, net}`. The implementation lives in the crates
//! under `crates/`.

pub use net_tetris_core as core;
pub use net_tetris_net as net;
pub use net_tetris_types as types;
