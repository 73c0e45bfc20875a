//! Core types module - shared data structures and constants
//!
//! This crate defines the fundamental types shared by the client, the
//! reference server and the transport. Everything here is plain data with no
//! dependencies, so it can be used by the placement engine and the wire layer
//! alike.
//!
//! # Board Dimensions
//!
//! - **Rows**: 20 (indexed 0-19, top to bottom)
//! - **Columns**: 10 (indexed 0-9, left to right)
//! - **Snapshot length**: 200 characters, one per cell
//!
//! # Session Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `SESSION_SECS` | 120 | Countdown length of one game |
//! | `GRAVITY_MS` | 500 | Automatic fall interval when gravity is on |
//! | `LINE_CLEAR_POINTS` | 100 | Flat points per cleared line |
//!
//! # Examples
//!
//! ```
//! use net_tetris_types::{Command, PieceKind, BOARD_COLS, BOARD_ROWS};
//!
//! assert_eq!(PieceKind::from_str("t"), Some(PieceKind::T));
//! assert_eq!(Command::from_str("hard_drop"), Some(Command::HardDrop));
//! assert_eq!(Command::MoveLeft.as_str(), "move_left");
//! assert_eq!(BOARD_ROWS * BOARD_COLS, 200);
//! ```

/// Board height in cells (20 rows)
pub const BOARD_ROWS: usize = 20;

/// Board width in cells (10 columns)
pub const BOARD_COLS: usize = 10;

/// Number of characters in a full board snapshot payload
pub const SNAPSHOT_LEN: usize = BOARD_ROWS * BOARD_COLS;

/// Flat score per cleared line
pub const LINE_CLEAR_POINTS: u32 = 100;

/// Length of a game in seconds
pub const SESSION_SECS: u32 = 120;

/// Automatic fall interval in milliseconds
pub const GRAVITY_MS: u32 = 500;

/// Default server address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 12345;

/// Control payload announcing that the remote game ended
pub const GAME_OVER_MESSAGE: &str = "game_over";

/// A single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled,
}

impl Cell {
    pub fn is_filled(self) -> bool {
        matches!(self, Cell::Filled)
    }

    /// Snapshot character for this cell (`'0'` or `'1'`)
    pub fn as_char(self) -> char {
        match self {
            Cell::Empty => '0',
            Cell::Filled => '1',
        }
    }

    /// Parse a snapshot byte
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'0' => Some(Cell::Empty),
            b'1' => Some(Cell::Filled),
            _ => None,
        }
    }
}

/// The seven tetromino kinds, in the order the piece factory indexes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    /// Map a factory index (0..7) to a kind
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parse piece kind from string (case-insensitive)
    ///
    /// ```
    /// use net_tetris_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("i"), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_str("Z"), Some(PieceKind::Z));
    /// assert_eq!(PieceKind::from_str("x"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "j" => Some(PieceKind::J),
            "l" => Some(PieceKind::L),
            "o" => Some(PieceKind::O),
            "s" => Some(PieceKind::S),
            "t" => Some(PieceKind::T),
            "z" => Some(PieceKind::Z),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "i",
            PieceKind::J => "j",
            PieceKind::L => "l",
            PieceKind::O => "o",
            PieceKind::S => "s",
            PieceKind::T => "t",
            PieceKind::Z => "z",
        }
    }
}

/// Move intents sent from client to server.
///
/// The wire form is a fixed literal with no parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    MoveLeft,
    MoveRight,
    MoveDown,
    Rotate,
    HardDrop,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::MoveLeft,
        Command::MoveRight,
        Command::MoveDown,
        Command::Rotate,
        Command::HardDrop,
    ];

    /// Parse the wire literal. Exact match only.
    ///
    /// ```
    /// use net_tetris_types::Command;
    ///
    /// assert_eq!(Command::from_str("rotate"), Some(Command::Rotate));
    /// assert_eq!(Command::from_str("Rotate"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "move_left" => Some(Command::MoveLeft),
            "move_right" => Some(Command::MoveRight),
            "move_down" => Some(Command::MoveDown),
            "rotate" => Some(Command::Rotate),
            "hard_drop" => Some(Command::HardDrop),
            _ => None,
        }
    }

    /// Wire literal
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::MoveLeft => "move_left",
            Command::MoveRight => "move_right",
            Command::MoveDown => "move_down",
            Command::Rotate => "rotate",
            Command::HardDrop => "hard_drop",
        }
    }

    /// Translation carried by the movement commands
    pub fn delta(&self) -> Option<(i8, i8)> {
        match self {
            Command::MoveLeft => Some((-1, 0)),
            Command::MoveRight => Some((1, 0)),
            Command::MoveDown => Some((0, 1)),
            Command::Rotate | Command::HardDrop => None,
        }
    }
}

/// Lifecycle of a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}
