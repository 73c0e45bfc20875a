//! Game session - board, falling piece, score and clock
//!
//! A `GameSession` is used on both ends of the link. The reference server
//! drives it authoritatively through [`GameSession::apply_command`]; the client
//! keeps one as its prediction state, moving and rotating the local piece with
//! [`GameSession::predict_command`] and replacing the board wholesale whenever
//! a snapshot arrives.
//!
//! Every state change is queued as a [`GameEvent`]; drain them with
//! [`GameSession::take_events`].

use crate::board::Board;
use crate::events::{GameEvent, GameOverReason};
use crate::pieces::Tetromino;
use crate::placement::{
    check_collision, clear_lines, compose, drop_distance, line_clear_score, lock,
};
use crate::rng::{PieceSource, SimpleRng};
use crate::types::{Command, GRAVITY_MS, SESSION_SECS};

/// Session tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Clock length in seconds
    pub duration_secs: u32,
    /// Fall one row every `GRAVITY_MS` during `tick`
    pub gravity: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: SESSION_SECS,
            gravity: false,
        }
    }
}

/// Result of committing the active piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOutcome {
    pub lines_cleared: u32,
    pub points: u32,
}

pub struct GameSession {
    config: SessionConfig,
    board: Board,
    active: Option<Tetromino>,
    pieces: Box<dyn PieceSource>,
    score: u32,
    time_remaining_ms: u32,
    gravity_timer_ms: u32,
    game_over: Option<GameOverReason>,
    started: bool,
    events: Vec<GameEvent>,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("config", &self.config)
            .field("active", &self.active)
            .field("score", &self.score)
            .field("time_remaining_ms", &self.time_remaining_ms)
            .field("game_over", &self.game_over)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    pub fn new(pieces: Box<dyn PieceSource>, config: SessionConfig) -> Self {
        Self {
            config,
            board: Board::new(),
            active: None,
            pieces,
            score: 0,
            time_remaining_ms: config.duration_secs.saturating_mul(1000),
            gravity_timer_ms: 0,
            game_over: None,
            started: false,
            events: Vec::new(),
        }
    }

    /// Session with a seeded uniform piece source
    pub fn with_seed(seed: u32) -> Self {
        Self::new(Box::new(SimpleRng::new(seed)), SessionConfig::default())
    }

    /// Clear board, score and clock without spawning a piece.
    pub fn reset(&mut self) {
        self.board.clear();
        self.active = None;
        self.score = 0;
        self.time_remaining_ms = self.config.duration_secs.saturating_mul(1000);
        self.gravity_timer_ms = 0;
        self.game_over = None;
        self.started = false;

        self.events.push(GameEvent::ScoreChanged(0));
        self.events
            .push(GameEvent::TimeChanged(self.time_remaining_secs()));
        self.events.push(GameEvent::BoardUpdated(self.board.clone()));
    }

    /// Reset and spawn the first piece
    pub fn start(&mut self) -> bool {
        self.reset();
        self.started = true;
        self.spawn_piece()
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active(&self) -> Option<&Tetromino> {
        self.active.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn game_over(&self) -> bool {
        self.game_over.is_some()
    }

    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        self.game_over
    }

    /// Whole seconds left, rounded up
    pub fn time_remaining_secs(&self) -> u32 {
        self.time_remaining_ms.div_ceil(1000)
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Drain queued events in the order they happened
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn end_game(&mut self, reason: GameOverReason) {
        if self.game_over.is_none() {
            self.game_over = Some(reason);
            self.events.push(GameEvent::GameOver(reason));
        }
    }

    /// Create the next piece at its spawn position.
    ///
    /// Returns false (and ends the game) when the spawn position is blocked.
    pub fn spawn_piece(&mut self) -> bool {
        if self.game_over() {
            return false;
        }

        let piece = Tetromino::new(self.pieces.next_kind());
        if check_collision(&self.board, piece.x, piece.y, &piece.shape) {
            self.active = None;
            self.end_game(GameOverReason::SpawnBlocked);
            return false;
        }

        self.events.push(GameEvent::PieceChanged(piece.clone()));
        self.active = Some(piece);
        true
    }

    /// Try to translate the falling piece; true if the move was committed
    pub fn move_tetromino(&mut self, dx: i8, dy: i8) -> bool {
        if self.game_over() {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        let (x, y) = active.moved_by(dx, dy);
        if check_collision(&self.board, x, y, &active.shape) {
            return false;
        }

        active.x = x;
        active.y = y;
        self.events.push(GameEvent::PieceChanged(active.clone()));
        true
    }

    /// Try to rotate the falling piece clockwise; a blocked rotation is a no-op
    pub fn rotate_tetromino(&mut self) -> bool {
        if self.game_over() {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        let candidate = active.rotated();
        if check_collision(&self.board, active.x, active.y, &candidate) {
            return false;
        }

        active.shape = candidate;
        self.events.push(GameEvent::PieceChanged(active.clone()));
        true
    }

    /// Commit the falling piece, clear lines, score, and spawn the next one
    pub fn lock_active(&mut self) -> Option<LockOutcome> {
        let active = self.active.take()?;

        lock(&mut self.board, &active);
        let lines_cleared = clear_lines(&mut self.board);
        let points = line_clear_score(lines_cleared);

        if lines_cleared > 0 {
            self.score += points;
            self.events.push(GameEvent::ScoreChanged(self.score));
        }
        self.events.push(GameEvent::BoardUpdated(self.board.clone()));

        self.spawn_piece();
        Some(LockOutcome {
            lines_cleared,
            points,
        })
    }

    /// Move down one row, locking the piece if it cannot fall further.
    ///
    /// Returns true if the piece moved.
    pub fn step_down(&mut self) -> bool {
        if self.move_tetromino(0, 1) {
            return true;
        }
        if !self.game_over() {
            self.lock_active();
        }
        false
    }

    /// Drop to the lowest legal row and lock. Returns rows dropped.
    pub fn hard_drop(&mut self) -> u32 {
        if self.game_over() {
            return 0;
        }
        let Some(active) = self.active.as_mut() else {
            return 0;
        };

        let distance = drop_distance(&self.board, active);
        active.y += distance;
        self.lock_active();
        distance as u32
    }

    /// Authoritative handling of a move intent (server and offline play)
    pub fn apply_command(&mut self, command: Command) -> bool {
        match command {
            Command::MoveLeft => self.move_tetromino(-1, 0),
            Command::MoveRight => self.move_tetromino(1, 0),
            Command::MoveDown => {
                if self.active.is_none() || self.game_over() {
                    return false;
                }
                self.step_down();
                true
            }
            Command::Rotate => self.rotate_tetromino(),
            Command::HardDrop => {
                if self.active.is_none() || self.game_over() {
                    return false;
                }
                self.hard_drop();
                true
            }
        }
    }

    /// Local prediction of a move intent.
    ///
    /// Only translation and rotation are predicted; locking and hard drops
    /// are left to the authoritative peer, whose next snapshot settles them.
    pub fn predict_command(&mut self, command: Command) -> bool {
        match command {
            Command::Rotate => self.rotate_tetromino(),
            Command::HardDrop => false,
            other => match other.delta() {
                Some((dx, dy)) => self.move_tetromino(dx, dy),
                None => false,
            },
        }
    }

    /// Replace the locked cells wholesale with an authoritative snapshot
    pub fn replace_board(&mut self, board: Board) {
        self.board = board;
        self.events.push(GameEvent::BoardUpdated(self.board.clone()));
    }

    /// Board with the falling piece drawn in
    pub fn composed_board(&self) -> Board {
        compose(&self.board, self.active.as_ref())
    }

    /// Advance the clock (and gravity, when enabled) by `elapsed_ms`.
    pub fn tick(&mut self, elapsed_ms: u32) {
        if !self.started || self.game_over() {
            return;
        }

        let before = self.time_remaining_secs();
        self.time_remaining_ms = self.time_remaining_ms.saturating_sub(elapsed_ms);
        let after = self.time_remaining_secs();
        if after != before {
            self.events.push(GameEvent::TimeChanged(after));
        }
        if self.time_remaining_ms == 0 {
            self.end_game(GameOverReason::TimeUp);
            return;
        }

        if self.config.gravity {
            self.gravity_timer_ms += elapsed_ms;
            while self.gravity_timer_ms >= GRAVITY_MS && !self.game_over() {
                self.gravity_timer_ms -= GRAVITY_MS;
                if self.active.is_some() {
                    self.step_down();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedPieces;
    use crate::types::{Cell, PieceKind, BOARD_COLS};

    fn session_with(kinds: &[PieceKind]) -> GameSession {
        GameSession::new(
            Box::new(ScriptedPieces::new(kinds.iter().copied())),
            SessionConfig::default(),
        )
    }

    #[test]
    fn test_start_resets_and_spawns() {
        let mut s = session_with(&[PieceKind::T]);
        assert!(s.start());
        assert!(s.started());
        assert_eq!(s.active().unwrap().kind, PieceKind::T);

        let events = s.take_events();
        assert_eq!(events[0], GameEvent::ScoreChanged(0));
        assert_eq!(events[1], GameEvent::TimeChanged(120));
        assert!(matches!(events[2], GameEvent::BoardUpdated(_)));
        assert!(matches!(events[3], GameEvent::PieceChanged(_)));
        assert!(s.take_events().is_empty());
    }

    #[test]
    fn test_move_tetromino_walls() {
        let mut s = session_with(&[PieceKind::O]);
        s.start();

        // O spawns at x=4; it can move 4 left and then hits the wall.
        let mut moved = 0;
        for _ in 0..10 {
            if s.move_tetromino(-1, 0) {
                moved += 1;
            }
        }
        assert_eq!(moved, 4);
        assert_eq!(s.active().unwrap().x, 0);
        assert!(!s.move_tetromino(0, -1));
    }

    #[test]
    fn test_rejected_move_leaves_piece_unchanged() {
        let mut s = session_with(&[PieceKind::I]);
        s.start();
        let before = s.active().cloned();
        s.take_events();

        assert!(!s.move_tetromino(0, -1));
        assert_eq!(s.active().cloned(), before);
        assert!(s.take_events().is_empty());
    }

    #[test]
    fn test_rotation_blocked_is_noop() {
        let mut s = session_with(&[PieceKind::I]);
        s.start();
        // Horizontal I on the floor can't stand up: the vertical shape
        // would extend below row 19.
        while s.move_tetromino(0, 1) {}
        let before = s.active().cloned().unwrap();
        assert!(!s.rotate_tetromino());
        assert_eq!(s.active().unwrap(), &before);
    }

    #[test]
    fn test_rotation_commits_when_free() {
        let mut s = session_with(&[PieceKind::T]);
        s.start();
        s.move_tetromino(0, 2);
        assert!(s.rotate_tetromino());
        let active = s.active().unwrap();
        assert_eq!((active.shape.height(), active.shape.width()), (3, 2));
    }

    #[test]
    fn test_hard_drop_locks_and_spawns() {
        let mut s = session_with(&[PieceKind::O, PieceKind::I]);
        s.start();
        assert_eq!(s.hard_drop(), 18);

        assert_eq!(s.board().get(19, 4), Ok(Cell::Filled));
        assert_eq!(s.board().get(18, 5), Ok(Cell::Filled));
        assert_eq!(s.active().unwrap().kind, PieceKind::I);
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn test_line_clear_scores_flat_100() {
        let mut s = session_with(&[PieceKind::O]);
        s.start();

        // Fill row 19 except the two columns the O will land in.
        let mut board = Board::new();
        for col in 0..BOARD_COLS {
            if col != 4 && col != 5 {
                board.set(19, col, Cell::Filled).unwrap();
                board.set(18, col, Cell::Filled).unwrap();
            }
        }
        s.replace_board(board);
        s.take_events();

        s.hard_drop();
        assert_eq!(s.score(), 200);
        assert!(s.board().is_empty());
        assert!(s.take_events().contains(&GameEvent::ScoreChanged(200)));
    }

    #[test]
    fn test_spawn_blocked_ends_game() {
        let mut s = session_with(&[PieceKind::O]);
        s.start();
        let mut board = Board::new();
        board.set(0, 4, Cell::Filled).unwrap();
        s.replace_board(board);
        s.take_events();

        assert!(!s.spawn_piece());
        assert!(s.game_over());
        assert_eq!(s.game_over_reason(), Some(GameOverReason::SpawnBlocked));
        assert!(s.active().is_none());
        assert_eq!(
            s.take_events(),
            vec![GameEvent::GameOver(GameOverReason::SpawnBlocked)]
        );
        assert!(!s.apply_command(Command::HardDrop));
    }

    #[test]
    fn test_step_down_locks_on_floor() {
        let mut s = session_with(&[PieceKind::O]);
        s.start();
        for _ in 0..18 {
            assert!(s.step_down());
        }
        assert!(!s.step_down());
        assert_eq!(s.board().filled_count(), 4);
        assert_eq!(s.active().unwrap().y, 0);
    }

    #[test]
    fn test_predict_command_skips_hard_drop() {
        let mut s = session_with(&[PieceKind::T]);
        s.start();
        let x = s.active().unwrap().x;

        assert!(s.predict_command(Command::MoveRight));
        assert_eq!(s.active().unwrap().x, x + 1);
        assert!(!s.predict_command(Command::HardDrop));
        assert!(s.board().is_empty());
    }

    #[test]
    fn test_predict_without_piece_is_rejected() {
        let mut s = session_with(&[PieceKind::T]);
        s.reset();
        assert!(!s.predict_command(Command::MoveLeft));
        assert!(!s.predict_command(Command::Rotate));
    }

    #[test]
    fn test_tick_counts_down_whole_seconds() {
        let mut s = GameSession::new(
            Box::new(ScriptedPieces::new([PieceKind::T])),
            SessionConfig {
                duration_secs: 2,
                gravity: false,
            },
        );
        s.start();
        s.take_events();

        s.tick(500);
        assert!(s.take_events().is_empty());
        s.tick(500);
        assert_eq!(s.take_events(), vec![GameEvent::TimeChanged(1)]);
        s.tick(1000);
        assert_eq!(
            s.take_events(),
            vec![
                GameEvent::TimeChanged(0),
                GameEvent::GameOver(GameOverReason::TimeUp)
            ]
        );
        assert!(s.game_over());
    }

    #[test]
    fn test_tick_gravity_moves_piece() {
        let mut s = GameSession::new(
            Box::new(ScriptedPieces::new([PieceKind::T])),
            SessionConfig {
                duration_secs: 120,
                gravity: true,
            },
        );
        s.start();
        s.tick(GRAVITY_MS * 3);
        assert_eq!(s.active().unwrap().y, 3);
    }

    #[test]
    fn test_tick_before_start_is_ignored() {
        let mut s = GameSession::with_seed(1);
        s.tick(5000);
        assert_eq!(s.time_remaining_secs(), 120);
    }

    #[test]
    fn test_composed_board_contains_piece() {
        let mut s = session_with(&[PieceKind::I]);
        s.start();
        assert!(s.board().is_empty());
        assert_eq!(s.composed_board().filled_count(), 4);
    }
}
