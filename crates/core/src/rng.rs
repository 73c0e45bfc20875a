//! RNG module - injectable piece selection
//!
//! New pieces are chosen uniformly among the seven kinds. Selection goes
//! through the [`PieceSource`] trait so tests and replays can pin the exact
//! sequence, while live sessions use a seeded [`SimpleRng`].

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::PieceKind;

/// Anything that can pick the next piece kind.
pub trait PieceSource: Send {
    fn next_kind(&mut self) -> PieceKind;
}

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Seed from the wall clock, for sessions that don't ask for a fixed seed
    pub fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
            .unwrap_or(1);
        Self::new(nanos)
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        // High bits of an LCG are far better distributed than the low ones.
        ((self.next_u32() >> 16) * max) >> 16
    }

    /// Current state, usable as a seed to replay the remaining sequence
    pub fn seed(&self) -> u32 {
        self.state
    }
}

impl PieceSource for SimpleRng {
    fn next_kind(&mut self) -> PieceKind {
        let idx = self.next_range(PieceKind::ALL.len() as u32) as usize;
        PieceKind::ALL[idx]
    }
}

/// Fixed, cycling sequence of kinds.
#[derive(Debug, Clone)]
pub struct ScriptedPieces {
    queue: VecDeque<PieceKind>,
}

impl ScriptedPieces {
    /// Panics if `kinds` is empty.
    pub fn new(kinds: impl IntoIterator<Item = PieceKind>) -> Self {
        let queue: VecDeque<_> = kinds.into_iter().collect();
        assert!(!queue.is_empty(), "scripted sequence needs at least one kind");
        Self { queue }
    }
}

impl PieceSource for ScriptedPieces {
    fn next_kind(&mut self) -> PieceKind {
        // Non-empty by construction.
        let kind = self.queue[0];
        self.queue.rotate_left(1);
        kind
    }
}
