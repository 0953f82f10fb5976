//! Read-only copies of engine state for observers

use crate::types::{GameStats, TileKind};

/// 64-bit FNV-1a over a byte stream
pub fn fnv1a64(bytes: impl IntoIterator<Item = u8>) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(0x0000_0100_0000_01B3);
    }
    h
}

/// Turn phase as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Ready for the next swap
    #[default]
    Idle,
    /// Events from the last turn are still queued
    Resolving,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Resolving => "resolving",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GameSnapshot {
    pub size: usize,
    /// Row-major kind codes, 0 for an empty slot
    pub board: Vec<u8>,
    pub board_hash: u64,
    pub stats: GameStats,
    pub phase: Phase,
    pub game_over: bool,
    pub turn_id: u32,
    pub seed: Option<u32>,
}

impl GameSnapshot {
    /// Kind at `(row, col)`, `None` for empty or off-board
    pub fn kind_at(&self, row: usize, col: usize) -> Option<TileKind> {
        if row >= self.size || col >= self.size {
            return None;
        }
        TileKind::from_u8(self.board[row * self.size + col])
    }

    pub fn playable(&self) -> bool {
        !self.game_over && self.phase == Phase::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a64_reference_values() {
        assert_eq!(fnv1a64(std::iter::empty()), 0xcbf29ce484222325);
        assert_eq!(fnv1a64(*b"a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn test_kind_at_decodes_codes() {
        let snap = GameSnapshot {
            size: 2,
            board: vec![1, 0, 3, 8],
            ..GameSnapshot::default()
        };
        assert_eq!(snap.kind_at(0, 0), Some(TileKind::Chicken));
        assert_eq!(snap.kind_at(0, 1), None);
        assert_eq!(snap.kind_at(1, 1), Some(TileKind::Cappuccino));
        assert_eq!(snap.kind_at(2, 0), None);
    }
}
