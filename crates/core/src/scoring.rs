//! Scoring module - points per cascade round
//!
//! A round scores `cleared_cells * BASE_TILE_POINTS * round`. The multiplier follows the
//! combo round, not the number of runs: two runs cleared together in round 1 both score at
//! x1, and a cell shared by two runs is counted once.

use crate::types::BASE_TILE_POINTS;

/// Score breakdown for one cascade round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundScore {
    pub cleared: u32,
    pub round: u32,
    pub points: u32,
}

/// Points for clearing `cleared` unique cells in combo round `round` (1-based)
pub fn round_points(cleared: usize, round: u32) -> u32 {
    (cleared as u32)
        .saturating_mul(BASE_TILE_POINTS)
        .saturating_mul(round)
}

/// Build the score breakdown for a round
pub fn score_round(cleared: usize, round: u32) -> RoundScore {
    RoundScore {
        cleared: cleared as u32,
        round,
        points: round_points(cleared, round),
    }
}
