//! Engine events - the ordered step stream consumed by presentation collaborators
//!
//! Events are plain data. By the time an event is observed the engine has already
//! committed the transition it describes; renderers decide their own pacing.
//!
//! A committed turn produces, in order:
//!
//! ```text
//! swapped, move_committed, stats_updated,
//! per round: [combo] [multi_match] [big_run..]
//!            collectible_reached.. cells_cleared stats_updated tiles_dropped tiles_introduced
//! [board_stuck | board_reshuffled | game_over]
//! ```
//!
//! A non-matching swap produces `swapped, swap_reverted`.

use crate::grid::TileId;
use crate::types::{GameStats, GridPos, Orientation, TileKind};

/// One tile falling inside its column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileDrop {
    pub tile: TileId,
    pub col: i8,
    pub from_row: i8,
    pub to_row: i8,
}

impl TileDrop {
    pub fn distance(&self) -> u8 {
        (self.to_row - self.from_row) as u8
    }
}

/// One freshly created tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileSpawn {
    pub tile: TileId,
    pub row: i8,
    pub col: i8,
    pub kind: TileKind,
}

impl TileSpawn {
    pub fn pos(&self) -> GridPos {
        GridPos::new(self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Two tiles exchanged places (shown before the match check resolves)
    Swapped { from: GridPos, to: GridPos },
    /// A non-matching swap was undone; no move was spent
    SwapReverted { from: GridPos, to: GridPos },
    /// A match-producing move was accepted and paid for
    MoveCommitted { moves_remaining: u32 },
    /// Second and later rounds of a cascade; `anchor` is the first cell of the first run
    Combo { round: u32, anchor: GridPos },
    /// More than one run cleared in the same round
    MultiMatch { round: u32, runs: u32 },
    /// A run of four or more
    BigRun {
        length: u8,
        orientation: Orientation,
        kind: TileKind,
        anchor: GridPos,
    },
    /// A collectible tile reached the counter
    CollectibleReached { pos: GridPos, delta: u32 },
    /// The round's clear-set was removed
    CellsCleared { positions: Vec<GridPos>, round: u32 },
    /// Remaining tiles fell towards row `size - 1`
    TilesDropped { drops: Vec<TileDrop> },
    /// Empty slots were refilled
    TilesIntroduced { tiles: Vec<TileSpawn> },
    /// Counters after the step that changed them
    StatsUpdated(GameStats),
    /// No swap anywhere on the resting board produces a match
    BoardStuck,
    /// The board was regenerated because it had no available move
    BoardReshuffled { tiles: Vec<TileSpawn> },
    /// The move budget is spent and the last cascade has resolved
    GameOver(GameStats),
}

impl EngineEvent {
    /// Stable `snake_case` name, used for logs and the wire protocol
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::Swapped { .. } => "swapped",
            EngineEvent::SwapReverted { .. } => "swap_reverted",
            EngineEvent::MoveCommitted { .. } => "move_committed",
            EngineEvent::Combo { .. } => "combo",
            EngineEvent::MultiMatch { .. } => "multi_match",
            EngineEvent::BigRun { .. } => "big_run",
            EngineEvent::CollectibleReached { .. } => "collectible_reached",
            EngineEvent::CellsCleared { .. } => "cells_cleared",
            EngineEvent::TilesDropped { .. } => "tiles_dropped",
            EngineEvent::TilesIntroduced { .. } => "tiles_introduced",
            EngineEvent::StatsUpdated(_) => "stats_updated",
            EngineEvent::BoardStuck => "board_stuck",
            EngineEvent::BoardReshuffled { .. } => "board_reshuffled",
            EngineEvent::GameOver(_) => "game_over",
        }
    }
}
