//! Board generation
//!
//! Fills a board slot by slot in row-major order. Each slot draws from the kinds that do
//! not complete a run with the two slots to its left or the two above it, so with three
//! or more kinds the result is match-free by construction. A finished board is accepted only if it also has at
//! least one match-producing swap; otherwise generation starts over, up to a bounded
//! number of attempts.

use log::{debug, warn};

use crate::error::EngineError;
use crate::events::TileSpawn;
use crate::grid::{Grid, TileIdAllocator};
use crate::hint::has_available_move;
use crate::matcher::has_match;
use crate::rng::TileSource;
use crate::types::{GridPos, TileKind};

/// Kinds at `pos` that would not complete a run with already-placed neighbours
fn allowed_kinds(grid: &Grid, pos: GridPos, pool: &[TileKind], out: &mut Vec<TileKind>) {
    let pair = |a: GridPos, b: GridPos| -> Option<TileKind> {
        match (grid.kind_at(a), grid.kind_at(b)) {
            (Ok(Some(x)), Ok(Some(y))) if x == y => Some(x),
            _ => None,
        }
    };

    let left = if pos.col >= 2 {
        pair(pos.offset(0, -1), pos.offset(0, -2))
    } else {
        None
    };
    let above = if pos.row >= 2 {
        pair(pos.offset(-1, 0), pos.offset(-2, 0))
    } else {
        None
    };

    out.clear();
    out.extend(
        pool.iter()
            .copied()
            .filter(|k| Some(*k) != left && Some(*k) != above),
    );
}

/// One pass over the board
///
/// With two kinds a slot can have both excluded (left pair of one, above pair of the
/// other); it then draws from the whole pool and the run check below rejects the board.
fn fill_once(
    grid: &mut Grid,
    pool: &[TileKind],
    source: &mut dyn TileSource,
    ids: &mut TileIdAllocator,
) -> Result<(), EngineError> {
    grid.clear();
    let mut allowed = Vec::with_capacity(pool.len());
    let positions: Vec<GridPos> = grid.positions().collect();

    for pos in positions {
        allowed_kinds(grid, pos, pool, &mut allowed);
        let kind = if allowed.is_empty() {
            source.next_kind(pool)
        } else {
            source.next_kind(&allowed)
        };
        grid.set(pos, Some(ids.spawn(kind, pos)))?;
    }
    Ok(())
}

/// Generate a full, match-free board that has at least one available move
pub fn generate_board(
    size: usize,
    pool: &[TileKind],
    source: &mut dyn TileSource,
    ids: &mut TileIdAllocator,
    max_attempts: u32,
) -> Result<Grid, EngineError> {
    if pool.is_empty() {
        return Err(EngineError::InvalidConfig(
            "cannot generate a board from an empty kind set".to_string(),
        ));
    }

    let mut grid = Grid::new(size);
    for attempt in 1..=max_attempts {
        fill_once(&mut grid, pool, source, ids)?;
        if has_match(&grid) {
            continue;
        }
        if has_available_move(&mut grid) {
            debug!("[Generator] board accepted after {} attempt(s)", attempt);
            return Ok(grid);
        }
    }

    warn!(
        "[Generator] no playable {}x{} board in {} attempts",
        size, size, max_attempts
    );
    Err(EngineError::BoardGenerationFailure {
        attempts: max_attempts,
    })
}

/// Every tile on the board as a spawn record, row-major
pub fn board_spawns(grid: &Grid) -> Vec<TileSpawn> {
    grid.cells()
        .iter()
        .flatten()
        .map(|t| TileSpawn {
            tile: t.id,
            row: t.row,
            col: t.col,
            kind: t.kind,
        })
        .collect()
}
