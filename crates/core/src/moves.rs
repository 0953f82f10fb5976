//! Move validation - swap legality and sandboxed match checks
//!
//! A swap is legal when both positions are on the board, both hold a tile, and the two
//! positions are orthogonal neighbours. Whether a legal swap would match is answered by
//! swapping, detecting, and swapping back; the grid is restored exactly whatever the
//! outcome.

use crate::error::MoveError;
use crate::grid::Grid;
use crate::matcher::has_match;
use crate::types::GridPos;

/// Result of evaluating a requested swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveCheck {
    pub legal: bool,
    pub would_match: bool,
}

/// Classify a swap request without touching the grid
pub fn check_legal(grid: &Grid, from: GridPos, to: GridPos) -> Result<(), MoveError> {
    for pos in [from, to] {
        match grid.get(pos) {
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => return Err(MoveError::InvalidPosition { pos }),
        }
    }
    if !from.is_adjacent(to) {
        return Err(MoveError::IllegalMove { from, to });
    }
    Ok(())
}

/// Sandbox-and-revert: would swapping `a` and `b` create a run?
///
/// Callers must have checked both positions are in bounds.
pub(crate) fn swap_would_match(grid: &mut Grid, a: GridPos, b: GridPos) -> bool {
    if grid.swap(a, b).is_err() {
        return false;
    }
    let matched = has_match(grid);
    // Swapping back restores both slots and both tiles' coordinates.
    let _ = grid.swap(a, b);
    matched
}

/// Evaluate a swap: legality, then a sandboxed match test
pub fn try_move(grid: &mut Grid, from: GridPos, to: GridPos) -> MoveCheck {
    if check_legal(grid, from, to).is_err() {
        return MoveCheck::default();
    }
    MoveCheck {
        legal: true,
        would_match: swap_would_match(grid, from, to),
    }
}
