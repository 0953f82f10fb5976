//! Hint finder - the first match-producing swap in scan order
//!
//! Cells are visited row-major; for each cell the right neighbour is tried before the
//! one below. Every trial swap is reverted, so the board is unchanged afterwards.

use crate::grid::Grid;
use crate::moves::swap_would_match;
use crate::types::GridPos;

/// A swap that would produce at least one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hint {
    pub from: GridPos,
    pub to: GridPos,
}

/// First match-producing swap, or `None` when the board is deadlocked
///
/// Empty slots are skipped. Only called on a resting board, but it copes with holes.
pub fn find_hint_move(grid: &mut Grid) -> Option<Hint> {
    let size = grid.size() as i8;

    for row in 0..size {
        for col in 0..size {
            let from = GridPos::new(row, col);
            if !matches!(grid.get(from), Ok(Some(_))) {
                continue;
            }
            for to in [GridPos::new(row, col + 1), GridPos::new(row + 1, col)] {
                if !matches!(grid.get(to), Ok(Some(_))) {
                    continue;
                }
                if swap_would_match(grid, from, to) {
                    return Some(Hint { from, to });
                }
            }
        }
    }

    None
}

/// True when at least one swap on the board produces a match
pub fn has_available_move(grid: &mut Grid) -> bool {
    find_hint_move(grid).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TileKind::{self, *};

    #[test]
    fn test_finds_first_swap_in_scan_order() {
        let mut g = Grid::from_kinds(&[
            [Chicken, Chicken, Burger, Fries],
            [Burger, Fries, Chicken, Burger],
            [Fries, Burger, Fries, Chicken],
            [Burger, Fries, Burger, Fries],
        ])
        .unwrap();
        let before = g.clone();

        let hint = find_hint_move(&mut g).unwrap();
        assert_eq!(hint.from, GridPos::new(0, 2));
        assert_eq!(hint.to, GridPos::new(1, 2));
        assert_eq!(g, before);
    }

    #[test]
    fn test_deadlocked_board_has_no_hint() {
        // Columns cycle through three kinds with a row offset; no swap lines up three.
        let kinds = [Chicken, Burger, Fries];
        let rows: Vec<Vec<TileKind>> = (0..4)
            .map(|r| (0..4).map(|c| kinds[(c + 2 * r) % 3]).collect())
            .collect();
        let mut g = Grid::from_kinds(&rows[..]).unwrap();

        assert!(find_hint_move(&mut g).is_none());
        assert!(!has_available_move(&mut g));
    }
}
