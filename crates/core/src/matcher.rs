//! Match detection - finds runs of three or more equal tiles
//!
//! Rows are scanned left to right, then columns top to bottom. A run is emitted when it
//! terminates (kind change, empty slot, or board edge) with a length of at least
//! [`MIN_RUN_LENGTH`]. Empty slots never match anything.
//!
//! Output order is deterministic: every horizontal run in row-major order, followed by
//! every vertical run in column-major order. The first run of a round anchors the combo
//! label, nothing else depends on the order.
//!
//! Detection only reads the grid, so it can run against a hypothetical (swapped but not
//! committed) board.

use arrayvec::ArrayVec;

use crate::grid::Grid;
use crate::types::{GridPos, Orientation, TileKind, MAX_GRID_SIZE, MIN_RUN_LENGTH};

/// A maximal line of equal tiles
///
/// Positions are stored in scan order (left to right, or top to bottom). A run can never
/// be longer than a board side, so it lives on the stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchRun {
    pub positions: ArrayVec<GridPos, MAX_GRID_SIZE>,
    pub orientation: Orientation,
    pub kind: TileKind,
}

impl MatchRun {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// First cell of the run in scan order
    pub fn first(&self) -> GridPos {
        self.positions[0]
    }

    /// Middle cell (rounded towards the end for even lengths)
    pub fn anchor(&self) -> GridPos {
        self.positions[self.positions.len() / 2]
    }
}

/// Maps a (line, offset) pair to a board position for one scan direction
#[inline(always)]
fn line_pos(orientation: Orientation, line: usize, offset: usize) -> GridPos {
    match orientation {
        Orientation::Horizontal => GridPos::new(line as i8, offset as i8),
        Orientation::Vertical => GridPos::new(offset as i8, line as i8),
    }
}

#[inline(always)]
fn kind_at(grid: &Grid, pos: GridPos) -> Option<TileKind> {
    let size = grid.size();
    grid.cells()[pos.row as usize * size + pos.col as usize].map(|t| t.kind)
}

/// Scan every line in one direction, pushing each terminated run into `out`
fn scan_lines(grid: &Grid, orientation: Orientation, out: &mut Vec<MatchRun>) {
    let size = grid.size();

    for line in 0..size {
        let mut run_start = 0usize;
        let mut run_kind = kind_at(grid, line_pos(orientation, line, 0));

        // `offset == size` acts as a sentinel that terminates the last open run.
        for offset in 1..=size {
            let current = if offset < size {
                kind_at(grid, line_pos(orientation, line, offset))
            } else {
                None
            };

            if current.is_some() && current == run_kind {
                continue;
            }

            if let Some(kind) = run_kind {
                if offset - run_start >= MIN_RUN_LENGTH {
                    let positions = (run_start..offset)
                        .map(|o| line_pos(orientation, line, o))
                        .collect();
                    out.push(MatchRun {
                        positions,
                        orientation,
                        kind,
                    });
                }
            }

            run_start = offset;
            run_kind = current;
        }
    }
}

/// Find every run on the board
pub fn find_matches(grid: &Grid) -> Vec<MatchRun> {
    let mut runs = Vec::new();
    scan_lines(grid, Orientation::Horizontal, &mut runs);
    scan_lines(grid, Orientation::Vertical, &mut runs);
    runs
}

/// True if at least one run exists; stops at the first one
pub fn has_match(grid: &Grid) -> bool {
    let size = grid.size();

    for orientation in [Orientation::Horizontal, Orientation::Vertical] {
        for line in 0..size {
            let mut count = 0usize;
            let mut prev: Option<TileKind> = None;
            for offset in 0..size {
                let current = kind_at(grid, line_pos(orientation, line, offset));
                if current.is_some() && current == prev {
                    count += 1;
                    if count >= MIN_RUN_LENGTH {
                        return true;
                    }
                } else {
                    count = 1;
                }
                prev = current;
            }
        }
    }

    false
}

/// Union of all run positions, each cell once, in first-seen order
pub fn clear_set(grid_size: usize, runs: &[MatchRun]) -> Vec<GridPos> {
    let mut seen = vec![false; grid_size * grid_size];
    let mut out = Vec::new();
    for pos in runs.iter().flat_map(|r| r.positions.iter()) {
        let idx = pos.row as usize * grid_size + pos.col as usize;
        if !seen[idx] {
            seen[idx] = true;
            out.push(*pos);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TileKind::*;

    fn grid(rows: &[[TileKind; 4]; 4]) -> Grid {
        Grid::from_kinds(rows).unwrap()
    }

    #[test]
    fn test_no_matches_on_checkerboard() {
        let g = grid(&[
            [Chicken, Burger, Chicken, Burger],
            [Burger, Chicken, Burger, Chicken],
            [Chicken, Burger, Chicken, Burger],
            [Burger, Chicken, Burger, Chicken],
        ]);
        assert!(find_matches(&g).is_empty());
        assert!(!has_match(&g));
    }

    #[test]
    fn test_horizontal_run_at_row_end() {
        let g = grid(&[
            [Burger, Fries, Fries, Fries],
            [Chicken, Burger, Chicken, Burger],
            [Burger, Chicken, Burger, Chicken],
            [Chicken, Burger, Chicken, Burger],
        ]);
        let runs = find_matches(&g);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].orientation, Orientation::Horizontal);
        assert_eq!(runs[0].kind, Fries);
        assert_eq!(
            runs[0].positions.as_slice(),
            &[GridPos::new(0, 1), GridPos::new(0, 2), GridPos::new(0, 3)]
        );
        assert!(has_match(&g));
    }

    #[test]
    fn test_vertical_run_of_four() {
        let g = grid(&[
            [Cola, Burger, Chicken, Burger],
            [Cola, Chicken, Burger, Chicken],
            [Cola, Burger, Chicken, Burger],
            [Cola, Chicken, Burger, Chicken],
        ]);
        let runs = find_matches(&g);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].orientation, Orientation::Vertical);
        assert_eq!(runs[0].len(), 4);
        assert_eq!(runs[0].first(), GridPos::new(0, 0));
        assert_eq!(runs[0].anchor(), GridPos::new(2, 0));
    }

    #[test]
    fn test_empty_slots_break_runs() {
        let mut g = grid(&[
            [Fries, Fries, Fries, Burger],
            [Chicken, Burger, Chicken, Burger],
            [Burger, Chicken, Burger, Chicken],
            [Chicken, Burger, Chicken, Burger],
        ]);
        g.take(GridPos::new(0, 1)).unwrap();
        assert!(find_matches(&g).is_empty());
        assert!(!has_match(&g));
    }

    #[test]
    fn test_l_shape_yields_two_runs_sharing_a_cell() {
        let g = grid(&[
            [Cola, Cola, Cola, Burger],
            [Cola, Chicken, Burger, Chicken],
            [Cola, Burger, Chicken, Burger],
            [Burger, Chicken, Burger, Chicken],
        ]);
        let runs = find_matches(&g);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].orientation, Orientation::Horizontal);
        assert_eq!(runs[1].orientation, Orientation::Vertical);

        let cleared = clear_set(g.size(), &runs);
        assert_eq!(cleared.len(), 5);
        assert_eq!(cleared[0], GridPos::new(0, 0));
    }
}
