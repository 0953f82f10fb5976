//! Grid module - owns the board slots
//!
//! The grid is an NxN matrix where each slot is empty or holds a tile.
//! Uses a flat vector in row-major order (`row * size + col`) for cache locality.
//! Coordinates: (row, col), row 0 is the top row, col 0 is the left column.
//!
//! The grid knows nothing about game rules. It is a dumb store with one bookkeeping duty:
//! every tile it holds carries its own slot coordinates, and `set`/`swap` keep them in sync.
//! Out-of-bounds access always fails with [`GridError::OutOfBounds`].

use crate::error::GridError;
use crate::types::{GridPos, TileKind, MAX_GRID_SIZE};

/// Stable identity of a tile for its whole life on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u32);

/// A tile occupying a grid slot
///
/// `row`/`col` mirror the slot the tile sits in; the grid is the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub id: TileId,
    pub kind: TileKind,
    pub row: i8,
    pub col: i8,
}

impl Tile {
    pub fn new(id: TileId, kind: TileKind, pos: GridPos) -> Self {
        Self {
            id,
            kind,
            row: pos.row,
            col: pos.col,
        }
    }

    pub fn pos(&self) -> GridPos {
        GridPos::new(self.row, self.col)
    }
}

/// A grid slot: `None` is only observed mid-resolution
pub type Cell = Option<Tile>;

/// Monotonic tile id source
#[derive(Debug, Clone, Default)]
pub struct TileIdAllocator {
    next: u32,
}

impl TileIdAllocator {
    /// Allocator whose first id is `first`
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    pub fn next_id(&mut self) -> TileId {
        let id = TileId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Spawn a tile with a fresh id at `pos`
    pub fn spawn(&mut self, kind: TileKind, pos: GridPos) -> Tile {
        Tile::new(self.next_id(), kind, pos)
    }
}

/// The square game board
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create an empty `size`x`size` grid
    ///
    /// `size` is clamped to `1..=MAX_GRID_SIZE` so coordinates always fit in `i8`.
    pub fn new(size: usize) -> Self {
        let size = size.clamp(1, MAX_GRID_SIZE);
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Build a full grid from rows of kinds; tile ids are assigned row-major from 0
    ///
    /// Intended for fixtures and replays.
    pub fn from_kinds<R: AsRef<[TileKind]>>(rows: &[R]) -> Result<Self, GridError> {
        let size = rows.len();
        if size == 0 || size > MAX_GRID_SIZE || rows.iter().any(|r| r.as_ref().len() != size) {
            return Err(GridError::NotSquare { size });
        }

        let mut grid = Self::new(size);
        let mut ids = TileIdAllocator::default();
        for (r, row) in rows.iter().enumerate() {
            for (c, &kind) in row.as_ref().iter().enumerate() {
                let pos = GridPos::new(r as i8, c as i8);
                grid.set(pos, Some(ids.spawn(kind, pos)))?;
            }
        }
        Ok(grid)
    }

    #[inline(always)]
    fn index(&self, pos: GridPos) -> Result<usize, GridError> {
        if self.is_in_bounds(pos) {
            Ok(pos.row as usize * self.size + pos.col as usize)
        } else {
            Err(GridError::OutOfBounds {
                pos,
                size: self.size,
            })
        }
    }

    /// Side length of the board
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_in_bounds(&self, pos: GridPos) -> bool {
        pos.row >= 0
            && pos.col >= 0
            && (pos.row as usize) < self.size
            && (pos.col as usize) < self.size
    }

    /// Tile at `pos` (`Ok(None)` for an empty slot)
    pub fn get(&self, pos: GridPos) -> Result<Option<Tile>, GridError> {
        self.index(pos).map(|idx| self.cells[idx])
    }

    /// Kind at `pos` (`Ok(None)` for an empty slot)
    pub fn kind_at(&self, pos: GridPos) -> Result<Option<TileKind>, GridError> {
        Ok(self.get(pos)?.map(|t| t.kind))
    }

    /// Store `cell` at `pos`, returning the previous occupant
    ///
    /// A stored tile has its `row`/`col` rewritten to `pos`.
    pub fn set(&mut self, pos: GridPos, cell: Cell) -> Result<Cell, GridError> {
        let idx = self.index(pos)?;
        let cell = cell.map(|t| Tile {
            row: pos.row,
            col: pos.col,
            ..t
        });
        Ok(std::mem::replace(&mut self.cells[idx], cell))
    }

    /// Empty the slot at `pos`, returning what was there
    pub fn take(&mut self, pos: GridPos) -> Result<Cell, GridError> {
        self.set(pos, None)
    }

    /// Exchange the occupants of two slots and update both tiles' coordinates
    pub fn swap(&mut self, a: GridPos, b: GridPos) -> Result<(), GridError> {
        let ia = self.index(a)?;
        let ib = self.index(b)?;
        self.cells.swap(ia, ib);
        if let Some(t) = self.cells[ia].as_mut() {
            t.row = a.row;
            t.col = a.col;
        }
        if let Some(t) = self.cells[ib].as_mut() {
            t.row = b.row;
            t.col = b.col;
        }
        Ok(())
    }

    /// Row-major slots
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Row-major iterator over every position on the board
    pub fn positions(&self) -> impl Iterator<Item = GridPos> {
        let size = self.size as i8;
        (0..size).flat_map(move |r| (0..size).map(move |c| GridPos::new(r, c)))
    }

    /// True when no slot is empty
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    /// True when every tile's cached coordinates match its slot
    pub fn is_consistent(&self) -> bool {
        self.cells.iter().enumerate().all(|(idx, cell)| match cell {
            Some(t) => {
                t.row as usize == idx / self.size && t.col as usize == idx % self.size
            }
            None => true,
        })
    }

    /// Largest tile id on the board
    pub fn max_tile_id(&self) -> Option<TileId> {
        self.cells.iter().flatten().map(|t| t.id).max()
    }

    /// Empty every slot
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = None;
        }
    }

    /// Write compact kind codes (0 = empty) in row-major order
    pub fn write_codes(&self, out: &mut Vec<u8>) {
        out.clear();
        out.extend(
            self.cells
                .iter()
                .map(|c| c.map(|t| t.kind.to_u8()).unwrap_or(0)),
        );
    }

    /// Kinds as nested rows, for assertions and display
    pub fn to_kinds(&self) -> Vec<Vec<Option<TileKind>>> {
        self.cells
            .chunks(self.size)
            .map(|row| row.iter().map(|c| c.map(|t| t.kind)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TileKind::*;

    #[test]
    fn test_grid_index_calculation() {
        let grid = Grid::new(8);
        assert_eq!(grid.index(GridPos::new(0, 0)), Ok(0));
        assert_eq!(grid.index(GridPos::new(0, 7)), Ok(7));
        assert_eq!(grid.index(GridPos::new(1, 0)), Ok(8));
        assert_eq!(grid.index(GridPos::new(7, 7)), Ok(63));
        assert!(grid.index(GridPos::new(-1, 0)).is_err());
        assert!(grid.index(GridPos::new(0, 8)).is_err());
        assert!(grid.index(GridPos::new(8, 0)).is_err());
    }

    #[test]
    fn test_set_rewrites_tile_coordinates() {
        let mut grid = Grid::new(4);
        let mut ids = TileIdAllocator::default();
        let tile = ids.spawn(Fries, GridPos::new(0, 0));

        grid.set(GridPos::new(2, 3), Some(tile)).unwrap();

        let stored = grid.get(GridPos::new(2, 3)).unwrap().unwrap();
        assert_eq!(stored.id, tile.id);
        assert_eq!(stored.pos(), GridPos::new(2, 3));
        assert!(grid.is_consistent());
    }

    #[test]
    fn test_swap_updates_both_tiles() {
        let mut grid = Grid::from_kinds(&[[Chicken, Burger], [Fries, Cola]]).unwrap();
        let a = GridPos::new(0, 0);
        let b = GridPos::new(1, 1);

        grid.swap(a, b).unwrap();

        assert_eq!(grid.kind_at(a).unwrap(), Some(Cola));
        assert_eq!(grid.kind_at(b).unwrap(), Some(Chicken));
        assert_eq!(grid.get(a).unwrap().unwrap().pos(), a);
        assert_eq!(grid.get(b).unwrap().unwrap().pos(), b);
        assert!(grid.is_consistent());
    }

    #[test]
    fn test_out_of_bounds_is_an_error_everywhere() {
        let mut grid = Grid::new(3);
        let bad = GridPos::new(3, 0);
        assert!(grid.get(bad).is_err());
        assert!(grid.set(bad, None).is_err());
        assert!(grid.take(bad).is_err());
        assert!(grid.swap(GridPos::new(0, 0), bad).is_err());
    }

    #[test]
    fn test_from_kinds_rejects_ragged_rows() {
        let rows: Vec<Vec<TileKind>> = vec![vec![Chicken, Burger], vec![Fries]];
        assert_eq!(
            Grid::from_kinds(&rows[..]),
            Err(GridError::NotSquare { size: 2 })
        );
    }

    #[test]
    fn test_write_codes_marks_empty_slots() {
        let mut grid = Grid::from_kinds(&[[Chicken, Burger], [Fries, Cola]]).unwrap();
        grid.take(GridPos::new(0, 1)).unwrap();

        let mut codes = Vec::new();
        grid.write_codes(&mut codes);
        assert_eq!(codes, vec![1, 0, 3, 4]);
        assert_eq!(grid.empty_count(), 1);
        assert!(!grid.is_full());
    }
}
