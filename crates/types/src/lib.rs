//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core rules, adapter protocol, headless runners).
//!
//! # Board Dimensions
//!
//! The board is a square grid whose side is a runtime parameter:
//!
//! - **Default size**: 8x8 (the desktop layout; 7x7 is the common mobile layout)
//! - **Allowed sizes**: 3 through 16
//! - **Coordinates**: `(row, col)`, row 0 is the top row, col 0 is the left column
//!
//! # Rule Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_MOVES` | 30 | Move budget of a new game |
//! | `MIN_RUN_LENGTH` | 3 | Shortest line of equal tiles that clears |
//! | `BASE_TILE_POINTS` | 10 | Points per cleared cell before the combo multiplier |
//! | `HINT_DELAY_MS` | 5000 | Idle time after which a front-end shows a hint |
//! | `MAX_GENERATION_ATTEMPTS` | 1000 | Board generation retry cap |
//!
//! # Examples
//!
//! ```
//! use match3_types::{GridPos, TileKind, DEFAULT_GRID_SIZE};
//!
//! let kind = TileKind::from_str("CHICKEN").unwrap();
//! assert_eq!(kind, TileKind::Chicken);
//!
//! let a = GridPos::new(0, 1);
//! assert!(a.is_adjacent(GridPos::new(1, 1)));
//! assert!(!a.is_adjacent(GridPos::new(1, 2)));
//!
//! assert_eq!(DEFAULT_GRID_SIZE, 8);
//! ```

use std::fmt;

/// Default board side length (8x8)
pub const DEFAULT_GRID_SIZE: usize = 8;

/// Smallest supported board side
pub const MIN_GRID_SIZE: usize = 3;

/// Largest supported board side
pub const MAX_GRID_SIZE: usize = 16;

/// Move budget of a fresh game
pub const DEFAULT_MOVES: u32 = 30;

/// Shortest run of equal tiles that counts as a match
pub const MIN_RUN_LENGTH: usize = 3;

/// Points awarded per cleared cell in combo round 1
pub const BASE_TILE_POINTS: u32 = 10;

/// Idle delay before a front-end should surface a hint
pub const HINT_DELAY_MS: u32 = 5000;

/// Upper bound on full-board regeneration attempts
pub const MAX_GENERATION_ATTEMPTS: u32 = 1000;


/// Item kinds a tile can carry
///
/// The first five form the classic set used by a default board:
/// - **Chicken**: the collectible kind (feeds the basket / wings counter)
/// - **Burger**, **Fries**, **Cola**, **Bucket**
///
/// The remaining kinds are available to boards configured with a wider set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TileKind {
    Chicken,
    Burger,
    Fries,
    Cola,
    Bucket,
    IceCream,
    Donut,
    Cappuccino,
}

impl TileKind {
    /// Every known kind, in code order
    pub const ALL: [TileKind; 8] = [
        TileKind::Chicken,
        TileKind::Burger,
        TileKind::Fries,
        TileKind::Cola,
        TileKind::Bucket,
        TileKind::IceCream,
        TileKind::Donut,
        TileKind::Cappuccino,
    ];

    /// Kinds used by a default board
    pub const DEFAULT_SET: [TileKind; 5] = [
        TileKind::Chicken,
        TileKind::Burger,
        TileKind::Fries,
        TileKind::Cola,
        TileKind::Bucket,
    ];

    /// Parse kind from string (case-insensitive, `snake_case` names)
    ///
    /// # Examples
    ///
    /// ```
    /// use match3_types::TileKind;
    ///
    /// assert_eq!(TileKind::from_str("fries"), Some(TileKind::Fries));
    /// assert_eq!(TileKind::from_str("Ice_Cream"), Some(TileKind::IceCream));
    /// assert_eq!(TileKind::from_str("cookie"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "chicken" => Some(TileKind::Chicken),
            "burger" => Some(TileKind::Burger),
            "fries" => Some(TileKind::Fries),
            "cola" => Some(TileKind::Cola),
            "bucket" => Some(TileKind::Bucket),
            "ice_cream" => Some(TileKind::IceCream),
            "donut" => Some(TileKind::Donut),
            "cappuccino" => Some(TileKind::Cappuccino),
            _ => None,
        }
    }

    /// Lowercase `snake_case` name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            TileKind::Chicken => "chicken",
            TileKind::Burger => "burger",
            TileKind::Fries => "fries",
            TileKind::Cola => "cola",
            TileKind::Bucket => "bucket",
            TileKind::IceCream => "ice_cream",
            TileKind::Donut => "donut",
            TileKind::Cappuccino => "cappuccino",
        }
    }

    /// Compact board code (1-based, 0 is reserved for an empty slot)
    pub fn to_u8(self) -> u8 {
        match self {
            TileKind::Chicken => 1,
            TileKind::Burger => 2,
            TileKind::Fries => 3,
            TileKind::Cola => 4,
            TileKind::Bucket => 5,
            TileKind::IceCream => 6,
            TileKind::Donut => 7,
            TileKind::Cappuccino => 8,
        }
    }

    /// Inverse of [`TileKind::to_u8`]
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            1..=8 => Some(Self::ALL[(code - 1) as usize]),
            _ => None,
        }
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cell coordinate on the board
///
/// Signed so that positions arriving from outside (input collaborators, the adapter)
/// can be represented before they are bounds-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    pub row: i8,
    pub col: i8,
}

impl GridPos {
    pub const fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    /// Position shifted by `(dr, dc)`; saturates instead of wrapping
    pub fn offset(self, dr: i8, dc: i8) -> Self {
        Self {
            row: self.row.saturating_add(dr),
            col: self.col.saturating_add(dc),
        }
    }

    /// Manhattan distance between two positions
    pub fn manhattan(self, other: GridPos) -> u32 {
        let dr = (self.row as i32 - other.row as i32).unsigned_abs();
        let dc = (self.col as i32 - other.col as i32).unsigned_abs();
        dr + dc
    }

    /// True for the four orthogonal neighbours only (never diagonal, never self)
    pub fn is_adjacent(self, other: GridPos) -> bool {
        self.manhattan(other) == 1
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Direction of a detected run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
        }
    }
}

/// Per-session counters
///
/// Reset on every new game. `score` and `wings_collected` only change during cascade
/// resolution; `moves_remaining` only changes when a match-producing move is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GameStats {
    pub score: u32,
    pub moves_remaining: u32,
    pub wings_collected: u32,
}

impl GameStats {
    /// Fresh counters for a game with the given move budget
    pub fn new(moves: u32) -> Self {
        Self {
            score: 0,
            moves_remaining: moves,
            wings_collected: 0,
        }
    }
}
