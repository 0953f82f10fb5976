//! Core rules module - pure, deterministic, and testable
//!
//! This crate contains the board model, the match rules, and the turn engine.
//! It has **no dependencies** on rendering, input, networking, or timers:
//!
//! - **Deterministic**: every random pick goes through a [`TileSource`]; a seed plus a list
//!   of swaps replays a game exactly
//! - **Headless**: the engine emits data events; pacing and animation belong to the caller
//! - **Sandboxed checks**: move validation and hints swap, test, and swap back
//!
//! # Module Structure
//!
//! - [`grid`]: square board of optional tiles with self-updating tile coordinates
//! - [`matcher`]: run detection (rows, then columns) and clear-set deduplication
//! - [`moves`]: swap legality and sandboxed "would this match" checks
//! - [`cascade`]: clear, score, collect, gravity, refill, repeat
//! - [`hint`]: first match-producing swap in scan order
//! - [`generator`]: match-free, playable board generation with bounded retries
//! - [`engine`]: turn state machine, event queue, deadlock policy, snapshots
//! - [`scoring`], [`events`], [`config`], [`rng`], [`snapshot`], [`error`]
//!
//! # Game Rules
//!
//! - **Runs**: three or more equal tiles in a row or column
//! - **Moves**: swap two orthogonal neighbours; only a swap that creates a run costs a move
//! - **Scoring**: each cascade round scores `cleared_cells * 10 * round`
//! - **Collectible**: every cleared collectible tile adds one wing
//! - **Game over**: once the move budget reaches zero and the last cascade has resolved
//!
//! # Example
//!
//! ```
//! use match3_core::{Engine, EngineConfig, TurnOutcome};
//!
//! let mut engine = Engine::new(EngineConfig::default()).unwrap();
//!
//! // Every generated board has at least one available move.
//! let hint = engine.hint().unwrap();
//! let outcome = engine.request_swap(hint.from, hint.to).unwrap();
//! assert!(matches!(outcome, TurnOutcome::Committed { .. }));
//!
//! // Drain the turn's events before the next request.
//! for event in engine.drain_events() {
//!     println!("{}", event.name());
//! }
//! assert_eq!(engine.stats().moves_remaining, 29);
//! assert!(engine.stats().score >= 30);
//! ```

pub mod cascade;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod generator;
pub mod grid;
pub mod hint;
pub mod matcher;
pub mod moves;
pub mod rng;
pub mod scoring;
pub mod snapshot;

pub use match3_types as types;

// Re-export commonly used types for convenience
pub use cascade::{apply_gravity, refill, Cascade, CascadeRules, CascadeSummary};
pub use config::{DeadlockPolicy, EngineConfig};
pub use engine::{Engine, TurnOutcome};
pub use error::{EngineError, GridError, MoveError};
pub use events::{EngineEvent, TileDrop, TileSpawn};
pub use generator::generate_board;
pub use grid::{Cell, Grid, Tile, TileId, TileIdAllocator};
pub use hint::{find_hint_move, Hint};
pub use matcher::{clear_set, find_matches, has_match, MatchRun};
pub use moves::{check_legal, try_move, MoveCheck};
pub use rng::{SeededTiles, SequenceTiles, SimpleRng, TileSource};
pub use scoring::{round_points, score_round, RoundScore};
pub use snapshot::{fnv1a64, GameSnapshot, Phase};
