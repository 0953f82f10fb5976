//! Error types for the rule engine
//!
//! Every variant here is recoverable: a rejected request leaves the engine untouched.
//! `BoardGenerationFailure` is the only condition a caller cannot retry its way out of
//! without changing configuration.

use thiserror::Error;

use crate::types::GridPos;

/// Grid accessor failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("position {pos} is outside the {size}x{size} grid")]
    OutOfBounds { pos: GridPos, size: usize },
    #[error("grid rows must form a {size}x{size} square")]
    NotSquare { size: usize },
}

/// Reasons a swap request is ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    /// Out of bounds, or the slot holds no tile
    #[error("invalid position {pos}")]
    InvalidPosition { pos: GridPos },
    /// Positions are not orthogonal neighbours
    #[error("illegal move {from} -> {to}: tiles are not adjacent")]
    IllegalMove { from: GridPos, to: GridPos },
    /// A previous turn's events have not been drained yet
    #[error("a cascade is still being resolved")]
    ConcurrentMoveRejected,
    /// The move budget is spent
    #[error("game over: no moves remaining")]
    GameOver,
    /// Board bookkeeping failed while resolving; the turn is abandoned
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Engine construction and reset failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("could not generate a match-free board in {attempts} attempts")]
    BoardGenerationFailure { attempts: u32 },
    #[error("board is not at rest: {0}")]
    UnstableBoard(&'static str),
    #[error(transparent)]
    Grid(#[from] GridError),
}
