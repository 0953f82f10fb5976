//! Turn engine - owns the board and counters, turns swap requests into event streams
//!
//! The engine is a pure state-transition machine. `request_swap` computes the whole turn
//! at once (swap, revert or cascade, deadlock check, game over) and queues one
//! [`EngineEvent`] per step. The turn counts as in flight until the caller has drained
//! the queue; swap requests made before that are rejected with
//! [`MoveError::ConcurrentMoveRejected`].
//!
//! Grid and stats are never handed out mutably. Observers get events, `&Grid`, or a
//! [`GameSnapshot`].

use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::cascade::{Cascade, CascadeRules};
use crate::config::{DeadlockPolicy, EngineConfig};
use crate::error::{EngineError, MoveError};
use crate::events::EngineEvent;
use crate::generator::{board_spawns, generate_board};
use crate::grid::{Grid, TileIdAllocator};
use crate::hint::{find_hint_move, has_available_move, Hint};
use crate::matcher::has_match;
use crate::moves::check_legal;
use crate::rng::{SeededTiles, TileSource};
use crate::snapshot::{fnv1a64, GameSnapshot, Phase};
use crate::types::{GameStats, GridPos};

/// What a legal swap request turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The swap matched; the move was paid for and the cascade resolved
    Committed {
        rounds: u32,
        score_delta: u32,
        wings_delta: u32,
    },
    /// The swap did not match and was undone at no cost
    Reverted,
}

pub struct Engine {
    config: EngineConfig,
    grid: Grid,
    stats: GameStats,
    source: Box<dyn TileSource + Send>,
    ids: TileIdAllocator,
    events: VecDeque<EngineEvent>,
    phase: Phase,
    game_over: bool,
    turn_id: u32,
}

impl Engine {
    /// New game with a seeded tile source taken from `config.seed`
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let source = Box::new(SeededTiles::new(config.seed));
        Self::with_source(config, source)
    }

    /// New game drawing every kind from `source`
    pub fn with_source(
        config: EngineConfig,
        mut source: Box<dyn TileSource + Send>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let mut ids = TileIdAllocator::default();
        let grid = generate_board(
            config.grid_size,
            &config.kinds,
            source.as_mut(),
            &mut ids,
            config.max_generation_attempts,
        )?;
        info!(
            "[Engine] new {}x{} game, {} moves, {} kinds",
            config.grid_size,
            config.grid_size,
            config.initial_moves,
            config.kinds.len()
        );
        Ok(Self {
            stats: GameStats::new(config.initial_moves),
            config,
            grid,
            source,
            ids,
            events: VecDeque::new(),
            phase: Phase::Idle,
            game_over: false,
            turn_id: 0,
        })
    }

    /// Start from a prepared board (fixtures, replays)
    ///
    /// The board must be full, match-free, and sized as configured. Its tile ids are
    /// kept; new tiles continue after the largest one.
    pub fn from_grid(
        config: EngineConfig,
        grid: Grid,
        source: Box<dyn TileSource + Send>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if grid.size() != config.grid_size {
            return Err(EngineError::InvalidConfig(format!(
                "board is {}x{} but grid_size is {}",
                grid.size(),
                grid.size(),
                config.grid_size
            )));
        }
        if !grid.is_full() {
            return Err(EngineError::UnstableBoard("board has empty slots"));
        }
        if !grid.is_consistent() {
            return Err(EngineError::UnstableBoard("tile coordinates disagree with slots"));
        }
        if has_match(&grid) {
            return Err(EngineError::UnstableBoard("board contains a run"));
        }

        let next_id = grid.max_tile_id().map(|id| id.0.wrapping_add(1)).unwrap_or(0);
        Ok(Self {
            stats: GameStats::new(config.initial_moves),
            config,
            grid,
            source,
            ids: TileIdAllocator::starting_at(next_id),
            events: VecDeque::new(),
            phase: Phase::Idle,
            game_over: false,
            turn_id: 0,
        })
    }

    /// Regenerate the board and restore the initial counters
    ///
    /// Pending events are discarded. The tile source is not reseeded, so consecutive
    /// games on one engine differ.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        self.grid = generate_board(
            self.config.grid_size,
            &self.config.kinds,
            self.source.as_mut(),
            &mut self.ids,
            self.config.max_generation_attempts,
        )?;
        self.stats = GameStats::new(self.config.initial_moves);
        self.events.clear();
        self.phase = Phase::Idle;
        self.game_over = false;
        self.turn_id = 0;
        self.check_deadlock();
        self.sync_phase();
        info!("[Engine] reset");
        Ok(())
    }

    /// Swap the tiles at `from` and `to` and resolve the turn
    ///
    /// A rejected request (`InvalidPosition`, `IllegalMove`, `ConcurrentMoveRejected`,
    /// `GameOver`) leaves the engine exactly as it was. `MoveError::Grid` means a grid
    /// invariant broke mid-cascade: the partial turn stays applied and whatever it queued
    /// must still be drained. On `Ok` the turn's events are queued and must be drained
    /// before the next request.
    pub fn request_swap(&mut self, from: GridPos, to: GridPos) -> Result<TurnOutcome, MoveError> {
        if self.phase == Phase::Resolving {
            warn!("[Engine] swap {} -> {} rejected: still resolving", from, to);
            return Err(MoveError::ConcurrentMoveRejected);
        }
        if self.game_over {
            return Err(MoveError::GameOver);
        }
        if let Err(err) = check_legal(&self.grid, from, to) {
            debug!("[Engine] swap {} -> {} ignored: {}", from, to, err);
            return Err(err);
        }

        self.grid.swap(from, to)?;
        self.turn_id = self.turn_id.wrapping_add(1);
        self.events.push_back(EngineEvent::Swapped { from, to });

        if !has_match(&self.grid) {
            self.grid.swap(from, to)?;
            self.events.push_back(EngineEvent::SwapReverted { from, to });
            self.sync_phase();
            debug!("[Engine] turn {}: swap {} -> {} reverted", self.turn_id, from, to);
            return Ok(TurnOutcome::Reverted);
        }

        self.stats.moves_remaining = self.stats.moves_remaining.saturating_sub(1);
        self.events.push_back(EngineEvent::MoveCommitted {
            moves_remaining: self.stats.moves_remaining,
        });
        self.events.push_back(EngineEvent::StatsUpdated(self.stats));

        let resolved = Cascade {
            grid: &mut self.grid,
            stats: &mut self.stats,
            source: self.source.as_mut(),
            ids: &mut self.ids,
            rules: CascadeRules {
                kinds: &self.config.kinds,
                collectible: self.config.collectible,
            },
        }
        .resolve(&mut self.events);
        let summary = match resolved {
            Ok(summary) => summary,
            Err(err) => {
                warn!("[Engine] turn {} aborted mid-cascade: {}", self.turn_id, err);
                self.sync_phase();
                return Err(err.into());
            }
        };

        debug!(
            "[Engine] turn {}: {} round(s), +{} points, +{} wings",
            self.turn_id, summary.rounds, summary.score_delta, summary.wings_delta
        );

        if self.stats.moves_remaining == 0 {
            self.game_over = true;
            self.events.push_back(EngineEvent::GameOver(self.stats));
            info!(
                "[Engine] game over: score {}, wings {}",
                self.stats.score, self.stats.wings_collected
            );
        } else {
            self.check_deadlock();
        }

        self.sync_phase();
        Ok(TurnOutcome::Committed {
            rounds: summary.rounds,
            score_delta: summary.score_delta,
            wings_delta: summary.wings_delta,
        })
    }

    fn check_deadlock(&mut self) {
        if has_available_move(&mut self.grid) {
            return;
        }
        match self.config.deadlock_policy {
            DeadlockPolicy::Ignore => {
                info!("[Engine] board stuck: no available move");
                self.events.push_back(EngineEvent::BoardStuck);
            }
            DeadlockPolicy::Reshuffle => {
                match generate_board(
                    self.config.grid_size,
                    &self.config.kinds,
                    self.source.as_mut(),
                    &mut self.ids,
                    self.config.max_generation_attempts,
                ) {
                    Ok(grid) => {
                        self.grid = grid;
                        info!("[Engine] board reshuffled");
                        self.events.push_back(EngineEvent::BoardReshuffled {
                            tiles: board_spawns(&self.grid),
                        });
                    }
                    Err(err) => {
                        warn!("[Engine] reshuffle failed: {}", err);
                        self.events.push_back(EngineEvent::BoardStuck);
                    }
                }
            }
        }
    }

    fn sync_phase(&mut self) {
        self.phase = if self.events.is_empty() {
            Phase::Idle
        } else {
            Phase::Resolving
        };
    }

    /// True while a turn's events are still queued
    pub fn is_processing(&self) -> bool {
        self.phase == Phase::Resolving
    }

    /// Next queued event; the engine returns to idle once the queue is empty
    pub fn next_event(&mut self) -> Option<EngineEvent> {
        let event = self.events.pop_front();
        if self.events.is_empty() {
            self.phase = Phase::Idle;
        }
        event
    }

    /// Take every queued event at once
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.phase = Phase::Idle;
        self.events.drain(..).collect()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// First match-producing swap on the current board
    pub fn hint(&mut self) -> Option<Hint> {
        find_hint_move(&mut self.grid)
    }

    pub fn stats(&self) -> GameStats {
        self.stats
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn turn_id(&self) -> u32 {
        self.turn_id
    }

    /// Copy the observable state into `out`, reusing its board buffer
    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.size = self.grid.size();
        self.grid.write_codes(&mut out.board);
        out.board_hash = fnv1a64(out.board.iter().copied());
        out.stats = self.stats;
        out.phase = self.phase;
        out.game_over = self.game_over;
        out.turn_id = self.turn_id;
        out.seed = self.source.seed();
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut snap = GameSnapshot::default();
        self.snapshot_into(&mut snap);
        snap
    }
}
