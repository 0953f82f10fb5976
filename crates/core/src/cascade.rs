//! Cascade resolution - clear, score, collect, gravity, refill, repeat
//!
//! Each round detects every run on the board, clears the union of their cells once,
//! scores `cleared * 10 * round`, credits one wing per collectible tile cleared, lets the
//! remaining tiles fall, and refills the holes. Rounds repeat until the board is at rest.
//!
//! Refill draws fresh kinds with no neighbour filter, so chains are possible. There is no
//! round cap: every round clears at least three cells, and termination is left to the
//! tile source the same way a live game leaves it to chance.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::error::GridError;
use crate::events::{EngineEvent, TileDrop, TileSpawn};
use crate::grid::{Grid, TileIdAllocator};
use crate::matcher::{clear_set, find_matches, MatchRun};
use crate::rng::TileSource;
use crate::scoring::round_points;
use crate::types::{GameStats, GridPos, TileKind};

/// Game rules the resolver needs
#[derive(Debug, Clone, Copy)]
pub struct CascadeRules<'r> {
    /// Kinds drawn for refill
    pub kinds: &'r [TileKind],
    pub collectible: TileKind,
}

/// Totals for one resolved turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CascadeSummary {
    pub rounds: u32,
    pub score_delta: u32,
    pub wings_delta: u32,
    pub cleared: u32,
}

/// Let tiles fall towards row `size - 1`, one column at a time
///
/// Relative order inside a column is preserved. Drops are listed column by column, bottom
/// tile first.
pub fn apply_gravity(grid: &mut Grid) -> Result<Vec<TileDrop>, GridError> {
    let size = grid.size() as i8;
    let mut drops = Vec::new();

    for col in 0..size {
        let mut write = size - 1;
        for row in (0..size).rev() {
            let from = GridPos::new(row, col);
            let Some(tile) = grid.get(from)? else {
                continue;
            };
            if row != write {
                grid.take(from)?;
                grid.set(GridPos::new(write, col), Some(tile))?;
                drops.push(TileDrop {
                    tile: tile.id,
                    col,
                    from_row: row,
                    to_row: write,
                });
            }
            write -= 1;
        }
    }

    Ok(drops)
}

/// Fill every empty slot with a fresh tile
///
/// Columns left to right, rows top to bottom; one kind is drawn per slot in that order.
pub fn refill(
    grid: &mut Grid,
    pool: &[TileKind],
    source: &mut dyn TileSource,
    ids: &mut TileIdAllocator,
) -> Result<Vec<TileSpawn>, GridError> {
    let size = grid.size() as i8;
    let mut spawns = Vec::new();

    for col in 0..size {
        for row in 0..size {
            let pos = GridPos::new(row, col);
            if grid.get(pos)?.is_some() {
                continue;
            }
            let kind = source.next_kind(pool);
            let tile = ids.spawn(kind, pos);
            grid.set(pos, Some(tile))?;
            spawns.push(TileSpawn {
                tile: tile.id,
                row,
                col,
                kind,
            });
        }
    }

    Ok(spawns)
}

/// One turn's worth of cascade resolution over borrowed engine state
pub struct Cascade<'a> {
    pub grid: &'a mut Grid,
    pub stats: &'a mut GameStats,
    pub source: &'a mut dyn TileSource,
    pub ids: &'a mut TileIdAllocator,
    pub rules: CascadeRules<'a>,
}

impl<'a> Cascade<'a> {
    /// Run rounds until no run remains, appending every step to `events`
    pub fn resolve(
        &mut self,
        events: &mut VecDeque<EngineEvent>,
    ) -> Result<CascadeSummary, GridError> {
        let mut summary = CascadeSummary::default();

        loop {
            let runs = find_matches(self.grid);
            if runs.is_empty() {
                break;
            }
            summary.rounds += 1;
            let round = summary.rounds;

            self.push_cues(&runs, round, events);

            let cleared = clear_set(self.grid.size(), &runs);

            let mut wings = 0u32;
            for &pos in &cleared {
                if self.grid.kind_at(pos)? == Some(self.rules.collectible) {
                    wings += 1;
                    events.push_back(EngineEvent::CollectibleReached { pos, delta: 1 });
                }
            }
            for &pos in &cleared {
                self.grid.take(pos)?;
            }

            let points = round_points(cleared.len(), round);
            self.stats.score = self.stats.score.saturating_add(points);
            self.stats.wings_collected = self.stats.wings_collected.saturating_add(wings);
            summary.score_delta = summary.score_delta.saturating_add(points);
            summary.wings_delta += wings;
            summary.cleared += cleared.len() as u32;

            debug!(
                "[Cascade] round {}: {} run(s), {} cell(s), +{} points, +{} wings",
                round,
                runs.len(),
                cleared.len(),
                points,
                wings
            );

            events.push_back(EngineEvent::CellsCleared {
                positions: cleared,
                round,
            });
            events.push_back(EngineEvent::StatsUpdated(*self.stats));

            let drops = apply_gravity(self.grid)?;
            trace!("[Cascade] {} tile(s) dropped", drops.len());
            events.push_back(EngineEvent::TilesDropped { drops });

            let tiles = refill(self.grid, self.rules.kinds, self.source, self.ids)?;
            trace!("[Cascade] {} tile(s) introduced", tiles.len());
            events.push_back(EngineEvent::TilesIntroduced { tiles });
        }

        Ok(summary)
    }

    fn push_cues(&self, runs: &[MatchRun], round: u32, events: &mut VecDeque<EngineEvent>) {
        if round >= 2 {
            events.push_back(EngineEvent::Combo {
                round,
                anchor: runs[0].first(),
            });
        }
        if runs.len() >= 2 {
            events.push_back(EngineEvent::MultiMatch {
                round,
                runs: runs.len() as u32,
            });
        }
        for run in runs.iter().filter(|r| r.len() >= 4) {
            events.push_back(EngineEvent::BigRun {
                length: run.len() as u8,
                orientation: run.orientation,
                kind: run.kind,
                anchor: run.anchor(),
            });
        }
    }
}
