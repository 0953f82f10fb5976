//! Engine configuration
//!
//! Board size, move budget and kind set are fixed for the life of a game. Values come
//! from [`EngineConfig::default`] or from `MATCH3_*` environment variables.

use std::env;

use crate::error::EngineError;
use crate::types::{
    TileKind, DEFAULT_GRID_SIZE, DEFAULT_MOVES, MAX_GENERATION_ATTEMPTS, MAX_GRID_SIZE,
    MIN_GRID_SIZE,
};

/// What to do when a resting board has no match-producing swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeadlockPolicy {
    /// Report `BoardStuck` and leave the board alone
    #[default]
    Ignore,
    /// Regenerate a match-free board that has at least one move
    Reshuffle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub grid_size: usize,
    pub initial_moves: u32,
    /// Kinds used for generation and refill
    pub kinds: Vec<TileKind>,
    /// Kind that feeds the wings counter
    pub collectible: TileKind,
    pub seed: u32,
    pub max_generation_attempts: u32,
    pub deadlock_policy: DeadlockPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            initial_moves: DEFAULT_MOVES,
            kinds: TileKind::DEFAULT_SET.to_vec(),
            collectible: TileKind::Chicken,
            seed: 1,
            max_generation_attempts: MAX_GENERATION_ATTEMPTS,
            deadlock_policy: DeadlockPolicy::Ignore,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

impl EngineConfig {
    /// Create from environment variables, falling back to defaults
    ///
    /// - `MATCH3_GRID_SIZE`: board side (default 8)
    /// - `MATCH3_MOVES`: move budget (default 30)
    /// - `MATCH3_KINDS`: number of kinds in play, taken from the front of the kind list
    /// - `MATCH3_SEED`: RNG seed
    /// - `MATCH3_RESHUFFLE`: "1"/"true" reshuffles deadlocked boards
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(size) = env_parse::<usize>("MATCH3_GRID_SIZE") {
            config.grid_size = size;
        }
        if let Some(moves) = env_parse::<u32>("MATCH3_MOVES") {
            config.initial_moves = moves;
        }
        if let Some(count) = env_parse::<usize>("MATCH3_KINDS") {
            let count = count.clamp(1, TileKind::ALL.len());
            config.kinds = TileKind::ALL[..count].to_vec();
        }
        if let Some(seed) = env_parse::<u32>("MATCH3_SEED") {
            config.seed = seed;
        }
        if let Some(on) = env_flag("MATCH3_RESHUFFLE") {
            config.deadlock_policy = if on {
                DeadlockPolicy::Reshuffle
            } else {
                DeadlockPolicy::Ignore
            };
        }

        config
    }

    /// Reject configurations the generator cannot work with
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return Err(EngineError::InvalidConfig(format!(
                "grid size {} outside {}..={}",
                self.grid_size, MIN_GRID_SIZE, MAX_GRID_SIZE
            )));
        }
        if self.initial_moves == 0 {
            return Err(EngineError::InvalidConfig(
                "initial_moves must be at least 1".to_string(),
            ));
        }
        if self.kinds.len() < 2 {
            return Err(EngineError::InvalidConfig(
                "at least two tile kinds are required".to_string(),
            ));
        }
        for (i, kind) in self.kinds.iter().enumerate() {
            if self.kinds[..i].contains(kind) {
                return Err(EngineError::InvalidConfig(format!(
                    "tile kind {} listed twice",
                    kind
                )));
            }
        }
        if !self.kinds.contains(&self.collectible) {
            return Err(EngineError::InvalidConfig(format!(
                "collectible {} is not in the kind set",
                self.collectible
            )));
        }
        if self.max_generation_attempts == 0 {
            return Err(EngineError::InvalidConfig(
                "max_generation_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
