//! RNG module - tile kind generation
//!
//! Every random decision the engine makes goes through a [`TileSource`], so a game is
//! fully described by its configuration, its source, and the list of requested swaps.
//!
//! - [`SimpleRng`]: small LCG, deterministic across platforms
//! - [`SeededTiles`]: uniform picks driven by a `SimpleRng` (the default source)
//! - [`SequenceTiles`]: replays a fixed list of kinds, for fixtures and replays

use crate::types::TileKind;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    ///
    /// Uses the high bits; the low bits of a power-of-two LCG cycle with a short period.
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        (self.next_u32() >> 16) % max
    }

    /// Current internal state
    pub fn state(&self) -> u32 {
        self.state
    }
}

/// Supplies kinds for newly created tiles
pub trait TileSource {
    /// Pick one kind out of `pool` (never empty)
    fn next_kind(&mut self, pool: &[TileKind]) -> TileKind;

    /// Seed that reproduces this source, if it has one
    fn seed(&self) -> Option<u32> {
        None
    }
}

/// Uniform kind picks from a seeded LCG
#[derive(Debug, Clone)]
pub struct SeededTiles {
    seed: u32,
    rng: SimpleRng,
}

impl SeededTiles {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            rng: SimpleRng::new(seed),
        }
    }
}

impl Default for SeededTiles {
    fn default() -> Self {
        Self::new(1)
    }
}

impl TileSource for SeededTiles {
    fn next_kind(&mut self, pool: &[TileKind]) -> TileKind {
        let idx = self.rng.next_range(pool.len() as u32) as usize;
        pool[idx]
    }

    fn seed(&self) -> Option<u32> {
        Some(self.seed)
    }
}

/// Replays a scripted list of kinds, cycling when it runs out
///
/// A scripted kind that is not in the requested pool is skipped in favour of the pool's
/// first kind, so generation constraints still hold.
#[derive(Debug, Clone)]
pub struct SequenceTiles {
    kinds: Vec<TileKind>,
    index: usize,
}

impl SequenceTiles {
    pub fn new(kinds: impl Into<Vec<TileKind>>) -> Self {
        Self {
            kinds: kinds.into(),
            index: 0,
        }
    }

    /// How many kinds have been handed out
    pub fn consumed(&self) -> usize {
        self.index
    }
}

impl TileSource for SequenceTiles {
    fn next_kind(&mut self, pool: &[TileKind]) -> TileKind {
        if self.kinds.is_empty() {
            return pool[0];
        }
        let kind = self.kinds[self.index % self.kinds.len()];
        self.index += 1;
        if pool.contains(&kind) {
            kind
        } else {
            pool[0]
        }
    }
}

impl<S: TileSource + ?Sized> TileSource for Box<S> {
    fn next_kind(&mut self, pool: &[TileKind]) -> TileKind {
        (**self).next_kind(pool)
    }

    fn seed(&self) -> Option<u32> {
        (**self).seed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TileKind::*;

    #[test]
    fn test_rng_deterministic() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(12345);

        // Same seed should produce same sequence
        for _ in 0..100 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(54321);

        let v1 = rng1.next_u32();
        let v2 = rng2.next_u32();
        assert_ne!(v1, v2);
    }

    #[test]
    fn test_next_range_stays_in_range() {
        let mut rng = SimpleRng::new(7);
        for _ in 0..1000 {
            assert!(rng.next_range(5) < 5);
        }
        assert_eq!(rng.next_range(0), 0);
    }

    #[test]
    fn test_seeded_tiles_cover_the_pool() {
        let mut source = SeededTiles::new(42);
        let pool = TileKind::DEFAULT_SET;
        let mut seen = [false; 5];
        for _ in 0..500 {
            let kind = source.next_kind(&pool);
            let idx = pool.iter().position(|k| *k == kind).unwrap();
            seen[idx] = true;
        }
        assert!(seen.iter().all(|s| *s), "every kind should eventually appear");
        assert_eq!(source.seed(), Some(42));
    }

    #[test]
    fn test_sequence_tiles_cycle_and_respect_pool() {
        let mut source = SequenceTiles::new(vec![Cola, Donut]);
        let pool = [Chicken, Cola];
        assert_eq!(source.next_kind(&pool), Cola);
        // Donut is not in the pool, so the pool's first kind is used.
        assert_eq!(source.next_kind(&pool), Chicken);
        assert_eq!(source.next_kind(&pool), Cola);
        assert_eq!(source.consumed(), 3);
        assert_eq!(source.seed(), None);
    }
}
