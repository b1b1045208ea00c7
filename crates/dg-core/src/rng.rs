//! Random number generation for a dungeon instance
//!
//! Every instance owns its own seeded ChaCha RNG; nothing is process-global.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A source of uniform rolls in `[0, 1)`.
///
/// Combat math is written against this trait so tests can feed fixed
/// sequences instead of a real generator.
pub trait RollSource {
    fn roll(&mut self) -> f32;
}

/// Instance random number generator
///
/// Wraps ChaCha8Rng for reproducible runs from a seed.
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
}

impl GameRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Returns 0..n-1, or 0 if n is 0.
    pub fn rn2(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }

    /// Returns a value in `lo..=hi`. Bounds may be given in either order.
    pub fn range_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        self.rng.gen_range(lo..=hi)
    }

    /// Uniform float in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        self.rng.r#gen::<f32>()
    }

    /// Uniform float in `[lo, hi)`; returns `lo` for an empty range.
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }
}

impl RollSource for GameRng {
    fn roll(&mut self) -> f32 {
        self.unit()
    }
}
