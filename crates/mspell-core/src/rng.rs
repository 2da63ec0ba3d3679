//! Random number generation for the decision engine
//!
//! Every probabilistic rule (target scan order, resistance suppression,
//! selection tiers, cast failure) draws from one seeded ChaCha stream so a
//! turn can be replayed from its seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The single random stream a caster's turn draws from.
///
/// Scan order, suppression rolls, tier rolls, failure checks and effect
/// magnitudes all come from here, in that order, so a seed pins a decision.
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Fresh stream for hosts that do not replay turns.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// Seed to hand back to [`GameRng::new`] when replaying.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform draw in `0..n`; an empty range yields 0.
    pub fn rn2(&mut self, n: u32) -> u32 {
        match n {
            0 => 0,
            n => self.rng.gen_range(0..n),
        }
    }

    /// Uniform draw in `1..=n`; an empty range yields 0.
    pub fn rnd(&mut self, n: u32) -> u32 {
        match n {
            0 => 0,
            n => self.rng.gen_range(1..=n),
        }
    }

    /// Sum of `n` draws of `rnd(m)`, used for effect magnitudes.
    pub fn dice(&mut self, n: u32, m: u32) -> u32 {
        (0..n).map(|_| self.rnd(m)).sum()
    }

    pub fn one_in(&mut self, n: u32) -> bool {
        self.rn2(n) == 0
    }

    /// Tier and suppression odds. 100 and above always pass.
    pub fn percent(&mut self, percent: u32) -> bool {
        self.rn2(100) < percent
    }

    /// Uniform pick from a tier's members.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.rn2(items.len() as u32) as usize;
        items.get(index)
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
