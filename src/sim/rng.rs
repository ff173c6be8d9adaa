//! Deterministic random source for battles
//!
//! A seeded `SimRng` is the only entropy that simulation code may touch.
//! Unseeded, it falls through to the thread-local OS-seeded generator, which
//! is only acceptable for cosmetics and for drawing fresh seeds.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Largest seed handed out by `generate_seed` (31 bits, JSON friendly)
pub const MAX_SEED: u64 = 0x7FFF_FFFF;

#[derive(Debug, Clone)]
pub struct SimRng {
    seed: Option<u64>,
    stream: Option<Pcg32>,
}

impl Default for SimRng {
    fn default() -> Self {
        Self::unseeded()
    }
}

impl SimRng {
    /// Ambient, non-deterministic source
    pub fn unseeded() -> Self {
        Self {
            seed: None,
            stream: None,
        }
    }

    /// Reproducible stream for `seed`
    pub fn seeded(seed: u64) -> Self {
        let mut rng = Self::unseeded();
        rng.seed(seed);
        rng
    }

    /// Install a reproducible stream
    pub fn seed(&mut self, seed: u64) {
        self.seed = Some(seed);
        self.stream = Some(Pcg32::seed_from_u64(seed));
    }

    /// Return to the ambient source
    pub fn unseed(&mut self) {
        self.seed = None;
        self.stream = None;
    }

    pub fn is_seeded(&self) -> bool {
        self.stream.is_some()
    }

    pub fn seed_value(&self) -> Option<u64> {
        self.seed
    }

    /// Uniform float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        match self.stream.as_mut() {
            Some(stream) => stream.random::<f32>(),
            None => rand::rng().random::<f32>(),
        }
    }

    /// Uniform float in [lo, hi)
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }

    /// Centered jitter in [-half, half)
    pub fn jitter(&mut self, half: f32) -> f32 {
        (self.next_f32() - 0.5) * 2.0 * half
    }

    pub fn chance(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    pub fn coin_flip(&mut self) -> bool {
        self.next_f32() < 0.5
    }

    /// Uniform angle in [0, 2π)
    pub fn angle(&mut self) -> f32 {
        self.next_f32() * std::f32::consts::TAU
    }

    /// Draw a fresh seed from this source
    pub fn generate_seed(&mut self) -> u64 {
        match self.stream.as_mut() {
            Some(stream) => stream.random_range(0..=MAX_SEED),
            None => rand::rng().random_range(0..=MAX_SEED),
        }
    }
}
