//! Randomness for adversarial-input scenarios.

use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Supplier of bounded non-negative integers.
pub trait RandomSource {
    /// Uniform integer in `[0, bound)`; always 0 when `bound` is 0.
    fn next_bounded(&mut self, bound: u64) -> u64;

    /// Seed that reproduces this stream, if there is one.
    fn seed(&self) -> Option<u64> {
        None
    }
}

/// ChaCha20-backed source, seeded for reproducible runs or from the OS.
#[derive(Debug, Clone)]
pub struct ChaChaSource {
    rng: ChaCha20Rng,
    seed: Option<u64>,
}

impl ChaChaSource {
    /// Deterministic stream for `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Stream seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_os_rng(),
            seed: None,
        }
    }

    /// Seeded when `seed` is given, OS entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::seeded(s),
            None => Self::from_entropy(),
        }
    }
}

impl RandomSource for ChaChaSource {
    fn next_bounded(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.rng.random_range(0..bound)
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Replays a fixed list of values (reduced below the bound), cycling.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<u64>,
    next: usize,
}

impl SequenceSource {
    /// Source replaying `values`.
    pub fn new(values: Vec<u64>) -> Self {
        Self { values, next: 0 }
    }
}

impl RandomSource for SequenceSource {
    fn next_bounded(&mut self, bound: u64) -> u64 {
        if bound == 0 || self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value % bound
    }
}
