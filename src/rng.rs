use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// The solver's only source of randomness. Injected at construction so
/// deterministic tests and production randomness share one code path.
pub trait Sampler {
  /// Draws an integer from the inclusive range `[min, max]`.
  fn sample(&mut self, min: usize, max: usize) -> usize;
}

/// Seeded ChaCha20 sampler. The seed is recoverable so any generation can
/// be replayed.
#[derive(Debug, Clone)]
pub struct RngSampler {
  seed: u64,
  rng: ChaCha20Rng,
}

impl Default for RngSampler {
  fn default() -> Self {
    Self::new(None)
  }
}

impl RngSampler {
  pub fn new(seed: Option<u64>) -> Self {
    let seed = seed.unwrap_or_else(|| rand::rng().next_u64());
    Self {
      seed,
      rng: ChaCha20Rng::seed_from_u64(seed),
    }
  }

  pub fn seed(&self) -> u64 {
    self.seed
  }
}

impl Sampler for RngSampler {
  fn sample(&mut self, min: usize, max: usize) -> usize {
    self.rng.random_range(min..=max)
  }
}

/// Always picks the lower bound. The first tie wins every minimum-entropy
/// scan and the first weighted candidate wins every draw, which makes
/// whole solves reproducible by hand.
#[derive(Default, Debug, Clone, Copy)]
pub struct MinSampler;

impl Sampler for MinSampler {
  fn sample(&mut self, min: usize, _max: usize) -> usize {
    min
  }
}
