//! Random number source for terrain generation.
//!
//! The solver never touches a global RNG. Every random decision goes through
//! the `TerrainRng` trait so callers can pick the implementation:
//!
//! - `StdRandom`: wraps `rand::rngs::StdRng`, seedable from a `u64`
//! - `SequenceRandom`: replays a fixed list of samples (tests, replays)
//!
//! # Example
//!
//! ```ignore
//! use terrain_core::rng::{StdRandom, TerrainRng};
//!
//! let mut rng = StdRandom::from_seed(42);
//! let index = rng.next_usize_max(10); // 0..10
//! let unit = rng.next_double(); // 0.0..1.0
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Trait for random sources used by the constraint solver.
///
/// Only `next_double` and `next_u64` are required; bounded integers are
/// derived from `next_double` so that every implementation maps a sample to
/// an index the same way.
pub trait TerrainRng {
    /// Returns a random double in [0.0, 1.0).
    fn next_double(&mut self) -> f64;

    /// Returns a random u64. Used to derive seeds for follow-up runs.
    fn next_u64(&mut self) -> u64;

    /// Returns a random usize in [0, max).
    ///
    /// Returns 0 when `max` is 0.
    fn next_usize_max(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        let index = (self.next_double() * max as f64) as usize;
        // next_double is exclusive of 1.0, but guard against rounding at the top end
        index.min(max - 1)
    }
}

/// Standard Rust RNG wrapper using `rand::rngs::StdRng`.
///
/// This is the default RNG. The same seed always produces the same sequence
/// on the same build, which is what seeded terrain regeneration relies on.
#[derive(Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Create a new StdRandom from a u64 seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a StdRandom seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl TerrainRng for StdRandom {
    fn next_double(&mut self) -> f64 {
        self.rng.gen()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.gen()
    }
}

/// Replays a fixed list of unit samples in order, cycling when exhausted.
///
/// Samples are clamped into [0.0, 1.0). An empty list always yields 0.0.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    samples: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    pub fn new(samples: Vec<f64>) -> Self {
        let samples = samples
            .into_iter()
            .map(|s| if s.is_nan() { 0.0 } else { s.clamp(0.0, 1.0 - f64::EPSILON) })
            .collect();
        Self { samples, cursor: 0 }
    }

    /// A sequence that always returns the same sample.
    pub fn constant(sample: f64) -> Self {
        Self::new(vec![sample])
    }

    /// Number of samples drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl TerrainRng for SequenceRandom {
    fn next_double(&mut self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sample = self.samples[self.cursor % self.samples.len()];
        self.cursor += 1;
        sample
    }

    fn next_u64(&mut self) -> u64 {
        (self.next_double() * u64::MAX as f64) as u64
    }
}
