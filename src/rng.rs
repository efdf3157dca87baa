//! # RandomNumberGenerator
//!
//! The `RandomNumberGenerator` struct is the random stream owned by a run. It
//! wraps the `rand` crate's `StdRng` and exposes the handful of draws the
//! genetic operators need: uniform deviates on [0, 1), integer intervals,
//! biased coin flips, and Gaussian deviates.
//!
//! Every rank of a distributed run owns its own generator, seeded with
//! `base_seed + rank`, so no coordination is needed between processes.
//!
//! ## Example
//!
//! ```rust
//! use pgalib::rng::RandomNumberGenerator;
//!
//! let mut rng = RandomNumberGenerator::from_seed(7);
//! let r = rng.random01();
//! assert!((0.0..1.0).contains(&r));
//!
//! let die = rng.random_interval(1, 6);
//! assert!((1..=6).contains(&die));
//! ```

use rand::{rngs::StdRng, Rng, SeedableRng};

/// A wrapper around the `rand` crate's `StdRng` that provides the random
/// draws used by the genetic operators.
#[derive(Clone, Debug)]
pub struct RandomNumberGenerator {
    pub rng: StdRng,
}

impl RandomNumberGenerator {
    /// Creates a new `RandomNumberGenerator` instance seeded from the system entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a new `RandomNumberGenerator` instance with a specific seed.
    ///
    /// This is useful for reproducible tests and benchmarks.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates the generator for one rank of a run.
    ///
    /// With a base seed the stream is `base + rank`; without one each rank
    /// draws fresh entropy.
    pub fn for_rank(seed: Option<u64>, rank: usize) -> Self {
        match seed {
            Some(base) => Self::from_seed(base.wrapping_add(rank as u64)),
            None => Self::new(),
        }
    }

    /// Returns a uniform deviate on [0, 1).
    pub fn random01(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Returns a uniform integer on the closed interval `[start, end]`.
    ///
    /// When `end < start` the interval is empty and `start` is returned.
    pub fn random_interval(&mut self, start: i64, end: i64) -> i64 {
        if end <= start {
            return start;
        }
        let span = (end - start + 1) as f64;
        let offset = (self.random01() * span).floor() as i64;
        start + offset.min(end - start)
    }

    /// Returns a uniform index on `[0, len)`.
    pub fn random_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.random_interval(0, len as i64 - 1) as usize
    }

    /// Flips a biased coin that comes up `true` with probability `p`.
    pub fn random_flip(&mut self, p: f64) -> bool {
        self.random01() < p
    }

    /// Returns a uniform deviate on `[start, end)`.
    pub fn random_uniform(&mut self, start: f64, end: f64) -> f64 {
        start + (end - start) * self.random01()
    }

    /// Returns an approximately normal deviate.
    ///
    /// The draw is the sum of twelve uniforms shifted by six, scaled by
    /// `sigma` and moved to `mean`.
    pub fn random_gaussian(&mut self, mean: f64, sigma: f64) -> f64 {
        let sum: f64 = (0..12).map(|_| self.random01()).sum();
        (sum - 6.0) * sigma + mean
    }
}

impl Default for RandomNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}
