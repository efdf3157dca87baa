//! # Real representation
//!
//! Fixed-length vectors of `f64`. Each position has its own `[min, max]`
//! range, given either directly or as `median ± |median * percent|`.
//!
//! The default mutation perturbs a selected allele multiplicatively by a
//! Gaussian deviate: `x ± N(0, 0.1) * x`.
//!
//! ## Example
//!
//! ```rust
//! use pgalib::genome::{RealMutation, RealRepresentation, Representation};
//! use pgalib::rng::RandomNumberGenerator;
//!
//! let rep = RealRepresentation::new(3)
//!     .with_range(-2.0, 2.0)
//!     .with_mutation(RealMutation::Range);
//! let mut rng = RandomNumberGenerator::from_seed(4);
//! let mut x = rep.create(true, &mut rng);
//! rep.mutate(&mut x, 1.0, &mut rng);
//! assert!(x.iter().all(|v| (-2.0..2.0).contains(v)));
//! ```

use std::io::Write;

use super::{crossover_alleles, read_records, write_length, CrossoverParams, Representation};
use crate::error::{GeneticError, Result};
use crate::rng::RandomNumberGenerator;

/// How the initialisation ranges were specified.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealInit {
    Range,
    Percent,
}

/// How a selected real allele is perturbed.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealMutation {
    /// `x ± value * x`.
    Constant,
    /// `x ± U(0, value) * x`.
    Uniform,
    /// `x ± N(0, value) * x`.
    Gaussian,
    /// Redraw uniformly from the position's range.
    Range,
}

impl RealMutation {
    fn default_value(self) -> f64 {
        match self {
            RealMutation::Constant => 0.01,
            RealMutation::Uniform | RealMutation::Gaussian => 0.1,
            RealMutation::Range => 0.0,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RealRepresentation {
    len: usize,
    min: Vec<f64>,
    max: Vec<f64>,
    init: RealInit,
    mutation: RealMutation,
    mutation_value: Option<f64>,
    bounded: bool,
}

impl RealRepresentation {
    /// Alleles in `[0, 1)`, Gaussian mutation.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            min: vec![0.0; len],
            max: vec![1.0; len],
            init: RealInit::Range,
            mutation: RealMutation::Gaussian,
            mutation_value: None,
            bounded: false,
        }
    }

    pub fn with_ranges(mut self, min: Vec<f64>, max: Vec<f64>) -> Self {
        self.min = min;
        self.max = max;
        self.init = RealInit::Range;
        self
    }

    pub fn with_range(self, min: f64, max: f64) -> Self {
        let len = self.len;
        self.with_ranges(vec![min; len], vec![max; len])
    }

    /// Ranges of `median[i] ± |median[i] * percent[i]|`.
    pub fn with_percent(mut self, median: &[f64], percent: &[f64]) -> Self {
        let (min, max) = median
            .iter()
            .zip(percent)
            .map(|(&m, &p)| {
                let offset = (m * p).abs();
                (m - offset, m + offset)
            })
            .unzip();
        self.min = min;
        self.max = max;
        self.init = RealInit::Percent;
        self
    }

    pub fn with_mutation(mut self, mutation: RealMutation) -> Self {
        self.mutation = mutation;
        self
    }

    /// Overrides the mutation magnitude used by the multiplicative mutations.
    pub fn with_mutation_value(mut self, value: f64) -> Self {
        self.mutation_value = Some(value);
        self
    }

    pub fn with_bounded_mutation(mut self, bounded: bool) -> Self {
        self.bounded = bounded;
        self
    }

    pub fn init(&self) -> RealInit {
        self.init
    }

    pub fn mutation(&self) -> RealMutation {
        self.mutation
    }

    pub fn mutation_value(&self) -> f64 {
        self.mutation_value
            .unwrap_or_else(|| self.mutation.default_value())
    }

    pub fn min(&self) -> &[f64] {
        &self.min
    }

    pub fn max(&self) -> &[f64] {
        &self.max
    }

    fn mutate_with(
        &self,
        mutation: RealMutation,
        genome: &mut [f64],
        rate: f64,
        rng: &mut RandomNumberGenerator,
    ) -> usize {
        let value = self.mutation_value();
        let mut count = 0;
        for i in 0..self.len {
            if !rng.random_flip(rate) {
                continue;
            }
            let before = genome[i];
            let factor = match mutation {
                RealMutation::Range => {
                    genome[i] = rng.random_uniform(self.min[i], self.max[i]);
                    None
                }
                RealMutation::Constant => Some(value),
                RealMutation::Uniform => Some(rng.random_uniform(0.0, value)),
                RealMutation::Gaussian => Some(rng.random_gaussian(0.0, value)),
            };
            if let Some(factor) = factor {
                if rng.random_flip(0.5) {
                    genome[i] += factor * genome[i];
                } else {
                    genome[i] -= factor * genome[i];
                }
            }
            if self.bounded {
                genome[i] = genome[i].clamp(self.min[i], self.max[i]);
            }
            if genome[i] != before {
                count += 1;
            }
        }
        count
    }
}

impl Representation for RealRepresentation {
    type Genome = Vec<f64>;

    fn string_length(&self) -> usize {
        self.len
    }

    fn zeroed(&self) -> Vec<f64> {
        vec![0.0; self.len]
    }

    fn initialize(&self, genome: &mut Vec<f64>, rng: &mut RandomNumberGenerator) {
        genome.resize(self.len, 0.0);
        for (i, slot) in genome.iter_mut().enumerate() {
            *slot = rng.random_uniform(self.min[i], self.max[i]);
        }
    }

    fn mutate(&self, genome: &mut Vec<f64>, rate: f64, rng: &mut RandomNumberGenerator) -> usize {
        self.mutate_with(self.mutation, genome, rate, rng)
    }

    fn resample(&self, genome: &mut Vec<f64>, rate: f64, rng: &mut RandomNumberGenerator) -> usize {
        self.mutate_with(RealMutation::Range, genome, rate, rng)
    }

    fn crossover(
        &self,
        params: CrossoverParams,
        parent1: &Vec<f64>,
        parent2: &Vec<f64>,
        child1: &mut Vec<f64>,
        child2: &mut Vec<f64>,
        rng: &mut RandomNumberGenerator,
    ) {
        crossover_alleles(params, parent1, parent2, child1, child2, rng);
    }

    fn duplicate(&self, a: &Vec<f64>, b: &Vec<f64>) -> bool {
        a == b
    }

    fn print(&self, genome: &Vec<f64>, sink: &mut dyn Write) -> std::io::Result<()> {
        for (i, v) in genome.iter().enumerate() {
            let cell = format_g(*v, 7);
            match i % 5 {
                0 => write!(sink, "#{:4}: [{:>11}]", i, cell)?,
                4 => {
                    write!(sink, ", [{:>11}]", cell)?;
                    if i + 1 < genome.len() {
                        writeln!(sink)?;
                    }
                }
                _ => write!(sink, ", [{:>11}]", cell)?,
            }
        }
        writeln!(sink)
    }

    fn encode(&self, genome: &Vec<f64>, buf: &mut Vec<u8>) {
        write_length(buf, genome.len());
        for v in genome {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<f64>> {
        Ok(read_records::<8>(bytes, self.len)?
            .into_iter()
            .map(f64::from_le_bytes)
            .collect())
    }

    fn validate(&self) -> Result<()> {
        if self.min.len() != self.len || self.max.len() != self.len {
            return Err(GeneticError::Configuration(format!(
                "Real ranges must have {} entries, got {} minima and {} maxima",
                self.len,
                self.min.len(),
                self.max.len()
            )));
        }
        if let Some(i) = (0..self.len).find(|&i| {
            self.min[i].is_nan() || self.max[i].is_nan() || self.min[i] > self.max[i]
        }) {
            return Err(GeneticError::Configuration(format!(
                "Real range at position {} is invalid: [{}, {}]",
                i, self.min[i], self.max[i]
            )));
        }
        let value = self.mutation_value();
        if !value.is_finite() || value < 0.0 {
            return Err(GeneticError::InvalidNumericValue(format!(
                "Real mutation value must be finite and non-negative, got {}",
                value
            )));
        }
        Ok(())
    }
}

/// Renders `x` the way C's `%g` does with the given significant digits.
pub(crate) fn format_g(x: f64, precision: usize) -> String {
    fn trim(s: &str) -> &str {
        if s.contains('.') {
            s.trim_end_matches('0').trim_end_matches('.')
        } else {
            s
        }
    }

    if x == 0.0 || !x.is_finite() {
        return format!("{}", x);
    }
    let p = precision.max(1);
    let sci = format!("{:.*e}", p - 1, x);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if exponent < -4 || exponent >= p as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim(mantissa), sign, exponent.abs())
    } else {
        let decimals = (p as i32 - 1 - exponent).max(0) as usize;
        trim(&format!("{:.*}", decimals, x)).to_string()
    }
}
