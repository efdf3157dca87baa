//! # Integer representation
//!
//! Fixed-length vectors of `i64`. Every position carries its own inclusive
//! `[min, max]` range, used by range initialisation, range mutation and
//! bounded mutation. Alternatively the whole string is initialised as a
//! random permutation of `min ..= min + len - 1`.
//!
//! ## Example
//!
//! ```rust
//! use pgalib::genome::{IntegerRepresentation, Representation};
//! use pgalib::rng::RandomNumberGenerator;
//!
//! let rep = IntegerRepresentation::new(6);
//! let mut rng = RandomNumberGenerator::from_seed(1);
//! let mut tour = rep.create(true, &mut rng);
//! tour.sort();
//! assert_eq!(tour, vec![0, 1, 2, 3, 4, 5]);
//! ```

use std::io::Write;

use super::{crossover_alleles, read_records, write_length, CrossoverParams, Representation};
use crate::error::{GeneticError, Result};
use crate::rng::RandomNumberGenerator;

/// How integer strings are initialised.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerInit {
    /// A random permutation of `min[0] ..= min[0] + len - 1`.
    Permute,
    /// An independent uniform draw from each position's range.
    Range,
}

/// How a selected integer allele is perturbed.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerMutation {
    /// Add or subtract the value with equal probability.
    Constant(i64),
    /// Swap with a uniformly chosen position.
    Permute,
    /// Redraw uniformly from the position's range.
    Range,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerRepresentation {
    len: usize,
    min: Vec<i64>,
    max: Vec<i64>,
    init: IntegerInit,
    mutation: Option<IntegerMutation>,
    bounded: bool,
}

impl IntegerRepresentation {
    /// Permutations of `0 ..= len - 1`, mutated by swapping.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            min: vec![0; len],
            max: vec![len as i64 - 1; len],
            init: IntegerInit::Permute,
            mutation: None,
            bounded: false,
        }
    }

    /// Initialise as permutations of `min ..= max`; requires `max - min + 1 == len`.
    pub fn with_permutation(mut self, min: i64, max: i64) -> Self {
        self.min = vec![min; self.len];
        self.max = vec![max; self.len];
        self.init = IntegerInit::Permute;
        self
    }

    /// Initialise every position uniformly in its own `[min[i], max[i]]`.
    pub fn with_ranges(mut self, min: Vec<i64>, max: Vec<i64>) -> Self {
        self.min = min;
        self.max = max;
        self.init = IntegerInit::Range;
        self
    }

    /// Initialise every position uniformly in `[min, max]`.
    pub fn with_range(self, min: i64, max: i64) -> Self {
        let len = self.len;
        self.with_ranges(vec![min; len], vec![max; len])
    }

    pub fn with_mutation(mut self, mutation: IntegerMutation) -> Self {
        self.mutation = Some(mutation);
        self
    }

    /// Clamp mutated alleles into their initialisation range.
    pub fn with_bounded_mutation(mut self, bounded: bool) -> Self {
        self.bounded = bounded;
        self
    }

    pub fn init(&self) -> IntegerInit {
        self.init
    }

    /// The mutation in effect: the explicit choice, or swapping for
    /// permutations and range redraws otherwise.
    pub fn mutation(&self) -> IntegerMutation {
        self.mutation.unwrap_or(match self.init {
            IntegerInit::Permute => IntegerMutation::Permute,
            IntegerInit::Range => IntegerMutation::Range,
        })
    }

    pub fn min(&self) -> &[i64] {
        &self.min
    }

    pub fn max(&self) -> &[i64] {
        &self.max
    }

    fn clamp(&self, genome: &mut [i64], i: usize) {
        if self.bounded {
            genome[i] = genome[i].clamp(self.min[i], self.max[i]);
        }
    }

    fn mutate_with(
        &self,
        mutation: IntegerMutation,
        genome: &mut [i64],
        rate: f64,
        rng: &mut RandomNumberGenerator,
    ) -> usize {
        let mut count = 0;
        for i in 0..self.len {
            if !rng.random_flip(rate) {
                continue;
            }
            let before = genome[i];
            let mut swapped = false;
            match mutation {
                IntegerMutation::Constant(value) => {
                    if rng.random_flip(0.5) {
                        genome[i] = genome[i].saturating_add(value);
                    } else {
                        genome[i] = genome[i].saturating_sub(value);
                    }
                }
                IntegerMutation::Permute => {
                    let j = rng.random_index(self.len);
                    swapped = genome[i] != genome[j];
                    genome.swap(i, j);
                }
                IntegerMutation::Range => {
                    genome[i] = rng.random_interval(self.min[i], self.max[i]);
                }
            }
            self.clamp(genome, i);
            if swapped || genome[i] != before {
                count += 1;
            }
        }
        count
    }
}

impl Representation for IntegerRepresentation {
    type Genome = Vec<i64>;

    fn string_length(&self) -> usize {
        self.len
    }

    fn zeroed(&self) -> Vec<i64> {
        vec![0; self.len]
    }

    fn initialize(&self, genome: &mut Vec<i64>, rng: &mut RandomNumberGenerator) {
        genome.resize(self.len, 0);
        match self.init {
            IntegerInit::Permute => {
                let start = self.min.first().copied().unwrap_or(0);
                let mut pool: Vec<i64> = (0..self.len as i64).map(|k| start + k).collect();
                for slot in genome.iter_mut() {
                    let j = rng.random_index(pool.len());
                    *slot = pool.swap_remove(j);
                }
            }
            IntegerInit::Range => {
                for (i, slot) in genome.iter_mut().enumerate() {
                    *slot = rng.random_interval(self.min[i], self.max[i]);
                }
            }
        }
    }

    fn mutate(&self, genome: &mut Vec<i64>, rate: f64, rng: &mut RandomNumberGenerator) -> usize {
        self.mutate_with(self.mutation(), genome, rate, rng)
    }

    /// Permutations are reshuffled by swapping so they stay permutations.
    fn resample(&self, genome: &mut Vec<i64>, rate: f64, rng: &mut RandomNumberGenerator) -> usize {
        let mutation = match self.init {
            IntegerInit::Permute => IntegerMutation::Permute,
            IntegerInit::Range => IntegerMutation::Range,
        };
        self.mutate_with(mutation, genome, rate, rng)
    }

    fn crossover(
        &self,
        params: CrossoverParams,
        parent1: &Vec<i64>,
        parent2: &Vec<i64>,
        child1: &mut Vec<i64>,
        child2: &mut Vec<i64>,
        rng: &mut RandomNumberGenerator,
    ) {
        crossover_alleles(params, parent1, parent2, child1, child2, rng);
    }

    fn duplicate(&self, a: &Vec<i64>, b: &Vec<i64>) -> bool {
        a == b
    }

    fn print(&self, genome: &Vec<i64>, sink: &mut dyn Write) -> std::io::Result<()> {
        for (i, v) in genome.iter().enumerate() {
            match i % 6 {
                0 => write!(sink, "#{:5}: [{:8}]", i, v)?,
                5 => {
                    write!(sink, ", [{:8}]", v)?;
                    if i + 1 < genome.len() {
                        writeln!(sink)?;
                    }
                }
                _ => write!(sink, ", [{:8}]", v)?,
            }
        }
        writeln!(sink)
    }

    fn encode(&self, genome: &Vec<i64>, buf: &mut Vec<u8>) {
        write_length(buf, genome.len());
        for v in genome {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<i64>> {
        Ok(read_records::<8>(bytes, self.len)?
            .into_iter()
            .map(i64::from_le_bytes)
            .collect())
    }

    fn validate(&self) -> Result<()> {
        if self.min.len() != self.len || self.max.len() != self.len {
            return Err(GeneticError::Configuration(format!(
                "Integer ranges must have {} entries, got {} minima and {} maxima",
                self.len,
                self.min.len(),
                self.max.len()
            )));
        }
        if let Some(i) = (0..self.len).find(|&i| self.min[i] > self.max[i]) {
            return Err(GeneticError::Configuration(format!(
                "Integer range at position {} has min {} greater than max {}",
                i, self.min[i], self.max[i]
            )));
        }
        if self.init == IntegerInit::Permute && self.len > 0 {
            let span = self.max[0] - self.min[0] + 1;
            if span != self.len as i64 {
                return Err(GeneticError::Configuration(format!(
                    "Permutation range [{}, {}] holds {} values but the string length is {}",
                    self.min[0], self.max[0], span, self.len
                )));
            }
        }
        if let Some(IntegerMutation::Constant(v)) = self.mutation {
            if v <= 0 {
                return Err(GeneticError::Configuration(format!(
                    "Integer mutation constant must be positive, got {}",
                    v
                )));
            }
        }
        Ok(())
    }
}
