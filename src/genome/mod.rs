//! # Genome representations
//!
//! A run is generic over a [`Representation`]: the object that knows how to
//! create, initialise, mutate, recombine, compare, print and serialise one
//! kind of chromosome. Four representations ship with the crate:
//!
//! - [`binary::BinaryRepresentation`]: packed bit strings
//! - [`integer::IntegerRepresentation`]: signed integer vectors
//! - [`real::RealRepresentation`]: `f64` vectors
//! - [`character::CharacterRepresentation`]: printable character strings
//!
//! A user-defined representation is any type implementing the trait. Every
//! operator without a default is mandatory, so a missing operator is a
//! compile error rather than a run-time surprise.
//!
//! Individual operators of any representation can also be replaced for a
//! single run through [`Overrides`], which the run context consults before
//! falling back to the representation.

pub mod binary;
pub mod character;
pub mod encoding;
pub mod integer;
pub mod real;

use std::fmt::Debug;
use std::io::Write;

use crate::error::Result;
use crate::population::Population;
use crate::rng::RandomNumberGenerator;

pub use binary::{BinaryRepresentation, BinaryString};
pub use character::{CharacterRepresentation, CharacterSet};
pub use integer::{IntegerInit, IntegerMutation, IntegerRepresentation};
pub use real::{RealInit, RealMutation, RealRepresentation};

/// The recombination scheme applied by `crossover`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossoverType {
    /// A single cut site in `[1, L-1]`.
    OnePoint,
    /// Two distinct cut sites; the middle segment is exchanged.
    TwoPoint,
    /// Each allele (or differing word) is drawn from either parent.
    Uniform,
}

/// Parameters handed to `crossover` on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossoverParams {
    pub kind: CrossoverType,
    /// Probability that child one takes a given allele from parent one
    /// under uniform crossover.
    pub uniform_prob: f64,
}

/// The operator set of one chromosome representation.
pub trait Representation: Debug + Send + Sync {
    /// The chromosome type stored in every individual.
    type Genome: Clone + Debug + PartialEq + Send + Sync;

    /// Number of alleles in every genome of the run.
    fn string_length(&self) -> usize;

    /// Returns a genome with every allele zeroed.
    fn zeroed(&self) -> Self::Genome;

    /// Randomly initialises `genome` in place.
    fn initialize(&self, genome: &mut Self::Genome, rng: &mut RandomNumberGenerator);

    /// Allocates a genome, randomly initialised when `init` is set.
    fn create(&self, init: bool, rng: &mut RandomNumberGenerator) -> Self::Genome {
        let mut genome = self.zeroed();
        if init {
            self.initialize(&mut genome, rng);
        }
        genome
    }

    /// Mutates each allele with probability `rate` and returns how many
    /// alleles changed.
    fn mutate(&self, genome: &mut Self::Genome, rate: f64, rng: &mut RandomNumberGenerator)
        -> usize;

    /// Mutation used by the restart operator: each selected allele is redrawn
    /// uniformly from its legal range.
    fn resample(
        &self,
        genome: &mut Self::Genome,
        rate: f64,
        rng: &mut RandomNumberGenerator,
    ) -> usize {
        self.mutate(genome, rate, rng)
    }

    /// Recombines two parents into two children.
    fn crossover(
        &self,
        params: CrossoverParams,
        parent1: &Self::Genome,
        parent2: &Self::Genome,
        child1: &mut Self::Genome,
        child2: &mut Self::Genome,
        rng: &mut RandomNumberGenerator,
    );

    /// Returns true if the two genomes are considered duplicates.
    fn duplicate(&self, a: &Self::Genome, b: &Self::Genome) -> bool;

    /// Deep copy of `src` into `dst`.
    fn copy(&self, src: &Self::Genome, dst: &mut Self::Genome) {
        dst.clone_from(src);
    }

    /// Writes a human readable rendering of `genome`.
    fn print(&self, genome: &Self::Genome, sink: &mut dyn Write) -> std::io::Result<()>;

    /// Appends the transport payload of `genome` to `buf`.
    fn encode(&self, genome: &Self::Genome, buf: &mut Vec<u8>);

    /// Rebuilds a genome from a transport payload.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Genome>;

    /// Number of differing positions between two genomes, if the
    /// representation defines one. Used for the Hamming report line.
    fn distance(&self, _a: &Self::Genome, _b: &Self::Genome) -> Option<usize> {
        None
    }

    /// Checks representation parameters at setup time.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

pub type InitFn<G> = Box<dyn Fn(&mut G, &mut RandomNumberGenerator) + Send + Sync>;
pub type MutateFn<G> = Box<dyn Fn(&mut G, f64, &mut RandomNumberGenerator) -> usize + Send + Sync>;
pub type CrossoverFn<G> =
    Box<dyn Fn(&G, &G, &mut G, &mut G, &mut RandomNumberGenerator) + Send + Sync>;
pub type DuplicateFn<G> = Box<dyn Fn(&G, &G) -> bool + Send + Sync>;
pub type CopyFn<G> = Box<dyn Fn(&G, &mut G) + Send + Sync>;
pub type PrintFn<G> = Box<dyn Fn(&G, &mut dyn Write) -> std::io::Result<()> + Send + Sync>;

/// Per-run replacements for individual operators.
pub struct Overrides<G> {
    pub init: Option<InitFn<G>>,
    pub mutate: Option<MutateFn<G>>,
    pub crossover: Option<CrossoverFn<G>>,
    pub duplicate: Option<DuplicateFn<G>>,
    pub copy: Option<CopyFn<G>>,
    pub print: Option<PrintFn<G>>,
}

impl<G> Default for Overrides<G> {
    fn default() -> Self {
        Self {
            init: None,
            mutate: None,
            crossover: None,
            duplicate: None,
            copy: None,
            print: None,
        }
    }
}

impl<G> Debug for Overrides<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overrides")
            .field("init", &self.init.is_some())
            .field("mutate", &self.mutate.is_some())
            .field("crossover", &self.crossover.is_some())
            .field("duplicate", &self.duplicate.is_some())
            .field("copy", &self.copy.is_some())
            .field("print", &self.print.is_some())
            .finish()
    }
}

/// The operator table bound at setup: a representation plus any overrides.
#[derive(Debug)]
pub struct OperatorTable<R: Representation> {
    representation: R,
    overrides: Overrides<R::Genome>,
    crossover: CrossoverParams,
}

impl<R: Representation> OperatorTable<R> {
    pub fn new(representation: R, overrides: Overrides<R::Genome>, crossover: CrossoverParams) -> Self {
        Self {
            representation,
            overrides,
            crossover,
        }
    }

    pub fn representation(&self) -> &R {
        &self.representation
    }

    pub fn crossover_params(&self) -> CrossoverParams {
        self.crossover
    }

    pub fn create(&self, init: bool, rng: &mut RandomNumberGenerator) -> R::Genome {
        let mut genome = self.representation.zeroed();
        if init {
            self.initialize(&mut genome, rng);
        }
        genome
    }

    pub fn initialize(&self, genome: &mut R::Genome, rng: &mut RandomNumberGenerator) {
        match &self.overrides.init {
            Some(f) => f(genome, rng),
            None => self.representation.initialize(genome, rng),
        }
    }

    pub fn mutate(&self, genome: &mut R::Genome, rate: f64, rng: &mut RandomNumberGenerator) -> usize {
        match &self.overrides.mutate {
            Some(f) => f(genome, rate, rng),
            None => self.representation.mutate(genome, rate, rng),
        }
    }

    /// Restart mutation. A mutate override takes precedence over the
    /// representation's resampling.
    pub fn resample(&self, genome: &mut R::Genome, rate: f64, rng: &mut RandomNumberGenerator) -> usize {
        match &self.overrides.mutate {
            Some(f) => f(genome, rate, rng),
            None => self.representation.resample(genome, rate, rng),
        }
    }

    pub fn crossover(
        &self,
        parent1: &R::Genome,
        parent2: &R::Genome,
        child1: &mut R::Genome,
        child2: &mut R::Genome,
        rng: &mut RandomNumberGenerator,
    ) {
        match &self.overrides.crossover {
            Some(f) => f(parent1, parent2, child1, child2, rng),
            None => self
                .representation
                .crossover(self.crossover, parent1, parent2, child1, child2, rng),
        }
    }

    pub fn duplicate(&self, a: &R::Genome, b: &R::Genome) -> bool {
        match &self.overrides.duplicate {
            Some(f) => f(a, b),
            None => self.representation.duplicate(a, b),
        }
    }

    pub fn copy(&self, src: &R::Genome, dst: &mut R::Genome) {
        match &self.overrides.copy {
            Some(f) => f(src, dst),
            None => self.representation.copy(src, dst),
        }
    }

    /// Copies member `from` of `source` into slot `to` of `dest`.
    pub fn copy_member(
        &self,
        source: &Population<R::Genome>,
        from: usize,
        dest: &mut Population<R::Genome>,
        to: usize,
    ) {
        dest.copy_from(to, source, from, |s, d| self.copy(s, d));
    }

    /// Copies slot `from` of `pop` into slot `to` of the same buffer.
    pub fn copy_within(&self, pop: &mut Population<R::Genome>, from: usize, to: usize) {
        pop.copy_within(from, to, |s, d| self.copy(s, d));
    }

    pub fn print(&self, genome: &R::Genome, sink: &mut dyn Write) -> std::io::Result<()> {
        match &self.overrides.print {
            Some(f) => f(genome, sink),
            None => self.representation.print(genome, sink),
        }
    }

    pub fn distance(&self, a: &R::Genome, b: &R::Genome) -> Option<usize> {
        self.representation.distance(a, b)
    }
}

/// Reads a little-endian `u32` length prefix followed by that many fixed
/// width records.
pub(crate) fn read_records<const N: usize>(bytes: &[u8], expected: usize) -> Result<Vec<[u8; N]>> {
    use crate::error::GeneticError;

    if bytes.len() < 4 {
        return Err(GeneticError::Transport(
            "Genome payload is missing its length prefix".to_string(),
        ));
    }
    let (prefix, body) = bytes.split_at(4);
    let count = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
    if count != expected {
        return Err(GeneticError::Transport(format!(
            "Genome payload holds {} records, expected {}",
            count, expected
        )));
    }
    if body.len() != count * N {
        return Err(GeneticError::Transport(format!(
            "Genome payload has {} bytes, expected {}",
            body.len(),
            count * N
        )));
    }
    Ok(body
        .chunks_exact(N)
        .map(|chunk| {
            let mut record = [0u8; N];
            record.copy_from_slice(chunk);
            record
        })
        .collect())
}

pub(crate) fn write_length(buf: &mut Vec<u8>, count: usize) {
    buf.extend_from_slice(&(count as u32).to_le_bytes());
}

/// Picks the two ordered, distinct cut sites of a two-point crossover.
pub(crate) fn two_point_sites(len: usize, rng: &mut RandomNumberGenerator) -> (usize, usize) {
    let upper = len as i64 - 1;
    let first = rng.random_interval(1, upper);
    let mut second = rng.random_interval(1, upper);
    while second == first {
        second = rng.random_interval(1, upper);
    }
    if first < second {
        (first as usize, second as usize)
    } else {
        (second as usize, first as usize)
    }
}

/// Allele-wise crossover shared by the vector representations.
pub(crate) fn crossover_alleles<T: Copy + PartialEq>(
    params: CrossoverParams,
    parent1: &[T],
    parent2: &[T],
    child1: &mut Vec<T>,
    child2: &mut Vec<T>,
    rng: &mut RandomNumberGenerator,
) {
    let len = parent1.len();
    child1.clear();
    child2.clear();
    match params.kind {
        CrossoverType::OnePoint => {
            let site = rng.random_interval(1, len as i64 - 1) as usize;
            child1.extend_from_slice(&parent1[..site]);
            child1.extend_from_slice(&parent2[site..]);
            child2.extend_from_slice(&parent2[..site]);
            child2.extend_from_slice(&parent1[site..]);
        }
        CrossoverType::TwoPoint => {
            let (s1, s2) = two_point_sites(len, rng);
            child1.extend_from_slice(&parent1[..s1]);
            child1.extend_from_slice(&parent2[s1..s2]);
            child1.extend_from_slice(&parent1[s2..]);
            child2.extend_from_slice(&parent2[..s1]);
            child2.extend_from_slice(&parent1[s1..s2]);
            child2.extend_from_slice(&parent2[s2..]);
        }
        CrossoverType::Uniform => {
            for (&a, &b) in parent1.iter().zip(parent2) {
                if a == b {
                    child1.push(a);
                    child2.push(a);
                } else if rng.random_flip(params.uniform_prob) {
                    child1.push(a);
                    child2.push(b);
                } else {
                    child1.push(b);
                    child2.push(a);
                }
            }
        }
    }
}
