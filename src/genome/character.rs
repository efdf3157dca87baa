//! # Character representation
//!
//! Fixed-length strings over one of three ASCII alphabets. Mutation redraws
//! a selected position from the same alphabet.

use std::io::Write;

use super::{crossover_alleles, read_records, write_length, CrossoverParams, Representation};
use crate::error::{GeneticError, Result};
use crate::rng::RandomNumberGenerator;

/// The alphabet strings are drawn from.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharacterSet {
    /// `a` to `z`.
    #[default]
    Lower,
    /// `A` to `Z`.
    Upper,
    /// `A` to `Z` followed by `a` to `z`.
    Mixed,
}

impl CharacterSet {
    fn draw(self, rng: &mut RandomNumberGenerator) -> u8 {
        match self {
            CharacterSet::Lower => rng.random_interval(b'a' as i64, b'z' as i64) as u8,
            CharacterSet::Upper => rng.random_interval(b'A' as i64, b'Z' as i64) as u8,
            CharacterSet::Mixed => {
                let j = rng.random_interval(0, 51) as u8;
                if j < 26 {
                    b'A' + j
                } else {
                    b'a' + j - 26
                }
            }
        }
    }

    pub fn contains(self, c: u8) -> bool {
        match self {
            CharacterSet::Lower => c.is_ascii_lowercase(),
            CharacterSet::Upper => c.is_ascii_uppercase(),
            CharacterSet::Mixed => c.is_ascii_alphabetic(),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRepresentation {
    len: usize,
    set: CharacterSet,
}

impl CharacterRepresentation {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            set: CharacterSet::default(),
        }
    }

    pub fn with_character_set(mut self, set: CharacterSet) -> Self {
        self.set = set;
        self
    }

    pub fn character_set(&self) -> CharacterSet {
        self.set
    }
}

impl Representation for CharacterRepresentation {
    type Genome = Vec<u8>;

    fn string_length(&self) -> usize {
        self.len
    }

    fn zeroed(&self) -> Vec<u8> {
        vec![0; self.len]
    }

    fn initialize(&self, genome: &mut Vec<u8>, rng: &mut RandomNumberGenerator) {
        genome.resize(self.len, 0);
        for slot in genome.iter_mut() {
            *slot = self.set.draw(rng);
        }
    }

    fn mutate(&self, genome: &mut Vec<u8>, rate: f64, rng: &mut RandomNumberGenerator) -> usize {
        let mut count = 0;
        for slot in genome.iter_mut() {
            if rng.random_flip(rate) {
                let drawn = self.set.draw(rng);
                if drawn != *slot {
                    count += 1;
                }
                *slot = drawn;
            }
        }
        count
    }

    fn crossover(
        &self,
        params: CrossoverParams,
        parent1: &Vec<u8>,
        parent2: &Vec<u8>,
        child1: &mut Vec<u8>,
        child2: &mut Vec<u8>,
        rng: &mut RandomNumberGenerator,
    ) {
        crossover_alleles(params, parent1, parent2, child1, child2, rng);
    }

    fn duplicate(&self, a: &Vec<u8>, b: &Vec<u8>) -> bool {
        a == b
    }

    fn print(&self, genome: &Vec<u8>, sink: &mut dyn Write) -> std::io::Result<()> {
        for (row, chunk) in genome.chunks(50).enumerate() {
            write!(sink, "#{:5}: [", row * 50)?;
            sink.write_all(chunk)?;
            writeln!(sink, "]")?;
        }
        writeln!(sink)
    }

    fn encode(&self, genome: &Vec<u8>, buf: &mut Vec<u8>) {
        write_length(buf, genome.len());
        buf.extend_from_slice(genome);
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let genome: Vec<u8> = read_records::<1>(bytes, self.len)?
            .into_iter()
            .map(|[c]| c)
            .collect();
        if genome.iter().any(|c| !c.is_ascii()) {
            return Err(GeneticError::Transport(
                "Character payload contains non-ASCII bytes".to_string(),
            ));
        }
        Ok(genome)
    }
}
