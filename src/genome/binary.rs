//! # Binary representation
//!
//! Bit strings are packed most-significant-bit first into `u64` words: bit
//! `i` lives in word `i / 64` under the mask `1 << (63 - i % 64)`. The bits of
//! the final word past the logical length are padding and are kept zero by
//! every operator, so whole words can be compared and recombined directly.
//!
//! ## Example
//!
//! ```rust
//! use pgalib::genome::BinaryString;
//!
//! let mut bits = BinaryString::new(70);
//! bits.set(0, true);
//! bits.set(69, true);
//! assert_eq!(bits.count_ones(), 2);
//! assert_eq!(bits.words().len(), 2);
//! ```

use std::io::Write;

use super::{read_records, two_point_sites, write_length, CrossoverParams, CrossoverType, Representation};
use crate::error::{GeneticError, Result};
use crate::rng::RandomNumberGenerator;

/// Number of bits in one storage word.
pub const WORD_BITS: usize = u64::BITS as usize;

/// A fixed-length packed bit string.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryString {
    words: Vec<u64>,
    len: usize,
}

#[inline]
fn mask(bit: usize) -> u64 {
    1u64 << (WORD_BITS - 1 - bit % WORD_BITS)
}

/// Mask of the bits of the word holding `len`'s last bit that are in use.
fn tail_mask(len: usize) -> u64 {
    match len % WORD_BITS {
        0 => u64::MAX,
        extra => u64::MAX << (WORD_BITS - extra),
    }
}

impl BinaryString {
    /// Creates an all-zero string of `len` bits.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    /// Builds a string from booleans, first element is bit 0.
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut s = Self::new(bits.len());
        for (i, &b) in bits.iter().enumerate() {
            s.set(i, b);
        }
        s
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The packed storage, including padding bits of the last word.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Number of full words.
    pub fn full_words(&self) -> usize {
        self.len / WORD_BITS
    }

    /// Number of bits used in the trailing partial word.
    pub fn extra_bits(&self) -> usize {
        self.len % WORD_BITS
    }

    pub fn get(&self, i: usize) -> bool {
        self.words[i / WORD_BITS] & mask(i) != 0
    }

    pub fn set(&mut self, i: usize, value: bool) {
        let word = &mut self.words[i / WORD_BITS];
        if value {
            *word |= mask(i);
        } else {
            *word &= !mask(i);
        }
    }

    pub fn toggle(&mut self, i: usize) {
        self.words[i / WORD_BITS] ^= mask(i);
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Number of positions at which the two strings differ.
    pub fn hamming(&self, other: &Self) -> usize {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a ^ b).count_ones() as usize)
            .sum()
    }

    /// True if every padding bit of the last word is zero.
    pub fn padding_is_clear(&self) -> bool {
        match self.words.last() {
            Some(last) => last & !tail_mask(self.len) == 0,
            None => true,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    /// Bits `[0, site)` from `self`, bits `[site, len)` from `other`.
    fn splice(&self, other: &Self, site: usize) -> Self {
        let boundary = site / WORD_BITS;
        let head = match site % WORD_BITS {
            0 => 0,
            r => u64::MAX << (WORD_BITS - r),
        };
        let words = self
            .words
            .iter()
            .zip(&other.words)
            .enumerate()
            .map(|(w, (&a, &b))| match w.cmp(&boundary) {
                std::cmp::Ordering::Less => a,
                std::cmp::Ordering::Equal => (a & head) | (b & !head),
                std::cmp::Ordering::Greater => b,
            })
            .collect();
        Self { words, len: self.len }
    }
}

/// Packed bit-string chromosomes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryRepresentation {
    len: usize,
    /// Probability that an initial bit is one.
    init_prob: f64,
}

impl BinaryRepresentation {
    pub fn new(len: usize) -> Self {
        Self { len, init_prob: 0.5 }
    }

    /// Sets the probability that a randomly initialised bit is one.
    pub fn with_init_probability(mut self, p: f64) -> Self {
        self.init_prob = p;
        self
    }

    pub fn init_probability(&self) -> f64 {
        self.init_prob
    }

    fn print_word(sink: &mut dyn Write, word: u64, bits: usize) -> std::io::Result<()> {
        let text: String = (0..bits)
            .map(|i| if word & mask(i) != 0 { '1' } else { '0' })
            .collect();
        write!(sink, "{}", text)
    }
}

impl Representation for BinaryRepresentation {
    type Genome = BinaryString;

    fn string_length(&self) -> usize {
        self.len
    }

    fn zeroed(&self) -> BinaryString {
        BinaryString::new(self.len)
    }

    fn initialize(&self, genome: &mut BinaryString, rng: &mut RandomNumberGenerator) {
        for i in 0..self.len {
            genome.set(i, rng.random_flip(self.init_prob));
        }
    }

    fn mutate(&self, genome: &mut BinaryString, rate: f64, rng: &mut RandomNumberGenerator) -> usize {
        let mut count = 0;
        for i in 0..self.len {
            if rng.random_flip(rate) {
                genome.toggle(i);
                count += 1;
            }
        }
        count
    }

    fn crossover(
        &self,
        params: CrossoverParams,
        parent1: &BinaryString,
        parent2: &BinaryString,
        child1: &mut BinaryString,
        child2: &mut BinaryString,
        rng: &mut RandomNumberGenerator,
    ) {
        match params.kind {
            CrossoverType::OnePoint => {
                let site = rng.random_interval(1, self.len as i64 - 1) as usize;
                *child1 = parent1.splice(parent2, site);
                *child2 = parent2.splice(parent1, site);
            }
            CrossoverType::TwoPoint => {
                let (s1, s2) = two_point_sites(self.len, rng);
                *child1 = parent1.splice(parent2, s1).splice(parent1, s2);
                *child2 = parent2.splice(parent1, s1).splice(parent2, s2);
            }
            CrossoverType::Uniform => {
                let words = parent1.words.len();
                child1.words.resize(words, 0);
                child2.words.resize(words, 0);
                child1.len = self.len;
                child2.len = self.len;
                for w in 0..words {
                    let (a, b) = (parent1.words[w], parent2.words[w]);
                    if a == b {
                        child1.words[w] = a;
                        child2.words[w] = a;
                        continue;
                    }
                    let bits = if w + 1 == words && self.len % WORD_BITS != 0 {
                        self.len % WORD_BITS
                    } else {
                        WORD_BITS
                    };
                    let mut m = 0u64;
                    for bit in 0..bits {
                        if rng.random_flip(params.uniform_prob) {
                            m |= mask(bit);
                        }
                    }
                    child1.words[w] = (m & a) | (!m & b);
                    child2.words[w] = (!m & a) | (m & b);
                }
            }
        }
    }

    fn duplicate(&self, a: &BinaryString, b: &BinaryString) -> bool {
        a.words == b.words
    }

    fn distance(&self, a: &BinaryString, b: &BinaryString) -> Option<usize> {
        Some(a.hamming(b))
    }

    fn print(&self, genome: &BinaryString, sink: &mut dyn Write) -> std::io::Result<()> {
        for w in 0..genome.full_words() {
            write!(sink, "[ ")?;
            Self::print_word(sink, genome.words[w], WORD_BITS)?;
            writeln!(sink, " ]")?;
        }
        if genome.extra_bits() > 0 {
            write!(sink, "[ ")?;
            Self::print_word(sink, genome.words[genome.full_words()], genome.extra_bits())?;
            writeln!(sink, " ]")?;
        }
        Ok(())
    }

    fn encode(&self, genome: &BinaryString, buf: &mut Vec<u8>) {
        write_length(buf, genome.words.len());
        for w in &genome.words {
            buf.extend_from_slice(&w.to_le_bytes());
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<BinaryString> {
        let words: Vec<u64> = read_records::<8>(bytes, self.len.div_ceil(WORD_BITS))?
            .into_iter()
            .map(u64::from_le_bytes)
            .collect();
        let genome = BinaryString { words, len: self.len };
        if !genome.padding_is_clear() {
            return Err(GeneticError::Transport(
                "Binary payload has padding bits set".to_string(),
            ));
        }
        Ok(genome)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.init_prob) {
            return Err(GeneticError::Configuration(format!(
                "Binary initialization probability {} is not in [0, 1]",
                self.init_prob
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(kind: CrossoverType) -> CrossoverParams {
        CrossoverParams {
            kind,
            uniform_prob: 0.6,
        }
    }

    #[test]
    fn test_msb_first_layout() {
        let mut s = BinaryString::new(3);
        s.set(0, true);
        assert_eq!(s.words()[0], 1u64 << 63);
        s.set(2, true);
        assert_eq!(s.words()[0], (1u64 << 63) | (1u64 << 61));
        assert!(s.padding_is_clear());
    }

    #[test]
    fn test_mutation_respects_padding() {
        let rep = BinaryRepresentation::new(70);
        let mut rng = RandomNumberGenerator::from_seed(1);
        let mut g = rep.create(true, &mut rng);
        let changed = rep.mutate(&mut g, 1.0, &mut rng);
        assert_eq!(changed, 70);
        assert!(g.padding_is_clear());
    }

    #[test]
    fn test_mutation_rate_zero_changes_nothing() {
        let rep = BinaryRepresentation::new(40);
        let mut rng = RandomNumberGenerator::from_seed(1);
        let mut g = rep.create(true, &mut rng);
        let before = g.clone();
        assert_eq!(rep.mutate(&mut g, 0.0, &mut rng), 0);
        assert_eq!(g, before);
    }

    #[test]
    fn test_one_point_across_word_boundary() {
        let rep = BinaryRepresentation::new(130);
        let mut rng = RandomNumberGenerator::from_seed(17);
        let p1 = BinaryString::from_bits(&[true; 130]);
        let p2 = BinaryString::new(130);
        let mut c1 = rep.zeroed();
        let mut c2 = rep.zeroed();
        for _ in 0..50 {
            rep.crossover(params(CrossoverType::OnePoint), &p1, &p2, &mut c1, &mut c2, &mut rng);
            let ones = c1.count_ones();
            assert!((1..130).contains(&ones));
            assert!(c1.iter().take(ones).all(|b| b));
            assert!(c1.iter().skip(ones).all(|b| !b));
            assert_eq!(c1.count_ones() + c2.count_ones(), 130);
            assert!(c1.padding_is_clear() && c2.padding_is_clear());
        }
    }

    #[test]
    fn test_two_point_exchanges_middle() {
        let rep = BinaryRepresentation::new(100);
        let mut rng = RandomNumberGenerator::from_seed(5);
        let p1 = BinaryString::new(100);
        let p2 = BinaryString::from_bits(&[true; 100]);
        let mut c1 = rep.zeroed();
        let mut c2 = rep.zeroed();
        rep.crossover(params(CrossoverType::TwoPoint), &p1, &p2, &mut c1, &mut c2, &mut rng);
        assert!(!c1.get(0) && !c1.get(99));
        assert!(c2.get(0) && c2.get(99));
        assert_eq!(c1.hamming(&c2), 100);
        let first = c1.iter().position(|b| b).expect("middle segment");
        let ones = c1.count_ones();
        assert!(c1.iter().skip(first).take(ones).all(|b| b));
    }

    #[test]
    fn test_uniform_crossover_partitions_bits() {
        let rep = BinaryRepresentation::new(77);
        let mut rng = RandomNumberGenerator::from_seed(23);
        let p1 = rep.create(true, &mut rng);
        let p2 = rep.create(true, &mut rng);
        let mut c1 = rep.zeroed();
        let mut c2 = rep.zeroed();
        rep.crossover(params(CrossoverType::Uniform), &p1, &p2, &mut c1, &mut c2, &mut rng);
        for i in 0..77 {
            let mut got = [c1.get(i), c2.get(i)];
            let mut want = [p1.get(i), p2.get(i)];
            got.sort();
            want.sort();
            assert_eq!(got, want);
        }
        assert!(c1.padding_is_clear() && c2.padding_is_clear());
    }

    #[test]
    fn test_hamming() {
        let a = BinaryString::from_bits(&[true, false, true, true]);
        let b = BinaryString::from_bits(&[false, false, true, false]);
        assert_eq!(a.hamming(&b), 2);
        assert_eq!(b.hamming(&a), 2);
    }

    #[test]
    fn test_print_layout() {
        let rep = BinaryRepresentation::new(4);
        let g = BinaryString::from_bits(&[true, false, true, true]);
        let mut out = Vec::new();
        rep.print(&g, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[ 1011 ]\n");
    }

    #[test]
    fn test_codec_round_trip() {
        let rep = BinaryRepresentation::new(90);
        let mut rng = RandomNumberGenerator::from_seed(3);
        let g = rep.create(true, &mut rng);
        let mut buf = Vec::new();
        rep.encode(&g, &mut buf);
        assert_eq!(rep.decode(&buf).unwrap(), g);
    }

    #[test]
    fn test_decode_rejects_dirty_padding() {
        let rep = BinaryRepresentation::new(3);
        let mut buf = Vec::new();
        write_length(&mut buf, 1);
        buf.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(rep.decode(&buf).is_err());
    }

    #[test]
    fn test_init_probability_validation() {
        assert!(BinaryRepresentation::new(8).with_init_probability(1.5).validate().is_err());
        let rep = BinaryRepresentation::new(8).with_init_probability(1.0);
        let mut rng = RandomNumberGenerator::from_seed(0);
        assert_eq!(rep.create(true, &mut rng).count_ones(), 8);
    }
}
