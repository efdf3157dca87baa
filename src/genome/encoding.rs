//! # Binary encodings
//!
//! Helpers that store an integer or a real number in an inclusive bit range
//! `[start, end]` of a [`BinaryString`], either as plain binary or as a
//! binary-reflected Gray code. Bit `start` is the most significant bit.
//!
//! Reals are mapped onto the integers `0 ..= 2^n - 1` of an `n` bit range:
//! `real = (v - a) * (u - l) / (b - a) + l`, and back by rounding the inverse
//! to the nearest integer.
//!
//! ## Example
//!
//! ```rust
//! use pgalib::genome::{encoding, BinaryString};
//!
//! let mut bits = BinaryString::new(16);
//! encoding::encode_integer_as_gray(&mut bits, 4, 11, 200).unwrap();
//! assert_eq!(encoding::integer_from_gray(&bits, 4, 11).unwrap(), 200);
//!
//! encoding::encode_real_as_binary(&mut bits, 0, 9, -1.0, 1.0, 0.25).unwrap();
//! let back = encoding::real_from_binary(&bits, 0, 9, -1.0, 1.0).unwrap();
//! assert!((back - 0.25).abs() < 2.0 / 1023.0);
//! ```

use super::BinaryString;
use crate::error::{GeneticError, Result};

/// Widest bit range an integer can be encoded into.
pub const MAX_ENCODED_BITS: usize = 63;

fn check_range(genome: &BinaryString, start: usize, end: usize) -> Result<usize> {
    if start >= end {
        return Err(GeneticError::Encoding(format!(
            "Start bit {} must be less than end bit {}",
            start, end
        )));
    }
    if end >= genome.len() {
        return Err(GeneticError::Encoding(format!(
            "End bit {} exceeds string length {}",
            end,
            genome.len()
        )));
    }
    let length = end - start + 1;
    if length > MAX_ENCODED_BITS {
        return Err(GeneticError::Encoding(format!(
            "Bit range of {} bits exceeds the {} bit limit",
            length, MAX_ENCODED_BITS
        )));
    }
    Ok(length)
}

fn check_bounds(low: f64, high: f64) -> Result<()> {
    if low.is_nan() || high.is_nan() || low >= high {
        return Err(GeneticError::Encoding(format!(
            "Lower bound {} must be less than upper bound {}",
            low, high
        )));
    }
    Ok(())
}

fn largest(length: usize) -> u64 {
    (1u64 << length) - 1
}

fn write_bits(genome: &mut BinaryString, start: usize, length: usize, value: u64) {
    for i in 0..length {
        genome.set(start + i, (value >> (length - 1 - i)) & 1 == 1);
    }
}

fn read_bits(genome: &BinaryString, start: usize, length: usize) -> u64 {
    (0..length).fold(0u64, |acc, i| (acc << 1) | genome.get(start + i) as u64)
}

/// Maps `v` in `[a, b]` linearly onto `[l, u]`.
pub fn map_integer_to_real(v: i64, a: i64, b: i64, l: f64, u: f64) -> f64 {
    (v - a) as f64 * (u - l) / (b - a) as f64 + l
}

/// Maps `r` in `[l, u]` linearly onto `[a, b]`, rounding half away from zero.
pub fn map_real_to_integer(r: f64, l: f64, u: f64, a: i64, b: i64) -> i64 {
    ((b - a) as f64 * (r - l) / (u - l) + a as f64).round() as i64
}

/// Writes `value` as plain binary into bits `[start, end]`.
pub fn encode_integer_as_binary(
    genome: &mut BinaryString,
    start: usize,
    end: usize,
    value: i64,
) -> Result<()> {
    let length = check_range(genome, start, end)?;
    if value < 0 || value as u64 > largest(length) {
        return Err(GeneticError::Encoding(format!(
            "Value {} does not fit in {} bits",
            value, length
        )));
    }
    write_bits(genome, start, length, value as u64);
    Ok(())
}

/// Reads bits `[start, end]` as plain binary.
pub fn integer_from_binary(genome: &BinaryString, start: usize, end: usize) -> Result<i64> {
    let length = check_range(genome, start, end)?;
    Ok(read_bits(genome, start, length) as i64)
}

/// Writes `value` as a binary-reflected Gray code into bits `[start, end]`.
pub fn encode_integer_as_gray(
    genome: &mut BinaryString,
    start: usize,
    end: usize,
    value: i64,
) -> Result<()> {
    let length = check_range(genome, start, end)?;
    if value < 0 || value as u64 > largest(length) {
        return Err(GeneticError::Encoding(format!(
            "Value {} does not fit in {} bits",
            value, length
        )));
    }
    let v = value as u64;
    write_bits(genome, start, length, v ^ (v >> 1));
    Ok(())
}

/// Reads bits `[start, end]` as a binary-reflected Gray code.
pub fn integer_from_gray(genome: &BinaryString, start: usize, end: usize) -> Result<i64> {
    let length = check_range(genome, start, end)?;
    let mut previous = false;
    let mut value = 0u64;
    for i in 0..length {
        let bit = previous ^ genome.get(start + i);
        value = (value << 1) | bit as u64;
        previous = bit;
    }
    Ok(value as i64)
}

/// Writes `value` in `[low, high]` as plain binary into bits `[start, end]`.
pub fn encode_real_as_binary(
    genome: &mut BinaryString,
    start: usize,
    end: usize,
    low: f64,
    high: f64,
    value: f64,
) -> Result<()> {
    let length = check_range(genome, start, end)?;
    check_bounds(low, high)?;
    if value < low || value > high {
        return Err(GeneticError::Encoding(format!(
            "Value {} lies outside [{}, {}]",
            value, low, high
        )));
    }
    let d = map_real_to_integer(value, low, high, 0, largest(length) as i64);
    encode_integer_as_binary(genome, start, end, d)
}

/// Reads bits `[start, end]` as plain binary mapped onto `[low, high]`.
pub fn real_from_binary(genome: &BinaryString, start: usize, end: usize, low: f64, high: f64) -> Result<f64> {
    let length = check_range(genome, start, end)?;
    check_bounds(low, high)?;
    let v = integer_from_binary(genome, start, end)?;
    Ok(map_integer_to_real(v, 0, largest(length) as i64, low, high))
}

/// Writes `value` in `[low, high]` as Gray code into bits `[start, end]`.
pub fn encode_real_as_gray(
    genome: &mut BinaryString,
    start: usize,
    end: usize,
    low: f64,
    high: f64,
    value: f64,
) -> Result<()> {
    let length = check_range(genome, start, end)?;
    check_bounds(low, high)?;
    if value < low || value > high {
        return Err(GeneticError::Encoding(format!(
            "Value {} lies outside [{}, {}]",
            value, low, high
        )));
    }
    let d = map_real_to_integer(value, low, high, 0, largest(length) as i64);
    encode_integer_as_gray(genome, start, end, d)
}

/// Reads bits `[start, end]` as Gray code mapped onto `[low, high]`.
pub fn real_from_gray(genome: &BinaryString, start: usize, end: usize, low: f64, high: f64) -> Result<f64> {
    let length = check_range(genome, start, end)?;
    check_bounds(low, high)?;
    let v = integer_from_gray(genome, start, end)?;
    Ok(map_integer_to_real(v, 0, largest(length) as i64, low, high))
}
