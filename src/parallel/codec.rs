//! Wire format of the evaluation protocol.
//!
//! An individual travels as
//!
//! | bytes | field |
//! |---|---|
//! | 8 | evaluation, `f64` little endian |
//! | 8 | fitness, `f64` little endian |
//! | 4 | evaluation-current flag, `i32` little endian |
//! | rest | genome payload from the representation's `encode` |
//!
//! A result is a single little endian `f64`.

use crate::{
    error::{GeneticError, Result},
    genome::Representation,
    population::Individual,
};

const HEADER_LEN: usize = 20;

pub fn encode_individual<R: Representation>(
    representation: &R,
    individual: &Individual<R::Genome>,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + 8 * representation.string_length());
    buf.extend_from_slice(&individual.evaluation.to_le_bytes());
    buf.extend_from_slice(&individual.fitness.to_le_bytes());
    buf.extend_from_slice(&(individual.evaluation_current as i32).to_le_bytes());
    representation.encode(&individual.genome, &mut buf);
    buf
}

pub fn decode_individual<R: Representation>(
    representation: &R,
    bytes: &[u8],
) -> Result<Individual<R::Genome>> {
    if bytes.len() < HEADER_LEN {
        return Err(GeneticError::Transport(format!(
            "Individual payload of {} bytes is shorter than its {} byte header",
            bytes.len(),
            HEADER_LEN
        )));
    }
    let evaluation = f64::from_le_bytes(field(bytes, 0)?);
    let fitness = f64::from_le_bytes(field(bytes, 8)?);
    let flag = i32::from_le_bytes(field(bytes, 16)?);
    let genome = representation.decode(&bytes[HEADER_LEN..])?;
    Ok(Individual {
        genome,
        evaluation,
        fitness,
        evaluation_current: flag != 0,
    })
}

pub fn encode_evaluation(value: f64) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

pub fn decode_evaluation(bytes: &[u8]) -> Result<f64> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| {
        GeneticError::Transport(format!(
            "Evaluation result must be 8 bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(f64::from_le_bytes(raw))
}

fn field<const N: usize>(bytes: &[u8], at: usize) -> Result<[u8; N]> {
    bytes
        .get(at..at + N)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| GeneticError::Transport(format!("Truncated header field at byte {}", at)))
}
