//! # Fitness transform
//!
//! Turns raw evaluations into non-negative selection weights:
//!
//! 1. copy each evaluation into its fitness
//! 2. if any value is negative, shift everything up by `1.01 * |min|`
//! 3. when minimising, remap so that smaller evaluations get larger weights
//!    (reciprocal or Cmax)
//! 4. apply the final scaling: raw, linear normalisation or linear ranking
//!
//! ## Example
//!
//! ```rust
//! use pgalib::fitness::{compute_fitness, Direction, FitnessParams};
//!
//! let params = FitnessParams::new(Direction::Maximize);
//! let fitness = compute_fitness(&[-2.0, 0.0, 3.0], &params).unwrap();
//! assert!(fitness.iter().all(|f| *f >= 0.0));
//! assert!(fitness[2] > fitness[1] && fitness[1] > fitness[0]);
//! ```

use std::cmp::Ordering;

use tracing::trace;

use crate::error::{GeneticError, Result};
use crate::population::Population;

/// Optimisation direction of the evaluation function.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    /// True if evaluation `a` is strictly better than `b`.
    pub fn is_better(self, a: f64, b: f64) -> bool {
        match self {
            Direction::Maximize => a > b,
            Direction::Minimize => a < b,
        }
    }
}

/// Final scaling applied to the fitness values.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitnessType {
    /// Use the (shifted, remapped) evaluations directly.
    #[default]
    Raw,
    /// `K - sigma * rank` with `K = sigma * N`.
    Normal,
    /// Linear ranking between `2 - max` and `max`.
    Ranking,
}

/// How a minimisation problem is turned into a maximisation one.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitnessMinType {
    /// `1 / f`; a zero value is an error.
    Reciprocal,
    /// `cmax - evaluation` with `cmax = multiplier * max(0, max evaluation)`.
    #[default]
    Cmax,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessParams {
    pub direction: Direction,
    pub fitness_type: FitnessType,
    pub min_type: FitnessMinType,
    /// Weight of the best individual under linear ranking, in `[1, 2]`.
    pub rank_max: f64,
    pub cmax_multiplier: f64,
}

impl FitnessParams {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            fitness_type: FitnessType::Raw,
            min_type: FitnessMinType::Cmax,
            rank_max: 1.2,
            cmax_multiplier: 1.01,
        }
    }
}

/// Computes the fitness of every evaluation.
pub fn compute_fitness(evaluations: &[f64], params: &FitnessParams) -> Result<Vec<f64>> {
    if evaluations.is_empty() {
        return Err(GeneticError::EmptyPopulation);
    }
    if let Some(i) = evaluations.iter().position(|e| !e.is_finite()) {
        return Err(GeneticError::FitnessCalculation(format!(
            "Non-finite evaluation {} for individual {}",
            evaluations[i], i
        )));
    }

    let mut fitness = evaluations.to_vec();

    let min = fitness.iter().cloned().fold(f64::INFINITY, f64::min);
    if min < 0.0 {
        let shift = -1.01 * min;
        fitness.iter_mut().for_each(|f| *f += shift);
    }

    if params.direction == Direction::Minimize {
        match params.min_type {
            FitnessMinType::Reciprocal => {
                if let Some(i) = fitness.iter().position(|f| *f == 0.0) {
                    return Err(GeneticError::FitnessCalculation(format!(
                        "Reciprocal fitness of zero for individual {}",
                        i
                    )));
                }
                fitness.iter_mut().for_each(|f| *f = 1.0 / *f);
            }
            FitnessMinType::Cmax => {
                // Never below the largest evaluation, so no member goes negative.
                let max = evaluations.iter().cloned().fold(0.0, f64::max);
                let cmax = (max * params.cmax_multiplier).max(max);
                for (f, e) in fitness.iter_mut().zip(evaluations) {
                    *f = cmax - e;
                }
                if fitness.iter().all(|f| *f == 0.0) {
                    trace!("Cmax remap produced zero total fitness, using uniform weights");
                    fitness.iter_mut().for_each(|f| *f = 1.0);
                }
            }
        }
    }

    match params.fitness_type {
        FitnessType::Raw => {}
        FitnessType::Normal => linear_normal(&mut fitness),
        FitnessType::Ranking => linear_rank(&mut fitness, params.rank_max),
    }

    Ok(fitness)
}

/// Applies the transform to a population buffer in place.
///
/// Every member must carry a current evaluation.
pub fn apply_fitness<G>(population: &mut Population<G>, params: &FitnessParams) -> Result<()> {
    if let Some(i) = population.pending().first() {
        return Err(GeneticError::FitnessCalculation(format!(
            "Evaluation of individual {} is not up to date",
            i
        )));
    }
    let fitness = compute_fitness(&population.evaluations(), params)?;
    for (member, f) in population.members_mut().iter_mut().zip(fitness) {
        member.fitness = f;
    }
    Ok(())
}

/// Rank of every entry, 1 for the largest. Ties keep index order.
pub fn ranks(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].partial_cmp(&values[a]).unwrap_or(Ordering::Equal));
    let mut rank = vec![0; values.len()];
    for (position, &index) in order.iter().enumerate() {
        rank[index] = position + 1;
    }
    rank
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation around `mean`.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

fn linear_normal(fitness: &mut [f64]) {
    let n = fitness.len() as f64;
    let mut sigma = stddev(fitness, mean(fitness));
    if sigma == 0.0 {
        sigma = 1.0;
    }
    let k = sigma * n;
    let rank = ranks(fitness);
    for (f, r) in fitness.iter_mut().zip(rank) {
        *f = k - sigma * r as f64;
    }
}

fn linear_rank(fitness: &mut [f64], max: f64) {
    let min = 2.0 - max;
    let n = fitness.len() as f64;
    let rank = ranks(fitness);
    for (f, r) in fitness.iter_mut().zip(rank) {
        // A lone member takes the top weight.
        let position = if n > 1.0 { (r as f64 - 1.0) / (n - 1.0) } else { 0.0 };
        *f = (max - (max - min) * position) / n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(direction: Direction, min_type: FitnessMinType, fitness_type: FitnessType) -> FitnessParams {
        FitnessParams {
            direction,
            fitness_type,
            min_type,
            ..FitnessParams::new(direction)
        }
    }

    #[test]
    fn test_raw_maximize_is_identity_for_positive() {
        let p = FitnessParams::new(Direction::Maximize);
        assert_eq!(compute_fitness(&[1.0, 2.0, 3.0], &p).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_negative_values_are_shifted() {
        let p = FitnessParams::new(Direction::Maximize);
        let f = compute_fitness(&[-10.0, -5.0], &p).unwrap();
        assert!((f[0] - 0.1).abs() < 1e-12);
        assert!((f[1] - 5.1).abs() < 1e-12);
    }

    #[test]
    fn test_reciprocal_minimize() {
        let p = params(Direction::Minimize, FitnessMinType::Reciprocal, FitnessType::Raw);
        let f = compute_fitness(&[2.0, 4.0], &p).unwrap();
        assert_eq!(f, vec![0.5, 0.25]);
    }

    #[test]
    fn test_reciprocal_of_zero_is_fatal() {
        let p = params(Direction::Minimize, FitnessMinType::Reciprocal, FitnessType::Raw);
        match compute_fitness(&[0.0, 4.0], &p) {
            Err(GeneticError::FitnessCalculation(msg)) => assert!(msg.contains("Reciprocal")),
            other => panic!("Expected FitnessCalculation error, got {:?}", other),
        }
    }

    #[test]
    fn test_cmax_minimize() {
        let p = params(Direction::Minimize, FitnessMinType::Cmax, FitnessType::Raw);
        let f = compute_fitness(&[1.0, 3.0], &p).unwrap();
        let cmax = 3.0 * 1.01;
        assert!((f[0] - (cmax - 1.0)).abs() < 1e-12);
        assert!((f[1] - (cmax - 3.0)).abs() < 1e-12);
        assert!(f[1] > 0.0);
    }

    #[test]
    fn test_cmax_small_multiplier_stays_non_negative() {
        let p = FitnessParams {
            cmax_multiplier: 0.5,
            ..params(Direction::Minimize, FitnessMinType::Cmax, FitnessType::Raw)
        };
        let f = compute_fitness(&[1.0, 3.0], &p).unwrap();
        assert_eq!(f, vec![2.0, 0.0]);
    }

    #[test]
    fn test_cmax_all_equal_gives_uniform_weights() {
        let p = params(Direction::Minimize, FitnessMinType::Cmax, FitnessType::Raw);
        assert_eq!(compute_fitness(&[0.0, 0.0, 0.0], &p).unwrap(), vec![1.0; 3]);
        let f = compute_fitness(&[2.0, 2.0], &p).unwrap();
        assert!(f[0] > 0.0 && f[0] == f[1]);
    }

    #[test]
    fn test_cmax_negative_evaluations() {
        let p = params(Direction::Minimize, FitnessMinType::Cmax, FitnessType::Raw);
        let f = compute_fitness(&[-4.0, -1.0], &p).unwrap();
        assert_eq!(f, vec![4.0, 1.0]);
    }

    #[test]
    fn test_linear_ranking() {
        let p = params(Direction::Maximize, FitnessMinType::Cmax, FitnessType::Ranking);
        let f = compute_fitness(&[10.0, 30.0, 20.0], &p).unwrap();
        assert!((f[1] - 1.2 / 3.0).abs() < 1e-12);
        assert!((f[2] - 1.0 / 3.0).abs() < 1e-12);
        assert!((f[0] - 0.8 / 3.0).abs() < 1e-12);
        assert!((f.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_normal() {
        let p = params(Direction::Maximize, FitnessMinType::Cmax, FitnessType::Normal);
        let f = compute_fitness(&[5.0, 5.0, 5.0, 5.0], &p).unwrap();
        assert_eq!(f, vec![3.0, 2.0, 1.0, 0.0]);
        let g = compute_fitness(&[1.0, 3.0], &p).unwrap();
        assert_eq!(g, vec![0.0, 1.0]);
    }

    #[test]
    fn test_ranks_ties_keep_order() {
        assert_eq!(ranks(&[1.0, 3.0, 3.0, 0.0]), vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_non_finite_rejected() {
        let p = FitnessParams::new(Direction::Maximize);
        assert!(compute_fitness(&[1.0, f64::NAN], &p).is_err());
        assert!(matches!(compute_fitness(&[], &p), Err(GeneticError::EmptyPopulation)));
    }

    #[test]
    fn test_apply_fitness_rejects_stale_members() {
        let mut pop = Population::new(2, |_| 0u8);
        pop.get_mut(0).unwrap().set_evaluation(1.0);
        let p = FitnessParams::new(Direction::Maximize);
        match apply_fitness(&mut pop, &p) {
            Err(GeneticError::FitnessCalculation(msg)) => assert!(msg.contains("individual 1")),
            other => panic!("Expected FitnessCalculation error, got {:?}", other),
        }
        pop.get_mut(1).unwrap().set_evaluation(3.0);
        apply_fitness(&mut pop, &p).unwrap();
        assert_eq!(pop.fitness_values(), vec![1.0, 3.0]);
    }
}
